//! # Commands Module
//!
//! One function per back-office operation.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (dispatch, read retries)
//! ├── register.rs   ◄─── open, list, summary, vat, close, enclose
//! ├── correction.rs ◄─── add-item, remove-item
//! ├── seed.rs       ◄─── Demo service for a desk
//! └── status.rs     ◄─── Database health check
//! ```
//!
//! ## Retries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Reads (list, summary, vat)     TRANSIENT → retried with backoff        │
//! │  Writes (open, close, ...)      never retried here: a timed-out write   │
//! │                                 may have been applied, the operator     │
//! │                                 refreshes and decides                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod correction;
pub mod register;
pub mod seed;
pub mod status;

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use caisse_core::CoreResult;

use crate::cli::Command;
use crate::error::ApiError;
use crate::state::AppState;

/// Attempts for a read before giving up.
pub const MAX_READ_ATTEMPTS: u32 = 3;

/// Runs a parsed command and returns its JSON response.
pub async fn dispatch(state: &AppState, command: Command) -> Result<Value, ApiError> {
    match command {
        Command::Open {
            desk_id,
            desk_name,
            cash_fund,
        } => to_json(register::open(state, &desk_id, &desk_name, &cash_fund).await?),
        Command::List { desk, limit } => {
            to_json(register::list(state, desk.as_deref(), limit).await?)
        }
        Command::Summary { register_id } => to_json(register::summary(state, &register_id).await?),
        Command::Vat { register_id } => to_json(register::vat(state, &register_id).await?),
        Command::Close { register_id } => to_json(register::close(state, &register_id).await?),
        Command::Enclose {
            register_id,
            comment,
        } => to_json(register::enclose(state, &register_id, comment.as_deref()).await?),
        Command::AddItem {
            register_id,
            label,
            amount,
        } => to_json(correction::add(state, &register_id, &label, &amount).await?),
        Command::RemoveItem {
            register_id,
            item_id,
        } => to_json(correction::remove(state, &register_id, &item_id).await?),
        Command::Seed { desk_id } => to_json(seed::seed(state, &desk_id).await?),
        Command::Status => to_json(status::status(state).await?),
    }
}

fn to_json(value: impl Serialize) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::internal(format!("Could not encode response: {e}")))
}

/// Runs a read, retrying retryable failures with exponential backoff.
///
/// Only for reads: retrying a write that timed out could apply it twice.
pub async fn retry_read<T, F, Fut>(operation: &str, mut read: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let mut backoff = read_backoff();
    let mut attempt = 1;

    loop {
        match read().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < MAX_READ_ATTEMPTS => {
                let Some(delay) = backoff.next_backoff() else {
                    return Err(err.into());
                };
                warn!(operation, attempt, delay_ms = delay.as_millis() as u64, error = %err, "Retrying read");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn read_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(100),
        max_interval: Duration::from_secs(2),
        multiplier: 2.0,
        max_elapsed_time: Some(Duration::from_secs(10)),
        ..Default::default()
    }
}
