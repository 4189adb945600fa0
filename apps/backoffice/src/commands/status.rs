//! # Status Command
//!
//! Connectivity and schema check for the register database.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ApiError, ErrorCode};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub healthy: bool,
    pub migrations_total: usize,
    pub migrations_applied: usize,
    pub migrations_pending: usize,
}

pub async fn status(state: &AppState) -> Result<StatusResponse, ApiError> {
    debug!("status command");

    if !state.db.health_check().await {
        warn!("Database health check failed");
        return Err(ApiError::new(
            ErrorCode::Transient,
            "Database is not reachable, please retry",
        ));
    }

    let (total, applied) = state.db.migration_status().await?;

    Ok(StatusResponse {
        healthy: true,
        migrations_total: total,
        migrations_applied: applied,
        migrations_pending: total.saturating_sub(applied),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use caisse_db::{Database, DbConfig};

    #[tokio::test]
    async fn test_fresh_database_is_up_to_date() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db, AppConfig::default());

        let report = status(&state).await.unwrap();
        assert!(report.healthy);
        assert!(report.migrations_total >= 1);
        assert_eq!(report.migrations_applied, report.migrations_total);
        assert_eq!(report.migrations_pending, 0);
    }

    #[tokio::test]
    async fn test_closed_database_is_transient() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db, AppConfig::default());
        state.db.close().await;

        let err = status(&state).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Transient);
        assert!(err.retryable);
    }
}
