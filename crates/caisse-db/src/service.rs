//! # Register Service
//!
//! The operations the back-office screens call. Each one validates input,
//! makes one or more bounded store calls and hands the data to the pure
//! rules of `caisse-core`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  get_summary(id)                                                       │
//! │    store.load ──► window ──► sales.payments ──► aggregate_payments ─┐  │
//! │                        └──► store.items ─────────────────────────────┤  │
//! │                                                        variance::analyze│
//! │                                                                         │
//! │  get_vat_details(id)                                                   │
//! │    store.load ──► window ──► sales.sales_lines ──► aggregate_vat       │
//! │                                                                         │
//! │  close_register / enclose_register                                     │
//! │    store.atomic_transition (check-and-set)                             │
//! │                                                                         │
//! │  add_correction_item / remove_correction_item                          │
//! │    NewCorrection::new ──► store.append_item / store.remove_item        │
//! │                                                                         │
//! │  every store call: tokio::time::timeout ──► elapsed = Transient        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here retries. A refused transition is reported with its reason and
//! the caller re-reads the register.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use caisse_core::breakdown::{aggregate_payments, aggregate_vat};
use caisse_core::ledger::NewCorrection;
use caisse_core::validation::{validate_cash_fund, validate_comment, validate_desk_field};
use caisse_core::variance::{analyze, VariancePolicy};
use caisse_core::{
    AllowedActions, CoreError, CoreResult, CustomItem, Money, Register, RegisterSummary,
    Transition, VatDetails,
};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::store::{RegisterStore, SalesSource};

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default page size for register history.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

// =============================================================================
// Configuration
// =============================================================================

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bound on every store call. Elapsed → `CoreError::Transient`.
    pub store_timeout: Duration,

    /// Cash method code and cash declaration keyword.
    pub variance_policy: VariancePolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            variance_policy: VariancePolicy::default(),
        }
    }
}

impl ServiceConfig {
    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn variance_policy(mut self, policy: VariancePolicy) -> Self {
        self.variance_policy = policy;
        self
    }
}

// =============================================================================
// Service
// =============================================================================

/// Register lifecycle and reconciliation operations.
///
/// `S` persists registers and corrections, `E` supplies sales. With SQLite
/// both are the same [`Database`](crate::Database), see [`RegisterService::with_store`].
#[derive(Debug)]
pub struct RegisterService<S, E> {
    store: Arc<S>,
    sales: Arc<E>,
    config: ServiceConfig,
}

impl<S, E> Clone for RegisterService<S, E> {
    fn clone(&self) -> Self {
        RegisterService {
            store: Arc::clone(&self.store),
            sales: Arc::clone(&self.sales),
            config: self.config.clone(),
        }
    }
}

impl<T> RegisterService<T, T>
where
    T: RegisterStore + SalesSource,
{
    /// One backend for both registers and sales.
    pub fn with_store(store: Arc<T>, config: ServiceConfig) -> Self {
        RegisterService::new(Arc::clone(&store), store, config)
    }
}

impl<S, E> RegisterService<S, E>
where
    S: RegisterStore,
    E: SalesSource,
{
    pub fn new(store: Arc<S>, sales: Arc<E>, config: ServiceConfig) -> Self {
        RegisterService {
            store,
            sales,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Runs a store call under the configured timeout.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> CoreResult<T>
    where
        F: Future<Output = DbResult<T>>,
    {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(result) => result.map_err(CoreError::from),
            Err(_) => {
                let millis = u64::try_from(self.config.store_timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(operation, timeout_ms = millis, "Store call timed out");
                Err(DbError::Timeout(millis).into())
            }
        }
    }

    // =========================================================================
    // Registers
    // =========================================================================

    /// Opens a register on a desk, starting now.
    ///
    /// ## Errors
    /// * `Validation` - blank desk fields or negative cash fund
    /// * `Conflict(DeskAlreadyOpen)` - the desk already has an active register
    pub async fn open_register(
        &self,
        desk_id: &str,
        desk_name: &str,
        cash_fund: Money,
    ) -> CoreResult<Register> {
        let desk_id = validate_desk_field("desk_id", desk_id)?;
        let desk_name = validate_desk_field("desk_name", desk_name)?;
        validate_cash_fund(cash_fund)?;

        let register = Register::open(
            Uuid::new_v4().to_string(),
            desk_id,
            desk_name,
            cash_fund,
            Utc::now(),
        );

        self.bounded("insert_register", self.store.insert_register(&register))
            .await?;

        info!(
            id = %register.id,
            desk_id = %register.desk_id,
            cash_fund = %register.cash_fund(),
            "Register opened"
        );
        Ok(register)
    }

    /// Register history, most recent first.
    pub async fn list_registers(&self, desk_id: Option<&str>, limit: u32) -> CoreResult<Vec<Register>> {
        self.bounded("list_for_desk", self.store.list_for_desk(desk_id, limit))
            .await
    }

    /// Loads one register in any state.
    pub async fn get_register(&self, register_id: &str) -> CoreResult<Register> {
        self.bounded("load", self.store.load(register_id)).await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Payment breakdown, corrections and variance of a register.
    ///
    /// Allowed in every state. The window ends at `close_time` once closed,
    /// at the time of the call while active.
    pub async fn get_summary(&self, register_id: &str) -> CoreResult<RegisterSummary> {
        let register = self.get_register(register_id).await?;
        let window = register.window(Utc::now());

        let payments = self
            .bounded("payments", self.sales.payments(&register.desk_id, &window))
            .await?;
        let custom_items = self
            .bounded("items", self.store.items(&register.id))
            .await?;

        let summary_items = aggregate_payments(&payments, &window);
        let variance = analyze(&summary_items, &custom_items, &self.config.variance_policy);

        debug!(
            id = %register.id,
            methods = summary_items.len(),
            corrections = custom_items.len(),
            variance = variance.variance_cents,
            status = ?variance.status,
            "Summary computed"
        );

        Ok(RegisterSummary {
            allowed_actions: AllowedActions::for_state(register.state),
            register,
            summary_items,
            custom_items,
            variance,
        })
    }

    /// VAT breakdown of a register by delivery channel and VAT rate.
    pub async fn get_vat_details(&self, register_id: &str) -> CoreResult<VatDetails> {
        let register = self.get_register(register_id).await?;
        let window = register.window(Utc::now());

        let lines = self
            .bounded("sales_lines", self.sales.sales_lines(&register.desk_id, &window))
            .await?;
        let breakdown = aggregate_vat(&lines, &window);

        debug!(id = %register.id, groups = breakdown.items.len(), ttc = breakdown.totals.ttc_cents, "VAT details computed");

        Ok(VatDetails {
            register_id: register.id,
            state: register.state,
            items: breakdown.items,
            totals: breakdown.totals,
        })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Active → PreClosed. Freezes the payment window at now.
    ///
    /// ## Errors
    /// `Conflict(AlreadyClosed | AlreadyEnclosed)`, state unchanged.
    pub async fn close_register(&self, register_id: &str) -> CoreResult<Register> {
        let transition = Transition::Close { at: Utc::now() };
        self.transition(register_id, transition).await
    }

    /// PreClosed → Enclosed. Irreversible.
    ///
    /// ## Errors
    /// * `Validation` - comment too long
    /// * `Conflict(NotClosed | AlreadyEnclosed)`, state unchanged
    pub async fn enclose_register(
        &self,
        register_id: &str,
        comment: Option<&str>,
    ) -> CoreResult<Register> {
        let comment = validate_comment(comment)?;
        let transition = Transition::Enclose {
            at: Utc::now(),
            comment,
        };
        self.transition(register_id, transition).await
    }

    async fn transition(&self, register_id: &str, transition: Transition) -> CoreResult<Register> {
        let register = self
            .bounded(
                "atomic_transition",
                self.store.atomic_transition(register_id, &transition),
            )
            .await?;

        info!(
            id = %register.id,
            transition = transition.name(),
            state = register.state.as_str(),
            "Register transitioned"
        );
        Ok(register)
    }

    // =========================================================================
    // Corrections
    // =========================================================================

    /// Appends a correction line to an active or pre-closed register.
    ///
    /// ## Errors
    /// * `Validation` - blank/too long label, amount out of range
    /// * `NotFound` - unknown register
    /// * `Conflict(RegisterFrozen)` - register is enclosed
    pub async fn add_correction_item(
        &self,
        register_id: &str,
        label: &str,
        amount: Money,
    ) -> CoreResult<CustomItem> {
        let correction = NewCorrection::new(label, amount)?;
        let item = correction.into_item(Uuid::new_v4().to_string(), register_id, Utc::now());

        self.bounded("append_item", self.store.append_item(&item))
            .await?;

        info!(register_id = %register_id, id = %item.id, amount = %item.amount(), "Correction added");
        Ok(item)
    }

    /// Removes a live correction line.
    ///
    /// ## Errors
    /// * `NotFound` - unknown register or item, or item already removed
    /// * `Conflict(RegisterFrozen)` - register is enclosed
    pub async fn remove_correction_item(&self, register_id: &str, item_id: &str) -> CoreResult<()> {
        self.bounded(
            "remove_item",
            self.store.remove_item(register_id, item_id, Utc::now()),
        )
        .await?;

        info!(register_id = %register_id, id = %item_id, "Correction removed");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
