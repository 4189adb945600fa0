//! # Store Interfaces
//!
//! What [`RegisterService`](crate::service::RegisterService) needs from
//! storage, as two traits:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RegisterStore (read/write, owned by the back-office)                  │
//! │  ├── insert_register / load / list_for_desk                            │
//! │  ├── atomic_transition   check-and-set, never partial                  │
//! │  └── append_item / remove_item / items                                 │
//! │                                                                         │
//! │  SalesSource (read-only, fed by the tills)                             │
//! │  └── payments / sales_lines   for one desk and one window              │
//! │                                                                         │
//! │  Implementations: Database (SQLite)  •  MemoryStore (tests, demos)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutating method checks the register state and mutates in one atomic
//! step. Refusals come back as `DbError::Conflict` with the precise reason.

use async_trait::async_trait;
use caisse_core::{CustomItem, PaymentEvent, Register, SalesLine, ServiceWindow, Transition};
use chrono::{DateTime, Utc};

use crate::error::DbResult;
use crate::pool::Database;

/// Persistence of registers and their correction ledgers.
#[async_trait]
pub trait RegisterStore: Send + Sync {
    /// Persists a newly opened register.
    ///
    /// Fails with `Conflict(DeskAlreadyOpen)` if the desk has an active one.
    async fn insert_register(&self, register: &Register) -> DbResult<()>;

    /// Loads a register, `NotFound` if unknown.
    async fn load(&self, register_id: &str) -> DbResult<Register>;

    /// Registers of one desk (or all desks), most recent first.
    async fn list_for_desk(&self, desk_id: Option<&str>, limit: u32) -> DbResult<Vec<Register>>;

    /// Applies `transition` only if the register is in its source state.
    async fn atomic_transition(&self, register_id: &str, transition: &Transition) -> DbResult<Register>;

    /// Appends a correction item unless the register is enclosed.
    async fn append_item(&self, item: &CustomItem) -> DbResult<()>;

    /// Removes a live correction item unless the register is enclosed.
    async fn remove_item(&self, register_id: &str, item_id: &str, at: DateTime<Utc>) -> DbResult<()>;

    /// Live correction items, in insertion order.
    async fn items(&self, register_id: &str) -> DbResult<Vec<CustomItem>>;
}

/// Read-only access to settled payments and sold lines.
#[async_trait]
pub trait SalesSource: Send + Sync {
    async fn payments(&self, desk_id: &str, window: &ServiceWindow) -> DbResult<Vec<PaymentEvent>>;

    async fn sales_lines(&self, desk_id: &str, window: &ServiceWindow) -> DbResult<Vec<SalesLine>>;
}

// =============================================================================
// SQLite
// =============================================================================

#[async_trait]
impl RegisterStore for Database {
    async fn insert_register(&self, register: &Register) -> DbResult<()> {
        self.registers().insert(register).await
    }

    async fn load(&self, register_id: &str) -> DbResult<Register> {
        self.registers().require(register_id).await
    }

    async fn list_for_desk(&self, desk_id: Option<&str>, limit: u32) -> DbResult<Vec<Register>> {
        self.registers().list(desk_id, limit).await
    }

    async fn atomic_transition(&self, register_id: &str, transition: &Transition) -> DbResult<Register> {
        self.registers().transition(register_id, transition).await
    }

    async fn append_item(&self, item: &CustomItem) -> DbResult<()> {
        self.registers().add_item(item).await
    }

    async fn remove_item(&self, register_id: &str, item_id: &str, at: DateTime<Utc>) -> DbResult<()> {
        self.registers().remove_item(register_id, item_id, at).await
    }

    async fn items(&self, register_id: &str) -> DbResult<Vec<CustomItem>> {
        self.registers().live_items(register_id).await
    }
}

#[async_trait]
impl SalesSource for Database {
    async fn payments(&self, desk_id: &str, window: &ServiceWindow) -> DbResult<Vec<PaymentEvent>> {
        self.sales().payments(desk_id, window).await
    }

    async fn sales_lines(&self, desk_id: &str, window: &ServiceWindow) -> DbResult<Vec<SalesLine>> {
        self.sales().sales_lines(desk_id, window).await
    }
}
