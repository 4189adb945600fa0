//! # caisse-db: Storage and Operations for the Cash-Register Engine
//!
//! This crate persists registers and correction items, reads the sales fed
//! by the tills, and exposes the back-office operations as
//! [`RegisterService`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  caisse CLI / back-office screens                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     caisse-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   RegisterService ──► RegisterStore + SalesSource (traits)      │   │
//! │  │                            │                  │                 │   │
//! │  │              ┌─────────────┴───┐      ┌───────┴────────┐        │   │
//! │  │              │ Database        │      │ MemoryStore    │        │   │
//! │  │              │ (pool.rs,       │      │ (memory.rs,    │        │   │
//! │  │              │  repository/)   │      │  Mutex)        │        │   │
//! │  │              └─────────────────┘      └────────────────┘        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL) with embedded migrations                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage error types and their mapping to `CoreError`
//! - [`repository`] - SQLite repositories (registers, sales)
//! - [`store`] - `RegisterStore` / `SalesSource` interfaces
//! - [`memory`] - In-memory store
//! - [`service`] - `RegisterService` operations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use caisse_db::{Database, DbConfig, RegisterService, ServiceConfig};
//!
//! let db = Database::new(DbConfig::new("caisse.db")).await?;
//! let service = RegisterService::with_store(Arc::new(db), ServiceConfig::default());
//!
//! let summary = service.get_summary(&register_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use pool::{Database, DbConfig};
pub use service::{RegisterService, ServiceConfig};
pub use store::{RegisterStore, SalesSource};

// Repository re-exports for convenience
pub use repository::register::RegisterRepository;
pub use repository::sales::SalesRepository;
