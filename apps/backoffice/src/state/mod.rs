//! # State Module
//!
//! Everything a command needs, built once at startup.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                          AppState                                │  │
//! │  │                                                                  │  │
//! │  │  service: RegisterService<Database, Database>  ◄── operations    │  │
//! │  │  db:      Database (same pool)                 ◄── seeding       │  │
//! │  │  config:  AppConfig                            ◄── formatting    │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database has an internal connection pool (thread-safe)              │
//! │  • AppConfig is read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;

pub use config::{AppConfig, ConfigError};

use std::sync::Arc;

use caisse_db::{Database, RegisterService};

/// Application state shared by all commands.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: RegisterService<Database, Database>,
    pub db: Database,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        let service = RegisterService::with_store(Arc::new(db.clone()), config.service_config());
        AppState {
            service,
            db,
            config,
        }
    }
}
