//! # Caisse Back-Office Library
//!
//! Core library for the `caisse` command line. One invocation runs one
//! back-office operation against the register database and prints the
//! result as JSON.
//!
//! ## Module Organization
//! ```text
//! caisse_backoffice/
//! ├── lib.rs          ◄─── You are here (startup & dispatch)
//! ├── cli.rs          ◄─── clap command definitions
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState (service + database + config)
//! │   └── config.rs   ◄─── CAISSE_* configuration
//! ├── commands/
//! │   ├── mod.rs      ◄─── Dispatch and read retries
//! │   ├── register.rs ◄─── open, list, summary, vat, close, enclose
//! │   ├── correction.rs ◄─ add-item, remove-item
//! │   ├── seed.rs     ◄─── Demo data for a desk
//! │   └── status.rs   ◄─── Database health check
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use directories::ProjectDirs;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use caisse_db::{Database, DbConfig};
use cli::Cli;
use error::ApiError;
use state::{AppConfig, AppState, ConfigError};

/// Runs one back-office command.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Command Startup                                   │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber on stderr with env filter                      │
/// │     • Default: INFO, can be overridden with RUST_LOG                    │
/// │                                                                         │
/// │  2. Parse Arguments & Load Configuration ─────────────────────────────► │
/// │     • clap derive, CAISSE_* environment variables                       │
/// │                                                                         │
/// │  3. Determine Database Path ──────────────────────────────────────────► │
/// │     • --db, then CAISSE_DB_PATH, then the platform data directory       │
/// │                                                                         │
/// │  4. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode, pending migrations applied                  │
/// │                                                                         │
/// │  5. Dispatch ─────────────────────────────────────────────────────────► │
/// │     • stdout: JSON result       exit 0                                  │
/// │     • stderr: JSON ApiError     exit per error code                     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match execute(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let body = serde_json::to_string_pretty(&err)
                .unwrap_or_else(|_| format!("{{\"message\":\"{}\"}}", err.message));
            eprintln!("{body}");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn execute(cli: Cli) -> Result<String, ApiError> {
    let config = AppConfig::from_env()?;

    let db_path = get_database_path(cli.db.as_ref(), &config)?;
    info!(?db_path, "Database path determined");

    let db = Database::new(DbConfig::new(db_path).max_connections(config.max_connections)).await?;
    debug!("Database connected and migrations applied");

    let state = AppState::new(db, config);
    let result = commands::dispatch(&state, cli.command).await;
    state.db.close().await;

    render(&result?)
}

fn render(value: &impl Serialize) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::internal(format!("Could not encode response: {e}")))
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout stays pure JSON.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=caisse=trace` - Show trace for caisse crates only
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,caisse=debug,sqlx=warn"));

    // try_init: a second call (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Determines the database file path.
///
/// ## Resolution Order
/// 1. `--db` flag
/// 2. `CAISSE_DB_PATH` environment variable
/// 3. Platform data directory:
///    - **macOS**: `~/Library/Application Support/fr.caisse.backoffice/caisse.db`
///    - **Windows**: `%APPDATA%\caisse\backoffice\data\caisse.db`
///    - **Linux**: `~/.local/share/backoffice/caisse.db`
fn get_database_path(flag: Option<&PathBuf>, config: &AppConfig) -> Result<PathBuf, ConfigError> {
    if let Some(path) = flag.or(config.database_path.as_ref()) {
        return Ok(path.clone());
    }

    let proj_dirs =
        ProjectDirs::from("fr", "caisse", "backoffice").ok_or(ConfigError::NoDataDirectory)?;

    let data_dir = proj_dirs.data_dir();

    // Create directory if it doesn't exist
    std::fs::create_dir_all(data_dir).map_err(|e| ConfigError::DataDirectory {
        path: data_dir.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(data_dir.join("caisse.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins_over_environment() {
        let config = AppConfig {
            database_path: Some(PathBuf::from("/env/caisse.db")),
            ..AppConfig::default()
        };
        let flag = PathBuf::from("/flag/caisse.db");

        assert_eq!(get_database_path(Some(&flag), &config).unwrap(), flag);
        assert_eq!(
            get_database_path(None, &config).unwrap(),
            PathBuf::from("/env/caisse.db")
        );
    }
}
