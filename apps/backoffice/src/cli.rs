//! # Command Line Definitions
//!
//! Amounts are decimal strings in either notation (`115,00` or `115.00`).
//! Negative amounts need no escaping: `caisse add-item <id> "Remise" -3,50`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Back-office register lifecycle and reconciliation.
#[derive(Debug, Parser)]
#[command(name = "caisse", version, about)]
pub struct Cli {
    /// SQLite database file (overrides CAISSE_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open a register on a desk
    Open {
        desk_id: String,
        desk_name: String,
        /// Opening cash fund
        #[arg(long, default_value = "0")]
        cash_fund: String,
    },

    /// List registers, most recent first
    List {
        /// Only registers of this desk
        #[arg(long)]
        desk: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Payment breakdown, corrections and variance
    Summary { register_id: String },

    /// VAT breakdown by delivery channel and rate
    Vat { register_id: String },

    /// Close an active register (freezes the sales window)
    Close { register_id: String },

    /// Enclose a closed register (irreversible)
    Enclose {
        register_id: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Add a correction line
    AddItem {
        register_id: String,
        label: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Remove a correction line
    RemoveItem { register_id: String, item_id: String },

    /// Open a register with a demo service of payments and sales
    Seed { desk_id: String },

    /// Database health and migration state
    Status,
}
