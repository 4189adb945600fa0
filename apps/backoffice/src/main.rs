//! # caisse: Back-Office Command Line
//!
//! ```text
//! caisse open d1 "Comptoir" --cash-fund 150,00
//! caisse add-item <register-id> "Espèces comptées" 115,00
//! caisse summary <register-id>
//! caisse close <register-id>
//! caisse enclose <register-id> --comment "RAS"
//! ```
//!
//! Results are printed as JSON on stdout, errors as JSON on stderr. Logs go
//! to stderr and are filtered with `RUST_LOG`.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // The actual setup is in lib.rs for better testability
    caisse_backoffice::run().await
}
