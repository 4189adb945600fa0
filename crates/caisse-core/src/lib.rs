//! # caisse-core: Pure Reconciliation Logic for the Back-Office
//!
//! This crate is the **heart** of the cash-register engine. It contains the
//! register lifecycle, the aggregators and the variance rules as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Cash Register Engine                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Back-office screens (external)                     │   │
//! │  │   Register list ──► Summary ──► Corrections ──► Close/Enclose   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ commands                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               caisse-db: RegisterService + stores               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ caisse-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────────┐  │   │
//! │  │   │   money   │ │ lifecycle │ │ breakdown │ │   variance    │  │   │
//! │  │   │   Money   │ │  Active   │ │ payments  │ │ cash-vs-cash  │  │   │
//! │  │   │  TaxRate  │ │ PreClosed │ │ VAT HT/TVA│ │ or aggregate  │  │   │
//! │  │   │           │ │ Enclosed  │ │           │ │               │  │   │
//! │  │   └───────────┘ └───────────┘ └───────────┘ └───────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Register, SummaryItem, CustomItem, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Input validation for operator-entered data
//! - [`lifecycle`] - Register state machine
//! - [`ledger`] - Correction ledger rules
//! - [`breakdown`] - Payment and VAT aggregators
//! - [`variance`] - Theoretical vs declared reconciliation
//!
//! ## Example Usage
//!
//! ```rust
//! use caisse_core::money::Money;
//!
//! let counted = Money::parse_decimal("115,00").unwrap();
//! let expected = Money::from_cents(11650);
//!
//! assert_eq!((counted - expected).cents(), -150);
//! assert_eq!((counted - expected).to_string(), "-1.50");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod breakdown;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod money;
pub mod types;
pub mod validation;
pub mod variance;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ConflictReason, CoreError, CoreResult, ErrorKind, ValidationError};
pub use lifecycle::{AllowedActions, Transition};
pub use money::Money;
pub use types::*;
pub use variance::{VariancePolicy, VarianceReport, VarianceStatus};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Payment method code used for cash settlements.
pub const CASH_METHOD_CODE: &str = "CASH";

/// Keyword identifying a "counted cash" declaration among correction labels.
///
/// Matched case-insensitively as a substring (e.g. "Espèces comptées").
pub const CASH_DECLARATION_KEYWORD: &str = "espèces";

/// Largest absolute amount accepted for a single operator-entered value,
/// in cents (10,000,000.00).
pub const MAX_ABS_AMOUNT_CENTS: i64 = 1_000_000_000;

/// Maximum length of a correction label.
pub const MAX_LABEL_LEN: usize = 120;

/// Maximum length of an enclose comment.
pub const MAX_COMMENT_LEN: usize = 500;
