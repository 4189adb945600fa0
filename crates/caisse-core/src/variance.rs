//! # Variance Analyzer
//!
//! Compares what the tills should contain with what the operator declared.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SummaryItem* ──► theoretical_total = Σ amount                          │
//! │  CustomItem*  ──► custom_total      = Σ amount                          │
//! │                                                                         │
//! │  "espèces" label in CustomItem*  AND  CASH in SummaryItem* ?            │
//! │     ├── yes ──► variance = declared cash − theoretical cash             │
//! │     └── no  ──► variance = custom_total − theoretical_total             │
//! │                                                                         │
//! │  variance == 0 ──► Balanced                                             │
//! │  variance  < 0 ──► Shortfall                                            │
//! │  variance  > 0 ──► Surplus                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both paths are part of the business rule. The cash-vs-cash comparison is
//! used whenever the operator counted the drawer; the aggregate comparison is
//! the fallback.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CustomItem, SummaryItem};
use crate::{CASH_DECLARATION_KEYWORD, CASH_METHOD_CODE};

// =============================================================================
// Policy
// =============================================================================

/// Which payment method is cash, and how a cash declaration is recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariancePolicy {
    pub cash_method_code: String,
    /// Lowercase keyword, matched as a case-insensitive substring.
    pub cash_keyword: String,
}

impl Default for VariancePolicy {
    fn default() -> Self {
        VariancePolicy {
            cash_method_code: CASH_METHOD_CODE.to_string(),
            cash_keyword: CASH_DECLARATION_KEYWORD.to_string(),
        }
    }
}

impl VariancePolicy {
    /// Overrides the payment method code treated as cash.
    pub fn with_cash_method_code(mut self, code: impl Into<String>) -> Self {
        self.cash_method_code = code.into();
        self
    }

    /// Whether a correction label declares counted cash.
    pub fn is_cash_declaration_label(&self, label: &str) -> bool {
        label
            .to_lowercase()
            .contains(&self.cash_keyword.to_lowercase())
    }
}

/// [`VariancePolicy::is_cash_declaration_label`] with the default keyword.
///
/// ```rust
/// use caisse_core::variance::is_cash_declaration_label;
///
/// assert!(is_cash_declaration_label("ESPÈCES comptées"));
/// assert!(!is_cash_declaration_label("Remise caisse"));
/// ```
pub fn is_cash_declaration_label(label: &str) -> bool {
    label.to_lowercase().contains(CASH_DECLARATION_KEYWORD)
}

// =============================================================================
// Report
// =============================================================================

/// Classification of a variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStatus {
    Balanced,
    /// Less money than expected.
    Shortfall,
    /// More money than expected.
    Surplus,
}

impl VarianceStatus {
    pub fn classify(variance: Money) -> Self {
        if variance.is_zero() {
            VarianceStatus::Balanced
        } else if variance.is_negative() {
            VarianceStatus::Shortfall
        } else {
            VarianceStatus::Surplus
        }
    }
}

/// Which comparison produced the variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VarianceBasis {
    /// Declared cash against the cash payment total.
    CashDeclaration {
        declared_cents: i64,
        theoretical_cash_cents: i64,
    },
    /// All corrections against all payment methods.
    Aggregate,
}

/// Result of reconciling one register. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VarianceReport {
    pub theoretical_total_cents: i64,
    pub custom_total_cents: i64,
    pub variance_cents: i64,
    pub status: VarianceStatus,
    pub basis: VarianceBasis,
    /// No sales and no corrections: the report carries no information.
    pub informational: bool,
}

impl VarianceReport {
    /// Returns the variance as Money.
    #[inline]
    pub fn variance(&self) -> Money {
        Money::from_cents(self.variance_cents)
    }
}

// =============================================================================
// Analysis
// =============================================================================

/// Reconciles the theoretical totals of a register with its corrections.
///
/// ## Example
/// ```rust
/// use caisse_core::variance::{analyze, VariancePolicy, VarianceStatus};
/// use caisse_core::SummaryItem;
///
/// let summary = vec![SummaryItem {
///     method_code: "CASH".into(),
///     method_label: "Espèces".into(),
///     amount_cents: 5000,
/// }];
///
/// let report = analyze(&summary, &[], &VariancePolicy::default());
/// assert_eq!(report.variance_cents, -5000);
/// assert_eq!(report.status, VarianceStatus::Shortfall);
/// ```
pub fn analyze(
    summary: &[SummaryItem],
    custom: &[CustomItem],
    policy: &VariancePolicy,
) -> VarianceReport {
    let theoretical_total: Money = summary.iter().map(SummaryItem::amount).sum();
    let custom_total: Money = custom.iter().map(CustomItem::amount).sum();

    let declared = custom
        .iter()
        .find(|item| policy.is_cash_declaration_label(&item.label));
    let cash = summary
        .iter()
        .find(|item| item.method_code == policy.cash_method_code);

    let (variance, basis) = match (declared, cash) {
        (Some(declared), Some(cash)) => (
            declared.amount() - cash.amount(),
            VarianceBasis::CashDeclaration {
                declared_cents: declared.amount_cents,
                theoretical_cash_cents: cash.amount_cents,
            },
        ),
        _ => (custom_total - theoretical_total, VarianceBasis::Aggregate),
    };

    VarianceReport {
        theoretical_total_cents: theoretical_total.cents(),
        custom_total_cents: custom_total.cents(),
        variance_cents: variance.cents(),
        status: VarianceStatus::classify(variance),
        basis,
        informational: summary.is_empty() && custom.is_empty(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
