//! # Domain Types
//!
//! Core domain types of the cash-register engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  PERSISTED                                                              │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │    Register     │1 *│   CustomItem    │                             │
//! │  │  ─────────────  │───│  ─────────────  │                             │
//! │  │  id, desk_id    │   │  id, label      │                             │
//! │  │  state          │   │  amount_cents   │                             │
//! │  │  cash_fund      │   └─────────────────┘                             │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  EXTERNAL INPUT (read-only)          DERIVED (never persisted)          │
//! │  ┌─────────────────┐                 ┌─────────────────┐               │
//! │  │  PaymentEvent   │ ──aggregate──►  │   SummaryItem   │               │
//! │  └─────────────────┘                 └─────────────────┘               │
//! │  ┌─────────────────┐                 ┌─────────────────┐               │
//! │  │   SalesLine     │ ──aggregate──►  │  TvaDetailItem  │               │
//! │  └─────────────────┘                 └─────────────────┘               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are stored as `*_cents: i64` fields with [`Money`] accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::lifecycle::AllowedActions;
use crate::money::Money;
use crate::variance::VarianceReport;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1000 bps = 10% (French restaurant rate), 550 bps = 5.5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

/// A VAT rate as configured in the catalog: identifier, label and rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRate {
    pub id: String,
    pub label: String,
    pub rate: TaxRate,
}

// =============================================================================
// Register State
// =============================================================================

/// Lifecycle state of a register. See [`crate::lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RegisterState {
    /// Till is open, sales are attributed to this register.
    Active,
    /// Till is closed, payment window frozen, corrections still editable.
    PreClosed,
    /// Archived. Register and corrections are read-only forever.
    Enclosed,
}

impl Default for RegisterState {
    fn default() -> Self {
        RegisterState::Active
    }
}

impl RegisterState {
    /// Stable lowercase name, identical to the persisted value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RegisterState::Active => "active",
            RegisterState::PreClosed => "pre_closed",
            RegisterState::Enclosed => "enclosed",
        }
    }
}

// =============================================================================
// Register
// =============================================================================

/// One cash-handling session of one desk over one continuous time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Register {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Desk (till) this register belongs to.
    pub desk_id: String,

    /// Desk display name at the time the register was opened.
    pub desk_name: String,

    /// When the register was opened.
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,

    /// When the register was closed (end of the payment window).
    #[ts(as = "Option<String>")]
    pub close_time: Option<DateTime<Utc>>,

    /// When the register was enclosed (archived).
    #[ts(as = "Option<String>")]
    pub enclose_time: Option<DateTime<Utc>>,

    /// Current lifecycle state.
    pub state: RegisterState,

    /// Opening cash fund in cents.
    pub cash_fund_cents: i64,

    /// Operator comment recorded when enclosing.
    pub enclose_comment: Option<String>,
}

impl Register {
    /// Creates a new active register starting at `start_time`.
    pub fn open(
        id: impl Into<String>,
        desk_id: impl Into<String>,
        desk_name: impl Into<String>,
        cash_fund: Money,
        start_time: DateTime<Utc>,
    ) -> Self {
        Register {
            id: id.into(),
            desk_id: desk_id.into(),
            desk_name: desk_name.into(),
            start_time,
            close_time: None,
            enclose_time: None,
            state: RegisterState::Active,
            cash_fund_cents: cash_fund.cents(),
            enclose_comment: None,
        }
    }

    /// Returns the cash fund as Money.
    #[inline]
    pub fn cash_fund(&self) -> Money {
        Money::from_cents(self.cash_fund_cents)
    }

    /// The payment window of this register as seen at `now`.
    pub fn window(&self, now: DateTime<Utc>) -> ServiceWindow {
        ServiceWindow::for_register(self, now)
    }
}

// =============================================================================
// Service Window
// =============================================================================

/// Inclusive time window `[start, end]` whose sales belong to a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ServiceWindow {
    /// `[start_time, close_time]` once closed, `[start_time, now]` while active.
    pub fn for_register(register: &Register, now: DateTime<Utc>) -> Self {
        ServiceWindow {
            start: register.start_time,
            end: register.close_time.unwrap_or(now),
        }
    }

    /// Checks if a timestamp falls inside the window (both bounds inclusive).
    #[inline]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

// =============================================================================
// Correction Item
// =============================================================================

/// One manually entered adjustment line attached to a register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomItem {
    pub id: String,
    pub register_id: String,
    /// Free-text label, e.g. "Espèces comptées", "Remise caisse".
    pub label: String,
    /// Signed amount in cents.
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CustomItem {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Sales Input (external, read-only)
// =============================================================================

/// A settled payment, as supplied by the sales/payment event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentEvent {
    pub id: String,
    pub desk_id: String,
    /// Payment method code ("CASH", "CB", "TR", ...).
    pub method_code: String,
    pub method_label: String,
    /// Signed: refunds are negative settlements.
    pub amount_cents: i64,
    pub settled_at: DateTime<Utc>,
}

impl PaymentEvent {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// A sold line with its VAT split, as supplied by the sales event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesLine {
    pub id: String,
    pub desk_id: String,
    /// "Sur place", "À emporter", "Livraison", ...
    pub delivery_channel: String,
    pub vat_rate_id: String,
    pub vat_rate_label: String,
    pub vat_rate_bps: i64,
    /// Net amount (HT) in cents.
    pub ht_cents: i64,
    /// Tax amount (TVA) in cents.
    pub tva_cents: i64,
    pub sold_at: DateTime<Utc>,
}

impl SalesLine {
    /// Builds a sales line from a tax-inclusive price.
    ///
    /// ## Snapshot Pattern
    /// The VAT rate identity and label are copied onto the line so the
    /// breakdown of an archived register never changes when the catalog does.
    pub fn from_gross(
        id: impl Into<String>,
        desk_id: impl Into<String>,
        delivery_channel: impl Into<String>,
        vat: &VatRate,
        gross: Money,
        sold_at: DateTime<Utc>,
    ) -> Self {
        let (ht, tva) = gross.split_inclusive_tax(vat.rate);
        SalesLine {
            id: id.into(),
            desk_id: desk_id.into(),
            delivery_channel: delivery_channel.into(),
            vat_rate_id: vat.id.clone(),
            vat_rate_label: vat.label.clone(),
            vat_rate_bps: i64::from(vat.rate.bps()),
            ht_cents: ht.cents(),
            tva_cents: tva.cents(),
            sold_at,
        }
    }
}

// =============================================================================
// Derived Read Models
// =============================================================================

/// Theoretical total of one payment method within a register's window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SummaryItem {
    pub method_code: String,
    pub method_label: String,
    pub amount_cents: i64,
}

impl SummaryItem {
    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// HT/TVA/TTC subtotal for one (delivery channel, VAT rate) pair.
///
/// Invariant: `ttc_cents == ht_cents + tva_cents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TvaDetailItem {
    pub delivery_channel: String,
    pub vat_rate_id: String,
    pub vat_rate_label: String,
    pub ht_cents: i64,
    pub tva_cents: i64,
    pub ttc_cents: i64,
}

/// Register-wide VAT totals, always the sums of the per-group values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatTotals {
    pub ht_cents: i64,
    pub tva_cents: i64,
    pub ttc_cents: i64,
}

/// Everything a summary screen needs for one register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegisterSummary {
    pub register: Register,
    pub summary_items: Vec<SummaryItem>,
    pub custom_items: Vec<CustomItem>,
    pub variance: VarianceReport,
    pub allowed_actions: AllowedActions,
}

/// VAT breakdown of one register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatDetails {
    pub register_id: String,
    pub state: RegisterState,
    pub items: Vec<TvaDetailItem>,
    pub totals: VatTotals,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_register_state_default() {
        assert_eq!(RegisterState::default(), RegisterState::Active);
        assert_eq!(RegisterState::PreClosed.as_str(), "pre_closed");
    }

    #[test]
    fn test_register_state_serde_names() {
        let json = serde_json::to_string(&RegisterState::PreClosed).unwrap();
        assert_eq!(json, "\"pre_closed\"");
    }

    #[test]
    fn test_window_of_active_register_ends_now() {
        let register = Register::open("r", "d1", "Bar", Money::from_cents(15000), at(10));
        let window = register.window(at(15));

        assert!(window.contains(at(10)));
        assert!(window.contains(at(15)));
        assert!(!window.contains(at(15) + Duration::seconds(1)));
        assert!(!window.contains(at(9)));
    }

    #[test]
    fn test_window_of_closed_register_is_frozen() {
        let mut register = Register::open("r", "d1", "Bar", Money::zero(), at(10));
        register.close_time = Some(at(12));
        register.state = RegisterState::PreClosed;

        let window = register.window(at(23));
        assert_eq!(window.end, at(12));
        assert!(!window.contains(at(13)));
    }

    #[test]
    fn test_sales_line_from_gross() {
        let vat = VatRate {
            id: "TVA10".to_string(),
            label: "10 %".to_string(),
            rate: TaxRate::from_bps(1000),
        };
        let line = SalesLine::from_gross("l1", "d1", "Sur place", &vat, Money::from_cents(2200), at(11));

        assert_eq!(line.ht_cents, 2000);
        assert_eq!(line.tva_cents, 200);
        assert_eq!(line.vat_rate_bps, 1000);
        assert_eq!(line.vat_rate_label, "10 %");
    }
}
