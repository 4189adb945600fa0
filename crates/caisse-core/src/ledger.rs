//! # Correction Ledger
//!
//! Manually entered adjustment lines attached to one register: the counted
//! cash declaration, discrepancies, manual corrections.
//!
//! ## Rules
//! - Append/remove only, never edit in place
//! - Mutations refused once the register is enclosed (`RegisterFrozen`)
//! - Removing an unknown or already removed item is `NotFound`
//! - One ledger per register; nothing here ever touches another register

use chrono::{DateTime, Utc};

use crate::error::{ConflictReason, CoreError, CoreResult};
use crate::lifecycle::ensure_corrections_allowed;
use crate::money::Money;
use crate::types::{CustomItem, RegisterState};
use crate::validation::{validate_correction_amount, validate_label, ValidationResult};
use crate::variance::VariancePolicy;

// =============================================================================
// New Correction
// =============================================================================

/// A validated correction, ready to be appended to a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCorrection {
    label: String,
    amount: Money,
}

impl NewCorrection {
    /// Validates operator input. The label is trimmed.
    pub fn new(label: &str, amount: Money) -> ValidationResult<Self> {
        let label = validate_label(label)?;
        validate_correction_amount(amount)?;
        Ok(NewCorrection { label, amount })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Materializes the correction as an item of `register_id`.
    pub fn into_item(
        self,
        id: impl Into<String>,
        register_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> CustomItem {
        CustomItem {
            id: id.into(),
            register_id: register_id.into(),
            label: self.label,
            amount_cents: self.amount.cents(),
            created_at,
        }
    }
}

// =============================================================================
// Correction Ledger
// =============================================================================

/// The live correction items of one register, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionLedger {
    register_id: String,
    items: Vec<CustomItem>,
}

impl CorrectionLedger {
    /// Creates an empty ledger for a register.
    pub fn new(register_id: impl Into<String>) -> Self {
        CorrectionLedger {
            register_id: register_id.into(),
            items: Vec::new(),
        }
    }

    /// Wraps items already loaded from a store.
    pub fn from_items(register_id: impl Into<String>, items: Vec<CustomItem>) -> Self {
        CorrectionLedger {
            register_id: register_id.into(),
            items,
        }
    }

    pub fn register_id(&self) -> &str {
        &self.register_id
    }

    pub fn items(&self) -> &[CustomItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CustomItem> {
        self.items
    }

    /// Appends an item if the owning register still accepts corrections.
    pub fn append(&mut self, state: RegisterState, item: CustomItem) -> CoreResult<()> {
        self.ensure_mutable(state)?;
        if item.register_id != self.register_id {
            return Err(CoreError::Storage(format!(
                "correction {} belongs to register {}, not {}",
                item.id, item.register_id, self.register_id
            )));
        }
        self.items.push(item);
        Ok(())
    }

    /// Removes a live item if the owning register still accepts corrections.
    pub fn remove(&mut self, state: RegisterState, item_id: &str) -> CoreResult<CustomItem> {
        self.ensure_mutable(state)?;
        let position = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| CoreError::not_found("Correction item", item_id))?;
        Ok(self.items.remove(position))
    }

    /// Sum of all live correction amounts.
    pub fn total(&self) -> Money {
        self.items.iter().map(CustomItem::amount).sum()
    }

    /// The first item declaring counted cash, if any.
    pub fn cash_declaration(&self, policy: &VariancePolicy) -> Option<&CustomItem> {
        self.items
            .iter()
            .find(|item| policy.is_cash_declaration_label(&item.label))
    }

    fn ensure_mutable(&self, state: RegisterState) -> CoreResult<()> {
        ensure_corrections_allowed(state)
            .map_err(|reason: ConflictReason| CoreError::conflict(&self.register_id, reason))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn item(id: &str, label: &str, cents: i64) -> CustomItem {
        NewCorrection::new(label, Money::from_cents(cents))
            .unwrap()
            .into_item(id, "r1", Utc::now())
    }

    #[test]
    fn test_new_correction_validates() {
        assert!(NewCorrection::new("", Money::from_cents(100)).is_err());
        let ok = NewCorrection::new(" Remise caisse ", Money::from_cents(-500)).unwrap();
        assert_eq!(ok.label(), "Remise caisse");
        assert_eq!(ok.amount().cents(), -500);
    }

    #[test]
    fn test_append_and_total() {
        let mut ledger = CorrectionLedger::new("r1");
        ledger
            .append(RegisterState::Active, item("a", "Espèces comptées", 11500))
            .unwrap();
        ledger
            .append(RegisterState::PreClosed, item("b", "Remise caisse", -500))
            .unwrap();

        assert_eq!(ledger.items().len(), 2);
        assert_eq!(ledger.total().cents(), 11000);
    }

    #[test]
    fn test_enclosed_ledger_is_frozen() {
        let mut ledger = CorrectionLedger::from_items("r1", vec![item("a", "Fond", 100)]);

        let err = ledger
            .append(RegisterState::Enclosed, item("b", "Late", 1))
            .unwrap_err();
        assert_eq!(err.conflict_reason(), Some(ConflictReason::RegisterFrozen));

        let err = ledger.remove(RegisterState::Enclosed, "a").unwrap_err();
        assert_eq!(err.conflict_reason(), Some(ConflictReason::RegisterFrozen));
        assert_eq!(ledger.items().len(), 1);
    }

    #[test]
    fn test_remove_unknown_or_twice_is_not_found() {
        let mut ledger = CorrectionLedger::from_items("r1", vec![item("a", "Fond", 100)]);

        assert_eq!(ledger.remove(RegisterState::Active, "a").unwrap().id, "a");
        let err = ledger.remove(RegisterState::Active, "a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_append_rejects_foreign_item() {
        let mut ledger = CorrectionLedger::new("other");
        assert!(ledger
            .append(RegisterState::Active, item("a", "Fond", 100))
            .is_err());
    }

    #[test]
    fn test_cash_declaration_lookup() {
        let ledger = CorrectionLedger::from_items(
            "r1",
            vec![
                item("a", "Remise caisse", -500),
                item("b", "ESPÈCES comptées", 11500),
                item("c", "espèces recomptées", 11600),
            ],
        );
        let found = ledger.cash_declaration(&VariancePolicy::default()).unwrap();
        assert_eq!(found.id, "b");
    }
}
