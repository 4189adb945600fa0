//! # Validation Module
//!
//! Input validation for operator-entered register data.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Back-office screen                                           │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Command (Rust)                                               │
//! │  ├── Decimal text → Money (money::Money::parse_decimal)                │
//! │  └── THIS MODULE: label / amount / comment rules                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store                                                        │
//! │  ├── Guarded writes (state check + mutation in one statement)          │
//! │  └── NOT NULL / foreign key / partial unique index                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_ABS_AMOUNT_CENTS, MAX_COMMENT_LEN, MAX_LABEL_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a correction label and returns it trimmed.
///
/// ## Rules
/// - Must not be empty or blank
/// - At most `MAX_LABEL_LEN` characters
///
/// ## Example
/// ```rust
/// use caisse_core::validation::validate_label;
///
/// assert_eq!(validate_label("  Espèces comptées ").unwrap(), "Espèces comptées");
/// assert!(validate_label("   ").is_err());
/// ```
pub fn validate_label(label: &str) -> ValidationResult<String> {
    let label = label.trim();

    if label.is_empty() {
        return Err(ValidationError::Required {
            field: "label".to_string(),
        });
    }

    if label.chars().count() > MAX_LABEL_LEN {
        return Err(ValidationError::TooLong {
            field: "label".to_string(),
            max: MAX_LABEL_LEN,
        });
    }

    Ok(label.to_string())
}

/// Validates a desk identifier or desk display name.
pub fn validate_desk_field(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 100,
        });
    }

    Ok(value.to_string())
}

/// Validates an optional enclose comment.
///
/// Blank comments are normalized to `None`.
pub fn validate_comment(comment: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(comment) = comment.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(ValidationError::TooLong {
            field: "comment".to_string(),
            max: MAX_COMMENT_LEN,
        });
    }

    Ok(Some(comment.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a signed correction amount.
///
/// ## Rules
/// - Any sign (corrections can add or remove money)
/// - Absolute value at most `MAX_ABS_AMOUNT_CENTS`
///
/// ## Example
/// ```rust
/// use caisse_core::money::Money;
/// use caisse_core::validation::validate_correction_amount;
///
/// assert!(validate_correction_amount(Money::from_cents(-500)).is_ok());
/// assert!(validate_correction_amount(Money::from_cents(i64::MAX)).is_err());
/// ```
pub fn validate_correction_amount(amount: Money) -> ValidationResult<()> {
    if amount.cents().checked_abs().map_or(true, |abs| abs > MAX_ABS_AMOUNT_CENTS) {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: -MAX_ABS_AMOUNT_CENTS,
            max: MAX_ABS_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates an opening cash fund.
///
/// ## Rules
/// - Must be non-negative (an empty drawer is allowed)
/// - At most `MAX_ABS_AMOUNT_CENTS`
pub fn validate_cash_fund(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() || amount.cents() > MAX_ABS_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "cash_fund".to_string(),
            min: 0,
            max: MAX_ABS_AMOUNT_CENTS,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_label() {
        assert_eq!(validate_label("Remise caisse").unwrap(), "Remise caisse");
        assert!(validate_label("").is_err());
        assert!(validate_label("   ").is_err());
        assert!(validate_label(&"é".repeat(MAX_LABEL_LEN)).is_ok());
        assert!(validate_label(&"é".repeat(MAX_LABEL_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_comment() {
        assert_eq!(validate_comment(None).unwrap(), None);
        assert_eq!(validate_comment(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_comment(Some(" RAS ")).unwrap(),
            Some("RAS".to_string())
        );
        assert!(validate_comment(Some(&"x".repeat(MAX_COMMENT_LEN + 1))).is_err());
    }

    #[test]
    fn test_validate_correction_amount() {
        assert!(validate_correction_amount(Money::from_cents(0)).is_ok());
        assert!(validate_correction_amount(Money::from_cents(-500)).is_ok());
        assert!(validate_correction_amount(Money::from_cents(MAX_ABS_AMOUNT_CENTS)).is_ok());
        assert!(validate_correction_amount(Money::from_cents(-MAX_ABS_AMOUNT_CENTS - 1)).is_err());
        assert!(validate_correction_amount(Money::from_cents(i64::MIN)).is_err());
    }

    #[test]
    fn test_validate_cash_fund() {
        assert!(validate_cash_fund(Money::zero()).is_ok());
        assert!(validate_cash_fund(Money::from_cents(15000)).is_ok());
        assert!(validate_cash_fund(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_desk_field() {
        assert_eq!(validate_desk_field("desk_id", " BAR-1 ").unwrap(), "BAR-1");
        assert!(validate_desk_field("desk_name", "").is_err());
    }
}
