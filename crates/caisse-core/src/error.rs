//! # Error Types
//!
//! Domain-specific error types for caisse-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  caisse-core errors (this file)                                        │
//! │  ├── CoreError        - The operation-level taxonomy                   │
//! │  │   ├── Validation   - malformed input, re-prompt                     │
//! │  │   ├── NotFound     - unknown register / correction item             │
//! │  │   ├── Conflict     - lifecycle violation (ConflictReason)           │
//! │  │   ├── Transient    - store unavailable / timeout, retry with backoff│
//! │  │   └── Storage      - internal store fault, not retried              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  caisse-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures → CoreError        │
//! │                                                                         │
//! │  Back-office API errors (in app)                                       │
//! │  └── ApiError         - What the screens see (code + reason)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError;  CoreError → ApiError    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Conflict Reason
// =============================================================================

/// Why a lifecycle transition or a ledger mutation was refused.
///
/// Each reason has a stable machine-readable code so callers can tell
/// "already enclosed" apart from any other fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictReason {
    /// Close requested on a register that is already pre-closed.
    AlreadyClosed,
    /// Close or enclose requested on an enclosed register.
    AlreadyEnclosed,
    /// Enclose requested on a register that is still active.
    NotClosed,
    /// Correction items of an enclosed register are frozen.
    RegisterFrozen,
    /// The desk already has an active register.
    DeskAlreadyOpen,
}

impl ConflictReason {
    /// Machine-readable code, identical to the serialized form.
    pub const fn code(&self) -> &'static str {
        match self {
            ConflictReason::AlreadyClosed => "ALREADY_CLOSED",
            ConflictReason::AlreadyEnclosed => "ALREADY_ENCLOSED",
            ConflictReason::NotClosed => "NOT_CLOSED",
            ConflictReason::RegisterFrozen => "REGISTER_FROZEN",
            ConflictReason::DeskAlreadyOpen => "DESK_ALREADY_OPEN",
        }
    }

    /// Operator-facing explanation.
    pub const fn describe(&self) -> &'static str {
        match self {
            ConflictReason::AlreadyClosed => "register is already closed",
            ConflictReason::AlreadyEnclosed => "register is already enclosed",
            ConflictReason::NotClosed => "register must be closed before it can be enclosed",
            ConflictReason::RegisterFrozen => "register is enclosed, corrections are frozen",
            ConflictReason::DeskAlreadyOpen => "desk already has an open register",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Coarse classification used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Transient,
    Storage,
}

/// Operation-level errors of the register engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed input (empty label, unparsable amount, ...).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced register or correction item does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Lifecycle transition or mutation refused in the current state.
    ///
    /// ## User Workflow
    /// ```text
    /// Enclose register R (second tab, already enclosed from the first)
    ///      │
    ///      ▼
    /// Conflict { register_id: R, reason: AlreadyEnclosed }
    ///      │
    ///      ▼
    /// Screen refreshes the register and hides the Enclose action
    /// ```
    #[error("Register {register_id}: {reason}")]
    Conflict {
        register_id: String,
        reason: ConflictReason,
    },

    /// Backing store unavailable or timed out. Safe to retry idempotent calls.
    #[error("Temporary storage failure: {0}")]
    Transient(String),

    /// Internal storage fault (corrupt data, failed migration).
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error.
    pub fn conflict(register_id: impl Into<String>, reason: ConflictReason) -> Self {
        CoreError::Conflict {
            register_id: register_id.into(),
            reason,
        }
    }

    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Conflict { .. } => ErrorKind::Conflict,
            CoreError::Transient(_) => ErrorKind::Transient,
            CoreError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Only transient failures may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// Returns the conflict reason, if this is a conflict.
    pub fn conflict_reason(&self) -> Option<ConflictReason> {
        match self {
            CoreError::Conflict { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input doesn't meet requirements.
/// Used for early validation before any store call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, unparsable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_and_code() {
        let err = CoreError::conflict("r-1", ConflictReason::AlreadyEnclosed);
        assert_eq!(err.to_string(), "Register r-1: register is already enclosed");
        assert_eq!(err.conflict_reason(), Some(ConflictReason::AlreadyEnclosed));
        assert_eq!(ConflictReason::AlreadyEnclosed.code(), "ALREADY_ENCLOSED");
    }

    #[test]
    fn test_conflict_reason_serializes_as_code() {
        let json = serde_json::to_string(&ConflictReason::RegisterFrozen).unwrap();
        assert_eq!(json, "\"REGISTER_FROZEN\"");
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(CoreError::Transient("pool timed out".into()).is_retryable());
        assert!(!CoreError::Storage("bad row".into()).is_retryable());
        assert!(!CoreError::conflict("r", ConflictReason::NotClosed).is_retryable());
        assert!(!CoreError::not_found("Register", "r").is_retryable());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "label".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert_eq!(core_err.kind(), ErrorKind::Validation);
        assert_eq!(core_err.to_string(), "Validation error: label is required");
    }
}
