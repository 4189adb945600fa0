//! # API Error Type
//!
//! Unified error type for back-office commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Back-Office                        │
//! │                                                                         │
//! │  ValidationError ──┐                                                    │
//! │  DbError ──────────┼──► CoreError ──► ApiError { code, reason, ... }   │
//! │  ConfigError ──────┘                        │                           │
//! │                                             ▼                           │
//! │                          stderr: {"code":"CONFLICT",                    │
//! │                                   "reason":"ALREADY_ENCLOSED",          │
//! │                                   "message":"...", "retryable":false}   │
//! │                                                                         │
//! │  VALIDATION_ERROR / NOT_FOUND / CONFLICT → actionable message           │
//! │  TRANSIENT                               → generic "retry" message      │
//! │  INTERNAL                                → generic message, logged      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use caisse_core::{CoreError, ValidationError};
use caisse_db::DbError;
use serde::Serialize;

use crate::state::ConfigError;

/// API error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "CONFLICT",
///   "reason": "ALREADY_ENCLOSED",
///   "message": "Register 2f1c… refused the operation: register is already enclosed",
///   "retryable": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Machine-readable conflict reason, only for `CONFLICT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable error message for display
    pub message: String,

    /// Whether the same request may succeed if sent again
    pub retryable: bool,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed, re-prompt the operator
    ValidationError,

    /// Register or correction item not found
    NotFound,

    /// Refused by the register lifecycle, refresh the register
    Conflict,

    /// Storage temporarily unavailable, safe to retry
    Transient,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            reason: None,
            message: message.into(),
            retryable: matches!(code, ErrorCode::Transient),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self.code {
            ErrorCode::ValidationError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::Conflict => 4,
            ErrorCode::Transient => 75, // EX_TEMPFAIL
            ErrorCode::Internal => 1,
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
            CoreError::NotFound { entity, id } => {
                ApiError::new(ErrorCode::NotFound, format!("{entity} not found: {id}"))
            }
            CoreError::Conflict {
                register_id,
                reason,
            } => {
                let mut api = ApiError::new(
                    ErrorCode::Conflict,
                    format!("Register {register_id}: {}", reason.describe()),
                );
                api.reason = Some(reason.code().to_string());
                api
            }
            CoreError::Transient(e) => {
                tracing::warn!("Transient storage failure: {}", e);
                ApiError::new(
                    ErrorCode::Transient,
                    "Storage is temporarily unavailable, please retry",
                )
            }
            CoreError::Storage(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Storage failure: {}", e);
                ApiError::internal("Database operation failed")
            }
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::from(CoreError::from(err))
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use caisse_core::ConflictReason;

    #[test]
    fn test_conflict_carries_reason_code() {
        let api: ApiError = CoreError::conflict("r1", ConflictReason::AlreadyEnclosed).into();

        assert_eq!(api.code, ErrorCode::Conflict);
        assert_eq!(api.reason.as_deref(), Some("ALREADY_ENCLOSED"));
        assert!(!api.retryable);

        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "CONFLICT");
        assert_eq!(json["reason"], "ALREADY_ENCLOSED");
    }

    #[test]
    fn test_transient_is_retryable_and_generic() {
        let api: ApiError = DbError::PoolExhausted.into();
        assert_eq!(api.code, ErrorCode::Transient);
        assert!(api.retryable);
        assert!(!api.message.contains("pool"));
    }

    #[test]
    fn test_storage_is_internal() {
        let api: ApiError = DbError::MigrationFailed("checksum".to_string()).into();
        assert_eq!(api.code, ErrorCode::Internal);
        assert!(!api.retryable);

        let json = serde_json::to_value(&api).unwrap();
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn test_validation_message_is_actionable() {
        let api: ApiError = ValidationError::Required {
            field: "label".to_string(),
        }
        .into();
        assert_eq!(api.code, ErrorCode::ValidationError);
        assert!(api.message.contains("label"));
    }
}
