//! # Register Lifecycle
//!
//! The state machine every register follows.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Register Lifecycle                                │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── open_register() → Register { state: Active }                   │
//! │                                                                         │
//! │  2. CLOSE                                  Active ──► PreClosed        │
//! │     └── freezes close_time: later sales belong to the next register    │
//! │                                                                         │
//! │  3. RECONCILE                                                          │
//! │     └── add/remove correction items (Active or PreClosed)              │
//! │                                                                         │
//! │  4. ENCLOSE                               PreClosed ──► Enclosed       │
//! │     └── irreversible: register + corrections read-only forever         │
//! │                                                                         │
//! │  No transition skips a state. No transition goes backwards.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The functions here only decide. Stores apply the decision with an atomic
//! check-and-set and use [`RegisterState::apply`] again to explain a refusal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ConflictReason;
use crate::types::RegisterState;

// =============================================================================
// Transition
// =============================================================================

/// A requested lifecycle transition with the data it records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Active → PreClosed. Records `close_time`.
    Close { at: DateTime<Utc> },
    /// PreClosed → Enclosed. Records `enclose_time` and the operator comment.
    Enclose {
        at: DateTime<Utc>,
        comment: Option<String>,
    },
}

impl Transition {
    /// The only state this transition may start from.
    pub const fn from_state(&self) -> RegisterState {
        match self {
            Transition::Close { .. } => RegisterState::Active,
            Transition::Enclose { .. } => RegisterState::PreClosed,
        }
    }

    /// The state reached when the transition succeeds.
    pub const fn target(&self) -> RegisterState {
        match self {
            Transition::Close { .. } => RegisterState::PreClosed,
            Transition::Enclose { .. } => RegisterState::Enclosed,
        }
    }

    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Transition::Close { .. } => "close",
            Transition::Enclose { .. } => "enclose",
        }
    }
}

impl RegisterState {
    /// Decides whether `transition` is legal from this state.
    ///
    /// ## Decision Table
    /// | from \ transition | Close             | Enclose           |
    /// |-------------------|-------------------|-------------------|
    /// | Active            | → PreClosed       | `NotClosed`       |
    /// | PreClosed         | `AlreadyClosed`   | → Enclosed        |
    /// | Enclosed          | `AlreadyEnclosed` | `AlreadyEnclosed` |
    pub fn apply(self, transition: &Transition) -> Result<RegisterState, ConflictReason> {
        match (self, transition) {
            (RegisterState::Active, Transition::Close { .. }) => Ok(RegisterState::PreClosed),
            (RegisterState::PreClosed, Transition::Enclose { .. }) => Ok(RegisterState::Enclosed),
            (RegisterState::Active, Transition::Enclose { .. }) => Err(ConflictReason::NotClosed),
            (RegisterState::PreClosed, Transition::Close { .. }) => {
                Err(ConflictReason::AlreadyClosed)
            }
            (RegisterState::Enclosed, _) => Err(ConflictReason::AlreadyEnclosed),
        }
    }

    /// Correction items may be added or removed only before enclosing.
    #[inline]
    pub const fn accepts_corrections(&self) -> bool {
        !matches!(self, RegisterState::Enclosed)
    }

    /// Enclosed is terminal.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, RegisterState::Enclosed)
    }
}

/// Refuses ledger mutations on an enclosed register.
pub fn ensure_corrections_allowed(state: RegisterState) -> Result<(), ConflictReason> {
    if state.accepts_corrections() {
        Ok(())
    } else {
        Err(ConflictReason::RegisterFrozen)
    }
}

// =============================================================================
// Allowed Actions
// =============================================================================

/// Which actions a screen may offer for a register in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AllowedActions {
    pub close: bool,
    pub enclose: bool,
    pub edit_corrections: bool,
}

impl AllowedActions {
    pub const fn for_state(state: RegisterState) -> Self {
        AllowedActions {
            close: matches!(state, RegisterState::Active),
            enclose: matches!(state, RegisterState::PreClosed),
            edit_corrections: state.accepts_corrections(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn close() -> Transition {
        Transition::Close { at: Utc::now() }
    }

    fn enclose() -> Transition {
        Transition::Enclose {
            at: Utc::now(),
            comment: None,
        }
    }

    const ALL_STATES: [RegisterState; 3] = [
        RegisterState::Active,
        RegisterState::PreClosed,
        RegisterState::Enclosed,
    ];

    #[test]
    fn test_happy_path() {
        let state = RegisterState::Active;
        let state = state.apply(&close()).unwrap();
        assert_eq!(state, RegisterState::PreClosed);
        let state = state.apply(&enclose()).unwrap();
        assert_eq!(state, RegisterState::Enclosed);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_refusals_carry_reasons() {
        assert_eq!(
            RegisterState::Active.apply(&enclose()),
            Err(ConflictReason::NotClosed)
        );
        assert_eq!(
            RegisterState::PreClosed.apply(&close()),
            Err(ConflictReason::AlreadyClosed)
        );
        assert_eq!(
            RegisterState::Enclosed.apply(&close()),
            Err(ConflictReason::AlreadyEnclosed)
        );
        assert_eq!(
            RegisterState::Enclosed.apply(&enclose()),
            Err(ConflictReason::AlreadyEnclosed)
        );
    }

    #[test]
    fn test_only_forward_single_steps_succeed() {
        for state in ALL_STATES {
            for transition in [close(), enclose()] {
                if let Ok(next) = state.apply(&transition) {
                    assert_eq!(state, transition.from_state());
                    assert_eq!(next, transition.target());
                }
            }
        }
    }

    #[test]
    fn test_corrections_frozen_only_when_enclosed() {
        assert!(ensure_corrections_allowed(RegisterState::Active).is_ok());
        assert!(ensure_corrections_allowed(RegisterState::PreClosed).is_ok());
        assert_eq!(
            ensure_corrections_allowed(RegisterState::Enclosed),
            Err(ConflictReason::RegisterFrozen)
        );
    }

    #[test]
    fn test_allowed_actions() {
        let active = AllowedActions::for_state(RegisterState::Active);
        assert!(active.close && !active.enclose && active.edit_corrections);

        let pre_closed = AllowedActions::for_state(RegisterState::PreClosed);
        assert!(!pre_closed.close && pre_closed.enclose && pre_closed.edit_corrections);

        let enclosed = AllowedActions::for_state(RegisterState::Enclosed);
        assert!(!enclosed.close && !enclosed.enclose && !enclosed.edit_corrections);
    }
}
