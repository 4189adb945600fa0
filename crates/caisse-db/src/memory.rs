//! # In-Memory Store
//!
//! [`RegisterStore`] and [`SalesSource`] over plain collections, for tests
//! and demos. All state sits behind one `tokio::sync::Mutex`: each method
//! checks and mutates under the same guard, which gives the same atomicity
//! as the guarded SQL statements of the SQLite store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use caisse_core::ledger::CorrectionLedger;
use caisse_core::{
    ConflictReason, CoreError, CustomItem, PaymentEvent, Register, RegisterState, SalesLine,
    ServiceWindow, Transition,
};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::store::{RegisterStore, SalesSource};

#[derive(Debug, Default)]
struct MemoryState {
    registers: HashMap<String, Register>,
    ledgers: HashMap<String, CorrectionLedger>,
    payments: Vec<PaymentEvent>,
    sales_lines: Vec<SalesLine>,
}

impl MemoryState {
    fn register(&self, register_id: &str) -> DbResult<&Register> {
        self.registers
            .get(register_id)
            .ok_or_else(|| DbError::not_found("Register", register_id))
    }
}

/// Mutex-guarded in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Delays every store call, to exercise caller timeouts.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Records a settled payment.
    pub async fn record_payment(&self, event: PaymentEvent) {
        self.state.lock().await.payments.push(event);
    }

    /// Records a sold line.
    pub async fn record_sales_line(&self, line: SalesLine) {
        self.state.lock().await.sales_lines.push(line);
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn ledger_error(err: CoreError) -> DbError {
    match err {
        CoreError::NotFound { entity, id } => DbError::NotFound { entity, id },
        CoreError::Conflict {
            register_id,
            reason,
        } => DbError::Conflict {
            register_id,
            reason,
        },
        other => DbError::Internal(other.to_string()),
    }
}

#[async_trait]
impl RegisterStore for MemoryStore {
    async fn insert_register(&self, register: &Register) -> DbResult<()> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;

        if state.registers.contains_key(&register.id) {
            return Err(DbError::duplicate("registers.id", &register.id));
        }
        let desk_busy = register.state == RegisterState::Active
            && state
                .registers
                .values()
                .any(|r| r.desk_id == register.desk_id && r.state == RegisterState::Active);
        if desk_busy {
            return Err(DbError::conflict(&register.id, ConflictReason::DeskAlreadyOpen));
        }

        debug!(id = %register.id, desk_id = %register.desk_id, "Inserting register (memory)");
        state
            .ledgers
            .insert(register.id.clone(), CorrectionLedger::new(&register.id));
        state.registers.insert(register.id.clone(), register.clone());
        Ok(())
    }

    async fn load(&self, register_id: &str) -> DbResult<Register> {
        self.simulate_latency().await;
        let state = self.state.lock().await;
        state.register(register_id).cloned()
    }

    async fn list_for_desk(&self, desk_id: Option<&str>, limit: u32) -> DbResult<Vec<Register>> {
        self.simulate_latency().await;
        let state = self.state.lock().await;

        let mut registers: Vec<Register> = state
            .registers
            .values()
            .filter(|r| desk_id.map_or(true, |desk| r.desk_id == desk))
            .cloned()
            .collect();
        registers.sort_by(|a, b| b.start_time.cmp(&a.start_time).then_with(|| b.id.cmp(&a.id)));
        registers.truncate(limit as usize);
        Ok(registers)
    }

    async fn atomic_transition(&self, register_id: &str, transition: &Transition) -> DbResult<Register> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;

        let register = state
            .registers
            .get_mut(register_id)
            .ok_or_else(|| DbError::not_found("Register", register_id))?;

        let next = register
            .state
            .apply(transition)
            .map_err(|reason| DbError::conflict(register_id, reason))?;

        match transition {
            Transition::Close { at } => register.close_time = Some(*at),
            Transition::Enclose { at, comment } => {
                register.enclose_time = Some(*at);
                register.enclose_comment = comment.clone();
            }
        }
        register.state = next;

        debug!(id = %register_id, transition = transition.name(), "Register transitioned (memory)");
        Ok(register.clone())
    }

    async fn append_item(&self, item: &CustomItem) -> DbResult<()> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;

        let register_state = state.register(&item.register_id)?.state;
        state
            .ledgers
            .entry(item.register_id.clone())
            .or_insert_with(|| CorrectionLedger::new(&item.register_id))
            .append(register_state, item.clone())
            .map_err(ledger_error)
    }

    async fn remove_item(&self, register_id: &str, item_id: &str, _at: DateTime<Utc>) -> DbResult<()> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;

        let register_state = state.register(register_id)?.state;
        state
            .ledgers
            .entry(register_id.to_string())
            .or_insert_with(|| CorrectionLedger::new(register_id))
            .remove(register_state, item_id)
            .map(|_| ())
            .map_err(ledger_error)
    }

    async fn items(&self, register_id: &str) -> DbResult<Vec<CustomItem>> {
        self.simulate_latency().await;
        let state = self.state.lock().await;

        state.register(register_id)?;
        Ok(state
            .ledgers
            .get(register_id)
            .map(|ledger| ledger.items().to_vec())
            .unwrap_or_default())
    }
}

#[async_trait]
impl SalesSource for MemoryStore {
    async fn payments(&self, desk_id: &str, window: &ServiceWindow) -> DbResult<Vec<PaymentEvent>> {
        self.simulate_latency().await;
        let state = self.state.lock().await;
        Ok(state
            .payments
            .iter()
            .filter(|e| e.desk_id == desk_id && window.contains(e.settled_at))
            .cloned()
            .collect())
    }

    async fn sales_lines(&self, desk_id: &str, window: &ServiceWindow) -> DbResult<Vec<SalesLine>> {
        self.simulate_latency().await;
        let state = self.state.lock().await;
        Ok(state
            .sales_lines
            .iter()
            .filter(|l| l.desk_id == desk_id && window.contains(l.sold_at))
            .cloned()
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use caisse_core::Money;

    fn register(id: &str, desk: &str) -> Register {
        Register::open(id, desk, "Terrasse", Money::zero(), Utc::now())
    }

    #[tokio::test]
    async fn test_one_active_register_per_desk() {
        let store = MemoryStore::new();
        store.insert_register(&register("r1", "d1")).await.unwrap();

        let err = store.insert_register(&register("r2", "d1")).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Conflict {
                reason: ConflictReason::DeskAlreadyOpen,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_refused_transition_leaves_register_untouched() {
        let store = MemoryStore::new();
        store.insert_register(&register("r1", "d1")).await.unwrap();

        let err = store
            .atomic_transition(
                "r1",
                &Transition::Enclose {
                    at: Utc::now(),
                    comment: Some("trop tôt".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Conflict {
                reason: ConflictReason::NotClosed,
                ..
            }
        ));

        let loaded = store.load("r1").await.unwrap();
        assert_eq!(loaded.state, RegisterState::Active);
        assert!(loaded.enclose_comment.is_none());
        assert!(loaded.enclose_time.is_none());
    }

    #[tokio::test]
    async fn test_items_of_unknown_register_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.items("ghost").await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
