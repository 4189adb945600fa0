//! # Register Repository
//!
//! Database operations for registers and their correction items.
//!
//! ## Guarded Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Every state-dependent write is ONE statement that checks and mutates: │
//! │                                                                         │
//! │  close    UPDATE registers SET state = 'pre_closed', close_time = ?    │
//! │           WHERE id = ? AND state = 'active'                            │
//! │                                                                         │
//! │  enclose  UPDATE registers SET state = 'enclosed', ...                 │
//! │           WHERE id = ? AND state = 'pre_closed'                        │
//! │                                                                         │
//! │  add      INSERT INTO custom_items ... SELECT ...                      │
//! │           WHERE EXISTS (register AND state <> 'enclosed')              │
//! │                                                                         │
//! │  remove   UPDATE custom_items SET deleted_at = ? WHERE ...             │
//! │           AND EXISTS (register AND state <> 'enclosed')                │
//! │                                                                         │
//! │  rows_affected == 0  ──►  re-read the register to explain the refusal  │
//! │                          (NotFound, or Conflict with its reason)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two concurrent encloses both run the guarded UPDATE; SQLite serializes
//! writers, so only the first sees `state = 'pre_closed'`.

use caisse_core::{ConflictReason, CustomItem, Register, RegisterState, Transition};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

const REGISTER_COLUMNS: &str = "id, desk_id, desk_name, start_time, close_time, enclose_time, \
                                state, cash_fund_cents, enclose_comment";

/// Repository for register and correction item operations.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

impl RegisterRepository {
    /// Creates a new RegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    // =========================================================================
    // Registers
    // =========================================================================

    /// Gets a register by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Register>> {
        let sql = format!("SELECT {REGISTER_COLUMNS} FROM registers WHERE id = ?1");

        let register = sqlx::query_as::<_, Register>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(register)
    }

    /// Gets a register by ID, failing with NotFound.
    pub async fn require(&self, id: &str) -> DbResult<Register> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Register", id))
    }

    /// Inserts a newly opened register.
    ///
    /// ## Errors
    /// `Conflict(DeskAlreadyOpen)` when the desk already has an active
    /// register (partial unique index `idx_registers_active_desk`).
    pub async fn insert(&self, register: &Register) -> DbResult<()> {
        debug!(id = %register.id, desk_id = %register.desk_id, "Inserting register");

        let result = sqlx::query(
            r#"
            INSERT INTO registers (
                id, desk_id, desk_name, start_time, close_time, enclose_time,
                state, cash_fund_cents, enclose_comment
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&register.id)
        .bind(&register.desk_id)
        .bind(&register.desk_name)
        .bind(register.start_time)
        .bind(register.close_time)
        .bind(register.enclose_time)
        .bind(register.state)
        .bind(register.cash_fund_cents)
        .bind(&register.enclose_comment)
        .execute(&self.pool)
        .await;

        match result.map_err(DbError::from) {
            Ok(_) => Ok(()),
            Err(DbError::UniqueViolation { field, .. }) if field.contains("desk_id") => {
                warn!(desk_id = %register.desk_id, "Desk already has an active register");
                Err(DbError::conflict(&register.id, ConflictReason::DeskAlreadyOpen))
            }
            Err(err) => Err(err),
        }
    }

    /// Lists registers, most recent first.
    ///
    /// ## Arguments
    /// * `desk_id` - Restrict to one desk, or all desks when `None`
    /// * `limit` - Maximum number of registers returned
    pub async fn list(&self, desk_id: Option<&str>, limit: u32) -> DbResult<Vec<Register>> {
        debug!(desk_id = ?desk_id, limit, "Listing registers");

        let sql = format!(
            "SELECT {REGISTER_COLUMNS} FROM registers \
             WHERE (?1 IS NULL OR desk_id = ?1) \
             ORDER BY start_time DESC, rowid DESC \
             LIMIT ?2"
        );

        let registers = sqlx::query_as::<_, Register>(&sql)
            .bind(desk_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(registers)
    }

    /// Applies a lifecycle transition with an atomic check-and-set.
    ///
    /// ## Returns
    /// The register as stored after the transition.
    ///
    /// ## Errors
    /// * `NotFound` - unknown register
    /// * `Conflict` - the register is not in `transition.from_state()`; the
    ///   register is left untouched
    pub async fn transition(&self, id: &str, transition: &Transition) -> DbResult<Register> {
        debug!(id = %id, transition = transition.name(), "Applying register transition");

        let result = match transition {
            Transition::Close { at } => {
                sqlx::query(
                    r#"
                    UPDATE registers
                    SET state = ?1, close_time = ?2
                    WHERE id = ?3 AND state = ?4
                    "#,
                )
                .bind(transition.target())
                .bind(*at)
                .bind(id)
                .bind(transition.from_state())
                .execute(&self.pool)
                .await?
            }
            Transition::Enclose { at, comment } => {
                sqlx::query(
                    r#"
                    UPDATE registers
                    SET state = ?1, enclose_time = ?2, enclose_comment = ?3
                    WHERE id = ?4 AND state = ?5
                    "#,
                )
                .bind(transition.target())
                .bind(*at)
                .bind(comment.as_deref())
                .bind(id)
                .bind(transition.from_state())
                .execute(&self.pool)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(self.explain_refused_transition(id, transition).await);
        }

        self.require(id).await
    }

    async fn explain_refused_transition(&self, id: &str, transition: &Transition) -> DbError {
        match self.get_by_id(id).await {
            Ok(None) => DbError::not_found("Register", id),
            Ok(Some(current)) => match current.state.apply(transition) {
                Err(reason) => {
                    warn!(
                        id = %id,
                        state = current.state.as_str(),
                        transition = transition.name(),
                        reason = reason.code(),
                        "Register transition refused"
                    );
                    DbError::conflict(id, reason)
                }
                // The state moved between the guarded write and this read.
                Ok(_) => DbError::Busy,
            },
            Err(err) => err,
        }
    }

    // =========================================================================
    // Correction Items
    // =========================================================================

    /// Appends a correction item unless its register is enclosed.
    ///
    /// ## Errors
    /// * `NotFound` - unknown register
    /// * `Conflict(RegisterFrozen)` - register is enclosed
    pub async fn add_item(&self, item: &CustomItem) -> DbResult<()> {
        debug!(register_id = %item.register_id, id = %item.id, "Adding correction item");

        let result = sqlx::query(
            r#"
            INSERT INTO custom_items (id, register_id, label, amount_cents, created_at)
            SELECT ?1, ?2, ?3, ?4, ?5
            WHERE EXISTS (
                SELECT 1 FROM registers WHERE id = ?2 AND state <> ?6
            )
            "#,
        )
        .bind(&item.id)
        .bind(&item.register_id)
        .bind(&item.label)
        .bind(item.amount_cents)
        .bind(item.created_at)
        .bind(RegisterState::Enclosed)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            self.require(&item.register_id).await?;
            return Err(DbError::conflict(
                &item.register_id,
                ConflictReason::RegisterFrozen,
            ));
        }

        Ok(())
    }

    /// Soft-deletes a live correction item unless its register is enclosed.
    ///
    /// ## Errors
    /// * `NotFound` - unknown register, or no live item `item_id` on it
    /// * `Conflict(RegisterFrozen)` - register is enclosed
    pub async fn remove_item(
        &self,
        register_id: &str,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(register_id = %register_id, id = %item_id, "Removing correction item");

        let result = sqlx::query(
            r#"
            UPDATE custom_items
            SET deleted_at = ?1
            WHERE id = ?2
              AND register_id = ?3
              AND deleted_at IS NULL
              AND EXISTS (
                  SELECT 1 FROM registers WHERE id = ?3 AND state <> ?4
              )
            "#,
        )
        .bind(at)
        .bind(item_id)
        .bind(register_id)
        .bind(RegisterState::Enclosed)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let register = self.require(register_id).await?;
            if register.state.is_terminal() {
                return Err(DbError::conflict(register_id, ConflictReason::RegisterFrozen));
            }
            return Err(DbError::not_found("Correction item", item_id));
        }

        Ok(())
    }

    /// Live (not removed) correction items of a register, in insertion order.
    pub async fn live_items(&self, register_id: &str) -> DbResult<Vec<CustomItem>> {
        let items = sqlx::query_as::<_, CustomItem>(
            r#"
            SELECT id, register_id, label, amount_cents, created_at
            FROM custom_items
            WHERE register_id = ?1 AND deleted_at IS NULL
            ORDER BY created_at, rowid
            "#,
        )
        .bind(register_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use caisse_core::Money;
    use chrono::Duration;

    async fn repo() -> RegisterRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().registers()
    }

    fn register(id: &str, desk: &str) -> Register {
        Register::open(id, desk, "Bar", Money::from_cents(15000), Utc::now() - Duration::hours(3))
    }

    fn item(id: &str, register_id: &str, cents: i64) -> CustomItem {
        CustomItem {
            id: id.to_string(),
            register_id: register_id.to_string(),
            label: "Remise caisse".to_string(),
            amount_cents: cents,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = repo().await;
        let reg = register("r1", "d1");
        repo.insert(&reg).await.unwrap();

        let loaded = repo.get_by_id("r1").await.unwrap().unwrap();
        assert_eq!(loaded.state, RegisterState::Active);
        assert_eq!(loaded.cash_fund_cents, 15000);
        assert!(repo.get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_active_register_on_desk_conflicts() {
        let repo = repo().await;
        repo.insert(&register("r1", "d1")).await.unwrap();

        let err = repo.insert(&register("r2", "d1")).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Conflict {
                reason: ConflictReason::DeskAlreadyOpen,
                ..
            }
        ));

        // Another desk is independent.
        repo.insert(&register("r3", "d2")).await.unwrap();
    }

    #[tokio::test]
    async fn test_desk_reopens_after_close() {
        let repo = repo().await;
        repo.insert(&register("r1", "d1")).await.unwrap();
        repo.transition("r1", &Transition::Close { at: Utc::now() })
            .await
            .unwrap();

        repo.insert(&register("r2", "d1")).await.unwrap();
        let listed = repo.list(Some("d1"), 10).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_transitions_and_refusals() {
        let repo = repo().await;
        repo.insert(&register("r1", "d1")).await.unwrap();

        let enclose = Transition::Enclose {
            at: Utc::now(),
            comment: Some("RAS".to_string()),
        };

        let err = repo.transition("r1", &enclose).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Conflict {
                reason: ConflictReason::NotClosed,
                ..
            }
        ));

        let closed = repo
            .transition("r1", &Transition::Close { at: Utc::now() })
            .await
            .unwrap();
        assert_eq!(closed.state, RegisterState::PreClosed);
        assert!(closed.close_time.is_some());

        let enclosed = repo.transition("r1", &enclose).await.unwrap();
        assert_eq!(enclosed.state, RegisterState::Enclosed);
        assert_eq!(enclosed.enclose_comment.as_deref(), Some("RAS"));

        let err = repo.transition("r1", &enclose).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Conflict {
                reason: ConflictReason::AlreadyEnclosed,
                ..
            }
        ));

        let err = repo
            .transition("missing", &Transition::Close { at: Utc::now() })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_items_frozen_after_enclose() {
        let repo = repo().await;
        repo.insert(&register("r1", "d1")).await.unwrap();
        repo.add_item(&item("i1", "r1", -500)).await.unwrap();

        repo.transition("r1", &Transition::Close { at: Utc::now() })
            .await
            .unwrap();
        repo.transition(
            "r1",
            &Transition::Enclose {
                at: Utc::now(),
                comment: None,
            },
        )
        .await
        .unwrap();

        let err = repo.add_item(&item("i2", "r1", 100)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Conflict {
                reason: ConflictReason::RegisterFrozen,
                ..
            }
        ));

        let err = repo.remove_item("r1", "i1", Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Conflict {
                reason: ConflictReason::RegisterFrozen,
                ..
            }
        ));

        assert_eq!(repo.live_items("r1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_item_soft_deletes_once() {
        let repo = repo().await;
        repo.insert(&register("r1", "d1")).await.unwrap();
        repo.add_item(&item("i1", "r1", 1150)).await.unwrap();

        repo.remove_item("r1", "i1", Utc::now()).await.unwrap();
        assert!(repo.live_items("r1").await.unwrap().is_empty());

        let err = repo.remove_item("r1", "i1", Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_add_item_to_unknown_register_is_not_found() {
        let repo = repo().await;
        let err = repo.add_item(&item("i1", "ghost", 100)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
