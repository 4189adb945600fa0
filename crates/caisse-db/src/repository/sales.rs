//! # Sales Repository
//!
//! Read access to the settled payments and sales lines recorded by the
//! till software, plus the ingestion helpers used by the demo seeder and
//! tests. The reconciliation engine never writes sales in production.

use caisse_core::{PaymentEvent, SalesLine, ServiceWindow};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for payment events and sales lines.
#[derive(Debug, Clone)]
pub struct SalesRepository {
    pool: SqlitePool,
}

impl SalesRepository {
    /// Creates a new SalesRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SalesRepository { pool }
    }

    /// Payment events of a desk inside a service window.
    ///
    /// The SQL range has one second of slack on each side (julianday is a
    /// float). The aggregators apply the exact inclusive bounds.
    pub async fn payments(&self, desk_id: &str, window: &ServiceWindow) -> DbResult<Vec<PaymentEvent>> {
        debug!(desk_id = %desk_id, start = %window.start, end = %window.end, "Loading payment events");

        let events = sqlx::query_as::<_, PaymentEvent>(
            r#"
            SELECT id, desk_id, method_code, method_label, amount_cents, settled_at
            FROM payment_events
            WHERE desk_id = ?1
              AND julianday(settled_at) BETWEEN julianday(?2) - 1.0 / 86400
                                            AND julianday(?3) + 1.0 / 86400
            ORDER BY settled_at, rowid
            "#,
        )
        .bind(desk_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Sales lines of a desk inside a service window.
    pub async fn sales_lines(&self, desk_id: &str, window: &ServiceWindow) -> DbResult<Vec<SalesLine>> {
        debug!(desk_id = %desk_id, start = %window.start, end = %window.end, "Loading sales lines");

        let lines = sqlx::query_as::<_, SalesLine>(
            r#"
            SELECT id, desk_id, delivery_channel, vat_rate_id, vat_rate_label,
                   vat_rate_bps, ht_cents, tva_cents, sold_at
            FROM sales_lines
            WHERE desk_id = ?1
              AND julianday(sold_at) BETWEEN julianday(?2) - 1.0 / 86400
                                         AND julianday(?3) + 1.0 / 86400
            ORDER BY sold_at, rowid
            "#,
        )
        .bind(desk_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Records a settled payment.
    pub async fn record_payment(&self, event: &PaymentEvent) -> DbResult<()> {
        debug!(id = %event.id, method = %event.method_code, amount = event.amount_cents, "Recording payment");

        sqlx::query(
            r#"
            INSERT INTO payment_events (id, desk_id, method_code, method_label, amount_cents, settled_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&event.id)
        .bind(&event.desk_id)
        .bind(&event.method_code)
        .bind(&event.method_label)
        .bind(event.amount_cents)
        .bind(event.settled_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a sold line.
    pub async fn record_sales_line(&self, line: &SalesLine) -> DbResult<()> {
        debug!(id = %line.id, channel = %line.delivery_channel, vat = %line.vat_rate_id, "Recording sales line");

        sqlx::query(
            r#"
            INSERT INTO sales_lines (
                id, desk_id, delivery_channel, vat_rate_id, vat_rate_label,
                vat_rate_bps, ht_cents, tva_cents, sold_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&line.id)
        .bind(&line.desk_id)
        .bind(&line.delivery_channel)
        .bind(&line.vat_rate_id)
        .bind(&line.vat_rate_label)
        .bind(line.vat_rate_bps)
        .bind(line.ht_cents)
        .bind(line.tva_cents)
        .bind(line.sold_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 11, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn payment(id: &str, desk: &str, minute: i64) -> PaymentEvent {
        PaymentEvent {
            id: id.to_string(),
            desk_id: desk.to_string(),
            method_code: "CB".to_string(),
            method_label: "Carte bancaire".to_string(),
            amount_cents: 1000,
            settled_at: at(minute),
        }
    }

    #[tokio::test]
    async fn test_payments_filtered_by_desk_and_window() {
        let sales = Database::new(DbConfig::in_memory()).await.unwrap().sales();
        sales.record_payment(&payment("p1", "d1", 10)).await.unwrap();
        sales.record_payment(&payment("p2", "d1", 120)).await.unwrap();
        sales.record_payment(&payment("p3", "d2", 10)).await.unwrap();
        sales.record_payment(&payment("p4", "d1", 500)).await.unwrap();

        let window = ServiceWindow {
            start: at(0),
            end: at(120),
        };
        let events = sales.payments("d1", &window).await.unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();

        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(events[0].settled_at, at(10));
    }
}
