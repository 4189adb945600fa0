//! # Payment and VAT Breakdowns
//!
//! Both aggregators read the same external sales data for the same service
//! window and are independent of each other.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PaymentEvent* ──► filter(window) ──► group by method_code             │
//! │                                        └─► SummaryItem (one per code)   │
//! │                                                                         │
//! │  SalesLine* ────► filter(window) ──► group by (channel, vat_rate_id)   │
//! │                                        ├─► Σ ht, Σ tva                  │
//! │                                        ├─► ttc := ht + tva              │
//! │                                        └─► totals := Σ groups           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are summed signed: refunds reduce a method's total and nothing is
//! clamped. Both functions are pure and idempotent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{PaymentEvent, SalesLine, ServiceWindow, SummaryItem, TvaDetailItem, VatTotals};

// =============================================================================
// Payment Breakdown
// =============================================================================

/// Theoretical total per payment method, ordered by method code.
///
/// Events outside `window` are ignored. The label of a method is the one of
/// its first event in input order.
pub fn aggregate_payments(events: &[PaymentEvent], window: &ServiceWindow) -> Vec<SummaryItem> {
    let mut by_method: BTreeMap<&str, SummaryItem> = BTreeMap::new();

    for event in events.iter().filter(|e| window.contains(e.settled_at)) {
        by_method
            .entry(event.method_code.as_str())
            .or_insert_with(|| SummaryItem {
                method_code: event.method_code.clone(),
                method_label: event.method_label.clone(),
                amount_cents: 0,
            })
            .amount_cents += event.amount_cents;
    }

    by_method.into_values().collect()
}

// =============================================================================
// VAT Breakdown
// =============================================================================

/// Per-group VAT items and their grand totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatBreakdown {
    pub items: Vec<TvaDetailItem>,
    pub totals: VatTotals,
}

/// Groups sales lines by `(delivery_channel, vat_rate_id)`.
///
/// ## Rounding Policy
/// HT and TVA come from the lines already rounded to cents and are summed as
/// integers. TTC is never summed on its own: each group's TTC is
/// `ht + tva`, and the grand totals are the sums of the groups.
pub fn aggregate_vat(lines: &[SalesLine], window: &ServiceWindow) -> VatBreakdown {
    let mut groups: BTreeMap<(&str, &str), TvaDetailItem> = BTreeMap::new();

    for line in lines.iter().filter(|l| window.contains(l.sold_at)) {
        let group = groups
            .entry((line.delivery_channel.as_str(), line.vat_rate_id.as_str()))
            .or_insert_with(|| TvaDetailItem {
                delivery_channel: line.delivery_channel.clone(),
                vat_rate_id: line.vat_rate_id.clone(),
                vat_rate_label: line.vat_rate_label.clone(),
                ht_cents: 0,
                tva_cents: 0,
                ttc_cents: 0,
            });
        group.ht_cents += line.ht_cents;
        group.tva_cents += line.tva_cents;
    }

    let items: Vec<TvaDetailItem> = groups
        .into_values()
        .map(|mut item| {
            item.ttc_cents = item.ht_cents + item.tva_cents;
            item
        })
        .collect();

    let totals = items.iter().fold(VatTotals::default(), |acc, item| VatTotals {
        ht_cents: acc.ht_cents + item.ht_cents,
        tva_cents: acc.tva_cents + item.tva_cents,
        ttc_cents: acc.ttc_cents + item.ttc_cents,
    });

    VatBreakdown { items, totals }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{TaxRate, VatRate};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 11, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn window() -> ServiceWindow {
        ServiceWindow {
            start: at(0),
            end: at(600),
        }
    }

    fn payment(code: &str, cents: i64, minute: i64) -> PaymentEvent {
        PaymentEvent {
            id: format!("{code}-{minute}"),
            desk_id: "d1".to_string(),
            method_code: code.to_string(),
            method_label: match code {
                "CASH" => "Espèces".to_string(),
                "CB" => "Carte bancaire".to_string(),
                other => other.to_string(),
            },
            amount_cents: cents,
            settled_at: at(minute),
        }
    }

    fn rate(id: &str, bps: u32) -> VatRate {
        VatRate {
            id: id.to_string(),
            label: format!("{} %", bps as f64 / 100.0),
            rate: TaxRate::from_bps(bps),
        }
    }

    fn line(channel: &str, vat: &VatRate, gross: i64, minute: i64) -> SalesLine {
        SalesLine::from_gross(
            format!("{channel}-{}-{minute}", vat.id),
            "d1",
            channel,
            vat,
            Money::from_cents(gross),
            at(minute),
        )
    }

    #[test]
    fn test_payments_grouped_one_item_per_code() {
        let events = vec![
            payment("CB", 12000, 5),
            payment("CASH", 6650, 10),
            payment("CB", 8750, 20),
            payment("CASH", 5000, 30),
        ];

        let items = aggregate_payments(&events, &window());

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].method_code, "CASH");
        assert_eq!(items[0].amount_cents, 11650);
        assert_eq!(items[0].method_label, "Espèces");
        assert_eq!(items[1].method_code, "CB");
        assert_eq!(items[1].amount_cents, 20750);
    }

    #[test]
    fn test_payments_outside_window_ignored() {
        let events = vec![
            payment("CASH", 1000, -1),
            payment("CASH", 2000, 0),
            payment("CASH", 3000, 600),
            payment("CASH", 4000, 601),
        ];

        let items = aggregate_payments(&events, &window());
        assert_eq!(items[0].amount_cents, 5000);
    }

    #[test]
    fn test_refunds_are_summed_not_clamped() {
        let events = vec![payment("TR", 1500, 1), payment("TR", -2000, 2)];
        let items = aggregate_payments(&events, &window());
        assert_eq!(items[0].amount_cents, -500);
    }

    #[test]
    fn test_payments_idempotent() {
        let events = vec![payment("CB", 100, 1), payment("CASH", 50, 2)];
        assert_eq!(
            aggregate_payments(&events, &window()),
            aggregate_payments(&events, &window())
        );
    }

    #[test]
    fn test_no_payments_no_items() {
        assert!(aggregate_payments(&[], &window()).is_empty());
    }

    #[test]
    fn test_vat_grouped_by_channel_and_rate() {
        let ten = rate("TVA10", 1000);
        let five = rate("TVA55", 550);
        let lines = vec![
            line("Sur place", &ten, 1100, 1),
            line("Sur place", &ten, 2200, 2),
            line("À emporter", &five, 450, 3),
            line("À emporter", &ten, 1100, 4),
            line("Sur place", &ten, 9900, 900), // after close
        ];

        let breakdown = aggregate_vat(&lines, &window());

        assert_eq!(breakdown.items.len(), 3);
        let sur_place = breakdown
            .items
            .iter()
            .find(|i| i.delivery_channel == "Sur place")
            .unwrap();
        assert_eq!(sur_place.ht_cents, 3000);
        assert_eq!(sur_place.tva_cents, 300);
        assert_eq!(sur_place.ttc_cents, 3300);

        assert_eq!(breakdown.totals.ttc_cents, 3300 + 450 + 1100);
    }

    #[test]
    fn test_vat_empty() {
        let breakdown = aggregate_vat(&[], &window());
        assert!(breakdown.items.is_empty());
        assert_eq!(breakdown.totals, VatTotals::default());
    }

    proptest! {
        /// Per-group and grand-total identities hold for any input.
        #[test]
        fn prop_vat_identities(
            raw in proptest::collection::vec((0usize..3, 0usize..3, -50_000i64..50_000, 0i64..700), 0..60)
        ) {
            let channels = ["Sur place", "À emporter", "Livraison"];
            let rates = [rate("TVA55", 550), rate("TVA10", 1000), rate("TVA20", 2000)];
            let lines: Vec<SalesLine> = raw
                .iter()
                .map(|(c, r, gross, minute)| line(channels[*c], &rates[*r], *gross, *minute))
                .collect();

            let breakdown = aggregate_vat(&lines, &window());

            let ht: i64 = breakdown.items.iter().map(|i| i.ht_cents).sum();
            let tva: i64 = breakdown.items.iter().map(|i| i.tva_cents).sum();
            let ttc: i64 = breakdown.items.iter().map(|i| i.ttc_cents).sum();

            for item in &breakdown.items {
                prop_assert_eq!(item.ttc_cents, item.ht_cents + item.tva_cents);
            }
            prop_assert_eq!(ht + tva, ttc);
            prop_assert_eq!(breakdown.totals.ttc_cents, ttc);
            prop_assert_eq!(breakdown.totals.ht_cents, ht);
            prop_assert_eq!(breakdown.totals.tva_cents, tva);

            let in_window: i64 = raw
                .iter()
                .filter(|(_, _, _, minute)| *minute <= 600)
                .map(|(_, _, gross, _)| *gross)
                .sum();
            prop_assert_eq!(ttc, in_window);
        }
    }
}
