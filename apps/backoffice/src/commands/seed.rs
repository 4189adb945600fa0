//! # Seed Command
//!
//! Opens a register three hours in the past and records a demo service of
//! payments and sales lines on its desk, so the summary and VAT screens
//! have something to show.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use caisse_core::validation::validate_desk_field;
use caisse_core::{Money, PaymentEvent, Register, SalesLine, TaxRate, VatRate};

use crate::error::ApiError;
use crate::state::AppState;

/// (method code, method label, amount in cents, minutes after opening)
const DEMO_PAYMENTS: &[(&str, &str, i64, i64)] = &[
    ("CB", "Carte bancaire", 4_250, 15),
    ("CASH", "Espèces", 2_380, 32),
    ("TR", "Titre restaurant", 1_900, 47),
    ("CB", "Carte bancaire", 6_720, 64),
    ("CASH", "Espèces", -450, 71),
    ("CASH", "Espèces", 3_100, 95),
];

/// (delivery channel, VAT rate index, gross amount in cents, minutes after opening)
const DEMO_SALES: &[(&str, usize, i64, i64)] = &[
    ("Sur place", 0, 3_600, 15),
    ("Sur place", 1, 650, 15),
    ("À emporter", 2, 2_380, 32),
    ("Sur place", 0, 1_900, 47),
    ("Livraison", 2, 6_720, 64),
    ("À emporter", 2, -450, 71),
    ("Sur place", 0, 2_450, 95),
    ("Sur place", 1, 650, 95),
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedResponse {
    pub register: Register,
    pub payments: usize,
    pub sales_lines: usize,
}

pub async fn seed(state: &AppState, desk_id: &str) -> Result<SeedResponse, ApiError> {
    let desk_id = validate_desk_field("desk_id", desk_id)?;
    let start = Utc::now() - Duration::hours(3);

    let register = Register::open(
        Uuid::new_v4().to_string(),
        desk_id.as_str(),
        format!("Démo {desk_id}"),
        Money::from_cents(15_000),
        start,
    );
    state.db.registers().insert(&register).await?;

    let sales = state.db.sales();

    for (code, label, cents, minutes) in DEMO_PAYMENTS {
        let event = PaymentEvent {
            id: Uuid::new_v4().to_string(),
            desk_id: desk_id.clone(),
            method_code: code.to_string(),
            method_label: label.to_string(),
            amount_cents: *cents,
            settled_at: start + Duration::minutes(*minutes),
        };
        sales.record_payment(&event).await?;
    }

    let rates = vat_rates();
    for (channel, rate, cents, minutes) in DEMO_SALES {
        let line = SalesLine::from_gross(
            Uuid::new_v4().to_string(),
            desk_id.as_str(),
            *channel,
            &rates[*rate],
            Money::from_cents(*cents),
            start + Duration::minutes(*minutes),
        );
        sales.record_sales_line(&line).await?;
    }

    info!(
        id = %register.id,
        desk_id = %desk_id,
        payments = DEMO_PAYMENTS.len(),
        sales_lines = DEMO_SALES.len(),
        "Demo service seeded"
    );

    Ok(SeedResponse {
        register,
        payments: DEMO_PAYMENTS.len(),
        sales_lines: DEMO_SALES.len(),
    })
}

/// French restaurant VAT rates.
fn vat_rates() -> [VatRate; 3] {
    [
        VatRate {
            id: "tva-10".to_string(),
            label: "TVA 10%".to_string(),
            rate: TaxRate::from_bps(1000),
        },
        VatRate {
            id: "tva-20".to_string(),
            label: "TVA 20%".to_string(),
            rate: TaxRate::from_bps(2000),
        },
        VatRate {
            id: "tva-5.5".to_string(),
            label: "TVA 5,5%".to_string(),
            rate: TaxRate::from_bps(550),
        },
    ]
}
