//! # Register Commands
//!
//! Lifecycle and read commands for one register.
//!
//! Register ids are passed to the service as typed: any id that matches no
//! register, UUID-shaped or not, is reported as `NOT_FOUND`.

use serde::Serialize;
use tracing::debug;

use caisse_core::variance::VarianceBasis;
use caisse_core::{Money, Register, RegisterSummary, VatDetails};

use super::retry_read;
use crate::error::ApiError;
use crate::state::AppState;

/// Amounts of a summary, formatted for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedTotals {
    pub cash_fund: String,
    pub theoretical: String,
    /// Sum of all correction lines
    pub corrections: String,
    /// Counted cash, when the variance is computed cash against cash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_cash: Option<String>,
    pub variance: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: RegisterSummary,
    pub formatted: FormattedTotals,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VatResponse {
    #[serde(flatten)]
    pub details: VatDetails,
    /// TTC total, formatted for display
    pub formatted_ttc: String,
}

pub async fn open(
    state: &AppState,
    desk_id: &str,
    desk_name: &str,
    cash_fund: &str,
) -> Result<Register, ApiError> {
    debug!(desk_id, "open command");

    let cash_fund = Money::parse_decimal(cash_fund)?;
    Ok(state
        .service
        .open_register(desk_id, desk_name, cash_fund)
        .await?)
}

pub async fn list(
    state: &AppState,
    desk_id: Option<&str>,
    limit: Option<u32>,
) -> Result<Vec<Register>, ApiError> {
    debug!(?desk_id, ?limit, "list command");

    let limit = limit.unwrap_or(state.config.list_limit);
    if limit == 0 {
        return Err(ApiError::validation("limit must be at least 1"));
    }

    retry_read("list", || state.service.list_registers(desk_id, limit)).await
}

pub async fn summary(state: &AppState, register_id: &str) -> Result<SummaryResponse, ApiError> {
    debug!(register_id, "summary command");

    let summary = retry_read("summary", || state.service.get_summary(register_id)).await?;

    let variance = &summary.variance;
    let formatted = FormattedTotals {
        cash_fund: state.config.format_currency(summary.register.cash_fund_cents),
        theoretical: state.config.format_currency(variance.theoretical_total_cents),
        corrections: state.config.format_currency(variance.custom_total_cents),
        declared_cash: match variance.basis {
            VarianceBasis::CashDeclaration { declared_cents, .. } => {
                Some(state.config.format_currency(declared_cents))
            }
            VarianceBasis::Aggregate => None,
        },
        variance: state.config.format_currency(variance.variance_cents),
    };

    Ok(SummaryResponse { summary, formatted })
}

pub async fn vat(state: &AppState, register_id: &str) -> Result<VatResponse, ApiError> {
    debug!(register_id, "vat command");

    let details = retry_read("vat", || state.service.get_vat_details(register_id)).await?;
    let formatted_ttc = state.config.format_currency(details.totals.ttc_cents);

    Ok(VatResponse {
        details,
        formatted_ttc,
    })
}

pub async fn close(state: &AppState, register_id: &str) -> Result<Register, ApiError> {
    debug!(register_id, "close command");

    Ok(state.service.close_register(register_id).await?)
}

pub async fn enclose(
    state: &AppState,
    register_id: &str,
    comment: Option<&str>,
) -> Result<Register, ApiError> {
    debug!(register_id, "enclose command");

    Ok(state.service.enclose_register(register_id, comment).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::correction;
    use crate::error::ErrorCode;
    use crate::state::AppConfig;
    use caisse_core::PaymentEvent;
    use caisse_db::{Database, DbConfig};

    async fn state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState::new(db, AppConfig::default())
    }

    #[tokio::test]
    async fn test_open_summary_close_enclose() {
        let state = state().await;

        let register = open(&state, "d1", "Comptoir", "150,00").await.unwrap();
        assert_eq!(register.cash_fund_cents, 15000);

        correction::add(&state, &register.id, "Pourboires", "-3,50")
            .await
            .unwrap();

        let response = summary(&state, &register.id).await.unwrap();
        assert_eq!(response.formatted.cash_fund, "150.00 €");
        assert_eq!(response.formatted.corrections, "-3.50 €");
        assert_eq!(response.formatted.declared_cash, None);
        assert_eq!(response.formatted.variance, "-3.50 €");

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("register").is_some());
        assert!(json.get("formatted").is_some());

        close(&state, &register.id).await.unwrap();
        let enclosed = enclose(&state, &register.id, Some("RAS")).await.unwrap();
        assert_eq!(enclosed.enclose_comment.as_deref(), Some("RAS"));

        let err = enclose(&state, &register.id, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.reason.as_deref(), Some("ALREADY_ENCLOSED"));
    }

    #[tokio::test]
    async fn test_rejects_malformed_input() {
        let state = state().await;

        let err = open(&state, "d1", "Comptoir", "beaucoup").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = list(&state, None, Some(0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_unknown_register_is_not_found() {
        let state = state().await;
        let id = uuid::Uuid::new_v4().to_string();

        let err = vat(&state, &id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(!err.retryable);

        for id in ["not-a-uuid", "42", ""] {
            assert_eq!(summary(&state, id).await.unwrap_err().code, ErrorCode::NotFound);
            assert_eq!(close(&state, id).await.unwrap_err().code, ErrorCode::NotFound);
            assert_eq!(enclose(&state, id, None).await.unwrap_err().code, ErrorCode::NotFound);
        }
    }

    #[tokio::test]
    async fn test_declared_cash_follows_variance_basis() {
        let state = state().await;
        let register = open(&state, "d1", "Comptoir", "0").await.unwrap();

        state
            .db
            .sales()
            .record_payment(&PaymentEvent {
                id: uuid::Uuid::new_v4().to_string(),
                desk_id: "d1".to_string(),
                method_code: "CASH".to_string(),
                method_label: "Espèces".to_string(),
                amount_cents: 11650,
                settled_at: register.start_time,
            })
            .await
            .unwrap();

        correction::add(&state, &register.id, "Espèces comptées", "115,00")
            .await
            .unwrap();
        correction::add(&state, &register.id, "Pourboires", "20,00")
            .await
            .unwrap();

        let response = summary(&state, &register.id).await.unwrap();
        assert_eq!(response.formatted.declared_cash.as_deref(), Some("115.00 €"));
        assert_eq!(response.formatted.corrections, "135.00 €");
        assert_eq!(response.formatted.theoretical, "116.50 €");
        assert_eq!(response.formatted.variance, "-1.50 €");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["formatted"]["declaredCash"], "115.00 €");
    }
}
