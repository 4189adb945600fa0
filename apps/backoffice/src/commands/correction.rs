//! # Correction Commands

use serde::Serialize;
use tracing::debug;

use caisse_core::{CustomItem, Money};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemResponse {
    pub register_id: String,
    pub item_id: String,
    pub removed: bool,
}

pub async fn add(
    state: &AppState,
    register_id: &str,
    label: &str,
    amount: &str,
) -> Result<CustomItem, ApiError> {
    debug!(register_id, label, "add-item command");

    let amount = Money::parse_decimal(amount)?;
    Ok(state
        .service
        .add_correction_item(register_id, label, amount)
        .await?)
}

pub async fn remove(
    state: &AppState,
    register_id: &str,
    item_id: &str,
) -> Result<RemoveItemResponse, ApiError> {
    debug!(register_id, item_id, "remove-item command");

    state
        .service
        .remove_correction_item(register_id, item_id)
        .await?;

    Ok(RemoveItemResponse {
        register_id: register_id.to_string(),
        item_id: item_id.to_string(),
        removed: true,
    })
}
