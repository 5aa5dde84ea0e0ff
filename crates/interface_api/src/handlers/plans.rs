//! Plan handlers

use axum::{extract::{Path, State}, Json};

use domain_workflow::PremiumQuote;

use crate::dto::plans::PremiumQuoteRequest;
use crate::handlers::validated;
use crate::{error::ApiError, AppState};

/// Quotes the premium under a plan
pub async fn quote(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<PremiumQuoteRequest>,
) -> Result<Json<PremiumQuote>, ApiError> {
    let request = validated(request)?;
    let quote = state
        .workflow
        .quote_premium(&name, request.idv, &request.addons, request.ncb_percent)
        .await?;
    Ok(Json(quote))
}
