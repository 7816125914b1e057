use crate::models::dtos::{CommissionQuery, CommissionResponse};
use crate::models::AppState;
use crate::services::commission;
use crate::utility::{kobo_to_naira, naira_to_kobo};
use axum::extract::{Query, State};
use axum::{http::StatusCode, Json};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/payment/commission/calculate",
    params(CommissionQuery),
    responses(
        (status = 200, description = "Commission breakdown for an amount", body = CommissionResponse),
        (status = 400, description = "Non-positive amount")
    ),
    tag = "Payment"
)]
pub async fn calculate_commission(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommissionQuery>,
) -> Result<Json<CommissionResponse>, (StatusCode, String)> {
    let rate = state.settings.commission_percentage;
    let split = commission::calculate_commission(naira_to_kobo(query.amount), rate)?;

    Ok(Json(CommissionResponse {
        total_amount: query.amount,
        commission_percentage: rate,
        commission_amount: kobo_to_naira(split.commission_kobo),
        net_amount: kobo_to_naira(split.net_kobo),
    }))
}
