use crate::models::dtos::VerifyPaymentResponse;
use crate::models::AppState;
use crate::services::settlement_service::SettlementService;
use axum::extract::{Path, State};
use axum::{http::StatusCode, Json};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/payment/verify/{reference}",
    params(("reference" = String, Path, description = "Payment reference")),
    responses(
        (status = 200, description = "Current payment status", body = VerifyPaymentResponse),
        (status = 404, description = "Unknown payment reference"),
        (status = 503, description = "Payment provider unavailable")
    ),
    security(("userId" = [])),
    tag = "Payment"
)]
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> Result<Json<VerifyPaymentResponse>, (StatusCode, String)> {
    let response = SettlementService::verify_and_settle(state, &reference).await?;
    Ok(Json(response))
}
