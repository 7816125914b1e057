use crate::config::security_config::AuthUser;
use crate::error::ApiError;
use crate::models::dtos::{InitializePaymentRequest, InitializePaymentResponse};
use crate::models::AppState;
use crate::services::settlement_service::SettlementService;
use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/api/payment/initialize",
    request_body = InitializePaymentRequest,
    responses(
        (status = 201, description = "Payment initialized", body = InitializePaymentResponse),
        (status = 400, description = "Invalid amount or provider rejection"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Receiver not found"),
        (status = 503, description = "Payment provider unavailable")
    ),
    security(("userId" = [])),
    tag = "Payment"
)]
pub async fn initialize_payment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<InitializePaymentRequest>,
) -> Result<(StatusCode, Json<InitializePaymentResponse>), (StatusCode, String)> {
    req.validate().map_err(ApiError::from)?;
    info!(
        "Initialize payment: payer={}, receiver={}, amount={}",
        user.id, req.receiver_id, req.amount
    );

    let response = SettlementService::initialize_payment(state, user.id, req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
