use crate::config::security_config::AuthUser;
use crate::error::ApiError;
use crate::models::dtos::{WithdrawRequest, WithdrawResponse};
use crate::models::AppState;
use crate::services::settlement_service::SettlementService;
use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/api/wallet/withdraw",
    request_body = WithdrawRequest,
    responses(
        (status = 202, description = "Withdrawal accepted", body = WithdrawResponse),
        (status = 400, description = "Amount out of bounds, insufficient funds, or provider rejection"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No verified bank details"),
        (status = 503, description = "Payout provider unavailable")
    ),
    security(("userId" = [])),
    tag = "Wallet"
)]
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<WithdrawRequest>,
) -> Result<(StatusCode, Json<WithdrawResponse>), (StatusCode, String)> {
    req.validate().map_err(ApiError::from)?;
    info!("Withdrawal request: runner={}, amount={}", user.id, req.amount);

    let response = SettlementService::request_withdrawal(state, user.id, req).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}
