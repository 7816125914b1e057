use crate::config::security_config::AuthUser;
use crate::models::dtos::WalletBalanceResponse;
use crate::models::AppState;
use crate::services::settlement_service::SettlementService;
use axum::extract::State;
use axum::{http::StatusCode, Extension, Json};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/wallet/balance",
    responses(
        (status = 200, description = "Current wallet balance", body = WalletBalanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Caller is not a runner")
    ),
    security(("userId" = [])),
    tag = "Wallet"
)]
pub async fn wallet_balance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WalletBalanceResponse>, (StatusCode, String)> {
    let response = SettlementService::wallet_balance(&state, user.id)?;
    Ok(Json(response))
}
