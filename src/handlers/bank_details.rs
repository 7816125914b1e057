use crate::config::security_config::AuthUser;
use crate::error::ApiError;
use crate::models::dtos::{AddBankDetailsRequest, BankDetailsResponse};
use crate::models::AppState;
use crate::services::bank_service::BankService;
use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;
use validator::Validate;

#[utoipa::path(
    post,
    path = "/api/bank_details",
    request_body = AddBankDetailsRequest,
    responses(
        (status = 201, description = "Bank details verified and stored", body = BankDetailsResponse),
        (status = 400, description = "Malformed bank code or account number"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Caller is not a runner or account unresolvable"),
        (status = 503, description = "Payment provider unavailable")
    ),
    security(("userId" = [])),
    tag = "Bank"
)]
pub async fn add_bank_details(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<AddBankDetailsRequest>,
) -> Result<(StatusCode, Json<BankDetailsResponse>), (StatusCode, String)> {
    req.validate().map_err(ApiError::from)?;
    let details = BankService::add_bank_details(state, user.id, req).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

#[utoipa::path(
    get,
    path = "/api/bank_details",
    responses(
        (status = 200, description = "Active bank details for the caller", body = Vec<BankDetailsResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("userId" = [])),
    tag = "Bank"
)]
pub async fn runner_bank_details(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<BankDetailsResponse>>, (StatusCode, String)> {
    let details = BankService::runner_bank_details(&state, user.id)?;
    Ok(Json(details))
}
