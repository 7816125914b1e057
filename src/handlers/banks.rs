use crate::error::ApiError;
use crate::models::dtos::{BankInfo, ResolveAccountQuery, ResolveAccountResponse};
use crate::models::AppState;
use axum::extract::{Query, State};
use axum::{http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

#[utoipa::path(
    get,
    path = "/api/banks",
    responses(
        (status = 200, description = "Supported Nigerian banks", body = Vec<BankInfo>),
        (status = 503, description = "Payment provider unavailable")
    ),
    tag = "Bank"
)]
pub async fn all_banks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BankInfo>>, (StatusCode, String)> {
    let banks = state.gateway.list_banks("NG").await?;
    Ok(Json(banks))
}

#[utoipa::path(
    get,
    path = "/api/banks/resolve",
    params(ResolveAccountQuery),
    responses(
        (status = 200, description = "Resolved account holder name", body = ResolveAccountResponse),
        (status = 400, description = "Malformed bank code or account number"),
        (status = 404, description = "Account could not be resolved"),
        (status = 503, description = "Payment provider unavailable")
    ),
    tag = "Bank"
)]
pub async fn resolve_account(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResolveAccountQuery>,
) -> Result<Json<ResolveAccountResponse>, (StatusCode, String)> {
    query.validate().map_err(ApiError::from)?;

    let account_name = state
        .gateway
        .resolve_bank_account(&query.bank_code, &query.account_number)
        .await?;

    Ok(Json(ResolveAccountResponse {
        bank_code: query.bank_code,
        account_number: query.account_number,
        account_name,
    }))
}
