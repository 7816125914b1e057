use crate::config::security_config::AuthUser;
use crate::models::dtos::{PaymentHistoryItem, PaymentHistoryQuery};
use crate::models::entities::PaymentStatus;
use crate::models::AppState;
use crate::services::payment_repository::PaymentRepository;
use crate::utility::kobo_to_naira;
use axum::extract::{Query, State};
use axum::{http::StatusCode, Extension, Json};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/payment/history",
    params(PaymentHistoryQuery),
    responses(
        (status = 200, description = "Payments involving the caller, newest first", body = Vec<PaymentHistoryItem>),
        (status = 401, description = "Unauthorized")
    ),
    security(("userId" = [])),
    tag = "Payment"
)]
pub async fn payment_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PaymentHistoryQuery>,
) -> Result<Json<Vec<PaymentHistoryItem>>, (StatusCode, String)> {
    let as_receiver = matches!(query.role.as_deref(), Some("runner"));
    let status = query
        .status
        .as_deref()
        .and_then(|s| s.parse::<PaymentStatus>().ok());

    let conn = &mut state.db.get().map_err(crate::error::ApiError::from)?;
    let payments = PaymentRepository::history(
        conn,
        user.id,
        as_receiver,
        status,
        query.limit.unwrap_or(50),
        query.offset.unwrap_or(0),
    )?;

    let direction = if as_receiver { "received" } else { "sent" };
    let items = payments
        .into_iter()
        .map(|p| PaymentHistoryItem {
            id: p.id,
            reference: p.reference.clone(),
            amount: kobo_to_naira(p.amount),
            currency: "NGN".to_string(),
            status: p.status(),
            description: p.description.clone(),
            payment_method: p.payment_method.clone(),
            transaction_id: p.transaction_id.clone(),
            direction: direction.to_string(),
            created_at: p.created_at,
        })
        .collect();

    Ok(Json(items))
}
