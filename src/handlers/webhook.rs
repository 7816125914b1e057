use crate::models::AppState;
use crate::services::webhook_service::{WebhookOutcome, WebhookService, SIGNATURE_HEADER};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Provider callback. Every handled outcome is acknowledged with 200 so the
/// provider stops redelivering; only signature failures, malformed payloads
/// and transient storage errors are surfaced as non-2xx.
#[utoipa::path(
    post,
    path = "/api/payment/webhook",
    request_body = String,
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 400, description = "Malformed payload"),
        (status = 401, description = "Invalid signature"),
        (status = 503, description = "Transient storage failure, redeliver later")
    ),
    tag = "Webhook"
)]
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, String)> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let outcome = WebhookService::process(&state, &body, signature)?;

    let message = match outcome {
        WebhookOutcome::Processed(status) => {
            info!("Webhook processed, payment status now {}", status);
            format!("processed: {}", status)
        }
        WebhookOutcome::Duplicate => "duplicate delivery ignored".to_string(),
        WebhookOutcome::UnknownReference => "unknown reference acknowledged".to_string(),
        WebhookOutcome::Ignored => "event ignored".to_string(),
    };

    Ok(Json(json!({ "status": true, "message": message })))
}
