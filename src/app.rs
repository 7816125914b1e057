use axum::{middleware, Router};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::security_config::auth_middleware;
use crate::config::swagger_config::ApiDoc;
use crate::handlers::bank_details::{add_bank_details, runner_bank_details};
use crate::handlers::banks::{all_banks, resolve_account};
use crate::handlers::commission::calculate_commission;
use crate::handlers::health::health;
use crate::handlers::initialize_payment::initialize_payment;
use crate::handlers::payment_history::payment_history;
use crate::handlers::verify_payment::verify_payment;
use crate::handlers::wallet_balance::wallet_balance;
use crate::handlers::webhook::payment_webhook;
use crate::handlers::withdraw::withdraw;
use crate::models::AppState;
use crate::observability::metrics::setup_metrics;

pub fn create_router(state: Arc<AppState>) -> Router {
    let (prometheus_layer, metric_handle) = setup_metrics();

    // Public routes (no authentication)
    let public_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", axum::routing::get(health))
        .route(
            "/metrics",
            axum::routing::get(move || async move { metric_handle.render() }),
        )
        .route("/api/payment/webhook", axum::routing::post(payment_webhook))
        .route(
            "/api/payment/commission/calculate",
            axum::routing::get(calculate_commission),
        )
        .route("/api/banks", axum::routing::get(all_banks))
        .route("/api/banks/resolve", axum::routing::get(resolve_account));

    // Protected routes (require the authenticated user id header)
    let protected_router = Router::new()
        .route(
            "/api/payment/initialize",
            axum::routing::post(initialize_payment),
        )
        .route(
            "/api/payment/verify/{reference}",
            axum::routing::get(verify_payment),
        )
        .route("/api/payment/history", axum::routing::get(payment_history))
        .route("/api/wallet/balance", axum::routing::get(wallet_balance))
        .route("/api/wallet/withdraw", axum::routing::post(withdraw))
        .route(
            "/api/bank_details",
            axum::routing::post(add_bank_details).get(runner_bank_details),
        )
        .layer(middleware::from_fn(auth_middleware));

    Router::new()
        .merge(public_router)
        .merge(protected_router)
        .layer(prometheus_layer)
        .with_state(state)
}
