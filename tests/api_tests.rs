mod common;

use axum_test::TestServer;
use common::test_state_without_db;
use errandpay::app::create_router;
use http::StatusCode;
use uuid::Uuid;

#[tokio::test]
async fn health_endpoint_is_public() {
    let server = TestServer::new(create_router(test_state_without_db("http://unused"))).unwrap();

    let response = server.get("/health").await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn router_can_be_built_more_than_once_per_process() {
    // The metrics recorder is process-global; constructing a second router
    // must reuse it rather than try to install it again.
    let first = TestServer::new(create_router(test_state_without_db("http://unused"))).unwrap();
    let second = TestServer::new(create_router(test_state_without_db("http://unused"))).unwrap();

    first.get("/health").await.assert_status(StatusCode::OK);
    second.get("/metrics").await.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_user_id_header() {
    let server = TestServer::new(create_router(test_state_without_db("http://unused"))).unwrap();

    let response = server.get("/api/wallet/balance").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server.get("/api/payment/history").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_user_id_header_is_rejected() {
    let server = TestServer::new(create_router(test_state_without_db("http://unused"))).unwrap();

    let response = server
        .get("/api/wallet/balance")
        .add_header("x-user-id", "not-a-uuid")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn commission_endpoint_computes_split_without_auth() {
    let server = TestServer::new(create_router(test_state_without_db("http://unused"))).unwrap();

    let response = server
        .get("/api/payment/commission/calculate")
        .add_query_param("amount", 1000.0)
        .await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["total_amount"], 1000.0);
    assert_eq!(body["commission_percentage"], 15);
    assert_eq!(body["commission_amount"], 150.0);
    assert_eq!(body["net_amount"], 850.0);
}

#[tokio::test]
async fn commission_endpoint_rejects_non_positive_amounts() {
    let server = TestServer::new(create_router(test_state_without_db("http://unused"))).unwrap();

    let response = server
        .get("/api/payment/commission/calculate")
        .add_query_param("amount", 0.0)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_without_valid_signature_is_unauthorized() {
    let server = TestServer::new(create_router(test_state_without_db("http://unused"))).unwrap();

    let response = server
        .post("/api/payment/webhook")
        .add_header("x-korapay-signature", "deadbeef")
        .json(&serde_json::json!({
            "event": "charge.success",
            "data": { "reference": Uuid::new_v4().to_string(), "status": "success" }
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn withdraw_request_is_validated_before_auth_user_is_used() {
    let server = TestServer::new(create_router(test_state_without_db("http://unused"))).unwrap();

    // Authenticated but negative amount: rejected by validation
    let response = server
        .post("/api/wallet/withdraw")
        .add_header("x-user-id", Uuid::new_v4().to_string())
        .json(&serde_json::json!({
            "amount": -10.0,
            "bank_details_id": Uuid::new_v4().to_string()
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
