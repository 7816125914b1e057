mod common;

use common::test_state_without_db;
use errandpay::error::ApiError;
use errandpay::services::gateway_client::{BankAccountRef, ChargeStatus, DisbursementStatus};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn initialize_charge_returns_checkout_url() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/charges/initialize"))
        .and(body_partial_json(json!({
            "reference": "pay_ref_1",
            "amount": 50000,
            "currency": "NGN"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Authorization created",
            "data": {
                "reference": "KPY_abc123",
                "checkout_url": "https://checkout.korapay.com/abc123"
            }
        })))
        .mount(&mock_server)
        .await;

    let state = test_state_without_db(&mock_server.uri());
    let init = state
        .gateway
        .initialize_charge(
            "pay_ref_1",
            50_000,
            "NGN",
            "Test Payer",
            "payer@example.com",
            "Errand payment",
        )
        .await
        .unwrap();

    assert_eq!(init.provider_reference.as_deref(), Some("KPY_abc123"));
    assert_eq!(
        init.checkout_url.as_deref(),
        Some("https://checkout.korapay.com/abc123")
    );
}

#[tokio::test]
async fn initialize_charge_rejection_is_not_retryable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/charges/initialize"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": false,
            "message": "Invalid currency"
        })))
        .mount(&mock_server)
        .await;

    let state = test_state_without_db(&mock_server.uri());
    let err = state
        .gateway
        .initialize_charge("pay_ref_2", 50_000, "XYZ", "n", "e@x.com", "n")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::GatewayRejected(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn verify_charge_maps_provider_statuses() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transactions/ref_success"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Transaction retrieved",
            "data": {
                "reference": "KPY_1",
                "status": "success",
                "amount": 50000,
                "currency": "NGN"
            }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transactions/ref_processing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Transaction retrieved",
            "data": { "reference": "KPY_2", "status": "processing" }
        })))
        .mount(&mock_server)
        .await;

    let state = test_state_without_db(&mock_server.uri());

    let success = state.gateway.verify_charge("ref_success").await.unwrap();
    assert_eq!(success.status, ChargeStatus::Success);
    assert_eq!(success.amount_kobo, Some(50_000));

    let processing = state.gateway.verify_charge("ref_processing").await.unwrap();
    assert_eq!(processing.status, ChargeStatus::Pending);
}

#[tokio::test]
async fn server_errors_map_to_gateway_unavailable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transactions/ref_down"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "status": false,
            "message": "Service unavailable"
        })))
        .mount(&mock_server)
        .await;

    let state = test_state_without_db(&mock_server.uri());
    let err = state.gateway.verify_charge("ref_down").await.unwrap_err();

    assert!(matches!(err, ApiError::GatewayUnavailable(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn resolve_unknown_account_maps_to_account_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/misc/banks/resolve"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": false,
            "message": "Account not found"
        })))
        .mount(&mock_server)
        .await;

    let state = test_state_without_db(&mock_server.uri());
    let err = state
        .gateway
        .resolve_bank_account("058", "0000000000")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::AccountNotFound(_)));
}

#[tokio::test]
async fn resolve_account_returns_account_name() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/misc/banks/resolve"))
        .and(body_partial_json(json!({
            "bank": "058",
            "account": "0123456789"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Account resolved",
            "data": { "account_name": "ADA OBI", "account_number": "0123456789" }
        })))
        .mount(&mock_server)
        .await;

    let state = test_state_without_db(&mock_server.uri());
    let name = state
        .gateway
        .resolve_bank_account("058", "0123456789")
        .await
        .unwrap();

    assert_eq!(name, "ADA OBI");
}

#[tokio::test]
async fn disburse_reports_processing_until_provider_settles() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transactions/disburse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Transfer queued",
            "data": { "reference": "KPY_disb_1", "status": "processing" }
        })))
        .mount(&mock_server)
        .await;

    let state = test_state_without_db(&mock_server.uri());
    let result = state
        .gateway
        .disburse(
            "WTH_1_abcdef12",
            50_000,
            BankAccountRef {
                bank_code: "058",
                account_number: "0123456789",
                account_name: "Test Runner",
            },
            "Test Runner",
            "runner@example.com",
            "Withdrawal",
        )
        .await
        .unwrap();

    assert_eq!(result.status, DisbursementStatus::Processing);
    assert_eq!(result.provider_reference.as_deref(), Some("KPY_disb_1"));
}

#[tokio::test]
async fn list_banks_parses_bank_entries() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/misc/banks"))
        .and(query_param("countryCode", "NG"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Banks retrieved",
            "data": [
                { "code": "058", "name": "GTBank", "slug": "gtbank", "country": "NG" },
                { "code": "044", "name": "Access Bank", "slug": "access-bank", "country": "NG" }
            ]
        })))
        .mount(&mock_server)
        .await;

    let state = test_state_without_db(&mock_server.uri());
    let banks = state.gateway.list_banks("NG").await.unwrap();

    assert_eq!(banks.len(), 2);
    assert_eq!(banks[0].code, "058");
    assert_eq!(banks[1].name, "Access Bank");
}
