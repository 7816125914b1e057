mod common;

use common::{cleanup_user, insert_bank_details, insert_user, test_state, try_test_pool};
use diesel::prelude::*;
use errandpay::error::ApiError;
use errandpay::models::dtos::{InitializePaymentRequest, WithdrawRequest};
use errandpay::models::entities::PaymentStatus;
use errandpay::schema::{payments, wallet_transactions, wallets};
use errandpay::services::ledger_service::LedgerService;
use errandpay::services::payment_repository::PaymentRepository;
use errandpay::services::settlement_service::SettlementService;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn wallet_balance(conn: &mut diesel::PgConnection, runner_id: uuid::Uuid) -> i64 {
    wallets::table
        .filter(wallets::runner_id.eq(runner_id))
        .select(wallets::balance)
        .first(conn)
        .unwrap()
}

#[tokio::test]
async fn initialize_payment_creates_pending_intent_with_checkout() {
    let Some(pool) = try_test_pool() else {
        eprintln!("Skipping: no test database configured");
        return;
    };
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/charges/initialize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Authorization created",
            "data": {
                "reference": "KPY_init_1",
                "checkout_url": "https://checkout.korapay.com/init_1"
            }
        })))
        .mount(&mock_server)
        .await;

    let state = test_state(pool, &mock_server.uri());
    let conn = &mut state.db.get().unwrap();
    let payer_id = insert_user(conn, "Client");
    let runner_id = insert_user(conn, "Runner");

    let response = SettlementService::initialize_payment(
        state.clone(),
        payer_id,
        InitializePaymentRequest {
            receiver_id: runner_id,
            amount: 1_000.0,
            description: Some("Grocery run".to_string()),
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status, PaymentStatus::Pending);
    assert_eq!(
        response.checkout_url.as_deref(),
        Some("https://checkout.korapay.com/init_1")
    );

    let payment = PaymentRepository::find_by_reference(conn, &response.reference).unwrap();
    assert_eq!(payment.amount, 100_000);
    assert_eq!(payment.transaction_id.as_deref(), Some("KPY_init_1"));

    cleanup_user(conn, runner_id);
    cleanup_user(conn, payer_id);
}

#[tokio::test]
async fn initialize_payment_to_non_runner_is_rejected() {
    let Some(pool) = try_test_pool() else {
        eprintln!("Skipping: no test database configured");
        return;
    };
    let state = test_state(pool, "http://unused");
    let conn = &mut state.db.get().unwrap();
    let payer_id = insert_user(conn, "Client");
    let other_client = insert_user(conn, "Client");

    let err = SettlementService::initialize_payment(
        state.clone(),
        payer_id,
        InitializePaymentRequest {
            receiver_id: other_client,
            amount: 500.0,
            description: None,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));

    cleanup_user(conn, other_client);
    cleanup_user(conn, payer_id);
}

#[tokio::test]
async fn verify_settles_successful_charge_exactly_once() {
    let Some(pool) = try_test_pool() else {
        eprintln!("Skipping: no test database configured");
        return;
    };
    let mock_server = MockServer::start().await;

    let state = test_state(pool, &mock_server.uri());
    let conn = &mut state.db.get().unwrap();
    let payer_id = insert_user(conn, "Client");
    let runner_id = insert_user(conn, "Runner");

    let response = {
        Mock::given(method("POST"))
            .and(path("/charges/initialize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "ok",
                "data": { "reference": "KPY_v1", "checkout_url": "https://c/v1" }
            })))
            .mount(&mock_server)
            .await;
        SettlementService::initialize_payment(
            state.clone(),
            payer_id,
            InitializePaymentRequest {
                receiver_id: runner_id,
                amount: 1_000.0,
                description: None,
            },
        )
        .await
        .unwrap()
    };

    Mock::given(method("GET"))
        .and(path(format!("/transactions/{}", response.reference)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "ok",
            "data": {
                "reference": "KPY_v1",
                "status": "success",
                "amount": 100000,
                "currency": "NGN"
            }
        })))
        .mount(&mock_server)
        .await;

    let verified = SettlementService::verify_and_settle(state.clone(), &response.reference)
        .await
        .unwrap();
    assert_eq!(verified.status, PaymentStatus::Paid);
    assert_eq!(wallet_balance(conn, runner_id), 85_000);

    // Terminal payments short-circuit; a second verify never re-credits
    let verified_again = SettlementService::verify_and_settle(state.clone(), &response.reference)
        .await
        .unwrap();
    assert_eq!(verified_again.status, PaymentStatus::Paid);
    assert_eq!(wallet_balance(conn, runner_id), 85_000);

    cleanup_user(conn, runner_id);
    cleanup_user(conn, payer_id);
}

#[tokio::test]
async fn withdrawal_success_completes_the_hold() {
    let Some(pool) = try_test_pool() else {
        eprintln!("Skipping: no test database configured");
        return;
    };
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transactions/disburse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Transfer completed",
            "data": { "reference": "KPY_w1", "status": "success" }
        })))
        .mount(&mock_server)
        .await;

    let state = test_state(pool, &mock_server.uri());
    let conn = &mut state.db.get().unwrap();
    let runner_id = insert_user(conn, "Runner");
    let bank_details_id = insert_bank_details(conn, runner_id);
    let wallet = LedgerService::get_or_create_wallet(conn, runner_id).unwrap();
    LedgerService::credit(conn, wallet.id, 100_000, "seed_w1", None, None).unwrap();

    let response = SettlementService::request_withdrawal(
        state.clone(),
        runner_id,
        WithdrawRequest {
            amount: 500.0,
            bank_details_id,
            narration: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status, PaymentStatus::Paid);
    assert!(response.withdrawal_reference.starts_with("WTH_"));
    assert_eq!(wallet_balance(conn, runner_id), 50_000);

    let leg_status: String = wallet_transactions::table
        .filter(wallet_transactions::reference.eq(&response.withdrawal_reference))
        .filter(wallet_transactions::transaction_type.eq("debit"))
        .select(wallet_transactions::status)
        .first(conn)
        .unwrap();
    assert_eq!(leg_status, "completed");

    cleanup_user(conn, runner_id);
}

#[tokio::test]
async fn withdrawal_failure_reverses_the_hold() {
    let Some(pool) = try_test_pool() else {
        eprintln!("Skipping: no test database configured");
        return;
    };
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transactions/disburse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Transfer failed",
            "data": { "reference": "KPY_w2", "status": "failed" }
        })))
        .mount(&mock_server)
        .await;

    let state = test_state(pool, &mock_server.uri());
    let conn = &mut state.db.get().unwrap();
    let runner_id = insert_user(conn, "Runner");
    let bank_details_id = insert_bank_details(conn, runner_id);
    let wallet = LedgerService::get_or_create_wallet(conn, runner_id).unwrap();
    LedgerService::credit(conn, wallet.id, 100_000, "seed_w2", None, None).unwrap();

    let response = SettlementService::request_withdrawal(
        state.clone(),
        runner_id,
        WithdrawRequest {
            amount: 500.0,
            bank_details_id,
            narration: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status, PaymentStatus::Failed);
    // Reversal restored the pre-withdrawal balance
    assert_eq!(wallet_balance(conn, runner_id), 100_000);

    cleanup_user(conn, runner_id);
}

#[tokio::test]
async fn ambiguous_disbursement_keeps_funds_held() {
    let Some(pool) = try_test_pool() else {
        eprintln!("Skipping: no test database configured");
        return;
    };
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transactions/disburse"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status": false,
            "message": "Internal error"
        })))
        .mount(&mock_server)
        .await;

    let state = test_state(pool, &mock_server.uri());
    let conn = &mut state.db.get().unwrap();
    let runner_id = insert_user(conn, "Runner");
    let bank_details_id = insert_bank_details(conn, runner_id);
    let wallet = LedgerService::get_or_create_wallet(conn, runner_id).unwrap();
    LedgerService::credit(conn, wallet.id, 100_000, "seed_w3", None, None).unwrap();

    let response = SettlementService::request_withdrawal(
        state.clone(),
        runner_id,
        WithdrawRequest {
            amount: 500.0,
            bank_details_id,
            narration: None,
        },
    )
    .await
    .unwrap();

    // Outcome unknown: no automatic reversal, hold stays until a webhook or
    // verify call reports a definitive status.
    assert_eq!(response.status, PaymentStatus::Pending);
    assert_eq!(wallet_balance(conn, runner_id), 50_000);

    let leg_status: String = wallet_transactions::table
        .filter(wallet_transactions::reference.eq(&response.withdrawal_reference))
        .filter(wallet_transactions::transaction_type.eq("debit"))
        .select(wallet_transactions::status)
        .first(conn)
        .unwrap();
    assert_eq!(leg_status, "pending");

    cleanup_user(conn, runner_id);
}

#[tokio::test]
async fn withdrawal_with_insufficient_balance_writes_nothing() {
    let Some(pool) = try_test_pool() else {
        eprintln!("Skipping: no test database configured");
        return;
    };
    let state = test_state(pool, "http://unused");
    let conn = &mut state.db.get().unwrap();
    let runner_id = insert_user(conn, "Runner");
    let bank_details_id = insert_bank_details(conn, runner_id);
    let wallet = LedgerService::get_or_create_wallet(conn, runner_id).unwrap();
    LedgerService::credit(conn, wallet.id, 10_000, "seed_w4", None, None).unwrap();

    let err = SettlementService::request_withdrawal(
        state.clone(),
        runner_id,
        WithdrawRequest {
            amount: 500.0,
            bank_details_id,
            narration: None,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::InsufficientFunds { .. }));
    assert_eq!(wallet_balance(conn, runner_id), 10_000);

    // The rejected debit also rolled back the payment intent: no orphan
    // disbursement row is left for reconciliation to stumble over.
    let intents: i64 = payments::table
        .filter(payments::payer_id.eq(runner_id))
        .count()
        .get_result(conn)
        .unwrap();
    assert_eq!(intents, 0);

    cleanup_user(conn, runner_id);
}

#[tokio::test]
async fn withdrawal_bounds_are_enforced() {
    let Some(pool) = try_test_pool() else {
        eprintln!("Skipping: no test database configured");
        return;
    };
    let state = test_state(pool, "http://unused");
    let conn = &mut state.db.get().unwrap();
    let runner_id = insert_user(conn, "Runner");
    let bank_details_id = insert_bank_details(conn, runner_id);

    // Below the \u{20a6}100 minimum
    let err = SettlementService::request_withdrawal(
        state.clone(),
        runner_id,
        WithdrawRequest {
            amount: 50.0,
            bank_details_id,
            narration: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::InvalidAmount(_)));

    // Above the \u{20a6}1,000,000 maximum
    let err = SettlementService::request_withdrawal(
        state.clone(),
        runner_id,
        WithdrawRequest {
            amount: 1_500_000.0,
            bank_details_id,
            narration: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::InvalidAmount(_)));

    cleanup_user(conn, runner_id);
}

#[tokio::test]
async fn pending_disbursement_is_reconciled_by_verify() {
    let Some(pool) = try_test_pool() else {
        eprintln!("Skipping: no test database configured");
        return;
    };
    let mock_server = MockServer::start().await;
    // First attempt ends ambiguously, later verification reports success
    Mock::given(method("POST"))
        .and(path("/transactions/disburse"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status": false,
            "message": "Internal error"
        })))
        .mount(&mock_server)
        .await;

    let state = test_state(pool, &mock_server.uri());
    let conn = &mut state.db.get().unwrap();
    let runner_id = insert_user(conn, "Runner");
    let bank_details_id = insert_bank_details(conn, runner_id);
    let wallet = LedgerService::get_or_create_wallet(conn, runner_id).unwrap();
    LedgerService::credit(conn, wallet.id, 100_000, "seed_w5", None, None).unwrap();

    let response = SettlementService::request_withdrawal(
        state.clone(),
        runner_id,
        WithdrawRequest {
            amount: 500.0,
            bank_details_id,
            narration: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(response.status, PaymentStatus::Pending);

    Mock::given(method("GET"))
        .and(path(format!(
            "/transactions/{}",
            response.withdrawal_reference
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "ok",
            "data": { "reference": "KPY_w5", "status": "success" }
        })))
        .mount(&mock_server)
        .await;

    let verified =
        SettlementService::verify_and_settle(state.clone(), &response.withdrawal_reference)
            .await
            .unwrap();
    assert_eq!(verified.status, PaymentStatus::Paid);
    assert_eq!(wallet_balance(conn, runner_id), 50_000);

    let leg_status: String = wallet_transactions::table
        .filter(wallet_transactions::reference.eq(&response.withdrawal_reference))
        .filter(wallet_transactions::transaction_type.eq("debit"))
        .select(wallet_transactions::status)
        .first(conn)
        .unwrap();
    assert_eq!(leg_status, "completed");

    cleanup_user(conn, runner_id);
}
