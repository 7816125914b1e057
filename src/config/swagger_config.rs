use crate::handlers::{
    bank_details::__path_add_bank_details, bank_details::__path_runner_bank_details,
    banks::__path_all_banks, banks::__path_resolve_account,
    commission::__path_calculate_commission, health::__path_health,
    initialize_payment::__path_initialize_payment, payment_history::__path_payment_history,
    verify_payment::__path_verify_payment, wallet_balance::__path_wallet_balance,
    webhook::__path_payment_webhook, withdraw::__path_withdraw,
};
use crate::models::dtos::*;
use crate::models::entities::PaymentStatus;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        initialize_payment, verify_payment, payment_history, wallet_balance,
        withdraw, payment_webhook, calculate_commission, all_banks,
        resolve_account, add_bank_details, runner_bank_details, health
    ),
    components(schemas(
        InitializePaymentRequest, InitializePaymentResponse, VerifyPaymentResponse,
        WalletBalanceResponse, WithdrawRequest, WithdrawResponse,
        CommissionResponse, BankInfo, ResolveAccountResponse,
        AddBankDetailsRequest, BankDetailsResponse, PaymentHistoryItem, PaymentStatus
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Payment", description = "Payment initialization and verification"),
        (name = "Wallet", description = "Runner wallet balance and withdrawals"),
        (name = "Bank", description = "Bank lists and payout destinations"),
        (name = "Webhook", description = "Provider notifications")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "userId".to_string(),
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-user-id"))),
            );
        }
    }
}
