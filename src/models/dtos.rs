use crate::models::entities::PaymentStatus;
use crate::utility::{validate_account_number, validate_bank_code};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct InitializePaymentRequest {
    pub receiver_id: Uuid,
    /// Amount in naira; converted to kobo internally.
    #[validate(range(min = 0.01, max = 1_000_000.0, message = "Amount must be between ₦0.01 and ₦1,000,000"))]
    pub amount: f64,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct InitializePaymentResponse {
    pub payment_id: Uuid,
    pub reference: String,
    pub checkout_url: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct VerifyPaymentResponse {
    pub reference: String,
    pub status: PaymentStatus,
    pub amount: f64,
    pub currency: String,
    pub transaction_id: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct WalletBalanceResponse {
    pub balance: f64,
    pub currency: String,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct WithdrawRequest {
    /// Amount in naira; bounds are enforced in kobo by the coordinator.
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,
    pub bank_details_id: Uuid,
    #[validate(length(max = 255))]
    pub narration: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct WithdrawResponse {
    pub withdrawal_reference: String,
    pub status: PaymentStatus,
    pub amount: f64,
}

#[derive(Deserialize, ToSchema, IntoParams)]
pub struct CommissionQuery {
    pub amount: f64,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct CommissionResponse {
    pub total_amount: f64,
    pub commission_percentage: i64,
    pub commission_amount: f64,
    pub net_amount: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct BankInfo {
    pub code: String,
    pub name: String,
    pub slug: Option<String>,
    pub country: String,
}

#[derive(Deserialize, ToSchema, Validate, IntoParams)]
pub struct ResolveAccountQuery {
    #[validate(custom(function = "validate_bank_code"))]
    pub bank_code: String,
    #[validate(custom(function = "validate_account_number"))]
    pub account_number: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ResolveAccountResponse {
    pub account_name: String,
    pub account_number: String,
    pub bank_code: String,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct AddBankDetailsRequest {
    #[validate(custom(function = "validate_bank_code"))]
    pub bank_code: String,
    #[validate(custom(function = "validate_account_number"))]
    pub account_number: String,
    #[validate(length(max = 255))]
    pub bank_name: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct BankDetailsResponse {
    pub id: Uuid,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
    pub bank_name: Option<String>,
    pub is_verified: bool,
}

#[derive(Deserialize, ToSchema, IntoParams)]
pub struct PaymentHistoryQuery {
    /// "client" lists payments made, "runner" lists payments received.
    pub role: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct PaymentHistoryItem {
    pub id: Uuid,
    pub reference: String,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub description: Option<String>,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub direction: String,
    pub created_at: DateTime<Utc>,
}
