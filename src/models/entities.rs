use crate::schema::{payments, runner_bank_details, users, wallet_transactions, wallets};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Payment intent lifecycle. Transitions are monotonic toward a terminal
/// state; once terminal, only Paid -> Refunded is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// The one escape hatch from a terminal state.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        match self {
            PaymentStatus::Pending => true,
            PaymentStatus::Paid => next == PaymentStatus::Refunded,
            PaymentStatus::Failed | PaymentStatus::Refunded => false,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Paid" => Ok(PaymentStatus::Paid),
            "Failed" => Ok(PaymentStatus::Failed),
            "Refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("Unknown payment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            other => Err(format!("Unknown transaction type: {}", other)),
        }
    }
}

/// Ledger leg status. `pending` legs are awaiting provider confirmation
/// (withdrawal debits); everything else is written as `completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            other => Err(format!("Unknown transaction status: {}", other)),
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_runner(&self) -> bool {
        self.role == "Runner"
    }
}

// One wallet per runner, enforced by a unique constraint on runner_id.
// Balance is NGN kobo (BIGINT); only the ledger service writes it.
#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(table_name = wallets)]
pub struct Wallet {
    pub id: Uuid,
    pub runner_id: Uuid,
    pub balance: i64,
    pub currency: String,
    pub is_active: bool,
    pub last_transaction_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = wallets)]
pub struct NewWallet {
    pub id: Uuid,
    pub runner_id: Uuid,
    pub balance: i64,
    pub currency: String,
    pub is_active: bool,
}

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(table_name = wallet_transactions)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub amount: i64,
    pub transaction_type: String,
    pub status: String,
    pub reference: String,
    pub balance_before: i64,
    pub balance_after: i64,
    pub description: Option<String>,
    pub metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = wallet_transactions)]
pub struct NewWalletTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub amount: i64,
    pub transaction_type: String,
    pub status: String,
    pub reference: String,
    pub balance_before: i64,
    pub balance_after: i64,
    pub description: Option<String>,
    pub metadata: Option<JsonValue>,
}

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(table_name = payments)]
pub struct Payment {
    pub id: Uuid,
    pub reference: String,
    pub payer_id: Uuid,
    pub receiver_id: Uuid,
    pub amount: i64,
    pub description: Option<String>,
    pub payment_method: String,
    pub payment_status: String,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn status(&self) -> PaymentStatus {
        // Column is constrained to the four known values by the repository.
        self.payment_status
            .parse()
            .unwrap_or(PaymentStatus::Pending)
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = payments)]
pub struct NewPayment {
    pub id: Uuid,
    pub reference: String,
    pub payer_id: Uuid,
    pub receiver_id: Uuid,
    pub amount: i64,
    pub description: Option<String>,
    pub payment_method: String,
    pub payment_status: String,
    pub transaction_id: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(table_name = runner_bank_details)]
pub struct RunnerBankDetails {
    pub id: Uuid,
    pub runner_id: Uuid,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
    pub bank_name: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub verification_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = runner_bank_details)]
pub struct NewRunnerBankDetails {
    pub id: Uuid,
    pub runner_id: Uuid,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
    pub bank_name: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub verification_date: Option<DateTime<Utc>>,
}
