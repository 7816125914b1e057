use crate::error::ApiError;
use crate::models::dtos::{
    InitializePaymentRequest, InitializePaymentResponse, VerifyPaymentResponse,
    WalletBalanceResponse, WithdrawRequest, WithdrawResponse,
};
use crate::models::entities::{
    NewPayment, Payment, PaymentStatus, TransactionStatus, TransactionType, User,
};
use crate::models::AppState;
use crate::schema::{runner_bank_details, users};
use crate::services::commission::calculate_commission;
use crate::services::gateway_client::{
    BankAccountRef, ChargeStatus, ChargeVerification, DisbursementStatus,
};
use crate::services::ledger_service::LedgerService;
use crate::services::notification_service::NotificationTemplate;
use crate::services::payment_repository::PaymentRepository;
use crate::utility::kobo_to_naira;
use chrono::Utc;
use diesel::prelude::*;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const METHOD_CHARGE: &str = "KoraPay";
pub const METHOD_DISBURSEMENT: &str = "KoraPay Disbursement";

/// Bounded retry with exponential backoff, applied only to transient errors
/// of idempotent operations. Non-idempotent calls (disburse) are never run
/// through this.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.base_delay * 2u32.pow(attempt - 1);
                    warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        operation, attempt, self.max_attempts, delay, e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Owns the two money-moving workflows: client payment -> runner wallet
/// credit, and runner wallet -> bank disbursement. All wallet mutation goes
/// through the ledger service; all payment status changes go through the
/// payment repository.
pub struct SettlementService;

impl SettlementService {
    /// Creates a Pending payment and opens a checkout with the provider.
    pub async fn initialize_payment(
        state: Arc<AppState>,
        payer_id: Uuid,
        req: InitializePaymentRequest,
    ) -> Result<InitializePaymentResponse, ApiError> {
        let amount_kobo = crate::utility::naira_to_kobo(req.amount);
        if amount_kobo <= 0 {
            return Err(ApiError::InvalidAmount(
                "amount must be positive".to_string(),
            ));
        }

        let conn = &mut state.db.get()?;
        let payer = Self::load_user(conn, payer_id)?;
        let receiver = Self::load_user(conn, req.receiver_id)?;
        if !receiver.is_runner() {
            return Err(ApiError::NotFound(format!(
                "User {} is not a runner",
                receiver.id
            )));
        }

        let payment_id = Uuid::new_v4();
        let reference = payment_id.to_string();
        let payment = PaymentRepository::create(
            conn,
            NewPayment {
                id: payment_id,
                reference: reference.clone(),
                payer_id,
                receiver_id: receiver.id,
                amount: amount_kobo,
                description: req.description.clone(),
                payment_method: METHOD_CHARGE.to_string(),
                payment_status: PaymentStatus::Pending.as_str().to_string(),
                transaction_id: None,
            },
        )?;

        let narration = req.description.as_deref().unwrap_or("Payment transaction");
        let init = match state
            .gateway
            .initialize_charge(
                &reference,
                amount_kobo,
                "NGN",
                &payer.full_name,
                &payer.email,
                narration,
            )
            .await
        {
            Ok(init) => init,
            Err(e @ ApiError::GatewayRejected(_)) => {
                // Definitive rejection: the provider never opened a charge.
                PaymentRepository::update_status(conn, &reference, PaymentStatus::Failed)?;
                return Err(e);
            }
            Err(e) => {
                // Ambiguous (timeout, 5xx): the charge may exist provider-side.
                // Leave the payment Pending so verify/webhook can resolve it.
                warn!(
                    "Charge initialization for {} ended ambiguously: {}",
                    reference, e
                );
                return Err(e);
            }
        };

        if let Some(provider_reference) = &init.provider_reference {
            PaymentRepository::set_transaction_id(conn, &reference, provider_reference)?;
        }

        info!(
            "Payment initialized: reference={}, payer={}, receiver={}, amount={} kobo",
            reference, payer_id, receiver.id, amount_kobo
        );

        Ok(InitializePaymentResponse {
            payment_id,
            reference,
            checkout_url: init.checkout_url,
            amount: req.amount,
            currency: "NGN".to_string(),
            status: payment.status(),
        })
    }

    /// Polls the provider for the current charge state and applies any
    /// resulting settlement. Safe to call any number of times for the same
    /// reference; the ledger is credited at most once.
    pub async fn verify_and_settle(
        state: Arc<AppState>,
        reference: &str,
    ) -> Result<VerifyPaymentResponse, ApiError> {
        let conn = &mut state.db.get()?;
        let payment = PaymentRepository::find_by_reference(conn, reference)?;

        // Terminal payments need no provider round-trip.
        if payment.status().is_terminal() {
            return Ok(Self::verify_response(&payment));
        }

        let verification = state
            .retry_policy
            .run("verify_charge", || state.gateway.verify_charge(reference))
            .await?;

        let updated = match payment.payment_method.as_str() {
            METHOD_DISBURSEMENT => match verification.status {
                ChargeStatus::Success => Self::complete_payout(conn, &state, &payment)?,
                ChargeStatus::Failed => {
                    Self::fail_payout(conn, &state, &payment, verification.raw.clone())?
                }
                ChargeStatus::Pending => payment,
            },
            _ => match verification.status {
                ChargeStatus::Success => {
                    Self::settle_client_payment(conn, &state, &payment, &verification)?
                }
                ChargeStatus::Failed => Self::fail_client_payment(conn, &state, &payment)?,
                ChargeStatus::Pending => payment,
            },
        };

        if let Some(provider_reference) = &verification.provider_reference {
            PaymentRepository::set_transaction_id(conn, reference, provider_reference)?;
        }

        Ok(Self::verify_response(&updated))
    }

    /// Converts a provider-confirmed charge into a wallet credit: commission
    /// split, net credit to the runner, payment marked Paid. The ledger's
    /// uniqueness guarantee makes the credit idempotent on `reference`; if
    /// the credit fails the payment stays Pending and the whole operation is
    /// retryable without a double effect.
    pub fn settle_client_payment(
        conn: &mut PgConnection,
        state: &AppState,
        payment: &Payment,
        verification: &ChargeVerification,
    ) -> Result<Payment, ApiError> {
        let split = calculate_commission(payment.amount, state.settings.commission_percentage)?;
        let wallet = LedgerService::get_or_create_wallet(conn, payment.receiver_id)?;

        let entry = LedgerService::credit(
            conn,
            wallet.id,
            split.net_kobo,
            &payment.reference,
            Some(format!(
                "Payment from client {} (after {}% commission)",
                payment.payer_id, state.settings.commission_percentage
            )),
            Some(json!({
                "payment_id": payment.id,
                "payer_id": payment.payer_id,
                "total_amount": payment.amount,
                "commission_percentage": state.settings.commission_percentage,
                "commission_amount": split.commission_kobo,
                "provider_response": verification.raw,
            })),
        )?;

        let updated = PaymentRepository::update_status(conn, &payment.reference, PaymentStatus::Paid)?;

        if entry.applied {
            info!(
                "Settled payment {}: credited {} kobo (commission {} kobo), balance now {}",
                payment.reference, split.net_kobo, split.commission_kobo, entry.balance_after
            );
            state.notifier.notify(
                payment.receiver_id,
                NotificationTemplate::WalletCredited,
                json!({
                    "reference": payment.reference,
                    "amount": kobo_to_naira(split.net_kobo),
                    "balance": kobo_to_naira(entry.balance_after),
                }),
            );
            state.notifier.notify(
                payment.payer_id,
                NotificationTemplate::PaymentReceived,
                json!({
                    "reference": payment.reference,
                    "amount": kobo_to_naira(payment.amount),
                }),
            );
        }

        Ok(updated)
    }

    pub fn fail_client_payment(
        conn: &mut PgConnection,
        state: &AppState,
        payment: &Payment,
    ) -> Result<Payment, ApiError> {
        let updated =
            PaymentRepository::update_status(conn, &payment.reference, PaymentStatus::Failed)?;
        state.notifier.notify(
            payment.payer_id,
            NotificationTemplate::PaymentFailed,
            json!({
                "reference": payment.reference,
                "amount": kobo_to_naira(payment.amount),
            }),
        );
        Ok(updated)
    }

    /// Validates and executes a withdrawal: debit first (reserving the
    /// funds), then disburse. The debit leg stays `pending` until the
    /// provider confirms; an ambiguous provider outcome leaves the hold in
    /// place rather than risking a double payout.
    pub async fn request_withdrawal(
        state: Arc<AppState>,
        runner_id: Uuid,
        req: WithdrawRequest,
    ) -> Result<WithdrawResponse, ApiError> {
        let amount_kobo = crate::utility::naira_to_kobo(req.amount);
        if amount_kobo < state.settings.min_withdrawal_kobo {
            return Err(ApiError::InvalidAmount(format!(
                "minimum withdrawal is \u{20a6}{:.2}",
                kobo_to_naira(state.settings.min_withdrawal_kobo)
            )));
        }
        if amount_kobo > state.settings.max_withdrawal_kobo {
            return Err(ApiError::InvalidAmount(format!(
                "maximum withdrawal is \u{20a6}{:.2}",
                kobo_to_naira(state.settings.max_withdrawal_kobo)
            )));
        }

        let conn = &mut state.db.get()?;
        let runner = Self::load_user(conn, runner_id)?;
        if !runner.is_runner() {
            return Err(ApiError::NotFound(format!(
                "User {} is not a runner",
                runner_id
            )));
        }

        let bank_details = runner_bank_details::table
            .filter(runner_bank_details::id.eq(req.bank_details_id))
            .filter(runner_bank_details::runner_id.eq(runner_id))
            .filter(runner_bank_details::is_active.eq(true))
            .filter(runner_bank_details::is_verified.eq(true))
            .select(crate::models::entities::RunnerBankDetails::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "Verified bank details not found for runner {}",
                    runner_id
                ))
            })?;

        let wallet = LedgerService::get_or_create_wallet(conn, runner_id)?;
        let reference = Self::withdrawal_reference(runner_id);

        // Intent row and hold are written together, intent first: a failed
        // debit rolls back the payment, and funds are never held under a
        // reference the webhook/verify reconciliation path cannot find.
        let payment = conn.transaction::<Payment, ApiError, _>(|conn| {
            let payment = PaymentRepository::create(
                conn,
                NewPayment {
                    id: Uuid::new_v4(),
                    reference: reference.clone(),
                    payer_id: runner_id,
                    receiver_id: runner_id,
                    amount: amount_kobo,
                    description: req.narration.clone(),
                    payment_method: METHOD_DISBURSEMENT.to_string(),
                    payment_status: PaymentStatus::Pending.as_str().to_string(),
                    transaction_id: None,
                },
            )?;

            LedgerService::debit(
                conn,
                wallet.id,
                amount_kobo,
                TransactionStatus::Pending,
                &reference,
                Some(format!(
                    "Withdrawal to {} - {}",
                    bank_details.bank_name.as_deref().unwrap_or("bank"),
                    bank_details.account_number
                )),
                Some(json!({
                    "bank_details_id": bank_details.id,
                    "bank_code": bank_details.bank_code,
                    "account_number": bank_details.account_number,
                })),
            )?;

            Ok(payment)
        })?;

        let narration = req
            .narration
            .clone()
            .unwrap_or_else(|| format!("Withdrawal for {}", runner.full_name));
        // Single attempt, deliberately outside the retry policy: a repeated
        // disburse call could pay out twice.
        let outcome = state
            .gateway
            .disburse(
                &reference,
                amount_kobo,
                BankAccountRef {
                    bank_code: &bank_details.bank_code,
                    account_number: &bank_details.account_number,
                    account_name: &bank_details.account_name,
                },
                &runner.full_name,
                &runner.email,
                &narration,
            )
            .await;

        let status = match outcome {
            Ok(result) => {
                if let Some(provider_reference) = &result.provider_reference {
                    PaymentRepository::set_transaction_id(conn, &reference, provider_reference)?;
                }
                match result.status {
                    DisbursementStatus::Failed => {
                        Self::fail_payout(conn, &state, &payment, result.raw)?.status()
                    }
                    DisbursementStatus::Success => {
                        Self::complete_payout(conn, &state, &payment)?.status()
                    }
                    DisbursementStatus::Processing => PaymentStatus::Pending,
                }
            }
            Err(e @ ApiError::GatewayRejected(_)) => {
                // The provider definitively refused the transfer; release the hold.
                error!("Disbursement {} rejected: {}", reference, e);
                Self::fail_payout(conn, &state, &payment, json!({ "error": e.to_string() }))?;
                return Err(e);
            }
            Err(e) => {
                // Unknown outcome (timeout, 5xx). The provider may still
                // execute the transfer, so the hold stays until a webhook or
                // a verify call reports a definitive status.
                warn!(
                    "Disbursement {} outcome unknown, keeping funds held: {}",
                    reference, e
                );
                PaymentStatus::Pending
            }
        };

        info!(
            "Withdrawal {} for runner {}: {} kobo, status {}",
            reference, runner_id, amount_kobo, status
        );

        Ok(WithdrawResponse {
            withdrawal_reference: reference,
            status,
            amount: req.amount,
        })
    }

    /// Provider confirmed the payout: complete the pending debit leg and
    /// mark the payment Paid. The money already left the wallet when the
    /// hold was taken, so there is no further balance change.
    pub fn complete_payout(
        conn: &mut PgConnection,
        state: &AppState,
        payment: &Payment,
    ) -> Result<Payment, ApiError> {
        LedgerService::mark_transaction_status(
            conn,
            &payment.reference,
            TransactionType::Debit,
            TransactionStatus::Completed,
        )?;
        let updated =
            PaymentRepository::update_status(conn, &payment.reference, PaymentStatus::Paid)?;
        state.notifier.notify(
            payment.receiver_id,
            NotificationTemplate::PayoutCompleted,
            json!({
                "reference": payment.reference,
                "amount": kobo_to_naira(payment.amount),
            }),
        );
        Ok(updated)
    }

    /// Provider definitively failed the payout: reverse the hold so the
    /// balance returns to its pre-withdrawal value, and mark the payment
    /// Failed.
    pub fn fail_payout(
        conn: &mut PgConnection,
        state: &AppState,
        payment: &Payment,
        provider_response: Value,
    ) -> Result<Payment, ApiError> {
        let entry = LedgerService::reverse(conn, &payment.reference)?;
        let updated =
            PaymentRepository::update_status(conn, &payment.reference, PaymentStatus::Failed)?;
        state.notifier.notify(
            payment.receiver_id,
            NotificationTemplate::PayoutFailed,
            json!({
                "reference": payment.reference,
                "amount": kobo_to_naira(payment.amount),
                "balance": kobo_to_naira(entry.balance_after),
                "provider_response": provider_response,
            }),
        );
        Ok(updated)
    }

    pub fn wallet_balance(
        state: &AppState,
        runner_id: Uuid,
    ) -> Result<WalletBalanceResponse, ApiError> {
        let conn = &mut state.db.get()?;
        let runner = Self::load_user(conn, runner_id)?;
        if !runner.is_runner() {
            return Err(ApiError::NotFound(format!(
                "User {} is not a runner",
                runner_id
            )));
        }
        let wallet = LedgerService::get_or_create_wallet(conn, runner_id)?;
        Ok(WalletBalanceResponse {
            balance: kobo_to_naira(wallet.balance),
            currency: wallet.currency,
        })
    }

    fn withdrawal_reference(runner_id: Uuid) -> String {
        let id = runner_id.to_string();
        let suffix = &id[id.len() - 8..];
        format!("WTH_{}_{}", Utc::now().timestamp_millis(), suffix)
    }

    fn verify_response(payment: &Payment) -> VerifyPaymentResponse {
        VerifyPaymentResponse {
            reference: payment.reference.clone(),
            status: payment.status(),
            amount: kobo_to_naira(payment.amount),
            currency: "NGN".to_string(),
            transaction_id: payment.transaction_id.clone(),
        }
    }

    fn load_user(conn: &mut PgConnection, user_id: Uuid) -> Result<User, ApiError> {
        users::table
            .find(user_id)
            .select(User::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::NotFound(format!("User {} does not exist", user_id)))
    }
}
