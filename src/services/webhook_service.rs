use crate::error::ApiError;
use crate::models::entities::PaymentStatus;
use crate::models::AppState;
use crate::services::gateway_client::{ChargeStatus, ChargeVerification};
use crate::services::payment_repository::PaymentRepository;
use crate::services::settlement_service::SettlementService;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Signature header sent with every provider notification.
pub const SIGNATURE_HEADER: &str = "x-korapay-signature";

/// Every notification kind the provider can deliver. Adding a kind here
/// forces the dispatch match below to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEvent {
    ChargeSuccess,
    ChargeFailed,
    TransferSuccess,
    TransferFailed,
    PayoutSuccess,
    PayoutFailed,
    RefundSuccess,
    RefundFailed,
}

impl WebhookEvent {
    pub fn parse(event: &str) -> Option<Self> {
        match event {
            "charge.success" => Some(WebhookEvent::ChargeSuccess),
            "charge.failed" => Some(WebhookEvent::ChargeFailed),
            "transfer.success" => Some(WebhookEvent::TransferSuccess),
            "transfer.failed" => Some(WebhookEvent::TransferFailed),
            "payout.success" => Some(WebhookEvent::PayoutSuccess),
            "payout.failed" => Some(WebhookEvent::PayoutFailed),
            "refund.success" => Some(WebhookEvent::RefundSuccess),
            "refund.failed" => Some(WebhookEvent::RefundFailed),
            _ => None,
        }
    }

    /// Payment status this notification would move the payment to; used for
    /// duplicate detection.
    fn implied_status(&self) -> Option<PaymentStatus> {
        match self {
            WebhookEvent::ChargeSuccess
            | WebhookEvent::TransferSuccess
            | WebhookEvent::PayoutSuccess => Some(PaymentStatus::Paid),
            WebhookEvent::ChargeFailed
            | WebhookEvent::TransferFailed
            | WebhookEvent::PayoutFailed => Some(PaymentStatus::Failed),
            WebhookEvent::RefundSuccess => Some(PaymentStatus::Refunded),
            WebhookEvent::RefundFailed => None,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct WebhookNotification {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Deserialize, Debug)]
pub struct WebhookData {
    pub reference: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(flatten)]
    pub extra: Value,
}

/// How a notification was resolved. Everything here is acknowledged with
/// 200 to the provider; only signature and malformed-body failures surface
/// as errors.
#[derive(Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed(PaymentStatus),
    Duplicate,
    UnknownReference,
    Ignored,
}

pub struct WebhookService;

impl WebhookService {
    /// Authenticate, deduplicate, and dispatch one provider notification.
    /// The signature is recomputed over the raw request body and compared in
    /// constant time before the payload is even parsed.
    pub fn process(
        state: &AppState,
        raw_body: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, ApiError> {
        Self::verify_signature(state, raw_body, signature)?;

        let notification: WebhookNotification = serde_json::from_slice(raw_body)
            .map_err(|e| ApiError::GatewayRejected(format!("Invalid webhook payload: {}", e)))?;

        let Some(event) = WebhookEvent::parse(&notification.event) else {
            warn!("Ignoring unknown webhook event: {}", notification.event);
            return Ok(WebhookOutcome::Ignored);
        };
        debug!(
            "Webhook event {:?} for reference {}",
            event, notification.data.reference
        );

        let conn = &mut state.db.get()?;
        let reference = &notification.data.reference;
        let Some(payment) = PaymentRepository::try_find_by_reference(conn, reference)? else {
            // Not ours to process; acknowledged so the provider stops retrying.
            warn!("Webhook for unknown payment reference: {}", reference);
            return Ok(WebhookOutcome::UnknownReference);
        };

        // Duplicate delivery: the payment is already in the implied state
        // and was updated within the dedup window. The ledger's uniqueness
        // constraint backstops anything that slips past this check.
        if let Some(implied) = event.implied_status() {
            let window = Duration::seconds(state.settings.webhook_dedup_window_secs);
            if payment.status() == implied && Utc::now() - payment.updated_at < window {
                info!("Duplicate webhook delivery for {}, acknowledged", reference);
                return Ok(WebhookOutcome::Duplicate);
            }
        }

        // A terminal payment is already settled; the only notification that
        // can still move one is refund.success for a Paid payment. Anything
        // else (late redelivery, or an event conflicting with the recorded
        // outcome) is acknowledged without touching the ledger.
        let current = payment.status();
        if current.is_terminal()
            && !(event == WebhookEvent::RefundSuccess && current == PaymentStatus::Paid)
        {
            info!(
                "Webhook {} for terminal payment {} ({}), acknowledged without effect",
                notification.event, reference, current
            );
            return Ok(WebhookOutcome::Duplicate);
        }

        let snapshot = serde_json::to_value(&notification.data.extra).unwrap_or(Value::Null);
        let updated = match event {
            WebhookEvent::ChargeSuccess => {
                let verification = ChargeVerification {
                    status: ChargeStatus::Success,
                    provider_reference: None,
                    amount_kobo: notification.data.amount,
                    currency: notification.data.currency.clone(),
                    raw: snapshot,
                };
                SettlementService::settle_client_payment(conn, state, &payment, &verification)?
            }
            WebhookEvent::ChargeFailed => {
                SettlementService::fail_client_payment(conn, state, &payment)?
            }
            WebhookEvent::TransferSuccess | WebhookEvent::PayoutSuccess => {
                SettlementService::complete_payout(conn, state, &payment)?
            }
            WebhookEvent::TransferFailed | WebhookEvent::PayoutFailed => {
                SettlementService::fail_payout(conn, state, &payment, snapshot)?
            }
            WebhookEvent::RefundSuccess => {
                PaymentRepository::update_status(conn, reference, PaymentStatus::Refunded)?
            }
            WebhookEvent::RefundFailed => {
                warn!("Refund failed for {}, payment status unchanged", reference);
                payment
            }
        };

        info!(
            "Webhook processed: event={}, reference={}, status={}",
            notification.event,
            reference,
            updated.status()
        );
        Ok(WebhookOutcome::Processed(updated.status()))
    }

    pub fn verify_signature(
        state: &AppState,
        raw_body: &[u8],
        signature: &str,
    ) -> Result<(), ApiError> {
        let secret = state.settings.kora_secret_key.expose_secret();
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| ApiError::Internal("Invalid webhook secret".to_string()))?;
        mac.update(raw_body);

        let supplied = hex::decode(signature).map_err(|_| ApiError::InvalidSignature)?;
        // verify_slice is constant-time.
        mac.verify_slice(&supplied).map_err(|_| {
            warn!("Webhook signature mismatch");
            ApiError::InvalidSignature
        })
    }
}
