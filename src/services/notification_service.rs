use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub enum NotificationTemplate {
    PaymentReceived,
    PaymentFailed,
    WalletCredited,
    PayoutCompleted,
    PayoutFailed,
}

impl NotificationTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationTemplate::PaymentReceived => "payment_received",
            NotificationTemplate::PaymentFailed => "payment_failed",
            NotificationTemplate::WalletCredited => "wallet_credited",
            NotificationTemplate::PayoutCompleted => "payout_completed",
            NotificationTemplate::PayoutFailed => "payout_failed",
        }
    }
}

/// Fire-and-forget dispatch to the platform's notification subsystem.
/// Delivery failures are logged and never propagate: a settlement must not
/// block or roll back because a notification could not be sent.
#[derive(Clone)]
pub struct Notifier {
    endpoint: Option<String>,
    http: Client,
}

impl Notifier {
    pub fn new(endpoint: Option<String>) -> Self {
        Notifier {
            endpoint,
            http: Client::new(),
        }
    }

    pub fn notify(&self, user_id: Uuid, template: NotificationTemplate, data: Value) {
        let Some(endpoint) = self.endpoint.clone() else {
            debug!(
                "Notification ({}): user_id={}, data={}",
                template.as_str(),
                user_id,
                data
            );
            return;
        };

        let http = self.http.clone();
        let payload = json!({
            "user_id": user_id,
            "template": template.as_str(),
            "data": data,
        });
        tokio::spawn(async move {
            if let Err(e) = http.post(&endpoint).json(&payload).send().await {
                warn!("Notification dispatch failed (ignored): {}", e);
            }
        });
    }
}
