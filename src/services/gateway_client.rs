use crate::config::Settings;
use crate::error::ApiError;
use crate::models::dtos::BankInfo;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde_json::{json, Value};
use tracing::{debug, error};

/// Provider-reported charge state, as returned by the verify endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeStatus {
    Success,
    Failed,
    Pending,
}

#[derive(Debug)]
pub struct ChargeInit {
    pub provider_reference: Option<String>,
    pub checkout_url: Option<String>,
}

#[derive(Debug)]
pub struct ChargeVerification {
    pub status: ChargeStatus,
    pub provider_reference: Option<String>,
    pub amount_kobo: Option<i64>,
    pub currency: Option<String>,
    pub raw: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisbursementStatus {
    Processing,
    Success,
    Failed,
}

#[derive(Debug)]
pub struct DisbursementResult {
    pub status: DisbursementStatus,
    pub provider_reference: Option<String>,
    pub raw: Value,
}

pub struct BankAccountRef<'a> {
    pub bank_code: &'a str,
    pub account_number: &'a str,
    pub account_name: &'a str,
}

/// Thin adapter over the KoraPay merchant API. Holds one HTTP client with a
/// fixed timeout; performs no retries of its own (the settlement coordinator
/// owns retry policy so side effects are never duplicated here).
#[derive(Clone)]
pub struct KoraClient {
    http: Client,
    base_url: String,
    secret_key: Secret<String>,
    notify_url: String,
}

impl KoraClient {
    pub fn new(settings: &Settings) -> Self {
        let http = Client::builder()
            .timeout(settings.gateway_timeout)
            .build()
            .expect("failed to build HTTP client");
        KoraClient {
            http,
            base_url: settings.kora_api_url.clone(),
            secret_key: settings.kora_secret_key.clone(),
            notify_url: format!("{}/api/payment/webhook", settings.base_url),
        }
    }

    pub async fn initialize_charge(
        &self,
        reference: &str,
        amount_kobo: i64,
        currency: &str,
        customer_name: &str,
        customer_email: &str,
        narration: &str,
    ) -> Result<ChargeInit, ApiError> {
        let payload = json!({
            "reference": reference,
            "amount": amount_kobo,
            "currency": currency,
            "narration": narration,
            "customer": {
                "name": customer_name,
                "email": customer_email,
            },
            "notification_url": self.notify_url,
        });

        let resp = self
            .send(self.http.post(format!("{}/charges/initialize", self.base_url)).json(&payload))
            .await?;
        let body = Self::parse_body(resp).await?;

        Ok(ChargeInit {
            provider_reference: body["data"]["reference"].as_str().map(str::to_string),
            checkout_url: body["data"]["checkout_url"].as_str().map(str::to_string),
        })
    }

    /// Idempotent read; callers may retry freely.
    pub async fn verify_charge(&self, reference: &str) -> Result<ChargeVerification, ApiError> {
        let resp = self
            .send(self.http.get(format!("{}/transactions/{}", self.base_url, reference)))
            .await?;
        let body = Self::parse_body(resp).await?;

        let data = &body["data"];
        let status = match data["status"].as_str() {
            Some("success") | Some("successful") => ChargeStatus::Success,
            Some("failed") | Some("cancelled") => ChargeStatus::Failed,
            _ => ChargeStatus::Pending,
        };

        Ok(ChargeVerification {
            status,
            provider_reference: data["reference"].as_str().map(str::to_string),
            amount_kobo: data["amount"].as_i64(),
            currency: data["currency"].as_str().map(str::to_string),
            raw: data.clone(),
        })
    }

    pub async fn resolve_bank_account(
        &self,
        bank_code: &str,
        account_number: &str,
    ) -> Result<String, ApiError> {
        let payload = json!({
            "bank": bank_code,
            "account": account_number,
        });

        let resp = self
            .send(self.http.post(format!("{}/misc/banks/resolve", self.base_url)).json(&payload))
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::AccountNotFound(format!(
                "{} / {}",
                bank_code, account_number
            )));
        }
        let body = Self::parse_body(resp).await?;

        body["data"]["account_name"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                error!("Account resolution response missing account_name");
                ApiError::AccountNotFound(format!("{} / {}", bank_code, account_number))
            })
    }

    pub async fn disburse(
        &self,
        reference: &str,
        amount_kobo: i64,
        bank_account: BankAccountRef<'_>,
        customer_name: &str,
        customer_email: &str,
        narration: &str,
    ) -> Result<DisbursementResult, ApiError> {
        let payload = json!({
            "reference": reference,
            "destination": {
                "type": "bank_account",
                "amount": amount_kobo,
                "currency": "NGN",
                "narration": narration,
                "bank_account": {
                    "bank": bank_account.bank_code,
                    "account": bank_account.account_number,
                    "account_name": bank_account.account_name,
                },
                "customer": {
                    "name": customer_name,
                    "email": customer_email,
                },
            },
        });

        let resp = self
            .send(self.http.post(format!("{}/transactions/disburse", self.base_url)).json(&payload))
            .await?;
        let body = Self::parse_body(resp).await?;

        let data = &body["data"];
        let status = match data["status"].as_str() {
            Some("success") | Some("successful") => DisbursementStatus::Success,
            Some("failed") => DisbursementStatus::Failed,
            _ => DisbursementStatus::Processing,
        };
        debug!("Disbursement {} accepted with status {:?}", reference, status);

        Ok(DisbursementResult {
            status,
            provider_reference: data["reference"].as_str().map(str::to_string),
            raw: data.clone(),
        })
    }

    /// Idempotent read; callers may retry freely.
    pub async fn list_banks(&self, country_code: &str) -> Result<Vec<BankInfo>, ApiError> {
        let resp = self
            .send(self.http.get(format!(
                "{}/misc/banks?countryCode={}",
                self.base_url, country_code
            )))
            .await?;
        let body = Self::parse_body(resp).await?;

        let banks = body["data"]
            .as_array()
            .ok_or_else(|| ApiError::GatewayRejected("Invalid bank list response".to_string()))?
            .iter()
            .filter_map(|bank| {
                Some(BankInfo {
                    code: bank["code"].as_str()?.to_string(),
                    name: bank["name"].as_str()?.to_string(),
                    slug: bank["slug"].as_str().map(str::to_string),
                    country: bank["country"]
                        .as_str()
                        .unwrap_or(country_code)
                        .to_string(),
                })
            })
            .collect();

        Ok(banks)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        request
            .header(
                "Authorization",
                format!("Bearer {}", self.secret_key.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| {
                error!("Provider request failed: {}", e);
                ApiError::from(e)
            })
    }

    /// Maps transport status and the provider's own `status` flag onto the
    /// error taxonomy before handing back the JSON body.
    async fn parse_body(resp: Response) -> Result<Value, ApiError> {
        let status = resp.status();
        let body = resp.json::<Value>().await.map_err(|e| {
            error!("Provider response parsing error: {}", e);
            ApiError::GatewayUnavailable(format!("Provider response error: {}", e))
        })?;

        if status.is_server_error() {
            return Err(ApiError::GatewayUnavailable(format!(
                "Provider returned {}",
                status
            )));
        }
        if !status.is_success() || !body["status"].as_bool().unwrap_or(false) {
            let message = body["message"]
                .as_str()
                .unwrap_or("Unknown provider error")
                .to_string();
            return Err(ApiError::GatewayRejected(message));
        }

        Ok(body)
    }
}
