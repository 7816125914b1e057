use secrecy::Secret;
use std::env;
use std::time::Duration;

/// All runtime configuration, loaded once in `main` and injected through
/// `AppState`. Nothing in the engine reads environment variables directly.
#[derive(Clone)]
pub struct Settings {
    pub database_url: String,
    /// KoraPay merchant API base, e.g. https://api.korapay.com/merchant/api/v1
    pub kora_api_url: String,
    /// Secret key used both as the bearer token and the webhook HMAC secret.
    pub kora_secret_key: Secret<String>,
    /// Public base URL of this service, used for the webhook notification_url.
    pub base_url: String,
    /// Platform commission on client payments, in whole percent.
    pub commission_percentage: i64,
    /// Withdrawal bounds, in kobo.
    pub min_withdrawal_kobo: i64,
    pub max_withdrawal_kobo: i64,
    /// Window within which a repeated webhook for the same (reference, status)
    /// pair is treated as a duplicate delivery.
    pub webhook_dedup_window_secs: i64,
    /// Fixed timeout applied to every provider call.
    pub gateway_timeout: Duration,
    /// Bounded retry for transient failures of idempotent operations.
    pub retry_max_attempts: u32,
    pub retry_base_delay: Duration,
    /// Platform notification endpoint; notifications are logged only when unset.
    pub notification_url: Option<String>,
}

impl Settings {
    pub fn from_env() -> eyre::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| eyre::eyre!("DATABASE_URL must be set"))?;
        let kora_secret_key = env::var("KORA_SECRET_KEY")
            .map_err(|_| eyre::eyre!("KORA_SECRET_KEY must be set"))?;

        let commission_percentage = env_parse("COMMISSION_PERCENTAGE", 15)?;
        if !(0..=100).contains(&commission_percentage) {
            eyre::bail!("COMMISSION_PERCENTAGE must be between 0 and 100");
        }

        Ok(Settings {
            database_url,
            kora_api_url: env::var("KORA_API_URL")
                .unwrap_or_else(|_| "https://api.korapay.com/merchant/api/v1".to_string()),
            kora_secret_key: Secret::new(kora_secret_key),
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            commission_percentage,
            min_withdrawal_kobo: env_parse("MIN_WITHDRAWAL_KOBO", 10_000)?,
            max_withdrawal_kobo: env_parse("MAX_WITHDRAWAL_KOBO", 100_000_000)?,
            webhook_dedup_window_secs: env_parse("WEBHOOK_DEDUP_WINDOW_SECS", 60)?,
            gateway_timeout: Duration::from_secs(env_parse("GATEWAY_TIMEOUT_SECS", 30)? as u64),
            retry_max_attempts: env_parse("RETRY_MAX_ATTEMPTS", 3)? as u32,
            retry_base_delay: Duration::from_millis(env_parse("RETRY_BASE_DELAY_MS", 200)? as u64),
            notification_url: env::var("NOTIFICATION_URL").ok(),
        })
    }
}

fn env_parse(key: &str, default: i64) -> eyre::Result<i64> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| eyre::eyre!("Invalid {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
