use crate::config::Settings;
use crate::services::gateway_client::KoraClient;
use crate::services::notification_service::Notifier;
use crate::services::settlement_service::RetryPolicy;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub settings: Settings,
    pub gateway: KoraClient,
    pub notifier: Notifier,
    pub retry_policy: RetryPolicy,
}

impl AppState {
    pub fn new(db: DbPool, settings: Settings) -> Self {
        let gateway = KoraClient::new(&settings);
        let notifier = Notifier::new(settings.notification_url.clone());
        let retry_policy = RetryPolicy::new(settings.retry_max_attempts, settings.retry_base_delay);
        AppState {
            db,
            settings,
            gateway,
            notifier,
            retry_policy,
        }
    }
}
