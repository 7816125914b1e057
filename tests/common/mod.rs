use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use dotenvy::dotenv;
use errandpay::config::Settings;
use errandpay::models::AppState;
use errandpay::schema::{payments, runner_bank_details, users, wallet_transactions, wallets};
use secrecy::Secret;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub const TEST_WEBHOOK_SECRET: &str = "test_kora_secret_key";

/// Settings pointing the gateway at a wiremock server. Short timeouts and a
/// single retry attempt keep failure-path tests fast.
pub fn test_settings(gateway_url: &str) -> Settings {
    Settings {
        database_url: "unused".to_string(),
        kora_api_url: gateway_url.to_string(),
        kora_secret_key: Secret::new(TEST_WEBHOOK_SECRET.to_string()),
        base_url: "http://localhost:3000".to_string(),
        commission_percentage: 15,
        min_withdrawal_kobo: 10_000,
        max_withdrawal_kobo: 100_000_000,
        webhook_dedup_window_secs: 60,
        gateway_timeout: Duration::from_secs(5),
        retry_max_attempts: 2,
        retry_base_delay: Duration::from_millis(10),
        notification_url: None,
    }
}

/// Pool against TEST_DATABASE_URL (or DATABASE_URL). Returns None when no
/// reachable database is configured so database-backed tests skip instead of
/// failing on machines without Postgres.
pub fn try_test_pool() -> Option<DbPool> {
    dotenv().ok();
    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;

    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder().max_size(5).build(manager).ok()?;

    {
        let conn = &mut pool.get().ok()?;
        run_migrations(conn);
    }
    Some(pool)
}

pub fn run_migrations(conn: &mut PgConnection) {
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
    const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");
}

pub fn test_state(pool: DbPool, gateway_url: &str) -> Arc<AppState> {
    Arc::new(AppState::new(pool, test_settings(gateway_url)))
}

/// AppState whose pool only fails when a connection is actually requested;
/// for tests that never touch the database.
pub fn test_state_without_db(gateway_url: &str) -> Arc<AppState> {
    let pool = Pool::builder()
        .max_size(1)
        .build_unchecked(ConnectionManager::<PgConnection>::new("postgres://invalid"));
    test_state(pool, gateway_url)
}

pub fn insert_user(conn: &mut PgConnection, role: &str) -> Uuid {
    let user_id = Uuid::new_v4();
    diesel::insert_into(users::table)
        .values((
            users::id.eq(user_id),
            users::email.eq(format!("test_{}@example.com", user_id)),
            users::full_name.eq("Test User"),
            users::role.eq(role),
        ))
        .execute(conn)
        .unwrap();
    user_id
}

pub fn insert_bank_details(conn: &mut PgConnection, runner_id: Uuid) -> Uuid {
    let bank_details_id = Uuid::new_v4();
    diesel::insert_into(runner_bank_details::table)
        .values((
            runner_bank_details::id.eq(bank_details_id),
            runner_bank_details::runner_id.eq(runner_id),
            runner_bank_details::bank_code.eq("058"),
            runner_bank_details::account_number.eq("0123456789"),
            runner_bank_details::account_name.eq("Test Runner"),
            runner_bank_details::bank_name.eq("Test Bank"),
            runner_bank_details::is_verified.eq(true),
            runner_bank_details::is_active.eq(true),
        ))
        .execute(conn)
        .unwrap();
    bank_details_id
}

/// Removes everything the test inserted for a user, child rows first.
pub fn cleanup_user(conn: &mut PgConnection, user_id: Uuid) {
    let wallet_ids: Vec<Uuid> = wallets::table
        .filter(wallets::runner_id.eq(user_id))
        .select(wallets::id)
        .load(conn)
        .unwrap_or_default();
    if !wallet_ids.is_empty() {
        diesel::delete(
            wallet_transactions::table.filter(wallet_transactions::wallet_id.eq_any(&wallet_ids)),
        )
        .execute(conn)
        .unwrap();
    }
    diesel::delete(
        payments::table.filter(
            payments::payer_id
                .eq(user_id)
                .or(payments::receiver_id.eq(user_id)),
        ),
    )
    .execute(conn)
    .unwrap();
    diesel::delete(runner_bank_details::table.filter(runner_bank_details::runner_id.eq(user_id)))
        .execute(conn)
        .unwrap();
    diesel::delete(wallets::table.filter(wallets::runner_id.eq(user_id)))
        .execute(conn)
        .unwrap();
    diesel::delete(users::table.filter(users::id.eq(user_id)))
        .execute(conn)
        .unwrap();
}
