use crate::error::ApiError;
use crate::models::entities::{
    NewWallet, NewWalletTransaction, TransactionStatus, TransactionType, Wallet,
    WalletTransaction,
};
use crate::schema::{wallet_transactions, wallets};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::Value as JsonValue;
use tracing::{info, warn};
use uuid::Uuid;

/// Reference prefix for the compensating credit written by `reverse`.
pub const REVERSAL_PREFIX: &str = "REF_";

/// Outcome of an atomic ledger operation. `applied` is false when the
/// (wallet, reference, type) entry already existed and the call was a no-op.
#[derive(Debug)]
pub struct LedgerEntry {
    pub transaction_id: Uuid,
    pub wallet_id: Uuid,
    pub balance_after: i64,
    pub applied: bool,
}

/// The only component allowed to mutate `wallets.balance`. Every mutation
/// locks the wallet row (`SELECT ... FOR UPDATE`) and writes the new balance
/// together with its ledger entry in one database transaction, so concurrent
/// credits and debits on the same wallet serialize without lost updates.
pub struct LedgerService;

impl LedgerService {
    /// Returns the runner's wallet, creating it with a zero balance on first
    /// use. A concurrent first call losing the insert race still observes
    /// the winner's row.
    pub fn get_or_create_wallet(
        conn: &mut PgConnection,
        runner_id: Uuid,
    ) -> Result<Wallet, ApiError> {
        diesel::insert_into(wallets::table)
            .values(NewWallet {
                id: Uuid::new_v4(),
                runner_id,
                balance: 0,
                currency: "NGN".to_string(),
                is_active: true,
            })
            .on_conflict(wallets::runner_id)
            .do_nothing()
            .execute(conn)
            .map_err(ApiError::from)?;

        wallets::table
            .filter(wallets::runner_id.eq(runner_id))
            .select(Wallet::as_select())
            .first(conn)
            .map_err(ApiError::from)
    }

    pub fn credit(
        conn: &mut PgConnection,
        wallet_id: Uuid,
        amount: i64,
        reference: &str,
        description: Option<String>,
        metadata: Option<JsonValue>,
    ) -> Result<LedgerEntry, ApiError> {
        Self::apply(
            conn,
            wallet_id,
            amount,
            TransactionType::Credit,
            TransactionStatus::Completed,
            reference,
            description,
            metadata,
        )
    }

    /// `status` is `Pending` for withdrawal holds awaiting provider
    /// confirmation and `Completed` for settled debits.
    pub fn debit(
        conn: &mut PgConnection,
        wallet_id: Uuid,
        amount: i64,
        status: TransactionStatus,
        reference: &str,
        description: Option<String>,
        metadata: Option<JsonValue>,
    ) -> Result<LedgerEntry, ApiError> {
        Self::apply(
            conn,
            wallet_id,
            amount,
            TransactionType::Debit,
            status,
            reference,
            description,
            metadata,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn apply(
        conn: &mut PgConnection,
        wallet_id: Uuid,
        amount: i64,
        transaction_type: TransactionType,
        status: TransactionStatus,
        reference: &str,
        description: Option<String>,
        metadata: Option<JsonValue>,
    ) -> Result<LedgerEntry, ApiError> {
        if amount <= 0 {
            return Err(ApiError::InvalidAmount(format!(
                "ledger amounts must be positive, got {} kobo",
                amount
            )));
        }

        let result = conn.transaction::<LedgerEntry, ApiError, _>(|conn| {
            let wallet: Wallet = wallets::table
                .find(wallet_id)
                .for_update()
                .select(Wallet::as_select())
                .first(conn)
                .map_err(ApiError::from)?;

            let new_balance = match transaction_type {
                TransactionType::Credit => wallet.balance + amount,
                TransactionType::Debit => {
                    if wallet.balance < amount {
                        return Err(ApiError::InsufficientFunds {
                            available: wallet.balance,
                            requested: amount,
                        });
                    }
                    wallet.balance - amount
                }
            };

            let transaction_id = diesel::insert_into(wallet_transactions::table)
                .values(NewWalletTransaction {
                    id: Uuid::new_v4(),
                    wallet_id,
                    amount,
                    transaction_type: transaction_type.as_str().to_string(),
                    status: status.as_str().to_string(),
                    reference: reference.to_string(),
                    balance_before: wallet.balance,
                    balance_after: new_balance,
                    description,
                    metadata,
                })
                .returning(wallet_transactions::id)
                .get_result::<Uuid>(conn)
                .map_err(ApiError::from)?;

            let now = Utc::now();
            diesel::update(wallets::table.find(wallet_id))
                .set((
                    wallets::balance.eq(new_balance),
                    wallets::last_transaction_at.eq(now),
                    wallets::updated_at.eq(now),
                ))
                .execute(conn)
                .map_err(ApiError::from)?;

            Ok(LedgerEntry {
                transaction_id,
                wallet_id,
                balance_after: new_balance,
                applied: true,
            })
        });

        match result {
            Err(ApiError::Database(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _,
            ))) => {
                // The (wallet, reference, type) entry already exists: a
                // concurrent delivery won the race. Report the recorded
                // entry instead of applying a second effect.
                info!(
                    "Ledger entry already recorded: wallet_id={}, reference={}, type={}",
                    wallet_id, reference, transaction_type
                );
                let existing = Self::find_entry(conn, wallet_id, reference, transaction_type)?;
                Ok(LedgerEntry {
                    transaction_id: existing.id,
                    wallet_id,
                    balance_after: existing.balance_after,
                    applied: false,
                })
            }
            other => other,
        }
    }

    /// Compensates a prior debit: credits the same amount back under a
    /// reversal reference linked to the original, and marks the original
    /// debit leg failed. Used only after a definitively failed disbursement.
    pub fn reverse(conn: &mut PgConnection, reference: &str) -> Result<LedgerEntry, ApiError> {
        let original = Self::find_debit(conn, reference)?;
        let reversal_reference = format!("{}{}", REVERSAL_PREFIX, reference);

        // One transaction: the original leg is never left marked failed
        // without its compensating credit.
        let entry = conn.transaction::<LedgerEntry, ApiError, _>(|conn| {
            diesel::update(wallet_transactions::table.find(original.id))
                .set((
                    wallet_transactions::status.eq(TransactionStatus::Failed.as_str()),
                    wallet_transactions::updated_at.eq(Utc::now()),
                ))
                .execute(conn)
                .map_err(ApiError::from)?;

            Self::credit(
                conn,
                original.wallet_id,
                original.amount,
                &reversal_reference,
                Some(format!("Reversal of failed payout {}", reference)),
                Some(serde_json::json!({
                    "original_reference": reference,
                    "original_transaction_id": original.id,
                    "reason": "payout_failed",
                })),
            )
        })?;

        if entry.applied {
            info!(
                "Reversed debit {}: credited {} kobo back to wallet {}",
                reference, original.amount, original.wallet_id
            );
        } else {
            warn!("Reversal for {} was already recorded, no new effect", reference);
        }
        Ok(entry)
    }

    /// Transitions a pending leg once the provider confirms the outcome.
    pub fn mark_transaction_status(
        conn: &mut PgConnection,
        reference: &str,
        transaction_type: TransactionType,
        status: TransactionStatus,
    ) -> Result<(), ApiError> {
        diesel::update(
            wallet_transactions::table
                .filter(wallet_transactions::reference.eq(reference))
                .filter(wallet_transactions::transaction_type.eq(transaction_type.as_str())),
        )
        .set((
            wallet_transactions::status.eq(status.as_str()),
            wallet_transactions::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
        .map_err(ApiError::from)?;
        Ok(())
    }

    pub fn find_debit(
        conn: &mut PgConnection,
        reference: &str,
    ) -> Result<WalletTransaction, ApiError> {
        wallet_transactions::table
            .filter(wallet_transactions::reference.eq(reference))
            .filter(wallet_transactions::transaction_type.eq(TransactionType::Debit.as_str()))
            .select(WalletTransaction::as_select())
            .first(conn)
            .optional()
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::UnknownPayment(reference.to_string()))
    }

    fn find_entry(
        conn: &mut PgConnection,
        wallet_id: Uuid,
        reference: &str,
        transaction_type: TransactionType,
    ) -> Result<WalletTransaction, ApiError> {
        wallet_transactions::table
            .filter(wallet_transactions::wallet_id.eq(wallet_id))
            .filter(wallet_transactions::reference.eq(reference))
            .filter(wallet_transactions::transaction_type.eq(transaction_type.as_str()))
            .select(WalletTransaction::as_select())
            .first(conn)
            .map_err(ApiError::from)
    }
}
