use crate::error::ApiError;
use crate::models::dtos::{AddBankDetailsRequest, BankDetailsResponse};
use crate::models::entities::{NewRunnerBankDetails, RunnerBankDetails, User};
use crate::models::AppState;
use crate::schema::{runner_bank_details, users};
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Payout-destination management: every stored account is resolved against
/// the provider before it becomes eligible for withdrawals.
pub struct BankService;

impl BankService {
    pub async fn add_bank_details(
        state: Arc<AppState>,
        runner_id: Uuid,
        req: AddBankDetailsRequest,
    ) -> Result<BankDetailsResponse, ApiError> {
        info!(
            "Add bank details: runner_id={}, bank_code={}, account_number={}",
            runner_id, req.bank_code, req.account_number
        );

        let conn = &mut state.db.get()?;
        let runner: Option<User> = users::table
            .find(runner_id)
            .select(User::as_select())
            .first(conn)
            .optional()?;
        match runner {
            Some(user) if user.is_runner() => {}
            _ => {
                return Err(ApiError::NotFound(format!(
                    "User {} is not a runner or does not exist",
                    runner_id
                )))
            }
        }

        // Resolution doubles as verification; an unresolvable account is
        // never stored.
        let account_name = state
            .gateway
            .resolve_bank_account(&req.bank_code, &req.account_number)
            .await?;
        debug!("Resolved account name: {}", account_name);

        let now = Utc::now();
        let details: RunnerBankDetails = diesel::insert_into(runner_bank_details::table)
            .values(NewRunnerBankDetails {
                id: Uuid::new_v4(),
                runner_id,
                bank_code: req.bank_code,
                account_number: req.account_number,
                account_name: account_name.clone(),
                bank_name: req.bank_name,
                is_verified: true,
                is_active: true,
                verification_date: Some(now),
            })
            .on_conflict((
                runner_bank_details::runner_id,
                runner_bank_details::bank_code,
                runner_bank_details::account_number,
            ))
            .do_update()
            .set((
                runner_bank_details::account_name.eq(&account_name),
                runner_bank_details::is_verified.eq(true),
                runner_bank_details::is_active.eq(true),
                runner_bank_details::verification_date.eq(now),
                runner_bank_details::updated_at.eq(now),
            ))
            .returning(RunnerBankDetails::as_returning())
            .get_result(conn)?;

        Ok(Self::to_response(details))
    }

    pub fn runner_bank_details(
        state: &AppState,
        runner_id: Uuid,
    ) -> Result<Vec<BankDetailsResponse>, ApiError> {
        let conn = &mut state.db.get()?;
        let rows: Vec<RunnerBankDetails> = runner_bank_details::table
            .filter(runner_bank_details::runner_id.eq(runner_id))
            .filter(runner_bank_details::is_active.eq(true))
            .order(runner_bank_details::created_at.desc())
            .select(RunnerBankDetails::as_select())
            .load(conn)?;

        Ok(rows.into_iter().map(Self::to_response).collect())
    }

    fn to_response(details: RunnerBankDetails) -> BankDetailsResponse {
        BankDetailsResponse {
            id: details.id,
            bank_code: details.bank_code,
            account_number: details.account_number,
            account_name: details.account_name,
            bank_name: details.bank_name,
            is_verified: details.is_verified,
        }
    }
}
