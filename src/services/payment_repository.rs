use crate::error::ApiError;
use crate::models::entities::{NewPayment, Payment, PaymentStatus};
use crate::schema::payments;
use chrono::Utc;
use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

/// CRUD over payment intent rows. No business logic beyond the monotonic
/// status-transition guard.
pub struct PaymentRepository;

impl PaymentRepository {
    pub fn create(conn: &mut PgConnection, new_payment: NewPayment) -> Result<Payment, ApiError> {
        diesel::insert_into(payments::table)
            .values(&new_payment)
            .returning(Payment::as_returning())
            .get_result(conn)
            .map_err(ApiError::from)
    }

    pub fn find_by_reference(conn: &mut PgConnection, reference: &str) -> Result<Payment, ApiError> {
        Self::try_find_by_reference(conn, reference)?
            .ok_or_else(|| ApiError::UnknownPayment(reference.to_string()))
    }

    pub fn try_find_by_reference(
        conn: &mut PgConnection,
        reference: &str,
    ) -> Result<Option<Payment>, ApiError> {
        payments::table
            .filter(payments::reference.eq(reference))
            .select(Payment::as_select())
            .first(conn)
            .optional()
            .map_err(ApiError::from)
    }

    /// Applies a status transition if the state machine allows it. Terminal
    /// states are sticky except Paid -> Refunded; a disallowed transition is
    /// logged and the stored row returned unchanged.
    pub fn update_status(
        conn: &mut PgConnection,
        reference: &str,
        next: PaymentStatus,
    ) -> Result<Payment, ApiError> {
        let payment = Self::find_by_reference(conn, reference)?;
        let current = payment.status();

        if current == next {
            return Ok(payment);
        }
        if !current.can_transition_to(next) {
            warn!(
                "Refusing payment status transition {} -> {} for reference {}",
                current, next, reference
            );
            return Ok(payment);
        }

        diesel::update(payments::table.filter(payments::reference.eq(reference)))
            .set((
                payments::payment_status.eq(next.as_str()),
                payments::updated_at.eq(Utc::now()),
            ))
            .returning(Payment::as_returning())
            .get_result(conn)
            .map_err(ApiError::from)
    }

    pub fn set_transaction_id(
        conn: &mut PgConnection,
        reference: &str,
        transaction_id: &str,
    ) -> Result<(), ApiError> {
        diesel::update(payments::table.filter(payments::reference.eq(reference)))
            .set((
                payments::transaction_id.eq(transaction_id),
                payments::updated_at.eq(Utc::now()),
            ))
            .execute(conn)
            .map_err(ApiError::from)?;
        Ok(())
    }

    /// History for the excluded CRUD surface: payments made by a client or
    /// received by a runner, newest first.
    pub fn history(
        conn: &mut PgConnection,
        user_id: Uuid,
        as_receiver: bool,
        status: Option<PaymentStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>, ApiError> {
        let mut query = payments::table.into_boxed();
        if as_receiver {
            query = query.filter(payments::receiver_id.eq(user_id));
        } else {
            query = query.filter(payments::payer_id.eq(user_id));
        }
        if let Some(status) = status {
            query = query.filter(payments::payment_status.eq(status.as_str()));
        }

        query
            .order(payments::created_at.desc())
            .limit(limit.clamp(1, 100))
            .offset(offset.max(0))
            .select(Payment::as_select())
            .load(conn)
            .map_err(ApiError::from)
    }
}
