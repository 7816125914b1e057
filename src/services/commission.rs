use crate::error::ApiError;

/// Result of splitting a gross payment into the platform's cut and the
/// amount credited to the runner. Both values are kobo and always sum back
/// to the input exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionSplit {
    pub commission_kobo: i64,
    pub net_kobo: i64,
}

/// Pure commission split. Commission is `total * rate / 100` rounded
/// half-up to the nearest kobo; the net amount is derived by subtraction so
/// no rounding leaks between the two legs.
pub fn calculate_commission(total_kobo: i64, rate_percent: i64) -> Result<CommissionSplit, ApiError> {
    if total_kobo <= 0 {
        return Err(ApiError::InvalidAmount(format!(
            "amount must be positive, got {} kobo",
            total_kobo
        )));
    }
    if !(0..=100).contains(&rate_percent) {
        return Err(ApiError::Internal(format!(
            "commission rate out of range: {}",
            rate_percent
        )));
    }

    let commission_kobo = (total_kobo * rate_percent + 50) / 100;
    Ok(CommissionSplit {
        commission_kobo,
        net_kobo: total_kobo - commission_kobo,
    })
}
