use validator::ValidationError;

/// Convert a user-facing naira amount to kobo, the integer minor unit all
/// engine arithmetic uses.
pub fn naira_to_kobo(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn kobo_to_naira(amount: i64) -> f64 {
    amount as f64 / 100.0
}

pub fn validate_bank_code(code: &str) -> Result<(), ValidationError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("Bank code must be 3 digits"))
    }
}

pub fn validate_account_number(number: &str) -> Result<(), ValidationError> {
    if number.len() == 10 && number.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("Account number must be 10 digits"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naira_kobo_round_trips() {
        assert_eq!(naira_to_kobo(10.99), 1099);
        assert_eq!(naira_to_kobo(0.01), 1);
        assert_eq!(naira_to_kobo(1000.0), 100_000);
        assert_eq!(kobo_to_naira(85_000), 850.0);
    }

    #[test]
    fn bank_code_must_be_three_digits() {
        assert!(validate_bank_code("058").is_ok());
        assert!(validate_bank_code("58").is_err());
        assert!(validate_bank_code("05a").is_err());
        assert!(validate_bank_code("0588").is_err());
    }

    #[test]
    fn account_number_must_be_ten_digits() {
        assert!(validate_account_number("0123456789").is_ok());
        assert!(validate_account_number("012345678").is_err());
        assert!(validate_account_number("01234567x9").is_err());
    }
}
