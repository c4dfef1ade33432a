//! Admin route handlers
//!
//! Everything here sits behind [`crate::middleware::admin_middleware`].

pub mod academies;
pub mod contact;
pub mod highlights;
pub mod matches;
pub mod players;
pub mod stats;
pub mod tournaments;
pub mod uploads;
pub mod users;

use chrono::NaiveDate;

use crate::error::AppError;

/// Dates travel as `YYYY-MM-DD`.
pub(crate) fn check_date(raw: &str) -> Result<(), AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| AppError::bad_request("INVALID_DATE", "Dates must use the YYYY-MM-DD format"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_date() {
        assert!(check_date("2008-02-29").is_ok());
        assert!(check_date("2007-02-29").is_err());
        assert!(check_date("12/05/2008").is_err());
    }
}
