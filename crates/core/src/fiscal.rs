//! April–March fiscal years.
//!
//! Every component that needs a fiscal year (voucher numbering, report defaults)
//! goes through [`FiscalYear::containing`], so the boundary is computed in one place.

use core::fmt;
use core::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// First month (1-based) of the fiscal year.
const FIRST_MONTH: u32 = 4;

/// A fiscal year running April 1 through March 31, labelled `"2025-26"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FiscalYear {
    start_year: i32,
}

impl FiscalYear {
    /// Fiscal year that begins on April 1 of `start_year`.
    pub fn starting(start_year: i32) -> Self {
        Self { start_year }
    }

    /// Fiscal year a date falls in: April onwards belongs to `Y-(Y+1)`,
    /// January to March belongs to `(Y-1)-Y`.
    pub fn containing(date: NaiveDate) -> Self {
        let year = date.year();
        if date.month() >= FIRST_MONTH {
            Self::starting(year)
        } else {
            Self::starting(year - 1)
        }
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// April 1 of the start year.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.start_year, FIRST_MONTH, 1)
    }

    /// March 31 of the following year.
    pub fn last_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.start_year + 1, FIRST_MONTH - 1, 31)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::containing(date) == *self
    }

    pub fn next(&self) -> Self {
        Self::starting(self.start_year + 1)
    }

    pub fn previous(&self) -> Self {
        Self::starting(self.start_year - 1)
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = (self.start_year + 1).rem_euclid(100);
        write!(f, "{}-{:02}", self.start_year, end)
    }
}

impl FromStr for FiscalYear {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| DomainError::validation(format!("fiscal year '{s}' is not YYYY-YY")))?;
        let start_year: i32 = start
            .parse()
            .map_err(|_| DomainError::validation(format!("fiscal year '{s}' has a bad start year")))?;
        let end_year: i32 = end
            .parse()
            .map_err(|_| DomainError::validation(format!("fiscal year '{s}' has a bad end year")))?;

        if end.len() != 2 || end_year != (start_year + 1).rem_euclid(100) {
            return Err(DomainError::validation(format!(
                "fiscal year '{s}' must span consecutive years"
            )));
        }
        Ok(Self::starting(start_year))
    }
}

impl TryFrom<String> for FiscalYear {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FiscalYear> for String {
    fn from(value: FiscalYear) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn march_31_belongs_to_previous_year() {
        assert_eq!(FiscalYear::containing(date(2025, 3, 31)).to_string(), "2024-25");
    }

    #[test]
    fn april_1_starts_new_year() {
        assert_eq!(FiscalYear::containing(date(2025, 4, 1)).to_string(), "2025-26");
    }

    #[test]
    fn january_is_in_the_year_that_started_last_april() {
        assert_eq!(FiscalYear::containing(date(2026, 1, 15)).to_string(), "2025-26");
    }

    #[test]
    fn century_rollover_label_is_zero_padded() {
        assert_eq!(FiscalYear::starting(1999).to_string(), "1999-00");
        assert_eq!("1999-00".parse::<FiscalYear>().unwrap(), FiscalYear::starting(1999));
    }

    #[test]
    fn parse_rejects_non_consecutive_years() {
        assert!("2025-27".parse::<FiscalYear>().is_err());
        assert!("2025".parse::<FiscalYear>().is_err());
        assert!("2025-2026".parse::<FiscalYear>().is_err());
    }

    #[test]
    fn bounds_cover_april_through_march() {
        let fy = FiscalYear::starting(2025);
        assert_eq!(fy.first_day(), Some(date(2025, 4, 1)));
        assert_eq!(fy.last_day(), Some(date(2026, 3, 31)));
    }

    proptest! {
        #[test]
        fn every_day_is_inside_its_own_fiscal_year(days in 0i64..40_000) {
            let day = date(1970, 1, 1) + chrono::Duration::days(days);
            let fy = FiscalYear::containing(day);
            let first = fy.first_day().unwrap();
            let last = fy.last_day().unwrap();
            prop_assert!(first <= day && day <= last);
            prop_assert_eq!(fy.to_string().parse::<FiscalYear>().unwrap(), fy);
        }
    }
}
