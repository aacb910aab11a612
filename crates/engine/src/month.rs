//! Calendar month tokens (`YYYY-MM`).

use chrono::{Datelike, NaiveDate};

use crate::{EngineError, ResultEngine};

/// A calendar month, the bucket every monthly aggregate is computed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> ResultEngine<Self> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidMonth(format!(
                "month must be between 01 and 12, got {month:02}"
            )));
        }
        if !(1..=9999).contains(&year) {
            return Err(EngineError::InvalidMonth(format!(
                "year must have four digits, got {year}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Parse a strict `YYYY-MM` token.
    pub fn parse(token: &str) -> ResultEngine<Self> {
        let bytes = token.as_bytes();
        let well_formed = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(idx, b)| idx == 4 || b.is_ascii_digit());
        if !well_formed {
            return Err(EngineError::InvalidMonth(format!(
                "expected YYYY-MM, got '{token}'"
            )));
        }
        let year = token[..4]
            .parse()
            .map_err(|_| EngineError::InvalidMonth(token.to_string()))?;
        let month = token[5..]
            .parse()
            .map_err(|_| EngineError::InvalidMonth(token.to_string()))?;
        Self::new(year, month)
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Month of a stored `YYYY-MM-DD` date.
    pub fn of_date_str(date: &str) -> ResultEngine<Self> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
            EngineError::Validation(format!("invalid date '{date}', expected YYYY-MM-DD"))
        })?;
        Ok(Self::of(date))
    }

    /// The month immediately preceding the month `today` falls in.
    pub fn previous_of(today: NaiveDate) -> Self {
        Self::of(today).previous()
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// `LIKE` pattern matching the ISO dates of this month.
    pub(crate) fn date_pattern(self) -> String {
        format!("{self}-%")
    }

    /// Deterministic label of the synthetic balance entry, e.g. `"January 2026 balance"`.
    pub fn balance_label(self) -> String {
        format!("{} balance", self.first_day().format("%B %Y"))
    }
}

impl core::fmt::Display for Month {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl core::str::FromStr for Month {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Month {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_strict_tokens() {
        let month = Month::parse("2026-01").unwrap();
        assert_eq!((month.year(), month.month()), (2026, 1));
        assert_eq!(month.to_string(), "2026-01");
    }

    #[test]
    fn parse_rejects_malformed_tokens() {
        for token in ["2026-1", "26-01", "2026/01", "2026-13", "2026-00", "2026-01-01", "abcd-ef"] {
            assert!(
                matches!(Month::parse(token), Err(EngineError::InvalidMonth(_))),
                "{token} should be rejected"
            );
        }
    }

    #[test]
    fn previous_and_next_cross_years() {
        let january = Month::parse("2026-01").unwrap();
        assert_eq!(january.previous().to_string(), "2025-12");
        assert_eq!(january.previous().next(), january);

        let today = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert_eq!(Month::previous_of(today).to_string(), "2026-02");
    }

    #[test]
    fn balance_label_uses_month_name() {
        let month = Month::parse("2026-01").unwrap();
        assert_eq!(month.balance_label(), "January 2026 balance");
        assert_eq!(month.date_pattern(), "2026-01-%");
    }
}
