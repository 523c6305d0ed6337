use anyhow::Context;
use chrono::NaiveDate;
use serde_with::DeserializeFromStr;

use std::{fmt::Display, str::FromStr};

/// The calendar date on which a sale was made.
///
/// Royalty exports write the purchase time either as a bare date
/// (`2021-01-04`) or as a UTC timestamp (`2021-01-04 09:12:33 UTC`). Only
/// the date part is significant for charting, so both forms parse to the
/// same [`PurchaseDate`].
#[derive(Clone, Copy, Debug, DeserializeFromStr, Eq, Ord, PartialEq, PartialOrd)]
pub struct PurchaseDate(pub NaiveDate);

impl FromStr for PurchaseDate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let date_part = s.split_whitespace().next().unwrap_or_default();
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .with_context(|| format!("invalid purchase date {s:?}"))?;
        Ok(Self(date))
    }
}

impl From<NaiveDate> for PurchaseDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Display for PurchaseDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_fn_parses_bare_date() {
        let date: PurchaseDate = "2021-01-04".parse().unwrap();
        assert_eq!(date.0, NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
    }

    #[test]
    fn from_str_fn_parses_utc_timestamp() {
        let date: PurchaseDate = "2021-01-04 09:12:33 UTC".parse().unwrap();
        assert_eq!(date.0, NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
    }

    #[test]
    fn from_str_fn_returns_error_for_bad_input() {
        assert!("not a date".parse::<PurchaseDate>().is_err());
        assert!("".parse::<PurchaseDate>().is_err());
        assert!("04/01/2021".parse::<PurchaseDate>().is_err());
    }

    #[test]
    fn display_shows_iso_date() {
        let date: PurchaseDate = "2021-01-04 09:12:33 UTC".parse().unwrap();
        assert_eq!(date.to_string(), "2021-01-04");
    }
}
