use crate::error::CoreError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A single ecommerce order as loaded from the source table.
///
/// Rows are immutable once loaded; every report is derived afresh from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRow {
    pub order_date: NaiveDate,
    pub category: String,
    pub revenue: Decimal,
    pub customer_id: String,
}

impl OrderRow {
    pub fn new(
        order_date: NaiveDate,
        category: impl Into<String>,
        revenue: Decimal,
        customer_id: impl Into<String>,
    ) -> Self {
        Self {
            order_date,
            category: category.into(),
            revenue,
            customer_id: customer_id.into(),
        }
    }

    /// The calendar month this order falls into.
    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.order_date)
    }
}

/// The user's current selection: an inclusive date range and a set of categories.
///
/// An empty category set matches nothing. "All categories" is expressed by
/// passing the full category list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub categories: BTreeSet<String>,
}

impl FilterSpec {
    /// Builds a validated filter. Fails with `CoreError::InvalidRange` if `start > end`.
    pub fn new<I, S>(start_date: NaiveDate, end_date: NaiveDate, categories: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = Self {
            start_date,
            end_date,
            categories: categories.into_iter().map(Into::into).collect(),
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Checks the range invariant. Fields are public, so callers that build a
    /// filter by hand (or deserialize one) go through here before filtering.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.start_date > self.end_date {
            return Err(CoreError::InvalidRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// The row predicate: date within the inclusive range and category selected.
    pub fn matches(&self, row: &OrderRow) -> bool {
        row.order_date >= self.start_date
            && row.order_date <= self.end_date
            && self.categories.contains(&row.category)
    }
}

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidInput(
                "month".to_string(),
                format!("{month} is not between 1 and 12"),
            ));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The first day of the month.
    pub fn first_day(&self) -> NaiveDate {
        // Construction guarantees 1..=12, so day 1 always exists.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Human-readable label used in prose, e.g. "Feb 2024".
    pub fn label(&self) -> String {
        self.first_day().format("%b %Y").to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidInput("month".to_string(), format!("'{s}' is not YYYY-MM"));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn filter_rejects_inverted_range() {
        let err = FilterSpec::new(date(2024, 3, 1), date(2024, 2, 1), ["Books"]).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidRange {
                start: date(2024, 3, 1),
                end: date(2024, 2, 1)
            }
        );
    }

    #[test]
    fn filter_accepts_single_day_range() {
        let spec = FilterSpec::new(date(2024, 3, 1), date(2024, 3, 1), ["Books"]).unwrap();
        let row = OrderRow::new(date(2024, 3, 1), "Books", dec!(10), "C1");
        assert!(spec.matches(&row));
    }

    #[test]
    fn filter_bounds_are_inclusive() {
        let spec = FilterSpec::new(date(2024, 1, 1), date(2024, 1, 31), ["Books"]).unwrap();
        assert!(spec.matches(&OrderRow::new(date(2024, 1, 1), "Books", dec!(1), "C1")));
        assert!(spec.matches(&OrderRow::new(date(2024, 1, 31), "Books", dec!(1), "C1")));
        assert!(!spec.matches(&OrderRow::new(date(2024, 2, 1), "Books", dec!(1), "C1")));
        assert!(!spec.matches(&OrderRow::new(date(2023, 12, 31), "Books", dec!(1), "C1")));
    }

    #[test]
    fn empty_category_set_matches_nothing() {
        let spec = FilterSpec::new(date(2024, 1, 1), date(2024, 12, 31), Vec::<String>::new()).unwrap();
        assert!(!spec.matches(&OrderRow::new(date(2024, 6, 1), "Books", dec!(1), "C1")));
    }

    #[test]
    fn year_month_orders_chronologically() {
        let dec_2023 = YearMonth::new(2023, 12).unwrap();
        let jan_2024 = YearMonth::new(2024, 1).unwrap();
        assert!(dec_2023 < jan_2024);
    }

    #[test]
    fn year_month_formats() {
        let ym = YearMonth::from_date(date(2024, 2, 15));
        assert_eq!(ym.to_string(), "2024-02");
        assert_eq!(ym.label(), "Feb 2024");
        assert_eq!("2024-02".parse::<YearMonth>().unwrap(), ym);
    }

    #[test]
    fn year_month_rejects_bad_month() {
        assert!(YearMonth::new(2024, 13).is_err());
        assert!("2024-00".parse::<YearMonth>().is_err());
        assert!("202402".parse::<YearMonth>().is_err());
    }

    #[test]
    fn year_month_serializes_as_string() {
        let ym = YearMonth::new(2024, 1).unwrap();
        assert_eq!(serde_json::to_string(&ym).unwrap(), "\"2024-01\"");
        let back: YearMonth = serde_json::from_str("\"2024-01\"").unwrap();
        assert_eq!(back, ym);
    }
}
