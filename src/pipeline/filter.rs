//! Filter Module
//! Country / category / date range selection over the transactions table.

use crate::data::columns;
use crate::pipeline::PipelineError;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days between 0001-01-01 (CE day 1) and the Unix epoch, as used by Polars dates.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Inclusive date range. An unset bound is open-ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// End before start.
    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if end < start)
    }

    /// Same range with an inverted pair of bounds swapped.
    pub fn normalized(self) -> Self {
        if self.is_inverted() {
            Self::new(self.end, self.start)
        } else {
            self
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let range = self.normalized();
        range.start.map_or(true, |start| date >= start) && range.end.map_or(true, |end| date <= end)
    }
}

/// The user's current selection. The default selects every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub country: Option<String>,
    pub category: Option<String>,
    pub date_range: DateRange,
}

impl FilterSpec {
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = date_range;
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        self.country.is_none() && self.category.is_none() && self.date_range.is_unbounded()
    }

    /// Conjunction of the set predicates, or `None` when nothing is set.
    fn predicate(&self) -> Option<Expr> {
        let range = self.date_range.normalized();

        let mut predicates = Vec::new();
        if let Some(country) = &self.country {
            predicates.push(col(columns::COUNTRY).eq(lit(country.as_str())));
        }
        if let Some(category) = &self.category {
            predicates.push(col(columns::CATEGORY).eq(lit(category.as_str())));
        }
        if let Some(start) = range.start {
            predicates.push(col(columns::ORDER_DATE).gt_eq(lit(start)));
        }
        if let Some(end) = range.end {
            predicates.push(col(columns::ORDER_DATE).lt_eq(lit(end)));
        }

        predicates.into_iter().reduce(|acc, p| acc.and(p))
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = self.date_range.normalized();
        let bound = |d: Option<NaiveDate>| d.map_or_else(|| "…".to_string(), |d| d.to_string());
        write!(
            f,
            "Country: {} | Category: {} | Period: {} to {}",
            self.country.as_deref().unwrap_or("All"),
            self.category.as_deref().unwrap_or("All"),
            bound(range.start),
            bound(range.end),
        )
    }
}

/// Rows of `transactions` matching `spec`, in input order.
pub fn apply_filter(transactions: &DataFrame, spec: &FilterSpec) -> Result<DataFrame, PipelineError> {
    let Some(predicate) = spec.predicate() else {
        return Ok(transactions.clone());
    };

    let filtered = transactions.clone().lazy().filter(predicate).collect()?;
    Ok(filtered)
}

/// Values offered by the filter selectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub countries: Vec<String>,
    pub categories: Vec<String>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl FilterOptions {
    pub fn from_transactions(transactions: &DataFrame) -> Result<Self, PipelineError> {
        let days = transactions
            .column(columns::ORDER_DATE)?
            .cast(&DataType::Int32)?;
        let days = days.i32()?;

        Ok(Self {
            countries: Self::distinct_sorted(transactions, columns::COUNTRY)?,
            categories: Self::distinct_sorted(transactions, columns::CATEGORY)?,
            first_date: days.min().and_then(date_from_epoch_days),
            last_date: days.max().and_then(date_from_epoch_days),
        })
    }

    /// Full data range, used as the default date selection.
    pub fn full_range(&self) -> DateRange {
        DateRange::new(self.first_date, self.last_date)
    }

    fn distinct_sorted(df: &DataFrame, column: &str) -> Result<Vec<String>, PipelineError> {
        let values = df.column(column)?.cast(&DataType::String)?;
        let mut distinct: Vec<String> = values
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        distinct.sort();
        distinct.dedup();
        Ok(distinct)
    }
}

/// Convert a Polars physical date (days since 1970-01-01).
pub fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_frame;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ids(df: &DataFrame) -> Vec<String> {
        df.column(columns::TRANSACTION_ID)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn default_spec_keeps_every_row() {
        let df = sample_frame();
        let filtered = apply_filter(&df, &FilterSpec::default()).unwrap();
        assert_eq!(ids(&filtered), vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn country_filter_preserves_row_order() {
        let df = sample_frame();
        let filtered = apply_filter(&df, &FilterSpec::default().with_country("FR")).unwrap();
        assert_eq!(ids(&filtered), vec!["T1", "T2"]);
    }

    #[test]
    fn predicates_are_combined_with_and() {
        let df = sample_frame();
        let spec = FilterSpec::default()
            .with_country("FR")
            .with_category("Electronics");
        assert_eq!(ids(&apply_filter(&df, &spec).unwrap()), vec!["T1"]);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let df = sample_frame();
        let spec = FilterSpec::default()
            .with_date_range(DateRange::between(date(2024, 1, 5), date(2024, 1, 20)));
        assert_eq!(ids(&apply_filter(&df, &spec).unwrap()), vec!["T1", "T3"]);
    }

    #[test]
    fn open_ended_range_uses_single_bound() {
        let df = sample_frame();
        let spec = FilterSpec::default()
            .with_date_range(DateRange::new(Some(date(2024, 1, 20)), None));
        assert_eq!(ids(&apply_filter(&df, &spec).unwrap()), vec!["T2", "T3"]);
    }

    #[test]
    fn inverted_range_is_swapped() {
        let df = sample_frame();
        let forward = FilterSpec::default()
            .with_date_range(DateRange::between(date(2024, 1, 1), date(2024, 1, 31)));
        let inverted = FilterSpec::default()
            .with_date_range(DateRange::between(date(2024, 1, 31), date(2024, 1, 1)));

        assert_eq!(
            ids(&apply_filter(&df, &inverted).unwrap()),
            ids(&apply_filter(&df, &forward).unwrap())
        );
    }

    #[test]
    fn unknown_country_yields_empty_frame() {
        let df = sample_frame();
        let filtered = apply_filter(&df, &FilterSpec::default().with_country("JP")).unwrap();
        assert_eq!(filtered.height(), 0);
        assert_eq!(filtered.width(), df.width());
    }

    #[test]
    fn range_contains_checks_both_bounds() {
        let range = DateRange::between(date(2024, 3, 1), date(2024, 2, 1));
        assert!(range.is_inverted());
        assert!(range.contains(date(2024, 2, 15)));
        assert!(!range.contains(date(2024, 3, 2)));
        assert!(DateRange::default().contains(date(1999, 1, 1)));
    }

    #[test]
    fn options_list_distinct_values_and_bounds() {
        let options = FilterOptions::from_transactions(&sample_frame()).unwrap();
        assert_eq!(options.countries, vec!["DE", "FR"]);
        assert_eq!(options.categories, vec!["Books", "Electronics"]);
        assert_eq!(options.first_date, Some(date(2024, 1, 5)));
        assert_eq!(options.last_date, Some(date(2024, 2, 10)));
    }

    #[test]
    fn spec_describes_itself() {
        let spec = FilterSpec::default()
            .with_country("FR")
            .with_date_range(DateRange::new(Some(date(2024, 1, 1)), None));
        assert_eq!(
            spec.to_string(),
            "Country: FR | Category: All | Period: 2024-01-01 to …"
        );
    }

    #[test]
    fn epoch_days_convert_to_dates() {
        assert_eq!(date_from_epoch_days(0), Some(date(1970, 1, 1)));
        assert_eq!(date_from_epoch_days(19_727), Some(date(2024, 1, 5)));
    }
}
