//! Aggregate View Builders
//! Group-by views over the filtered transactions and the `compute_views` entry point.

use crate::data::columns;
use crate::pipeline::{apply_filter, FilterSpec, Kpis, PipelineError};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Products kept in the top products view unless configured otherwise.
pub const TOP_PRODUCTS_LIMIT: usize = 10;

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const REVENUE: &str = "revenue";
const ORDERS: &str = "orders";
const CUSTOMERS: &str = "customers";
const YEAR: &str = "year";
const MONTH: &str = "month";
const WEEKDAY: &str = "weekday";

/// Calendar month, displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub month: YearMonth,
    pub revenue: f64,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayPoint {
    pub day: &'static str,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRevenue {
    pub product: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub revenue: f64,
    /// Fraction of the filtered revenue, 0 when that revenue is 0
    pub share: f64,
}

/// Revenue and distinct customers for one country or segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerBreakdown {
    pub key: String,
    pub revenue: f64,
    pub customers: usize,
}

/// Everything the presentation layer draws for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct Views {
    #[serde(skip)]
    pub filtered: DataFrame,
    pub kpis: Kpis,
    pub monthly: Vec<MonthlyPoint>,
    pub weekday: Vec<WeekdayPoint>,
    pub top_products: Vec<ProductRevenue>,
    pub categories: Vec<CategoryShare>,
    pub countries: Vec<CustomerBreakdown>,
    pub segments: Vec<CustomerBreakdown>,
}

impl Views {
    /// No transaction matched the filters.
    pub fn is_empty(&self) -> bool {
        self.kpis.order_count == 0
    }

    /// First `rows` filtered transactions with the display columns.
    pub fn preview(&self, rows: usize) -> Result<DataFrame, PipelineError> {
        Ok(self.filtered.select(columns::PREVIEW)?.head(Some(rows)))
    }
}

/// Filter the transactions and build every view.
pub fn compute_views(transactions: &DataFrame, spec: &FilterSpec) -> Result<Views, PipelineError> {
    compute_views_with_limit(transactions, spec, TOP_PRODUCTS_LIMIT)
}

pub fn compute_views_with_limit(
    transactions: &DataFrame,
    spec: &FilterSpec,
    top_products_limit: usize,
) -> Result<Views, PipelineError> {
    let filtered = apply_filter(transactions, spec)?;

    let views = Views {
        kpis: Kpis::from_filtered(&filtered)?,
        monthly: monthly_series(&filtered)?,
        weekday: weekday_series(&filtered)?,
        top_products: top_products(&filtered, top_products_limit)?,
        categories: category_shares(&filtered)?,
        countries: country_breakdown(&filtered)?,
        segments: segment_breakdown(&filtered)?,
        filtered,
    };

    debug!(
        rows = views.filtered.height(),
        country = ?spec.country,
        category = ?spec.category,
        "recomputed dashboard views"
    );
    Ok(views)
}

/// Revenue and order count per calendar month, oldest first.
pub fn monthly_series(filtered: &DataFrame) -> Result<Vec<MonthlyPoint>, PipelineError> {
    let out = filtered
        .clone()
        .lazy()
        .filter(col(columns::ORDER_DATE).is_not_null())
        .group_by([
            col(columns::ORDER_DATE).dt().year().cast(DataType::Int64).alias(YEAR),
            col(columns::ORDER_DATE).dt().month().cast(DataType::Int64).alias(MONTH),
        ])
        .agg([revenue(), len().cast(DataType::Int64).alias(ORDERS)])
        .sort([YEAR, MONTH], SortMultipleOptions::default())
        .collect()?;

    let years = int_values(&out, YEAR)?;
    let months = int_values(&out, MONTH)?;
    let revenues = float_values(&out, REVENUE)?;
    let orders = int_values(&out, ORDERS)?;

    Ok(years
        .into_iter()
        .zip(months)
        .zip(revenues)
        .zip(orders)
        .map(|(((year, month), revenue), orders)| MonthlyPoint {
            month: YearMonth {
                year: year as i32,
                month: month as u32,
            },
            revenue,
            orders: orders as usize,
        })
        .collect())
}

/// Revenue per weekday, always Monday through Sunday.
pub fn weekday_series(filtered: &DataFrame) -> Result<Vec<WeekdayPoint>, PipelineError> {
    let out = filtered
        .clone()
        .lazy()
        .filter(col(columns::ORDER_DATE).is_not_null())
        .group_by([col(columns::ORDER_DATE)
            .dt()
            .weekday()
            .cast(DataType::Int64)
            .alias(WEEKDAY)])
        .agg([revenue()])
        .collect()?;

    // Polars weekdays are ISO: Monday = 1
    let mut totals = [0.0; 7];
    for (day, revenue) in int_values(&out, WEEKDAY)?.into_iter().zip(float_values(&out, REVENUE)?) {
        if (1..=7).contains(&day) {
            totals[(day - 1) as usize] += revenue;
        }
    }

    Ok(WEEKDAY_NAMES
        .iter()
        .zip(totals)
        .map(|(&day, revenue)| WeekdayPoint { day, revenue })
        .collect())
}

/// Best-selling products by revenue, at most `limit`.
pub fn top_products(filtered: &DataFrame, limit: usize) -> Result<Vec<ProductRevenue>, PipelineError> {
    let out = grouped_by(filtered, columns::PRODUCT_NAME)
        .agg([revenue()])
        .sort([REVENUE], by_revenue_descending())
        .limit(limit as IdxSize)
        .collect()?;

    Ok(string_values(&out, columns::PRODUCT_NAME)?
        .into_iter()
        .zip(float_values(&out, REVENUE)?)
        .map(|(product, revenue)| ProductRevenue { product, revenue })
        .collect())
}

/// Revenue per category with its share of the filtered total.
pub fn category_shares(filtered: &DataFrame) -> Result<Vec<CategoryShare>, PipelineError> {
    let out = grouped_by(filtered, columns::CATEGORY)
        .agg([revenue()])
        .collect()?;

    let revenues = float_values(&out, REVENUE)?;
    let total: f64 = revenues.iter().sum();

    Ok(string_values(&out, columns::CATEGORY)?
        .into_iter()
        .zip(revenues)
        .map(|(category, revenue)| CategoryShare {
            category,
            revenue,
            share: if total > 0.0 { revenue / total } else { 0.0 },
        })
        .collect())
}

/// Revenue and customers per country, highest revenue first.
pub fn country_breakdown(filtered: &DataFrame) -> Result<Vec<CustomerBreakdown>, PipelineError> {
    let out = grouped_by(filtered, columns::COUNTRY)
        .agg([revenue(), distinct_customers()])
        .sort([REVENUE], by_revenue_descending())
        .collect()?;
    customer_breakdown(&out, columns::COUNTRY)
}

/// Revenue and customers per customer segment.
pub fn segment_breakdown(filtered: &DataFrame) -> Result<Vec<CustomerBreakdown>, PipelineError> {
    let out = grouped_by(filtered, columns::CUSTOMER_SEGMENT)
        .agg([revenue(), distinct_customers()])
        .collect()?;
    customer_breakdown(&out, columns::CUSTOMER_SEGMENT)
}

fn customer_breakdown(out: &DataFrame, key: &str) -> Result<Vec<CustomerBreakdown>, PipelineError> {
    Ok(string_values(out, key)?
        .into_iter()
        .zip(float_values(out, REVENUE)?)
        .zip(int_values(out, CUSTOMERS)?)
        .map(|((key, revenue), customers)| CustomerBreakdown {
            key,
            revenue,
            customers: customers as usize,
        })
        .collect())
}

/// Group by a string key in order of first appearance. Rows without a key are dropped.
fn grouped_by(filtered: &DataFrame, key: &str) -> LazyGroupBy {
    filtered
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by_stable([col(key).cast(DataType::String)])
}

fn revenue() -> Expr {
    col(columns::TOTAL_AMOUNT)
        .cast(DataType::Float64)
        .sum()
        .alias(REVENUE)
}

fn distinct_customers() -> Expr {
    col(columns::CUSTOMER_ID)
        .drop_nulls()
        .n_unique()
        .cast(DataType::Int64)
        .alias(CUSTOMERS)
}

/// Stable, so equal revenues keep their group order.
fn by_revenue_descending() -> SortMultipleOptions {
    SortMultipleOptions::default()
        .with_order_descending(true)
        .with_maintain_order(true)
}

fn string_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<String>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

fn float_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect())
}

fn int_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<i64>> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    Ok(column.i64()?.into_iter().map(|v| v.unwrap_or(0)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::DateRange;
    use crate::testing::sample_frame;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn country_scenario() {
        let views = compute_views(&sample_frame(), &FilterSpec::default().with_country("FR")).unwrap();

        assert_eq!(views.filtered.height(), 2);
        assert_eq!(views.kpis.total_revenue, 150.0);
        assert_eq!(
            views.monthly,
            vec![
                MonthlyPoint {
                    month: YearMonth { year: 2024, month: 1 },
                    revenue: 100.0,
                    orders: 1,
                },
                MonthlyPoint {
                    month: YearMonth { year: 2024, month: 2 },
                    revenue: 50.0,
                    orders: 1,
                },
            ]
        );
        let shares: Vec<(&str, f64)> = views
            .categories
            .iter()
            .map(|c| (c.category.as_str(), c.revenue))
            .collect();
        assert_eq!(shares, vec![("Electronics", 100.0), ("Books", 50.0)]);
    }

    #[test]
    fn empty_range_scenario() {
        let spec = FilterSpec::default()
            .with_date_range(DateRange::between(date(2030, 1, 1), date(2030, 12, 31)));
        let views = compute_views(&sample_frame(), &spec).unwrap();

        assert!(views.is_empty());
        assert_eq!(views.kpis.total_revenue, 0.0);
        assert_eq!(views.kpis.order_count, 0);
        assert_eq!(views.kpis.average_order_value, 0.0);
        assert_eq!(views.kpis.orders_per_customer, 0.0);
        assert_eq!(views.weekday.len(), 7);
        assert!(views.weekday.iter().all(|w| w.revenue == 0.0));
        assert!(views.top_products.is_empty());
        assert!(views.monthly.is_empty());
        assert!(views.categories.is_empty());
        assert!(views.countries.is_empty());
        assert!(views.segments.is_empty());
    }

    #[test]
    fn weekday_series_is_monday_first_with_zero_fill() {
        let weekday = weekday_series(&sample_frame()).unwrap();
        let days: Vec<&str> = weekday.iter().map(|w| w.day).collect();
        assert_eq!(days, WEEKDAY_NAMES.to_vec());
        // 2024-01-05 is a Friday, 2024-01-20 and 2024-02-10 are Saturdays
        assert_eq!(weekday[4].revenue, 100.0);
        assert_eq!(weekday[5].revenue, 250.0);
        assert_eq!(weekday[0].revenue, 0.0);
        assert_eq!(weekday[6].revenue, 0.0);
    }

    #[test]
    fn category_revenue_adds_up_to_total() {
        let views = compute_views(&sample_frame(), &FilterSpec::default()).unwrap();
        let sum: f64 = views.categories.iter().map(|c| c.revenue).sum();
        assert!((sum - views.kpis.total_revenue).abs() < 1e-9);
        let share_sum: f64 = views.categories.iter().map(|c| c.share).sum();
        assert!((share_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn top_products_truncates_and_keeps_tie_order() {
        let names: Vec<String> = (0..12).map(|i| format!("P{i:02}")).collect();
        let amounts: Vec<f64> = vec![
            5.0, 80.0, 30.0, 30.0, 70.0, 10.0, 60.0, 30.0, 90.0, 20.0, 40.0, 50.0,
        ];
        let df = df!(
            "product_name" => names,
            "total_amount" => amounts,
        )
        .unwrap();

        let top = top_products(&df, TOP_PRODUCTS_LIMIT).unwrap();
        assert_eq!(top.len(), 10);
        assert!(top.windows(2).all(|w| w[0].revenue >= w[1].revenue));
        let ties: Vec<&str> = top
            .iter()
            .filter(|p| p.revenue == 30.0)
            .map(|p| p.product.as_str())
            .collect();
        assert_eq!(ties, vec!["P02", "P03", "P07"]);
        assert_eq!(top[0].product, "P08");
    }

    #[test]
    fn top_products_sums_repeated_lines() {
        let df = df!(
            "product_name" => ["Mug", "Pen", "Mug"],
            "total_amount" => [10.0, 15.0, 10.0],
        )
        .unwrap();
        let top = top_products(&df, 10).unwrap();
        assert_eq!(
            top,
            vec![
                ProductRevenue {
                    product: "Mug".to_string(),
                    revenue: 20.0
                },
                ProductRevenue {
                    product: "Pen".to_string(),
                    revenue: 15.0
                },
            ]
        );
    }

    #[test]
    fn country_breakdown_sorted_by_revenue() {
        let countries = country_breakdown(&sample_frame()).unwrap();
        assert_eq!(
            countries,
            vec![
                CustomerBreakdown {
                    key: "DE".to_string(),
                    revenue: 200.0,
                    customers: 1
                },
                CustomerBreakdown {
                    key: "FR".to_string(),
                    revenue: 150.0,
                    customers: 2
                },
            ]
        );
    }

    #[test]
    fn segment_breakdown_counts_distinct_customers() {
        let df = df!(
            "customer_segment" => ["VIP", "Standard", "VIP", "VIP"],
            "customer_id" => ["C1", "C2", "C1", "C3"],
            "total_amount" => [100.0, 20.0, 50.0, 30.0],
        )
        .unwrap();
        let segments = segment_breakdown(&df).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].key, "VIP");
        assert_eq!(segments[0].revenue, 180.0);
        assert_eq!(segments[0].customers, 2);
        assert_eq!(segments[1].customers, 1);
    }

    #[test]
    fn null_keys_and_missing_customers_are_not_counted() {
        let df = df!(
            "country" => [Some("FR"), Some("FR"), Some("FR"), None, Some("DE")],
            "customer_id" => [Some("C1"), None, None, Some("C9"), None],
            "total_amount" => [10.0, 20.0, 30.0, 500.0, 40.0],
        )
        .unwrap();

        let countries = country_breakdown(&df).unwrap();
        assert_eq!(
            countries,
            vec![
                CustomerBreakdown {
                    key: "FR".to_string(),
                    revenue: 60.0,
                    customers: 1
                },
                CustomerBreakdown {
                    key: "DE".to_string(),
                    revenue: 40.0,
                    customers: 0
                },
            ]
        );
    }

    #[test]
    fn recomputing_is_idempotent() {
        let df = sample_frame();
        let spec = FilterSpec::default().with_category("Electronics");
        let first = compute_views(&df, &spec).unwrap();
        let second = compute_views(&df, &spec).unwrap();

        assert!(first.filtered.equals(&second.filtered));
        assert_eq!(first.kpis, second.kpis);
        assert_eq!(first.monthly, second.monthly);
        assert_eq!(first.weekday, second.weekday);
        assert_eq!(first.top_products, second.top_products);
        assert_eq!(first.categories, second.categories);
        assert_eq!(first.countries, second.countries);
        assert_eq!(first.segments, second.segments);
    }

    #[test]
    fn preview_uses_display_columns() {
        let views = compute_views(&sample_frame(), &FilterSpec::default()).unwrap();
        let preview = views.preview(2).unwrap();
        assert_eq!(preview.height(), 2);
        assert_eq!(preview.width(), columns::PREVIEW.len());
        assert!(preview.column(columns::CUSTOMER_ID).is_err());
    }

    #[test]
    fn year_month_displays_like_a_period() {
        assert_eq!(YearMonth { year: 2024, month: 3 }.to_string(), "2024-03");
    }
}
