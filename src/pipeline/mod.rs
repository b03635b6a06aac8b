//! Pipeline module - filtering, KPIs and aggregate views

mod filter;
mod kpi;
mod views;

use polars::prelude::PolarsError;
use thiserror::Error;

pub use filter::{apply_filter, date_from_epoch_days, DateRange, FilterOptions, FilterSpec};
pub use kpi::Kpis;
pub use views::{
    category_shares, compute_views, compute_views_with_limit, country_breakdown, monthly_series,
    segment_breakdown, top_products, weekday_series, CategoryShare, CustomerBreakdown,
    MonthlyPoint, ProductRevenue, Views, WeekdayPoint, YearMonth, TOP_PRODUCTS_LIMIT,
    WEEKDAY_NAMES,
};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}
