//! KPI Module
//! Scalar summary metrics of the filtered transactions.

use crate::data::columns;
use crate::pipeline::PipelineError;
use polars::prelude::*;
use serde::Serialize;

/// Headline metrics. Ratios are 0 when their denominator is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total_revenue: f64,
    pub order_count: usize,
    pub average_order_value: f64,
    pub unique_customers: usize,
    pub orders_per_customer: f64,
}

impl Kpis {
    pub fn from_filtered(filtered: &DataFrame) -> Result<Self, PipelineError> {
        let total_revenue = filtered
            .column(columns::TOTAL_AMOUNT)?
            .cast(&DataType::Float64)?
            .f64()?
            .sum()
            .unwrap_or(0.0);
        let order_count = filtered.height();
        let unique_customers = if order_count == 0 {
            0
        } else {
            filtered
                .column(columns::CUSTOMER_ID)?
                .as_materialized_series()
                .drop_nulls()
                .n_unique()?
        };

        Ok(Self {
            total_revenue,
            order_count,
            average_order_value: ratio(total_revenue, order_count),
            unique_customers,
            orders_per_customer: ratio(order_count as f64, unique_customers),
        })
    }

    /// Revenue as a percentage of `target`, 0 for a non-positive target.
    pub fn target_attainment_pct(&self, target: f64) -> f64 {
        if target > 0.0 {
            self.total_revenue / target * 100.0
        } else {
            0.0
        }
    }
}

fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_frame;

    #[test]
    fn metrics_over_sample() {
        let kpis = Kpis::from_filtered(&sample_frame()).unwrap();
        assert_eq!(kpis.total_revenue, 350.0);
        assert_eq!(kpis.order_count, 3);
        assert!((kpis.average_order_value - 350.0 / 3.0).abs() < 1e-9);
        assert_eq!(kpis.unique_customers, 3);
        assert_eq!(kpis.orders_per_customer, 1.0);
    }

    #[test]
    fn empty_frame_gives_zero_ratios() {
        let empty = sample_frame().head(Some(0));
        let kpis = Kpis::from_filtered(&empty).unwrap();
        assert_eq!(kpis, Kpis::default());
    }

    #[test]
    fn repeat_customers_raise_orders_per_customer() {
        let df = df!(
            "total_amount" => [10.0, 20.0, 30.0, 40.0],
            "customer_id" => ["C1", "C1", "C2", "C1"],
        )
        .unwrap();
        let kpis = Kpis::from_filtered(&df).unwrap();
        assert_eq!(kpis.unique_customers, 2);
        assert_eq!(kpis.orders_per_customer, 2.0);
        assert_eq!(kpis.average_order_value, 25.0);
    }

    #[test]
    fn missing_customer_ids_are_not_customers() {
        let df = df!(
            "total_amount" => [10.0, 20.0, 30.0],
            "customer_id" => [Some("C1"), None, None],
        )
        .unwrap();
        let kpis = Kpis::from_filtered(&df).unwrap();
        assert_eq!(kpis.order_count, 3);
        assert_eq!(kpis.unique_customers, 1);
        assert_eq!(kpis.orders_per_customer, 3.0);
    }

    #[test]
    fn attainment_against_target() {
        let kpis = Kpis {
            total_revenue: 2_500_000.0,
            ..Kpis::default()
        };
        assert_eq!(kpis.target_attainment_pct(5_000_000.0), 50.0);
        assert_eq!(kpis.target_attainment_pct(0.0), 0.0);
    }
}
