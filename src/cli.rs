//! Command-line interface
//!
//! The window is the default command; `summary` and `export` run headless
//! against the same pipeline.

use crate::charts::{format_amount, format_attainment};
use crate::config::{ConfigError, DashboardConfig};
use crate::pipeline::{DateRange, FilterSpec, Views};
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::fmt;
use std::path::PathBuf;

/// E-commerce analytics dashboard
///
/// Filters the cleaned transactions by country, category and period and
/// shows revenue KPIs and breakdowns.
#[derive(Parser, Debug)]
#[command(name = "ecommerce-dashboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Directory holding the CSV files (overrides config file)
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Path to configuration file (JSON)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Open the dashboard window (default if no command specified)
    Gui,

    /// Print the KPIs and breakdowns for a selection
    Summary {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print JSON instead of text
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,

        /// Indent the JSON output
        #[arg(long, action = ArgAction::SetTrue, requires = "json")]
        pretty: bool,
    },

    /// Write the dashboard charts to a PowerPoint file
    Export {
        /// Output file (.pptx)
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Open the report once written
        #[arg(long, action = ArgAction::SetTrue)]
        open: bool,
    },
}

/// Filter selection shared by the headless commands.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct FilterArgs {
    /// Only this country
    #[arg(long, value_name = "COUNTRY")]
    pub country: Option<String>,

    /// Only this product category
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// First day included (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Last day included (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,
}

impl FilterArgs {
    pub fn to_spec(&self) -> FilterSpec {
        FilterSpec {
            country: self.country.clone(),
            category: self.category.clone(),
            date_range: DateRange::new(self.from, self.to),
        }
    }
}

impl Cli {
    /// Config file (or defaults) with the command-line overrides applied.
    pub fn resolve_config(&self) -> Result<DashboardConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::from_file(path)?,
            None => DashboardConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        Ok(config)
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Gui)
    }
}

/// Plain text report of `views`, as printed by `summary`.
pub fn format_summary(views: &Views, spec: &FilterSpec, revenue_target: f64) -> String {
    Summary {
        views,
        spec,
        revenue_target,
    }
    .to_string()
}

struct Summary<'a> {
    views: &'a Views,
    spec: &'a FilterSpec,
    revenue_target: f64,
}

impl Summary<'_> {
    fn section(
        f: &mut fmt::Formatter<'_>,
        title: &str,
        rows: impl Iterator<Item = (String, f64)>,
    ) -> fmt::Result {
        writeln!(f, "\n{}", title)?;
        for (label, revenue) in rows {
            writeln!(f, "  {:<24} {:>14}", label, format_amount(revenue))?;
        }
        Ok(())
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let views = self.views;
        let kpis = &views.kpis;

        writeln!(f, "{}", self.spec)?;
        writeln!(f)?;

        if views.is_empty() {
            return writeln!(f, "No transactions match the selected filters.");
        }

        writeln!(
            f,
            "Revenue            {:>14}  ({})",
            format_amount(kpis.total_revenue),
            format_attainment(kpis.target_attainment_pct(self.revenue_target))
        )?;
        writeln!(f, "Orders             {:>14}", kpis.order_count)?;
        writeln!(f, "Average basket     {:>14.2}", kpis.average_order_value)?;
        writeln!(
            f,
            "Unique customers   {:>14}  ({:.2} orders / customer)",
            kpis.unique_customers, kpis.orders_per_customer
        )?;

        Self::section(
            f,
            "Monthly revenue",
            views.monthly.iter().map(|p| (p.month.to_string(), p.revenue)),
        )?;
        Self::section(
            f,
            "Revenue by day of week",
            views.weekday.iter().map(|w| (w.day.to_string(), w.revenue)),
        )?;
        Self::section(
            f,
            "Top products",
            views.top_products.iter().map(|p| (p.product.clone(), p.revenue)),
        )?;

        writeln!(f, "\nCategories")?;
        for share in &views.categories {
            writeln!(
                f,
                "  {:<24} {:>14}  {:>5.1}%",
                share.category,
                format_amount(share.revenue),
                share.share * 100.0
            )?;
        }

        for (title, rows) in [("Countries", &views.countries), ("Segments", &views.segments)] {
            writeln!(f, "\n{}", title)?;
            for row in rows {
                writeln!(
                    f,
                    "  {:<24} {:>14}  {} customers",
                    row.key,
                    format_amount(row.revenue),
                    row.customers
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::compute_views;
    use crate::testing::sample_frame;

    #[test]
    fn no_subcommand_opens_the_window() {
        let cli = Cli::try_parse_from(["ecommerce-dashboard"]).unwrap();
        assert_eq!(cli.command(), Command::Gui);
    }

    #[test]
    fn summary_flags_build_a_filter() {
        let cli = Cli::try_parse_from([
            "ecommerce-dashboard",
            "summary",
            "--country",
            "FR",
            "--from",
            "2024-01-01",
            "--json",
            "--data-dir",
            "/tmp/shop",
        ])
        .unwrap();

        let Command::Summary { filters, json, pretty } = cli.command() else {
            panic!("expected summary");
        };
        assert!(json);
        assert!(!pretty);

        let spec = filters.to_spec();
        assert_eq!(spec.country.as_deref(), Some("FR"));
        assert_eq!(spec.date_range.start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(spec.date_range.end, None);

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/shop"));
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let result = Cli::try_parse_from(["ecommerce-dashboard", "summary", "--to", "31/12/2024"]);
        assert!(result.is_err());
    }

    #[test]
    fn export_requires_an_output() {
        assert!(Cli::try_parse_from(["ecommerce-dashboard", "export"]).is_err());
    }

    #[test]
    fn summary_text_lists_breakdowns() {
        let spec = FilterSpec::default().with_country("FR");
        let views = compute_views(&sample_frame(), &spec).unwrap();
        let text = format_summary(&views, &spec, 1_500.0);

        assert!(text.starts_with("Country: FR | Category: All"));
        assert!(text.contains("(+10.0% vs objective)"));
        assert!(text
            .lines()
            .any(|line| line.starts_with("Orders") && line.ends_with(" 2")));
        assert!(text.contains("Electronics"));
        assert!(text.contains("VIP"));
    }

    #[test]
    fn empty_selection_prints_a_notice() {
        let spec = FilterSpec::default().with_country("JP");
        let views = compute_views(&sample_frame(), &spec).unwrap();
        let text = format_summary(&views, &spec, 5_000_000.0);
        assert!(text.contains("No transactions match"));
        assert!(!text.contains("Revenue"));
    }
}
