//! CSV Data Loader Module
//! Loads the transactions table and the four precomputed aggregate tables using Polars.

use crate::config::DashboardConfig;
use crate::data::columns;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Missing data file '{name}': {path}")]
    MissingResource { name: &'static str, path: PathBuf },
    #[error("Failed to load CSV '{name}' ({path}): {source}")]
    CsvError {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("Transactions table has no '{0}' column")]
    MissingColumn(&'static str),
    #[error("Could not convert order_date to dates: {0}")]
    DateCoercion(#[source] PolarsError),
}

/// Every table the dashboard reads. Built only when all five files load.
#[derive(Debug, Clone)]
pub struct LoadedTables {
    pub transactions: DataFrame,
    pub products: DataFrame,
    pub monthly: DataFrame,
    pub customers: DataFrame,
    pub countries: DataFrame,
}

/// Reads the dashboard's CSV resources from the configured data directory.
#[derive(Debug, Clone)]
pub struct DataLoader {
    config: DashboardConfig,
}

impl DataLoader {
    pub fn new(config: DashboardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Paths of the five resources, in load order.
    pub fn resource_paths(&self) -> Vec<PathBuf> {
        self.config
            .resources()
            .into_iter()
            .map(|(_, path)| path)
            .collect()
    }

    /// Load all tables. Any failure fails the whole load.
    pub fn load(&self) -> Result<LoadedTables, LoaderError> {
        let resources = self.config.resources();

        // Every file must exist before any parsing starts
        if let Some((name, path)) = resources.iter().find(|(_, path)| !path.is_file()) {
            return Err(LoaderError::MissingResource {
                name: *name,
                path: path.clone(),
            });
        }

        let [transactions, products, monthly, customers, countries] = resources;

        let tables = LoadedTables {
            transactions: Self::load_transactions(transactions.0, &transactions.1)?,
            products: Self::read_csv(products.0, &products.1, false)?,
            monthly: Self::read_csv(monthly.0, &monthly.1, false)?,
            customers: Self::read_csv(customers.0, &customers.1, false)?,
            countries: Self::read_csv(countries.0, &countries.1, false)?,
        };

        info!(
            data_dir = %self.config.data_dir.display(),
            transactions = tables.transactions.height(),
            products = tables.products.height(),
            monthly = tables.monthly.height(),
            customers = tables.customers.height(),
            countries = tables.countries.height(),
            "loaded dashboard tables"
        );
        Ok(tables)
    }

    fn load_transactions(name: &'static str, path: &Path) -> Result<DataFrame, LoaderError> {
        let df = Self::read_csv(name, path, true)?;

        for column in columns::REQUIRED {
            if df.get_column_index(column).is_none() {
                return Err(LoaderError::MissingColumn(column));
            }
        }

        Self::coerce_order_date(df).map_err(LoaderError::DateCoercion)
    }

    /// Read one CSV file eagerly. Malformed rows are errors, not skipped.
    fn read_csv(name: &'static str, path: &Path, parse_dates: bool) -> Result<DataFrame, LoaderError> {
        debug!(resource = name, path = %path.display(), "reading CSV");

        LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .with_try_parse_dates(parse_dates)
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|source| LoaderError::CsvError {
                name,
                path: path.to_path_buf(),
                source,
            })
    }

    /// Make `order_date` a Date column. Timestamps keep only their date part.
    fn coerce_order_date(df: DataFrame) -> Result<DataFrame, PolarsError> {
        let dtype = df.column(columns::ORDER_DATE)?.dtype().clone();

        let expr = match dtype {
            DataType::Date => return Ok(df),
            DataType::Datetime(_, _) => col(columns::ORDER_DATE).cast(DataType::Date),
            _ => col(columns::ORDER_DATE)
                .cast(DataType::String)
                .str()
                .to_date(StrptimeOptions::default()),
        };

        df.lazy().with_column(expr).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{write_fixture, SAMPLE_TRANSACTIONS};

    fn loader_for(dir: &Path) -> DataLoader {
        DataLoader::new(DashboardConfig {
            data_dir: dir.to_path_buf(),
            ..DashboardConfig::default()
        })
    }

    #[test]
    fn loads_all_tables_with_date_column() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), SAMPLE_TRANSACTIONS);

        let tables = loader_for(dir.path()).load().unwrap();
        assert_eq!(tables.transactions.height(), 3);
        assert_eq!(
            tables.transactions.column(columns::ORDER_DATE).unwrap().dtype(),
            &DataType::Date
        );
        assert_eq!(tables.products.height(), 2);
        // Other columns keep their inferred types
        assert_eq!(
            tables.transactions.column(columns::COUNTRY).unwrap().dtype(),
            &DataType::String
        );
    }

    #[test]
    fn timestamps_are_truncated_to_dates() {
        let dir = tempfile::tempdir().unwrap();
        let csv = "transaction_id,order_date,product_name,category,quantity,unit_price,total_amount,country,customer_id,customer_segment\n\
                   T1,2024-01-05 10:15:00,Laptop,Electronics,1,100.0,100.0,FR,C1,VIP\n";
        write_fixture(dir.path(), csv);

        let tables = loader_for(dir.path()).load().unwrap();
        let dates = tables.transactions.column(columns::ORDER_DATE).unwrap();
        assert_eq!(dates.dtype(), &DataType::Date);
        assert_eq!(dates.null_count(), 0);
    }

    #[test]
    fn missing_resource_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), SAMPLE_TRANSACTIONS);
        std::fs::remove_file(dir.path().join("top_customers.csv")).unwrap();

        let err = loader_for(dir.path()).load().unwrap_err();
        assert!(matches!(err, LoaderError::MissingResource { name: "customers", .. }));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let csv = "transaction_id,order_date,product_name,category,quantity,unit_price,total_amount,country,customer_id\n\
                   T1,2024-01-05,Laptop,Electronics,1,100.0,100.0,FR,C1\n";
        write_fixture(dir.path(), csv);

        let err = loader_for(dir.path()).load().unwrap_err();
        assert!(matches!(err, LoaderError::MissingColumn("customer_segment")));
    }

    #[test]
    fn unparsable_dates_fail_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let csv = "transaction_id,order_date,product_name,category,quantity,unit_price,total_amount,country,customer_id,customer_segment\n\
                   T1,not-a-date,Laptop,Electronics,1,100.0,100.0,FR,C1,VIP\n";
        write_fixture(dir.path(), csv);

        assert!(loader_for(dir.path()).load().is_err());
    }
}
