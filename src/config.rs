//! Dashboard Configuration Module
//! Data location, resource file names and display settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// File names of the five input tables, relative to `data_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceFiles {
    pub transactions: String,
    pub products: String,
    pub monthly: String,
    pub customers: String,
    pub countries: String,
}

impl Default for ResourceFiles {
    fn default() -> Self {
        Self {
            transactions: "transactions_cleaned.csv".to_string(),
            products: "sales_by_product.csv".to_string(),
            monthly: "sales_by_month.csv".to_string(),
            customers: "top_customers.csv".to_string(),
            countries: "sales_by_country.csv".to_string(),
        }
    }
}

/// Settings shared by the GUI, the CLI and the report exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub files: ResourceFiles,
    /// Number of products kept in the top products view
    pub top_products_limit: usize,
    /// Rows shown in the detailed data table
    pub preview_rows: usize,
    /// Revenue objective the headline KPI is compared against
    pub revenue_target: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            files: ResourceFiles::default(),
            top_products_limit: 10,
            preview_rows: 100,
            revenue_target: 5_000_000.0,
        }
    }
}

impl DashboardConfig {
    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Named resources in load order: (name, full path).
    pub fn resources(&self) -> [(&'static str, PathBuf); 5] {
        [
            ("transactions", self.data_dir.join(&self.files.transactions)),
            ("products", self.data_dir.join(&self.files.products)),
            ("monthly", self.data_dir.join(&self.files.monthly)),
            ("customers", self.data_dir.join(&self.files.customers)),
            ("countries", self.data_dir.join(&self.files.countries)),
        ]
    }
}
