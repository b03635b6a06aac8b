//! Shared fixtures for unit tests.

use std::fs;
use std::path::Path;

/// Three sales: two in France, one in Germany.
pub const SAMPLE_TRANSACTIONS: &str = "\
transaction_id,order_date,product_name,category,quantity,unit_price,total_amount,country,customer_id,customer_segment
T1,2024-01-05,Laptop,Electronics,1,100.0,100.0,FR,C1,VIP
T2,2024-02-10,Novel,Books,2,25.0,50.0,FR,C2,Standard
T3,2024-01-20,Phone,Electronics,1,200.0,200.0,DE,C3,Premium
";

/// Write a transactions file plus the four precomputed tables into `dir`.
pub fn write_fixture(dir: &Path, transactions: &str) {
    fs::write(dir.join("transactions_cleaned.csv"), transactions).unwrap();
    fs::write(
        dir.join("sales_by_product.csv"),
        "product_name,category,total_amount,quantity,nb_orders\nLaptop,Electronics,100.0,1,1\nPhone,Electronics,200.0,1,1\n",
    )
    .unwrap();
    fs::write(
        dir.join("sales_by_month.csv"),
        "year,month,total_amount,nb_orders,unique_customers\n2024,1,300.0,2,2\n2024,2,50.0,1,1\n",
    )
    .unwrap();
    fs::write(
        dir.join("top_customers.csv"),
        "customer_id,total_amount,nb_orders,customer_segment\nC3,200.0,1,Premium\nC1,100.0,1,VIP\n",
    )
    .unwrap();
    fs::write(
        dir.join("sales_by_country.csv"),
        "country,total_amount,nb_orders,unique_customers\nDE,200.0,1,1\nFR,150.0,2,2\n",
    )
    .unwrap();
}

/// Load the sample transactions into a frame the way the loader does.
pub fn sample_frame() -> polars::prelude::DataFrame {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), SAMPLE_TRANSACTIONS);
    let loader = crate::data::DataLoader::new(crate::config::DashboardConfig {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    });
    loader.load().unwrap().transactions
}
