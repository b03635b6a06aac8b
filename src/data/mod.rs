//! Data module - CSV loading and the loaded-table cache

pub mod columns;
mod cache;
mod loader;

pub use cache::TableCache;
pub use loader::{DataLoader, LoadedTables, LoaderError};
