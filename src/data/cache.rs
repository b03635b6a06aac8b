//! Loaded-Table Cache
//! Holds the tables of the last successful load until an explicit reload.

use crate::data::{DataLoader, LoadedTables, LoaderError};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Size and modification time of each resource at load time.
type Fingerprint = Vec<(PathBuf, Option<(u64, SystemTime)>)>;

/// Explicit cache around [`DataLoader`].
///
/// The tables are read once and shared read-only through an `Arc`. The
/// cache stays valid until [`TableCache::invalidate`] or
/// [`TableCache::reload`] is called; changes on disk are only reported by
/// [`TableCache::is_stale`].
pub struct TableCache {
    loader: DataLoader,
    tables: Option<Arc<LoadedTables>>,
    valid: bool,
    fingerprint: Fingerprint,
}

impl TableCache {
    pub fn new(loader: DataLoader) -> Self {
        Self {
            loader,
            tables: None,
            valid: false,
            fingerprint: Vec::new(),
        }
    }

    pub fn loader(&self) -> &DataLoader {
        &self.loader
    }

    pub fn is_valid(&self) -> bool {
        self.valid && self.tables.is_some()
    }

    /// Cached tables, loading them on first use.
    pub fn get_or_load(&mut self) -> Result<Arc<LoadedTables>, LoaderError> {
        if let (true, Some(tables)) = (self.valid, &self.tables) {
            debug!("serving dashboard tables from cache");
            return Ok(Arc::clone(tables));
        }

        // Fingerprint before reading so edits made during the load show up as stale
        let fingerprint = self.current_fingerprint();
        match self.loader.load() {
            Ok(tables) => {
                let tables = Arc::new(tables);
                self.tables = Some(Arc::clone(&tables));
                self.fingerprint = fingerprint;
                self.valid = true;
                Ok(tables)
            }
            Err(e) => {
                warn!(error = %e, "dashboard data unavailable");
                self.tables = None;
                self.valid = false;
                Err(e)
            }
        }
    }

    /// Tables of the last successful load, if still valid.
    pub fn get(&self) -> Option<Arc<LoadedTables>> {
        if self.valid {
            self.tables.clone()
        } else {
            None
        }
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Drop the cached tables and read the resources again.
    pub fn reload(&mut self) -> Result<Arc<LoadedTables>, LoaderError> {
        info!("reloading dashboard tables");
        self.invalidate();
        self.get_or_load()
    }

    /// True when a resource changed on disk since the cached load.
    pub fn is_stale(&self) -> bool {
        self.is_valid() && self.current_fingerprint() != self.fingerprint
    }

    fn current_fingerprint(&self) -> Fingerprint {
        self.loader
            .resource_paths()
            .into_iter()
            .map(|path| {
                let stamp = fs::metadata(&path)
                    .ok()
                    .and_then(|meta| Some((meta.len(), meta.modified().ok()?)));
                (path, stamp)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::testing::{write_fixture, SAMPLE_TRANSACTIONS};

    fn cache_for(dir: &std::path::Path) -> TableCache {
        TableCache::new(DataLoader::new(DashboardConfig {
            data_dir: dir.to_path_buf(),
            ..DashboardConfig::default()
        }))
    }

    #[test]
    fn repeated_loads_share_the_cached_tables() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), SAMPLE_TRANSACTIONS);
        let mut cache = cache_for(dir.path());

        let first = cache.get_or_load().unwrap();
        let second = cache.get_or_load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!cache.is_stale());
    }

    #[test]
    fn cache_survives_file_changes_until_reload() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), SAMPLE_TRANSACTIONS);
        let mut cache = cache_for(dir.path());
        let first = cache.get_or_load().unwrap();

        let extended = format!(
            "{SAMPLE_TRANSACTIONS}T4,2024-03-01,Tablet,Electronics,1,300.0,300.0,DE,C4,VIP\n"
        );
        fs::write(dir.path().join("transactions_cleaned.csv"), extended).unwrap();

        assert!(cache.is_stale());
        assert_eq!(cache.get_or_load().unwrap().transactions.height(), 3);

        let reloaded = cache.reload().unwrap();
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(reloaded.transactions.height(), 4);
        assert!(!cache.is_stale());
    }

    #[test]
    fn failed_load_leaves_cache_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = cache_for(dir.path());

        assert!(cache.get_or_load().is_err());
        assert!(!cache.is_valid());
        assert!(cache.get().is_none());
    }
}
