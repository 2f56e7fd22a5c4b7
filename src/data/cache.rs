//! Cleaned Table Cache
//! Loads and cleans each source file once per process.

use crate::data::cleaner::{CleanError, DataCleaner};
use crate::data::loader::{DataLoader, LoaderError};
use crate::data::table::IncidentTable;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Clean(#[from] CleanError),
}

/// Load a CSV and clean it.
pub fn load_and_clean(path: &Path) -> Result<IncidentTable, TableError> {
    let raw = DataLoader::load_csv(path)?;
    Ok(DataCleaner::clean(&raw)?)
}

/// Memoized cleaned tables keyed by source path.
#[derive(Default)]
pub struct TableCache {
    tables: HashMap<PathBuf, Arc<IncidentTable>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, loading and cleaning on first use.
    /// Failed loads are not cached.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<IncidentTable>, TableError> {
        if let Some(table) = self.tables.get(path) {
            log::debug!("Cache hit for {}", path.display());
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(load_and_clean(path)?);
        self.tables.insert(path.to_path_buf(), Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
