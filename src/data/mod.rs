//! Data module - CSV loading, cleaning, filtering and caching

mod cache;
mod cleaner;
mod download;
mod filter;
mod loader;
mod table;

pub use cache::{load_and_clean, TableCache, TableError};
pub use cleaner::{CleanError, DataCleaner, DATE_FORMAT};
pub use download::{ensure_dataset, DownloadOutcome, DEFAULT_SOURCE_URL};
pub use filter::FilterParams;
pub use loader::{DataLoader, LoaderError};
pub use table::{Incident, IncidentColumn, IncidentTable};
