// src/config.rs

use std::path::PathBuf;

/// Directory holding the `<dataset>.csv` input files.
pub const DEFAULT_DATA_ROOT: &str = "/home/iceberg/data";
/// Root directory the local catalog stores its tables under.
pub const DEFAULT_WAREHOUSE: &str = "/home/iceberg/warehouse";
/// Catalog every dataset is written into.
pub const DEFAULT_CATALOG: &str = "my_catalog";
pub const DEFAULT_APP_NAME: &str = "Import csv";
/// Rows decoded per Arrow record batch.
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Fixed locations and knobs for one ingestion run.
///
/// The CLI always uses [`IngestConfig::default`]; the library takes any value
/// so callers can point it elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    pub data_root: PathBuf,
    pub warehouse: PathBuf,
    pub catalog: String,
    pub app_name: String,
    pub batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            warehouse: PathBuf::from(DEFAULT_WAREHOUSE),
            catalog: DEFAULT_CATALOG.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl IngestConfig {
    /// Same fixed catalog name and app name, different directories.
    pub fn with_roots(data_root: impl Into<PathBuf>, warehouse: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            warehouse: warehouse.into(),
            ..Self::default()
        }
    }
}
