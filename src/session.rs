// src/session.rs

use anyhow::Result;
use std::{collections::HashMap, path::Path, sync::Arc};
use tracing::{debug, info};

use crate::{
    catalog::{Catalog, CatalogError, LocalCatalog},
    config::{IngestConfig, DEFAULT_APP_NAME, DEFAULT_BATCH_SIZE},
    dataframe::DataFrame,
    read,
};

/// Handle on the local, single-worker engine: the registered catalogs plus
/// read settings.
///
/// Create one per process (or per test) and let it drop; nothing is kept in
/// globals, so several sessions can live side by side.
pub struct Session {
    app_name: String,
    batch_size: usize,
    catalogs: HashMap<String, Arc<dyn Catalog>>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Session with the configured local catalog registered.
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::builder()
            .app_name(&config.app_name)
            .batch_size(config.batch_size)
            .catalog(Arc::new(LocalCatalog::new(
                &config.catalog,
                &config.warehouse,
            )))
            .build()
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Look up a registered catalog by name.
    pub fn catalog(&self, name: &str) -> Result<Arc<dyn Catalog>> {
        self.catalogs
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::CatalogNotFound(name.to_string()).into())
    }

    /// Read a header-row CSV file into a [`DataFrame`].
    pub fn read_csv<P: AsRef<Path>>(&self, path: P) -> Result<DataFrame> {
        read::read_csv(path, self.batch_size)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(app = %self.app_name, "session stopped");
    }
}

pub struct SessionBuilder {
    app_name: String,
    batch_size: usize,
    catalogs: HashMap<String, Arc<dyn Catalog>>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            catalogs: HashMap::new(),
        }
    }
}

impl SessionBuilder {
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    pub fn batch_size(mut self, rows: usize) -> Self {
        self.batch_size = rows.max(1);
        self
    }

    /// Register `catalog` under its own name. A later catalog with the same
    /// name replaces the earlier one.
    pub fn catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
        self.catalogs.insert(catalog.name().to_string(), catalog);
        self
    }

    pub fn build(self) -> Session {
        let mut names: Vec<&String> = self.catalogs.keys().collect();
        names.sort();
        info!(app = %self.app_name, catalogs = ?names, "session started");
        Session {
            app_name: self.app_name,
            batch_size: self.batch_size,
            catalogs: self.catalogs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn defaults() {
        let session = Session::builder().build();
        assert_eq!(session.app_name(), "Import csv");
        assert_eq!(session.batch_size(), DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn from_config_registers_local_catalog() {
        let wh = tempdir().unwrap();
        let cfg = IngestConfig::with_roots("/unused", wh.path());
        let session = Session::from_config(&cfg);

        assert_eq!(session.app_name(), "Import csv");
        assert!(session.catalog("my_catalog").is_ok());
    }

    #[test]
    fn resolves_registered_catalog() {
        let wh = tempdir().unwrap();
        let session = Session::builder()
            .catalog(Arc::new(LocalCatalog::new("my_catalog", wh.path())))
            .build();

        assert_eq!(session.catalog("my_catalog").unwrap().name(), "my_catalog");

        let err = session.catalog("other").err().unwrap();
        assert_eq!(
            err.downcast_ref::<CatalogError>(),
            Some(&CatalogError::CatalogNotFound("other".into()))
        );
    }

    #[test]
    fn read_then_write_through_session() -> Result<()> {
        let wh = tempdir()?;
        let mut csv = NamedTempFile::new()?;
        csv.write_all(b"id,amount\n1,10\n2,20\n")?;
        csv.flush()?;

        let session = Session::builder()
            .batch_size(1)
            .catalog(Arc::new(LocalCatalog::new("my_catalog", wh.path())))
            .build();

        let df = session.read_csv(csv.path())?;
        assert_eq!(df.batches().len(), 2);

        let writer = df.write_to(&session, "my_catalog.sales")?;
        assert_eq!(writer.ident().to_string(), "my_catalog.sales");
        let meta = writer.create()?;
        assert_eq!(meta.record_count, 2);
        Ok(())
    }

    #[test]
    fn write_to_unregistered_catalog_fails() -> Result<()> {
        let session = Session::builder().build();
        let df = DataFrame::no_columns();

        let err = df.write_to(&session, "my_catalog.sales")?.create().unwrap_err();
        assert_eq!(
            err.downcast_ref::<CatalogError>(),
            Some(&CatalogError::CatalogNotFound("my_catalog".into()))
        );
        Ok(())
    }
}
