// src/ingest.rs

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use crate::{config::IngestConfig, session::Session};

/// Outcome of one ingestion, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: u64,
}

/// Loads `<data-root>/<dataset>.csv` into a new table `<catalog>.<dataset>`.
///
/// The dataset name is used verbatim in both places. Every run is a strict
/// create: ingesting the same dataset twice fails on the second run.
pub struct Ingestor<'a> {
    session: &'a Session,
    data_root: PathBuf,
    catalog: String,
}

impl<'a> Ingestor<'a> {
    pub fn new(session: &'a Session, config: &IngestConfig) -> Self {
        Self {
            session,
            data_root: config.data_root.clone(),
            catalog: config.catalog.clone(),
        }
    }

    /// `<data-root>/<dataset>.csv`, spliced as text: an absolute or `..`
    /// dataset name never replaces the data root the way `Path::join` would.
    pub fn input_path(&self, dataset: &str) -> PathBuf {
        let mut path = self.data_root.clone().into_os_string();
        path.push("/");
        path.push(dataset);
        path.push(".csv");
        PathBuf::from(path)
    }

    pub fn table_ident(&self, dataset: &str) -> String {
        format!("{}.{}", self.catalog, dataset)
    }

    /// Read the dataset's CSV and create its table. Errors from the reader or
    /// the catalog are returned as they are.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn run(&self, dataset: &str) -> Result<IngestReport> {
        let path = self.input_path(dataset);
        let df = self.session.read_csv(&path)?;
        info!(
            path = %path.display(),
            rows = df.num_rows(),
            columns = df.columns().len(),
            "read csv"
        );

        let ident = self.table_ident(dataset);
        let meta = df.write_to(self.session, &ident)?.create()?;

        Ok(IngestReport {
            table: meta.identifier,
            columns: df.columns(),
            rows: meta.record_count,
        })
    }
}
