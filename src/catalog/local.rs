// src/catalog/local.rs

use anyhow::{Context, Result};
use chrono::Utc;
use glob::{glob, Pattern};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    io::{BufWriter, ErrorKind},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use super::{
    metadata::{TableMetadata, FORMAT_VERSION},
    Catalog, CatalogError, TableIdent,
};
use crate::dataframe::DataFrame;

const METADATA_DIR: &str = "metadata";
const METADATA_FILE: &str = "table.json";
const DATA_DIR: &str = "data";
/// Suffix of namespace directories. Table and namespace names never contain
/// a dot, so a namespace directory can't collide with a table directory or
/// with a table's own `data/` and `metadata/` directories.
const NAMESPACE_SUFFIX: &str = ".db";

/// A catalog stored on the local filesystem.
///
/// Layout under the warehouse root:
///
/// ```text
/// <warehouse>/<catalog>/<namespace>.db/.../<table>/
///     data/part-00000.parquet
///     metadata/table.json
/// ```
///
/// The table directory is claimed with a non-recursive `create_dir`, so of two
/// concurrent creators exactly one wins and the other sees
/// [`CatalogError::TableAlreadyExists`]. A table counts as existing only once
/// its `metadata/table.json` is in place.
pub struct LocalCatalog {
    name: String,
    warehouse: PathBuf,
}

impl LocalCatalog {
    pub fn new(name: impl Into<String>, warehouse: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            warehouse: warehouse.into(),
        }
    }

    fn catalog_root(&self) -> PathBuf {
        self.warehouse.join(&self.name)
    }

    /// Directory the table `ident` lives in.
    pub fn table_location(&self, ident: &TableIdent) -> Result<PathBuf> {
        if ident.catalog() != self.name {
            return Err(CatalogError::CatalogNotFound(ident.catalog().to_string()).into());
        }
        let mut path = self.catalog_root();
        for ns in ident.namespace() {
            path.push(format!("{}{}", ns, NAMESPACE_SUFFIX));
        }
        path.push(ident.name());
        Ok(path)
    }

    /// Identifiers of every table in this catalog, sorted.
    pub fn list_tables(&self) -> Result<Vec<TableIdent>> {
        let pattern = format!(
            "{}/**/{}/{}",
            Pattern::escape(&self.catalog_root().display().to_string()),
            METADATA_DIR,
            METADATA_FILE
        );
        let mut tables = Vec::new();
        for entry in glob(&pattern).context("invalid glob pattern for table listing")? {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    warn!("cannot read glob entry: {:?}", e);
                    continue;
                }
            };
            let meta = TableMetadata::read(&path)?;
            tables.push(TableIdent::parse(&meta.identifier)?);
        }
        tables.sort_by_key(|t| t.to_string());
        Ok(tables)
    }

    fn write_table_files(
        &self,
        ident: &TableIdent,
        location: &Path,
        frame: &DataFrame,
    ) -> Result<TableMetadata> {
        let mut data_files = Vec::new();

        // a frame without columns has nothing to put in a data file
        if !frame.schema().fields().is_empty() {
            let data_dir = location.join(DATA_DIR);
            fs::create_dir(&data_dir)
                .with_context(|| format!("creating data directory {}", data_dir.display()))?;
            let file_name = "part-00000.parquet";
            let bytes = write_parquet(frame, &data_dir.join(file_name))?;
            debug!(file = file_name, bytes, "wrote data file");
            data_files.push(format!("{}/{}", DATA_DIR, file_name));
        }

        let meta = TableMetadata {
            format_version: FORMAT_VERSION,
            identifier: ident.to_string(),
            location: location.display().to_string(),
            columns: TableMetadata::columns_from_schema(&frame.schema()),
            data_files,
            record_count: frame.num_rows() as u64,
            created_at: Utc::now(),
        };

        let meta_dir = location.join(METADATA_DIR);
        fs::create_dir(&meta_dir)
            .with_context(|| format!("creating metadata directory {}", meta_dir.display()))?;
        meta.write(&meta_dir.join(METADATA_FILE))?;

        Ok(meta)
    }
}

impl Catalog for LocalCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    fn table_exists(&self, ident: &TableIdent) -> Result<bool> {
        let location = self.table_location(ident)?;
        Ok(location.join(METADATA_DIR).join(METADATA_FILE).is_file())
    }

    /// A table directory left without metadata (the process died mid-create)
    /// still blocks a new create with `TableAlreadyExists`, while
    /// `table_exists` and `load_table` report it as absent. Remove the
    /// directory by hand to create the table again.
    #[tracing::instrument(level = "info", skip(self, frame), fields(table = %ident))]
    fn create_table(&self, ident: &TableIdent, frame: &DataFrame) -> Result<TableMetadata> {
        let location = self.table_location(ident)?;

        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating namespace directory {}", parent.display()))?;
        }

        match fs::create_dir(&location) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(CatalogError::TableAlreadyExists(ident.to_string()).into());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("creating table directory {}", location.display()));
            }
        }
        debug!(location = %location.display(), "claimed table location");

        match self.write_table_files(ident, &location, frame) {
            Ok(meta) => {
                info!(
                    location = %location.display(),
                    rows = meta.record_count,
                    "wrote table"
                );
                Ok(meta)
            }
            Err(err) => {
                // leave nothing half-written behind
                if let Err(e) = fs::remove_dir_all(&location) {
                    warn!(location = %location.display(), "failed to clean up table: {}", e);
                }
                Err(err)
            }
        }
    }

    fn load_table(&self, ident: &TableIdent) -> Result<(TableMetadata, DataFrame)> {
        let location = self.table_location(ident)?;
        let meta_path = location.join(METADATA_DIR).join(METADATA_FILE);
        if !meta_path.is_file() {
            return Err(CatalogError::TableNotFound(ident.to_string()).into());
        }
        let meta = TableMetadata::read(&meta_path)?;

        let mut schema = None;
        let mut batches = Vec::new();
        for rel in &meta.data_files {
            let path = location.join(rel);
            let file = File::open(&path)
                .with_context(|| format!("failed to open `{}`", path.display()))?;
            let builder = ParquetRecordBatchReaderBuilder::try_new(file)
                .with_context(|| format!("reading parquet footer of {}", path.display()))?;
            schema.get_or_insert_with(|| builder.schema().clone());
            let mut reader = builder.with_batch_size(1024).build()?;
            while let Some(batch) = reader.next().transpose()? {
                batches.push(batch);
            }
        }

        let frame = match schema {
            Some(schema) => DataFrame::try_new(schema, batches)?,
            None => DataFrame::no_columns(),
        };
        Ok((meta, frame))
    }
}

/// Write every batch of `frame` into one Snappy-compressed Parquet file,
/// through `<path>.tmp` + rename. Returns the file size.
fn write_parquet(frame: &DataFrame, path: &Path) -> Result<u64> {
    let tmp = path.with_extension("parquet.tmp");
    let file = File::create(&tmp)
        .with_context(|| format!("could not create temporary file `{}`", tmp.display()))?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), frame.schema(), Some(props))
        .context("creating parquet writer")?;
    for batch in frame.batches() {
        writer.write(batch).context("writing batch to parquet")?;
    }
    writer.close().context("closing parquet writer")?;

    fs::rename(&tmp, path).with_context(|| {
        format!("failed to rename `{}` to `{}`", tmp.display(), path.display())
    })?;

    let size = fs::metadata(path).context("getting file metadata")?.len();
    Ok(size)
}
