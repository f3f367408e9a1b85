// src/catalog/metadata.rs

use anyhow::{Context, Result};
use arrow::datatypes::Schema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

pub const FORMAT_VERSION: u32 = 1;

/// One column as recorded in the metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    /// Arrow data type, rendered with `Display` (e.g. `Utf8`).
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
}

/// `metadata/table.json` of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub format_version: u32,
    /// Fully qualified name, e.g. `my_catalog.sales`.
    pub identifier: String,
    pub location: String,
    pub columns: Vec<ColumnMeta>,
    /// Data files relative to `location`.
    pub data_files: Vec<String>,
    pub record_count: u64,
    pub created_at: DateTime<Utc>,
}

impl TableMetadata {
    pub fn columns_from_schema(schema: &Schema) -> Vec<ColumnMeta> {
        schema
            .fields()
            .iter()
            .map(|f| ColumnMeta {
                name: f.name().to_string(),
                data_type: f.data_type().to_string(),
                nullable: f.is_nullable(),
            })
            .collect()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Write as pretty JSON via `<path>.tmp` + rename.
    pub fn write(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp)
                .with_context(|| format!("creating metadata file {}", tmp.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self).context("serializing table metadata")?;
            writer.flush().context("flushing table metadata")?;
        }
        fs::rename(&tmp, path).with_context(|| {
            format!("failed to rename `{}` to `{}`", tmp.display(), path.display())
        })?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening metadata file {}", path.display()))?;
        serde_json::from_reader(file)
            .with_context(|| format!("parsing metadata file {}", path.display()))
    }
}
