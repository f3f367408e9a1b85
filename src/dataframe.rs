// src/dataframe.rs

use anyhow::{anyhow, Context, Result};
use arrow::{
    array::StringArray,
    datatypes::{Schema, SchemaRef},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::info;

use crate::{
    catalog::{TableIdent, TableMetadata},
    session::Session,
};

/// An in-memory table: one Arrow schema plus the record batches that follow it.
#[derive(Debug, Clone)]
pub struct DataFrame {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl DataFrame {
    /// Build a frame from batches that all share `schema`.
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        for (idx, batch) in batches.iter().enumerate() {
            if batch.schema().fields() != schema.fields() {
                return Err(anyhow!(
                    "record batch #{} does not match the frame schema",
                    idx
                ));
            }
        }
        Ok(Self { schema, batches })
    }

    /// A frame with columns but no rows.
    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::new(),
        }
    }

    /// No columns, no rows. What an empty CSV file reads as.
    pub fn no_columns() -> Self {
        Self::empty(Arc::new(Schema::empty()))
    }

    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn columns(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// All values of a text column, in row order across batches.
    pub fn string_column(&self, name: &str) -> Result<Vec<Option<String>>> {
        let idx = self
            .schema
            .index_of(name)
            .with_context(|| format!("no column named {:?}", name))?;

        let mut out = Vec::with_capacity(self.num_rows());
        for batch in &self.batches {
            let arr = batch
                .column(idx)
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| anyhow!("column {:?} is not a Utf8 column", name))?;
            out.extend(arr.iter().map(|v| v.map(str::to_string)));
        }
        Ok(out)
    }

    /// Start a write of this frame to the table `ident` (e.g. `my_catalog.sales`).
    pub fn write_to<'a>(&'a self, session: &'a Session, ident: &str) -> Result<DataFrameWriter<'a>> {
        let ident = TableIdent::parse(ident)?;
        Ok(DataFrameWriter {
            frame: self,
            session,
            ident,
        })
    }
}

/// Pending write of a [`DataFrame`] to one catalog table.
///
/// Only `create` exists: a table is never replaced or appended to.
pub struct DataFrameWriter<'a> {
    frame: &'a DataFrame,
    session: &'a Session,
    ident: TableIdent,
}

impl DataFrameWriter<'_> {
    pub fn ident(&self) -> &TableIdent {
        &self.ident
    }

    /// Create the table. Fails if it already exists.
    pub fn create(self) -> Result<TableMetadata> {
        let catalog = self.session.catalog(self.ident.catalog())?;
        let meta = catalog.create_table(&self.ident, self.frame)?;
        info!(
            table = %self.ident,
            rows = meta.record_count,
            columns = meta.columns.len(),
            "table created"
        );
        Ok(meta)
    }
}
