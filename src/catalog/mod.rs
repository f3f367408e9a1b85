// src/catalog/mod.rs

pub mod local;
pub mod metadata;

use anyhow::Result;
use std::fmt;
use thiserror::Error;

use crate::dataframe::DataFrame;

pub use local::LocalCatalog;
pub use metadata::{ColumnMeta, TableMetadata};

/// Failures a caller may want to tell apart. Everything else travels as a
/// plain `anyhow::Error`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("table {0} already exists")]
    TableAlreadyExists(String),
    #[error("table {0} not found")]
    TableNotFound(String),
    #[error("catalog {0:?} is not registered with this session")]
    CatalogNotFound(String),
    #[error("invalid table identifier {0:?}: expected <catalog>.<table>")]
    InvalidIdentifier(String),
}

/// Storage for named tables.
///
/// Tables are only ever created or read back; there is no replace, append or
/// drop.
pub trait Catalog: Send + Sync {
    fn name(&self) -> &str;

    fn table_exists(&self, ident: &TableIdent) -> Result<bool>;

    /// Create `ident` holding the rows of `frame`. Fails with
    /// [`CatalogError::TableAlreadyExists`] if the table is already there.
    fn create_table(&self, ident: &TableIdent, frame: &DataFrame) -> Result<TableMetadata>;

    fn load_table(&self, ident: &TableIdent) -> Result<(TableMetadata, DataFrame)>;
}

/// A dot-separated table name: `catalog.[namespace.]*table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableIdent {
    catalog: String,
    namespace: Vec<String>,
    name: String,
}

impl TableIdent {
    pub fn parse(ident: &str) -> Result<Self, CatalogError> {
        let parts: Vec<&str> = ident.split('.').collect();
        if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(CatalogError::InvalidIdentifier(ident.to_string()));
        }
        let last = parts.len() - 1;
        Ok(Self {
            catalog: parts[0].to_string(),
            namespace: parts[1..last].iter().map(|s| s.to_string()).collect(),
            name: parts[last].to_string(),
        })
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn namespace(&self) -> &[String] {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TableIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.catalog)?;
        for ns in &self.namespace {
            write!(f, ".{}", ns)?;
        }
        write!(f, ".{}", self.name)
    }
}
