pub mod catalog;
pub mod cli;
pub mod config;
pub mod dataframe;
pub mod ingest;
pub mod read;
pub mod session;

pub use catalog::{Catalog, CatalogError, LocalCatalog, TableIdent, TableMetadata};
pub use config::IngestConfig;
pub use dataframe::DataFrame;
pub use ingest::{IngestReport, Ingestor};
pub use session::Session;
