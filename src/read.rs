// src/read.rs

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use csv::{ReaderBuilder, StringRecord};
use std::{collections::HashMap, fs::File, path::Path, sync::Arc};
use tracing::{debug, warn};

use crate::dataframe::DataFrame;

/// Read a comma-delimited file whose first record is the column header.
///
/// Every column comes back as nullable `Utf8`; empty fields are null.
/// Records are fitted to the header: missing trailing fields are null and
/// extra fields are dropped. A missing file fails before anything else is
/// attempted; undecodable input (e.g. invalid UTF-8) fails the whole read.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_csv<P: AsRef<Path>>(path: P, batch_size: usize) -> Result<DataFrame> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open CSV file {}", path.display()))?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // ragged records are fitted below, not rejected
        .from_reader(file);

    // 1) header record → column names
    let raw_headers: Vec<String> = rdr
        .headers()
        .with_context(|| format!("failed to read CSV header of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    if raw_headers.is_empty() {
        warn!("CSV file has no header row, reading as an empty frame");
        return Ok(DataFrame::no_columns());
    }

    let headers = normalize_headers(&raw_headers);
    debug!(columns = ?headers, "parsed CSV header");

    let fields: Vec<Field> = headers
        .iter()
        .map(|n| Field::new(n, DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    // 2) data records, chunked into batches
    let batch_size = batch_size.max(1);
    let mut batches: Vec<RecordBatch> = Vec::new();
    let mut pending: Vec<StringRecord> = Vec::with_capacity(batch_size);
    let mut ragged = 0usize;

    for (idx, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("CSV parse error in {} at record {}", path.display(), idx))?;
        if record.len() != headers.len() {
            ragged += 1;
        }
        pending.push(record);

        if pending.len() >= batch_size {
            batches.push(build_batch(&schema, &pending)?);
            pending.clear();
        }
    }
    if !pending.is_empty() {
        batches.push(build_batch(&schema, &pending)?);
    }

    if ragged > 0 {
        warn!(
            ragged,
            width = headers.len(),
            "records with a field count different from the header were padded or truncated"
        );
    }

    DataFrame::try_new(schema, batches)
}

/// One Utf8 column per schema field; fields past the end of a record (and
/// empty fields) become null, fields past the last column are ignored.
fn build_batch(schema: &SchemaRef, records: &[StringRecord]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = (0..schema.fields().len())
        .map(|i| {
            let arr: StringArray = records
                .iter()
                .map(|r| r.get(i).filter(|v| !v.is_empty()))
                .collect();
            Arc::new(arr) as ArrayRef
        })
        .collect();

    RecordBatch::try_new(Arc::clone(schema), columns).context("building CSV record batch")
}

/// Turn raw header cells into usable, unique column names.
///
/// - a blank cell becomes `_c<index>`
/// - names that appear more than once (ignoring case) get their column index
///   appended, e.g. `a,A,b` → `a0,A1,b`
pub fn normalize_headers(raw: &[String]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for name in raw.iter().filter(|n| !n.is_empty()) {
        *counts.entry(name.to_lowercase()).or_default() += 1;
    }

    raw.iter()
        .enumerate()
        .map(|(idx, name)| {
            if name.is_empty() {
                format!("_c{}", idx)
            } else if counts.get(&name.to_lowercase()).copied().unwrap_or(0) > 1 {
                format!("{}{}", name, idx)
            } else {
                name.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{ErrorKind, Write};
    use tempfile::NamedTempFile;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,csv_ingest::read=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn csv_file(content: &str) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(content.as_bytes()).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn reads_header_and_rows() -> Result<()> {
        init_test_logging();
        let tmp = csv_file("id,amount\n1,10\n2,20\n");

        let df = read_csv(tmp.path(), 1024)?;

        assert_eq!(df.columns(), vec!["id", "amount"]);
        assert_eq!(df.num_rows(), 2);
        assert_eq!(
            df.string_column("id")?,
            vec![Some("1".to_string()), Some("2".to_string())]
        );
        assert_eq!(
            df.string_column("amount")?,
            vec![Some("10".to_string()), Some("20".to_string())]
        );
        Ok(())
    }

    #[test]
    fn header_only_file_has_columns_and_no_rows() -> Result<()> {
        let tmp = csv_file("id,amount\n");

        let df = read_csv(tmp.path(), 1024)?;

        assert_eq!(df.columns(), vec!["id", "amount"]);
        assert_eq!(df.num_rows(), 0);
        Ok(())
    }

    #[test]
    fn empty_file_reads_as_no_columns() -> Result<()> {
        let tmp = csv_file("");

        let df = read_csv(tmp.path(), 1024)?;

        assert!(df.columns().is_empty());
        assert_eq!(df.num_rows(), 0);
        Ok(())
    }

    #[test]
    fn small_batch_size_splits_rows() -> Result<()> {
        let tmp = csv_file("n\n1\n2\n3\n4\n5\n");

        let df = read_csv(tmp.path(), 2)?;

        assert_eq!(df.batches().len(), 3);
        assert_eq!(df.num_rows(), 5);
        Ok(())
    }

    #[test]
    fn quoted_fields_and_empty_values() -> Result<()> {
        let tmp = csv_file("name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\nDoe,\n");

        let df = read_csv(tmp.path(), 1024)?;

        assert_eq!(
            df.string_column("name")?,
            vec![Some("Smith, J".to_string()), Some("Doe".to_string())]
        );
        assert_eq!(
            df.string_column("note")?,
            vec![Some("said \"hi\"".to_string()), None]
        );
        Ok(())
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_csv(dir.path().join("nope.csv"), 1024).unwrap_err();

        let io = err
            .downcast_ref::<std::io::Error>()
            .expect("root cause should be an io error");
        assert_eq!(io.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn ragged_records_are_fitted_to_header() -> Result<()> {
        let tmp = csv_file("id,amount\n1,10\n2\n3,30,extra\n");

        let df = read_csv(tmp.path(), 1024)?;

        assert_eq!(df.columns(), vec!["id", "amount"]);
        assert_eq!(
            df.string_column("id")?,
            vec![
                Some("1".to_string()),
                Some("2".to_string()),
                Some("3".to_string())
            ]
        );
        assert_eq!(
            df.string_column("amount")?,
            vec![Some("10".to_string()), None, Some("30".to_string())]
        );
        Ok(())
    }

    #[test]
    fn invalid_utf8_fails() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"id,amount\n1,\xff\xfe\n").unwrap();
        tmp.flush().unwrap();

        assert!(read_csv(tmp.path(), 1024).is_err());
    }

    #[test]
    fn normalizes_blank_and_duplicate_headers() {
        let raw: Vec<String> = ["id", "", "Value", "value", "x"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(
            normalize_headers(&raw),
            vec!["id", "_c1", "Value2", "value3", "x"]
        );
    }
}
