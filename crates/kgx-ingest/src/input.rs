//! Input readers
//!
//! Source exports arrive as tab-delimited files (optionally gzipped) or as
//! JSON-lines streams of already-keyed flat records. Readers load the whole
//! file; the engine is a batch pass over one run's rows.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use kgx_common::{KgxError, Result};
use serde::de::DeserializeOwned;
use serde_jsonlines::JsonLinesReader;
use tracing::debug;

use crate::model::RawFlatRecord;

/// Open a file for buffered reading, decompressing `.gz` transparently
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        debug!(path = %path.display(), "Opening gzip input");
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read a headed, tab-delimited export into typed rows.
///
/// Quoting is disabled: database exports write quotes literally inside names.
pub fn read_tsv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .quoting(false)
        .from_reader(open_input(path)?);

    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()?;

    debug!(path = %path.display(), rows = rows.len(), "Read tab-delimited input");
    Ok(rows)
}

/// Read a JSON-lines file of loose flat records.
///
/// A line that is not valid JSON aborts the read with its line number.
pub fn read_flat_records(path: &Path) -> Result<Vec<RawFlatRecord>> {
    let reader = JsonLinesReader::new(open_input(path)?);
    let mut records = Vec::new();

    for (index, record) in reader.read_all::<RawFlatRecord>().enumerate() {
        let record = record.map_err(|e| {
            KgxError::parse(format!("{}:{}: {}", path.display(), index + 1, e))
        })?;
        records.push(record);
    }

    debug!(path = %path.display(), records = records.len(), "Read flat records");
    Ok(records)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde::Deserialize;
    use std::io::Write;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize)]
    struct Row {
        id: String,
        name: String,
    }

    #[test]
    fn test_read_tsv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.tsv");
        std::fs::write(&path, "id\tname\nHGNC:1\tA \"quoted\" name\nHGNC:2\tB\n").unwrap();

        let rows: Vec<Row> = read_tsv(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "HGNC:1");
        assert_eq!(rows[0].name, "A \"quoted\" name");
    }

    #[test]
    fn test_read_gzipped_tsv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.tsv.gz");

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"id\tname\nHGNC:9\tZ\n").unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let rows: Vec<Row> = read_tsv(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Z");
    }

    #[test]
    fn test_read_flat_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        std::fs::write(
            &path,
            "{\"group_key\":\"g1\",\"role\":1,\"id\":\"HGNC:777\",\"name\":\"BRCA1\"}\n\
             {\"group_key\":\"g1\",\"role\":2,\"id\":\"C009\",\"name\":\"Breast Cancer\"}\n",
        )
        .unwrap();

        let records = read_flat_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id.as_deref(), Some("C009"));
    }

    #[test]
    fn test_malformed_json_line_reports_position() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "{\"group_key\":\"g1\"}\n{not json\n").unwrap();

        let err = read_flat_records(&path).unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = read_flat_records(Path::new("/nonexistent/records.jsonl"));
        assert!(matches!(result, Err(KgxError::Io(_))));
    }
}
