//! Snapshot table loader.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;

use crate::schema::{ParticleId, ParticleRecord, SimTime};

/// Columns every snapshot table must provide.
pub const REQUIRED_COLUMNS: [&str; 8] = ["t", "id", "rx", "ry", "rz", "vx", "vy", "vz"];

/// One data row as it appears in the table.
#[derive(Debug, Deserialize)]
struct RawRow {
    t: f64,
    id: u64,
    rx: f64,
    ry: f64,
    rz: f64,
    vx: f64,
    vy: f64,
    vz: f64,
}

/// Errors raised while parsing a snapshot table.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to open {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to read table header: {0}")]
    Header(#[source] csv::Error),
    #[error("Table header is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("Malformed row at line {line}: {source}")]
    Row { line: u64, source: csv::Error },
    #[error("Non-finite time value {value} at line {line}")]
    NonFiniteTime { line: u64, value: f64 },
}

/// Reads delimited snapshot tables into [`ParticleRecord`]s.
///
/// Rows are returned in file order. No cross-row validation happens here.
#[derive(Debug, Clone, Copy)]
pub struct TableLoader {
    delimiter: u8,
}

impl Default for TableLoader {
    fn default() -> Self {
        Self { delimiter: b'\t' }
    }
}

impl TableLoader {
    /// Create a loader for tab-separated tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load a table from disk.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<ParticleRecord>, ParseError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let records = self.load_from_reader(file)?;
        log::info!("Loaded {} snapshot rows from {}", records.len(), path.display());
        Ok(records)
    }

    /// Load a table from any reader.
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<Vec<ParticleRecord>, ParseError> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr.headers().map_err(ParseError::Header)?.clone();
        check_headers(&headers)?;

        let mut records = Vec::new();
        let mut row = StringRecord::new();
        loop {
            match rdr.read_record(&mut row) {
                Ok(true) => {}
                Ok(false) => break,
                Err(source) => {
                    let line = source.position().map_or(0, |p| p.line());
                    return Err(ParseError::Row { line, source });
                }
            }

            let line = row.position().map_or(0, |p| p.line());
            let raw: RawRow = row
                .deserialize(Some(&headers))
                .map_err(|source| ParseError::Row { line, source })?;

            let t = SimTime::new(raw.t).ok_or(ParseError::NonFiniteTime { line, value: raw.t })?;
            records.push(ParticleRecord {
                id: ParticleId(raw.id),
                t,
                position: [raw.rx, raw.ry, raw.rz],
                velocity: [raw.vx, raw.vy, raw.vz],
            });
        }

        Ok(records)
    }
}

fn check_headers(headers: &StringRecord) -> Result<(), ParseError> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ParseError::MissingColumn(column));
        }
    }
    for extra in headers.iter().filter(|h| !REQUIRED_COLUMNS.contains(h)) {
        log::debug!("Ignoring extra column '{}'", extra);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TABLE: &str = "t\tid\trx\try\trz\tvx\tvy\tvz\n\
                         0\t2\t2.0\t0\t0\t0\t0\t0\n\
                         0\t1\t1.0\t0\t0\t0.5\t0\t0\n\
                         1\t1\t1.5\t0\t0\t0.5\t0\t0\n";

    #[test]
    fn test_load_preserves_row_order() {
        let records = TableLoader::new().load_from_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);

        let ids: Vec<u64> = records.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![2, 1, 1]);
        assert_eq!(records[1].velocity, [0.5, 0.0, 0.0]);
        assert_eq!(records[2].t.value(), 1.0);
    }

    #[test]
    fn test_columns_in_any_order() {
        let table = "id\tt\tvx\tvy\tvz\trx\try\trz\textra\n7\t0.25\t1\t2\t3\t4\t5\t6\tfoo\n";
        let records = TableLoader::new().load_from_reader(table.as_bytes()).unwrap();
        assert_eq!(records[0].id, ParticleId(7));
        assert_eq!(records[0].t.value(), 0.25);
        assert_eq!(records[0].position, [4.0, 5.0, 6.0]);
        assert_eq!(records[0].velocity, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_missing_column() {
        let table = "t\tid\trx\try\trz\tvx\tvy\n0\t1\t0\t0\t0\t0\t0\n";
        let err = TableLoader::new().load_from_reader(table.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MissingColumn("vz")));
    }

    #[test]
    fn test_non_numeric_value_reports_line() {
        let table = "t\tid\trx\try\trz\tvx\tvy\tvz\n\
                     0\t1\t0\t0\t0\t0\t0\t0\n\
                     0\t2\tabc\t0\t0\t0\t0\t0\n";
        let err = TableLoader::new().load_from_reader(table.as_bytes()).unwrap_err();
        match err {
            ParseError::Row { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_column_count() {
        let table = "t\tid\trx\try\trz\tvx\tvy\tvz\n0\t1\t0\t0\n";
        let err = TableLoader::new().load_from_reader(table.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Row { line: 2, .. }));
    }

    #[test]
    fn test_non_finite_time() {
        let table = "t\tid\trx\try\trz\tvx\tvy\tvz\nNaN\t1\t0\t0\t0\t0\t0\t0\n";
        let err = TableLoader::new().load_from_reader(table.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::NonFiniteTime { line: 2, .. }));
    }

    #[test]
    fn test_comma_delimiter() {
        let table = "t,id,rx,ry,rz,vx,vy,vz\n0, 3, 1.0, 2.0, 3.0, 0, 0, 0\n";
        let records = TableLoader::new()
            .with_delimiter(b',')
            .load_from_reader(table.as_bytes())
            .unwrap();
        assert_eq!(records[0].position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();

        let records = TableLoader::new().load(file.path()).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_missing_file() {
        let err = TableLoader::new().load("/nonexistent/snapshots.tsv").unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
