//! CSV loader: Date, Open, High, Low, Close, Volume (header names are exact,
//! order is free, extra columns are ignored).

use crate::error::LoadError;
use crate::models::RawRecord;
use csv::StringRecord;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    volume: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        Ok(Self {
            date: find("Date").ok_or(LoadError::MissingColumn("Date"))?,
            open: find("Open"),
            high: find("High"),
            low: find("Low"),
            close: find("Close").ok_or(LoadError::MissingColumn("Close"))?,
            volume: find("Volume"),
        })
    }

    fn extract(&self, record: &StringRecord) -> RawRecord {
        let get = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(|s| s.to_string());

        RawRecord {
            date: get(Some(self.date)),
            open: get(self.open),
            high: get(self.high),
            low: get(self.low),
            close: get(Some(self.close)),
            volume: get(self.volume),
        }
    }
}

/// Read every row of a CSV stream into raw records.
///
/// Any CSV-level failure (bad quoting, invalid UTF-8, missing header)
/// fails the whole input; row-level value problems are left to the cleaner.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawRecord>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(rdr.headers()?)?;

    let mut records = Vec::new();
    for result in rdr.records() {
        records.push(columns.extract(&result?));
    }
    Ok(records)
}

/// Open `path` and read its rows.
pub fn load_csv(path: &Path) -> Result<Vec<RawRecord>, LoadError> {
    debug!("Loading {:?}", path);
    let file = std::fs::File::open(path)?;
    read_records(file)
}

/// Short identifier used to attribute results and errors to a file.
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// `*.csv` files directly inside `dir`, sorted by name.
pub fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path.extension().map(|e| e.eq_ignore_ascii_case("csv")).unwrap_or(false);
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Expand CLI inputs: directories become their CSV files, files pass through.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(discover_csv_files(input)?);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_columns_by_name() {
        let data = "\
Adj Close,Close,Date,Volume
1.0,\"1,234.56\",01/02/2024,\"10,000\"
2.0,1240,01/03/2024,
";
        let rows = read_records(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date.as_deref(), Some("01/02/2024"));
        assert_eq!(rows[0].close.as_deref(), Some("1,234.56"));
        assert_eq!(rows[0].volume.as_deref(), Some("10,000"));
        assert_eq!(rows[0].open, None);
        assert_eq!(rows[1].volume.as_deref(), Some(""));
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let data = "Date,Open,Close\n01/02/2024,5\n";
        let rows = read_records(data.as_bytes()).unwrap();
        assert_eq!(rows[0].open.as_deref(), Some("5"));
        assert_eq!(rows[0].close, None);
    }

    #[test]
    fn test_column_names_are_case_sensitive() {
        let data = "date,close\n01/02/2024,100\n";
        match read_records(data.as_bytes()) {
            Err(LoadError::MissingColumn(col)) => assert_eq!(col, "Date"),
            other => panic!("expected missing Date column, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_close_column() {
        let data = "Date,Open\n01/02/2024,100\n";
        assert!(matches!(
            read_records(data.as_bytes()),
            Err(LoadError::MissingColumn("Close"))
        ));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(read_records("".as_bytes()).is_err());
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let data: &[u8] = b"Date,Close\n01/02/2024,\xff\xfe\n";
        assert!(matches!(read_records(data), Err(LoadError::Csv(_))));
    }

    #[test]
    fn test_file_label() {
        assert_eq!(file_label(Path::new("/tmp/data/AAPL.csv")), "AAPL.csv");
    }
}
