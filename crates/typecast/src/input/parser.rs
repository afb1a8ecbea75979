//! File ingestion: CSV (Windows-1252) and Excel workbooks.

use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use calamine::{Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use encoding_rs::WINDOWS_1252;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::source::{Dataset, SourceMetadata};
use crate::error::{Result, TypecastError};
use crate::schema::{CellValue, Column};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Cell texts read as missing values in CSV input (case-insensitive).
const NULL_MARKERS: &[&str] = &[
    "", "na", "n/a", "nan", "-nan", "null", "none", "#n/a", "#na", "<na>",
];

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
}

impl FileFormat {
    /// Pick the format from a file name's extension.
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(FileFormat::Csv),
            Some("xlsx") | Some("xls") => Ok(FileFormat::Spreadsheet),
            _ => Err(TypecastError::UnsupportedFormat(format!(
                "'{}': only CSV and Excel files are supported",
                file_name
            ))),
        }
    }
}

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// CSV delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the first row is a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// CSV quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Turns uploaded bytes into a [`Dataset`].
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Read a file from disk and parse it according to its extension.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(Dataset, SourceMetadata)> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        // Reject before touching the file
        FileFormat::from_file_name(&file_name)?;

        let bytes = std::fs::read(path).map_err(|e| TypecastError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.parse_bytes(&file_name, &bytes)
    }

    /// Parse an uploaded byte stream, dispatching on the file name.
    pub fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<(Dataset, SourceMetadata)> {
        let format = FileFormat::from_file_name(file_name)?;

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let (dataset, format_name, encoding) = match format {
            FileFormat::Csv => {
                // Legacy single-byte encoding; never fails to decode
                let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
                let delimiter = match self.config.delimiter {
                    Some(d) => d,
                    None => detect_delimiter(text.as_bytes())?,
                };
                let dataset = self.parse_csv(text.as_bytes(), delimiter)?;
                let format_name = match delimiter {
                    b'\t' => "tsv",
                    b',' => "csv",
                    b';' => "csv-semicolon",
                    b'|' => "psv",
                    _ => "delimited",
                };
                (dataset, format_name.to_string(), WINDOWS_1252.name())
            }
            FileFormat::Spreadsheet => {
                let extension = if file_name.to_ascii_lowercase().ends_with(".xls") {
                    "xls"
                } else {
                    "xlsx"
                };
                (self.parse_spreadsheet(bytes)?, extension.to_string(), "spreadsheet")
            }
        };

        debug!(
            file = file_name,
            format = %format_name,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "ingested dataset"
        );

        let metadata = SourceMetadata::new(
            file_name,
            hash,
            bytes.len() as u64,
            format_name,
            encoding,
            &dataset,
        );

        Ok((dataset, metadata))
    }

    /// Parse delimited text.
    fn parse_csv(&self, bytes: &[u8], delimiter: u8) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.config.has_header)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut rows: Vec<Vec<String>> = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }
            let record = result?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        let headers: Vec<String> = if self.config.has_header {
            reader.headers()?.iter().map(|s| s.to_string()).collect()
        } else {
            // Generate column names
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            (0..width).map(|i| format!("column_{}", i + 1)).collect()
        };

        if headers.is_empty() {
            return Err(TypecastError::EmptyData("No columns found".to_string()));
        }
        if rows.is_empty() {
            return Err(TypecastError::EmptyData("No data rows found".to_string()));
        }

        let mut raw_columns: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); headers.len()];
        for row in rows {
            let mut row = row.into_iter();
            // Pad short rows, drop extra fields
            for column in raw_columns.iter_mut() {
                column.push(row.next().unwrap_or_default());
            }
        }

        Dataset::new(
            headers
                .into_iter()
                .zip(raw_columns)
                .map(|(name, raw)| Column::new(name, type_text_column(raw)))
                .collect(),
        )
    }

    /// Parse the first worksheet of an xlsx/xls workbook.
    fn parse_spreadsheet(&self, bytes: &[u8]) -> Result<Dataset> {
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| TypecastError::EmptyData("Workbook has no worksheets".to_string()))??;

        let mut sheet_rows = range.rows();
        let headers: Vec<String> = if self.config.has_header {
            let header = sheet_rows
                .next()
                .ok_or_else(|| TypecastError::EmptyData("Worksheet is empty".to_string()))?;
            header
                .iter()
                .map(|data| data_to_cell(data).display_text().unwrap_or_default())
                .collect()
        } else {
            (0..range.width()).map(|i| format!("column_{}", i + 1)).collect()
        };

        let limit = self.config.max_rows.unwrap_or(usize::MAX);
        let rows: Vec<Vec<CellValue>> = sheet_rows
            .take(limit)
            .map(|row| row.iter().map(data_to_cell).collect())
            .collect();

        if headers.is_empty() {
            return Err(TypecastError::EmptyData("No columns found".to_string()));
        }
        if rows.is_empty() {
            return Err(TypecastError::EmptyData("No data rows found".to_string()));
        }

        Dataset::from_rows(headers, rows)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a CSV cell is a missing-value marker.
pub fn is_null_marker(value: &str) -> bool {
    let trimmed = value.trim();
    NULL_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Give a CSV column the representation a dataframe reader would: integers
/// if every value is one, else floats, else booleans, else the raw text.
fn type_text_column(raw: Vec<String>) -> Vec<CellValue> {
    let present = || raw.iter().filter(|v| !is_null_marker(v)).map(|v| v.trim());

    let typed: Option<Vec<CellValue>> = if present().all(|v| v.parse::<i64>().is_ok()) {
        Some(convert(&raw, |v| v.parse().ok().map(CellValue::Integer)))
    } else if present().all(|v| v.parse::<f64>().is_ok()) {
        Some(convert(&raw, |v| v.parse().ok().map(CellValue::Float)))
    } else if present().all(|v| v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false")) {
        Some(convert(&raw, |v| Some(CellValue::Bool(v.eq_ignore_ascii_case("true")))))
    } else {
        None
    };

    typed.unwrap_or_else(|| {
        raw.into_iter()
            .map(|v| {
                if is_null_marker(&v) {
                    CellValue::Null
                } else {
                    CellValue::Text(v)
                }
            })
            .collect()
    })
}

fn convert(raw: &[String], parse: impl Fn(&str) -> Option<CellValue>) -> Vec<CellValue> {
    raw.iter()
        .map(|v| {
            if is_null_marker(v) {
                CellValue::Null
            } else {
                parse(v.trim()).unwrap_or(CellValue::Null)
            }
        })
        .collect()
}

/// Map a spreadsheet cell onto a dataset cell. Error cells become null.
fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                dt.as_duration().map(CellValue::Duration).unwrap_or(CellValue::Null)
            } else {
                dt.as_datetime().map(CellValue::DateTime).unwrap_or(CellValue::Null)
            }
        }
        Data::DateTimeIso(s) => s
            .parse::<NaiveDateTime>()
            .ok()
            .or_else(|| {
                s.parse::<NaiveDate>()
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(TypecastError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let variance: f64 = if counts.len() > 1 {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64
        } else {
            0.0
        };

        // Higher count with lower variance wins; tab breaks ties
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NativeRepr;

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        let data = b"a;b;c\n1;2;3\n4;5;6";
        assert_eq!(detect_delimiter(data).unwrap(), b';');
    }

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(FileFormat::from_file_name("data.csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_file_name("Book.XLSX").unwrap(), FileFormat::Spreadsheet);
        assert_eq!(FileFormat::from_file_name("old.xls").unwrap(), FileFormat::Spreadsheet);
        assert!(matches!(
            FileFormat::from_file_name("notes.txt"),
            Err(TypecastError::UnsupportedFormat(_))
        ));
        assert!(FileFormat::from_file_name("no_extension").is_err());
    }

    #[test]
    fn test_parse_csv_types_columns() {
        let parser = Parser::new();
        let data = b"name,age,score,active\nAlice,30,1.5,true\nBob,,2,False";
        let (dataset, metadata) = parser.parse_bytes("people.csv", data).unwrap();

        assert_eq!(dataset.column_names(), vec!["name", "age", "score", "active"]);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(metadata.format, "csv");
        assert_eq!(metadata.encoding, "windows-1252");
        assert!(metadata.hash.starts_with("sha256:"));

        let age = dataset.column("age").unwrap();
        assert_eq!(age.cells, vec![CellValue::Integer(30), CellValue::Null]);
        assert_eq!(dataset.column("score").unwrap().native_repr(), NativeRepr::Float);
        assert_eq!(dataset.column("active").unwrap().native_repr(), NativeRepr::Boolean);
        assert_eq!(dataset.column("name").unwrap().native_repr(), NativeRepr::Object);
    }

    #[test]
    fn test_parse_csv_decodes_windows_1252() {
        let parser = Parser::new();
        // 0xE9 is 'é' in Windows-1252 and invalid as standalone UTF-8
        let data = b"city\nMontr\xe9al\nQu\xe9bec";
        let (dataset, _) = parser.parse_bytes("cities.csv", data).unwrap();

        let city = dataset.column("city").unwrap();
        assert_eq!(city.cells[0], CellValue::Text("Montréal".to_string()));
    }

    #[test]
    fn test_parse_csv_pads_ragged_rows() {
        let parser = Parser::new();
        let data = b"a,b,c\n1,2\n3,4,5,6";
        let (dataset, _) = parser.parse_bytes("ragged.csv", data).unwrap();

        assert_eq!(dataset.column_count(), 3);
        assert_eq!(dataset.column("c").unwrap().cells[0], CellValue::Null);
        assert_eq!(dataset.column("c").unwrap().cells[1], CellValue::Integer(5));
    }

    #[test]
    fn test_parse_csv_header_only_is_empty() {
        let parser = Parser::new();
        let result = parser.parse_bytes("empty.csv", b"a,b\n");
        assert!(matches!(result, Err(TypecastError::EmptyData(_))));
    }

    #[test]
    fn test_parse_csv_respects_max_rows() {
        let parser = Parser::with_config(ParserConfig {
            max_rows: Some(2),
            ..ParserConfig::default()
        });
        let (dataset, _) = parser.parse_bytes("n.csv", b"n\n1\n2\n3\n4").unwrap();
        assert_eq!(dataset.row_count(), 2);
    }

    #[test]
    fn test_unsupported_extension_is_rejected_before_parsing() {
        let parser = Parser::new();
        let result = parser.parse_bytes("notes.txt", b"a,b\n1,2");
        assert!(matches!(result, Err(TypecastError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_garbage_spreadsheet_is_ingestion_error() {
        let parser = Parser::new();
        let err = parser.parse_bytes("broken.xlsx", b"not a zip file").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::IngestionParse);
    }

    #[test]
    fn test_is_null_marker() {
        assert!(is_null_marker(""));
        assert!(is_null_marker("NA"));
        assert!(is_null_marker("n/a"));
        assert!(is_null_marker("NaN"));
        assert!(is_null_marker("null"));
        assert!(is_null_marker(" None "));
        assert!(!is_null_marker("value"));
        assert!(!is_null_marker("0"));
    }

    #[test]
    fn test_type_text_column_keeps_mixed_text() {
        let cells = type_text_column(vec!["1".to_string(), "x".to_string(), "".to_string()]);
        assert_eq!(
            cells,
            vec![
                CellValue::Text("1".to_string()),
                CellValue::Text("x".to_string()),
                CellValue::Null
            ]
        );
    }
}
