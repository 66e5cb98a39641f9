//! Table parser: delimited text with delimiter detection, or a workbook.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::source::{DataTable, SourceMetadata};
use super::spreadsheet;
use crate::error::{Result, SplitError};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// UTF-8 byte order mark, written by most spreadsheet exports.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Magic bytes of a ZIP container (xlsx, ods).
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Magic bytes of an OLE2 container (legacy xls).
const OLE_MAGIC: &[u8] = b"\xD0\xCF\x11\xE0";

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Parses delimited tabular data.
#[derive(Debug, Clone)]
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

    /// Parse a file and return the data table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| SplitError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| SplitError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.parse_bytes(&contents, &name)
    }

    /// Parse an in-memory upload. `name` is only used for metadata and
    /// extension checks.
    pub fn parse_bytes(&self, bytes: &[u8], name: &str) -> Result<(DataTable, SourceMetadata)> {
        if let Some(format) = workbook_format(bytes, name) {
            return self.parse_workbook(bytes, name, format);
        }
        reject_binary(bytes, name)?;

        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        let hash = content_hash(bytes);

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(bytes)?,
        };

        let table = self.parse_delimited(bytes, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        let metadata = SourceMetadata::new(
            name.to_string(),
            hash,
            bytes.len() as u64,
            format,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, metadata))
    }

    /// Parse anything readable, e.g. stdin.
    pub fn parse_reader(&self, mut reader: impl Read, name: &str) -> Result<(DataTable, SourceMetadata)> {
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).map_err(|e| SplitError::Io {
            path: name.into(),
            source: e,
        })?;
        self.parse_bytes(&contents, name)
    }

    fn parse_workbook(
        &self,
        bytes: &[u8],
        name: &str,
        format: String,
    ) -> Result<(DataTable, SourceMetadata)> {
        let table = spreadsheet::read_first_sheet(bytes, name, &self.config)?;
        let metadata = SourceMetadata::new(
            name.to_string(),
            content_hash(bytes),
            bytes.len() as u64,
            format,
            table.row_count(),
            table.column_count(),
        );
        Ok((table, metadata))
    }

    fn parse_delimited(&self, bytes: &[u8], delimiter: u8) -> Result<DataTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|s| s.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(SplitError::EmptyData("No header row found".to_string()));
        }

        let expected_cols = headers.len();
        let mut rows = Vec::new();

        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;

            // Blank lines inside a spreadsheet export carry no row.
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }

            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            row.resize(expected_cols, String::new());
            rows.push(row);
        }

        Ok(DataTable::new(headers, rows, delimiter))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

/// Workbooks are recognized by extension, or by container magic when the
/// name says nothing (e.g. a bare upload).
fn workbook_format(bytes: &[u8], name: &str) -> Option<String> {
    if let Some(ext) = spreadsheet::extension(name) {
        return Some(ext);
    }
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        return Some("spreadsheet".to_string());
    }
    None
}

/// Refuse binary payloads up front, so the caller gets an unsupported-format
/// signal rather than a CSV decode error.
fn reject_binary(bytes: &[u8], name: &str) -> Result<()> {
    if std::str::from_utf8(bytes).is_err() {
        return Err(SplitError::UnsupportedFormat(format!(
            "'{}' is not valid UTF-8 text",
            name
        )));
    }
    Ok(())
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
        return Err(SplitError::EmptyData("No lines to analyze".to_string()));
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

        // Tab gets a slight bonus as it's less common inside values
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

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_parse_csv() {
        let parser = Parser::new();
        let data = b"name,amount,city\nAlice,30,NYC\nBob,25,LA";
        let (table, meta) = parser.parse_bytes(data, "people.csv").unwrap();

        assert_eq!(table.headers, vec!["name", "amount", "city"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, 0), Some("Alice"));
        assert_eq!(table.get(1, 1), Some("25"));
        assert_eq!(meta.format, "csv");
        assert!(meta.hash.starts_with("sha256:"));
    }

    #[test]
    fn test_parse_strips_bom_and_trims_headers() {
        let parser = Parser::new();
        let data = b"\xEF\xBB\xBF name , amount\nDana,30\n";
        let (table, _) = parser.parse_bytes(data, "bom.csv").unwrap();
        assert_eq!(table.headers, vec!["name", "amount"]);
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let parser = Parser::new();
        let (table, _) = parser.parse_bytes(b"name,amount\n", "empty.csv").unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let parser = Parser::new();
        let (table, _) = parser
            .parse_bytes(b"a,b,c\n1\n1,2,3,4\n", "ragged.csv")
            .unwrap();
        assert_eq!(table.rows[0], vec!["1", "", ""]);
        assert_eq!(table.rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_parse_workbook_upload() {
        let parser = Parser::new();
        let bytes = crate::testing::xlsx(&[&["name", "amount"], &["Dana", "30"]]);

        let (table, meta) = parser.parse_bytes(&bytes, "Payments.xlsx").unwrap();
        assert_eq!(table.headers, vec!["name", "amount"]);
        assert_eq!(table.get(0, 1), Some("30"));
        assert_eq!(meta.format, "xlsx");
        assert_eq!(meta.row_count, 1);

        let (_, meta) = parser.parse_bytes(&bytes, "upload").unwrap();
        assert_eq!(meta.format, "spreadsheet");
    }

    #[test]
    fn test_corrupt_workbook_is_unsupported() {
        let parser = Parser::new();
        let err = parser.parse_bytes(b"PK\x03\x04rest", "book.xlsx").unwrap_err();
        assert!(matches!(err, SplitError::UnsupportedFormat(_)));

        let err = parser.parse_bytes(b"PK\x03\x04rest", "upload").unwrap_err();
        assert!(matches!(err, SplitError::UnsupportedFormat(_)));

        let err = parser.parse_bytes(b"name\n\xff\xfe\n", "bad.csv").unwrap_err();
        assert!(matches!(err, SplitError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_rejects_empty_input() {
        let parser = Parser::new();
        let err = parser.parse_bytes(b"", "nothing.csv").unwrap_err();
        assert!(matches!(err, SplitError::EmptyData(_)));
    }
}
