//! Workbook reading (xlsx, xlsm, xlsb, xls, ods) via calamine.

use std::io::Cursor;

use calamine::{Data, DataType, Reader, open_workbook_auto_from_rs};

use super::parser::ParserConfig;
use super::source::DataTable;
use crate::error::{Result, SplitError};

/// Extensions read as workbooks rather than delimited text.
pub(crate) const EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Lower-cased workbook extension of `name`, if it has one.
pub(crate) fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Read the first sheet. Its first row is the header; blank rows are
/// skipped and short rows padded to the header's width.
pub(crate) fn read_first_sheet(bytes: &[u8], name: &str, config: &ParserConfig) -> Result<DataTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| {
        SplitError::UnsupportedFormat(format!("'{}' is not a readable workbook: {}", name, e))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SplitError::EmptyData(format!("'{}' has no sheets", name)))?
        .map_err(|e| {
            SplitError::UnsupportedFormat(format!("'{}': cannot read first sheet: {}", name, e))
        })?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| cell_text(c).trim().to_string()).collect(),
        None => Vec::new(),
    };
    if headers.iter().all(|h| h.is_empty()) {
        return Err(SplitError::EmptyData("No header row found".to_string()));
    }

    let width = headers.len();
    let mut records = Vec::new();
    for (row_idx, cells) in rows.enumerate() {
        if config.max_rows.is_some_and(|max| row_idx >= max) {
            break;
        }
        let mut record: Vec<String> = cells.iter().map(cell_text).collect();
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        record.resize(width, String::new());
        records.push(record);
    }

    Ok(DataTable::new(headers, records, b','))
}

/// Cell value as the text a CSV export of the sheet would hold.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) if dt.time() == chrono::NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::xlsx;

    #[test]
    fn test_extension_is_case_insensitive() {
        assert_eq!(extension("Payments.XLSX").as_deref(), Some("xlsx"));
        assert_eq!(extension("old.xls").as_deref(), Some("xls"));
        assert_eq!(extension("payments.csv"), None);
        assert_eq!(extension("xlsx"), None);
    }

    #[test]
    fn test_reads_first_sheet_as_table() {
        let bytes = xlsx(&[
            &[" Name ", "Amount"],
            &["Dana Levi", "100"],
            &["", ""],
            &["Yossi Cohen"],
        ]);
        let table = read_first_sheet(&bytes, "book.xlsx", &ParserConfig::default()).unwrap();

        assert_eq!(table.headers, vec!["Name", "Amount"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0], vec!["Dana Levi", "100"]);
        assert_eq!(table.rows[1], vec!["Yossi Cohen", ""]);
    }

    #[test]
    fn test_max_rows_applies() {
        let bytes = xlsx(&[&["Name"], &["a"], &["b"], &["c"]]);
        let config = ParserConfig {
            max_rows: Some(2),
            ..Default::default()
        };
        let table = read_first_sheet(&bytes, "book.xlsx", &config).unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_zip_that_is_not_a_workbook_is_unsupported() {
        let err = read_first_sheet(b"PK\x03\x04rest", "book.xlsx", &ParserConfig::default())
            .unwrap_err();
        assert!(matches!(err, SplitError::UnsupportedFormat(_)));
    }
}
