//! Serialization of partitions into a single ZIP archive.
//!
//! Layout:
//! - `accountants/<name>.csv`, one per canonical identity
//! - `mapping.csv`, one `original,canonical` line per distinct RawName
//! - `summary.csv`, row counts and money totals per identity and source
//! - `people.csv`, only when person overrides routed rows
//! - `excluded.csv`, only when rows were excluded

use std::collections::HashSet;
use std::io::{Cursor, Write};

use serde::{Deserialize, Serialize};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Result, SplitError};
use crate::exclude::ExcludedRow;
use crate::partition::{MappingEntry, Partition};
use crate::route::PersonEntry;
use crate::schema::{Column, HeaderPreset, Row};
use crate::summary::{AccountantSummary, Totals, format_amount, identity_totals, summarize};

/// Directory holding per-accountant tables inside the archive.
pub const ACCOUNTANTS_DIR: &str = "accountants";
pub const MAPPING_FILE: &str = "mapping.csv";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const PEOPLE_FILE: &str = "people.csv";
pub const EXCLUDED_FILE: &str = "excluded.csv";

/// Device names Windows refuses as file stems, with any extension.
const RESERVED_STEMS: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Stem used when a canonical name sanitizes to nothing.
const UNNAMED: &str = "unnamed";

/// Longest file stem written, in chars.
const MAX_STEM_CHARS: usize = 120;

/// Lets spreadsheet software detect UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Options for the export step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Header labels written to per-accountant tables.
    pub headers: HeaderPreset,
    /// Append a totals row to each per-accountant table.
    pub totals_row: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            headers: HeaderPreset::default(),
            totals_row: true,
        }
    }
}

/// One named file of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The finished archive.
#[derive(Debug, Clone)]
pub struct Archive {
    /// ZIP bytes.
    pub bytes: Vec<u8>,
    /// Entry names in write order.
    pub entries: Vec<String>,
}

/// Everything that goes into one archive.
#[derive(Debug, Clone, Copy)]
pub struct Contents<'a> {
    pub partition: &'a Partition,
    pub mapping: &'a [MappingEntry],
    /// As produced by [`summarize`] over `partition`.
    pub summaries: &'a [AccountantSummary],
    pub excluded: &'a [ExcludedRow],
    pub people: &'a [PersonEntry],
}

/// Builds artifacts and packs them.
#[derive(Debug, Clone, Default)]
pub struct ExportAssembler {
    options: ExportOptions,
}

impl ExportAssembler {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Pack the per-accountant tables, the mapping and the summary.
    pub fn assemble(&self, partition: &Partition, mapping: &[MappingEntry]) -> Result<Archive> {
        let summaries = summarize(partition);
        self.assemble_contents(&Contents {
            partition,
            mapping,
            summaries: &summaries,
            excluded: &[],
            people: &[],
        })
    }

    /// Pack every artifact `contents` calls for.
    pub fn assemble_contents(&self, contents: &Contents<'_>) -> Result<Archive> {
        pack(&self.artifacts(contents)?)
    }

    /// Every artifact, in archive order. Names and contents depend only on
    /// the inputs.
    pub fn artifacts(&self, contents: &Contents<'_>) -> Result<Vec<Artifact>> {
        let partition = contents.partition;
        let mut artifacts = Vec::with_capacity(partition.len() + 4);

        let stems = unique_file_stems(partition.canonicals());
        for ((canonical, rows), stem) in partition.iter().zip(stems) {
            let totals = identity_totals(contents.summaries, canonical);
            artifacts.push(Artifact {
                name: format!("{}/{}.csv", ACCOUNTANTS_DIR, stem),
                bytes: self.accountant_table(rows, &totals)?,
            });
        }

        artifacts.push(Artifact {
            name: MAPPING_FILE.to_string(),
            bytes: mapping_table(contents.mapping)?,
        });
        artifacts.push(Artifact {
            name: SUMMARY_FILE.to_string(),
            bytes: self.summary_table(contents.summaries)?,
        });
        if !contents.people.is_empty() {
            artifacts.push(Artifact {
                name: PEOPLE_FILE.to_string(),
                bytes: people_table(contents.people)?,
            });
        }
        if !contents.excluded.is_empty() {
            artifacts.push(Artifact {
                name: EXCLUDED_FILE.to_string(),
                bytes: self.excluded_table(contents.excluded)?,
            });
        }

        Ok(artifacts)
    }

    /// Fixed columns in fixed order; the accountant column never appears.
    fn accountant_table(&self, rows: &[Row], totals: &Totals) -> Result<Vec<u8>> {
        let mut writer = bom_writer();
        writer.write_record(self.options.headers.headers())?;
        for row in rows {
            writer.write_record(&row.fields)?;
        }

        if self.options.totals_row && !rows.is_empty() {
            let record: Vec<String> = Column::ALL
                .iter()
                .map(|&column| {
                    if column == Column::PaymentDescription {
                        self.options.headers.totals_label().to_string()
                    } else {
                        totals.get(column).map(format_amount).unwrap_or_default()
                    }
                })
                .collect();
            writer.write_record(&record)?;
        }

        finish(writer)
    }

    fn summary_table(&self, summaries: &[AccountantSummary]) -> Result<Vec<u8>> {
        let mut writer = bom_writer();
        let mut header = vec!["canonical", "source", "rows"];
        header.extend(Column::MONEY.iter().map(|c| c.label(self.options.headers)));
        writer.write_record(&header)?;

        for summary in summaries {
            let mut record = vec![
                summary.canonical.clone(),
                summary.source.to_string(),
                summary.rows.to_string(),
            ];
            record.extend(
                Column::MONEY
                    .iter()
                    .map(|&c| summary.totals.get(c).map(format_amount).unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }

        finish(writer)
    }

    fn excluded_table(&self, excluded: &[ExcludedRow]) -> Result<Vec<u8>> {
        const COLUMNS: [Column; 4] = [
            Column::BusinessName,
            Column::FirstName,
            Column::LastName,
            Column::PaymentDescription,
        ];

        let mut writer = bom_writer();
        let mut header: Vec<&str> = COLUMNS.iter().map(|c| c.label(self.options.headers)).collect();
        header.push("reason");
        writer.write_record(&header)?;

        for entry in excluded {
            let mut record: Vec<&str> = COLUMNS.iter().map(|&c| entry.row.get(c)).collect();
            record.push(&entry.reason);
            writer.write_record(&record)?;
        }

        finish(writer)
    }
}

fn mapping_table(mapping: &[MappingEntry]) -> Result<Vec<u8>> {
    let mut writer = bom_writer();
    writer.write_record(["original", "canonical"])?;
    for entry in mapping {
        writer.write_record([&entry.original, &entry.canonical])?;
    }
    finish(writer)
}

fn people_table(people: &[PersonEntry]) -> Result<Vec<u8>> {
    let mut writer = bom_writer();
    writer.write_record(["person", "rule", "canonical"])?;
    for entry in people {
        writer.write_record([&entry.person, &entry.rule, &entry.canonical])?;
    }
    finish(writer)
}

fn bom_writer() -> csv::Writer<Vec<u8>> {
    csv::Writer::from_writer(UTF8_BOM.to_vec())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| SplitError::Internal(format!("CSV buffer flush failed: {}", e)))
}

/// Write artifacts into a deflate-compressed ZIP held in memory.
pub fn pack(artifacts: &[Artifact]) -> Result<Archive> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut entries = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        zip.start_file(artifact.name.as_str(), options)?;
        zip.write_all(&artifact.bytes)
            .map_err(zip::result::ZipError::from)?;
        debug!(entry = %artifact.name, bytes = artifact.bytes.len(), "archived");
        entries.push(artifact.name.clone());
    }

    let bytes = zip.finish()?.into_inner();
    Ok(Archive { bytes, entries })
}

/// Make a canonical name safe as a file stem. Deterministic: the same name
/// always gives the same stem.
pub fn sanitize_file_stem(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());
    let truncated: String = trimmed.chars().take(MAX_STEM_CHARS).collect();
    let truncated = truncated.trim_end_matches(|c: char| c == '.' || c.is_whitespace());

    if truncated.is_empty() {
        UNNAMED.to_string()
    } else if is_reserved_stem(truncated) {
        format!("{}_", truncated)
    } else {
        truncated.to_string()
    }
}

/// `CON`, `nul.txt`, `Com1 .x`: Windows matches the part before the first
/// dot, ignoring case and trailing spaces.
fn is_reserved_stem(stem: &str) -> bool {
    let base = stem.split('.').next().unwrap_or(stem).trim_end();
    RESERVED_STEMS.iter().any(|r| r.eq_ignore_ascii_case(base))
}

/// Sanitized stems, made unique case-insensitively by appending ` (2)`,
/// ` (3)`, ... in the given order.
pub fn unique_file_stems<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut stems = Vec::new();

    for name in names {
        let base = sanitize_file_stem(name);
        let mut candidate = base.clone();
        let mut n = 2;
        while taken.contains(&candidate.to_lowercase()) {
            candidate = format!("{} ({})", base, n);
            n += 1;
        }
        taken.insert(candidate.to_lowercase());
        stems.push(candidate);
    }

    stems
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("Dana Levi"), "Dana Levi");
        assert_eq!(sanitize_file_stem("רו\"ח אילן/קאופמן"), "רו_ח אילן_קאופמן");
        assert_eq!(sanitize_file_stem(" ..Dana. "), "Dana");
        assert_eq!(sanitize_file_stem("a\tb"), "a_b");
        assert_eq!(sanitize_file_stem(""), UNNAMED);
        assert_eq!(sanitize_file_stem(" . "), UNNAMED);
        assert_eq!(sanitize_file_stem(&"x".repeat(300)).chars().count(), MAX_STEM_CHARS);
    }

    #[test]
    fn test_windows_device_names_are_suffixed() {
        assert_eq!(sanitize_file_stem("CON"), "CON_");
        assert_eq!(sanitize_file_stem("nul"), "nul_");
        assert_eq!(sanitize_file_stem("Com1"), "Com1_");
        assert_eq!(sanitize_file_stem("lpt9.backup"), "lpt9.backup_");
        assert_eq!(sanitize_file_stem("Connor"), "Connor");
        assert_eq!(sanitize_file_stem("COM10"), "COM10");
        assert_eq!(unique_file_stems(["aux", "AUX"]), vec!["aux_", "AUX_ (2)"]);
    }

    #[test]
    fn test_unique_file_stems_resolve_collisions_in_order() {
        let stems = unique_file_stems(["A/B", "A:B", "a_b", "Other"]);
        assert_eq!(stems, vec!["A_B", "A_B (2)", "a_b (3)", "Other"]);
    }

    #[test]
    fn test_unique_file_stems_avoid_suffix_clash() {
        let stems = unique_file_stems(["x (2)", "x", "x"]);
        assert_eq!(stems, vec!["x (2)", "x", "x (3)"]);
    }

    #[test]
    fn test_pack_lists_entries() {
        let archive = pack(&[
            Artifact {
                name: "a.csv".into(),
                bytes: b"x".to_vec(),
            },
            Artifact {
                name: "b/c.csv".into(),
                bytes: b"y".to_vec(),
            },
        ])
        .unwrap();
        assert_eq!(archive.entries, vec!["a.csv", "b/c.csv"]);

        let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
        let mut content = String::new();
        zip.by_name("b/c.csv").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "y");
    }

    #[test]
    fn test_mapping_table_has_bom_and_header() {
        let bytes = mapping_table(&[MappingEntry {
            original: "yossi cohen".into(),
            canonical: "Yossi Cohen".into(),
        }])
        .unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text, "original,canonical\nyossi cohen,Yossi Cohen\n");
    }
}
