//! The `Splitter`: parse, project, exclude, route, cluster, partition and pack.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cluster::{Clusterer, Clustering};
use crate::config::SplitterConfig;
use crate::error::{Result, SplitError};
use crate::exclude::{BusinessFilter, ExcludedRow};
use crate::export::{Archive, Contents, ExportAssembler};
use crate::input::{DataTable, Parser, SourceMetadata};
use crate::normalize::Normalizer;
use crate::partition::{MappingEntry, Partition, partition_routed};
use crate::route::{PersonEntry, PersonRouter};
use crate::schema::{Row, RowSource};
use crate::similarity::SimilarityScorer;
use crate::summary::{AccountantSummary, summarize};

/// Everything one split produced.
#[derive(Debug, Clone)]
pub struct SplitReport {
    /// Metadata about the input, when it came from a file or an upload.
    pub source: Option<SourceMetadata>,
    pub clustering: Clustering,
    /// One entry per distinct RawName, first appearance first.
    pub mapping: Vec<MappingEntry>,
    pub partition: Partition,
    /// Rows set aside before clustering.
    pub excluded: Vec<ExcludedRow>,
    /// One entry per distinct customer a person override routed.
    pub people: Vec<PersonEntry>,
    pub archive: Archive,
    pub summary: SplitSummary,
}

impl SplitReport {
    /// True when the input held no data rows.
    pub fn is_empty(&self) -> bool {
        self.summary.input_rows == 0
    }
}

/// Counts describing a split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitSummary {
    pub input_rows: usize,
    pub excluded_rows: usize,
    /// Rows placed by a person override.
    pub manual_rows: usize,
    pub distinct_names: usize,
    pub identities: usize,
    pub merges: usize,
    pub accountants: Vec<AccountantSummary>,
}

/// Clustering without an archive, for inspection.
#[derive(Debug, Clone)]
pub struct Preview {
    pub clustering: Clustering,
    pub excluded: Vec<ExcludedRow>,
    pub people: Vec<PersonEntry>,
}

/// Rows with their identity decided, ready to partition.
struct Placement {
    clustering: Clustering,
    /// In row order; `Some` for rows a person override placed.
    rows: Vec<(Row, Option<usize>)>,
    people: Vec<PersonEntry>,
}

/// Splits a table of payments into one table per accountant.
///
/// Holds only immutable configuration. Every call builds its own clusterer
/// and buckets, so one instance can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct Splitter {
    config: SplitterConfig,
    parser: Parser,
}

impl Splitter {
    /// Validate `config` and build a splitter from it.
    pub fn new(config: SplitterConfig) -> Result<Self> {
        config.validate()?;
        let parser = Parser::with_config(config.parser.clone());
        Ok(Self { config, parser })
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split a CSV, TSV or workbook file on disk.
    pub fn split_file(&self, path: impl AsRef<Path>) -> Result<SplitReport> {
        let (table, source) = self.parser.parse_file(path)?;
        self.run(&table, Some(source))
    }

    /// Split an uploaded file held in memory.
    pub fn split_bytes(&self, bytes: &[u8], name: &str) -> Result<SplitReport> {
        let (table, source) = self.parser.parse_bytes(bytes, name)?;
        self.run(&table, Some(source))
    }

    /// Split an already parsed table.
    pub fn split_table(&self, table: &DataTable) -> Result<SplitReport> {
        self.run(table, None)
    }

    /// Parse a file and cluster its accountant names only.
    pub fn preview_file(&self, path: impl AsRef<Path>) -> Result<Preview> {
        let (table, _) = self.parser.parse_file(path)?;
        self.preview(&table)
    }

    /// Project, route and cluster, without partitioning or packing.
    pub fn preview(&self, table: &DataTable) -> Result<Preview> {
        let rows = self.config.schema().project(table)?;
        let (kept, excluded) = self.filter().apply(rows);
        let placement = self.place(kept)?;
        Ok(Preview {
            clustering: placement.clustering,
            excluded,
            people: placement.people,
        })
    }

    fn run(&self, table: &DataTable, source: Option<SourceMetadata>) -> Result<SplitReport> {
        let rows = self.config.schema().project(table)?;
        let input_rows = rows.len();
        if input_rows == 0 {
            warn!("input has no data rows");
        }

        let (kept, excluded) = self.filter().apply(rows);
        if !excluded.is_empty() {
            info!(rows = excluded.len(), "excluded rows by business name");
        }

        let Placement {
            clustering,
            rows,
            people,
        } = self.place(kept)?;
        info!(
            names = clustering.name_count(),
            identities = clustering.len(),
            threshold = self.config.similarity_threshold,
            metric = %self.config.metric,
            "clustered accountant names"
        );
        let manual_rows = rows.iter().filter(|(_, id)| id.is_some()).count();

        let output = partition_routed(rows, &clustering)?;
        check_coverage(&output.partition, input_rows, excluded.len())?;

        let accountants = summarize(&output.partition);
        let archive = ExportAssembler::new(self.config.export_options()).assemble_contents(
            &Contents {
                partition: &output.partition,
                mapping: &output.mapping,
                summaries: &accountants,
                excluded: &excluded,
                people: &people,
            },
        )?;
        info!(
            entries = archive.entries.len(),
            bytes = archive.bytes.len(),
            "assembled archive"
        );

        let summary = SplitSummary {
            input_rows,
            excluded_rows: excluded.len(),
            manual_rows,
            distinct_names: clustering.name_count(),
            identities: clustering.len(),
            merges: clustering.merge_count(),
            accountants,
        };

        Ok(SplitReport {
            source,
            clustering,
            mapping: output.mapping,
            partition: output.partition,
            excluded,
            people,
            archive,
            summary,
        })
    }

    /// Route rows by customer, cluster the rest, then resolve each used
    /// override's accountant against the clustered identities.
    fn place(&self, rows: Vec<Row>) -> Result<Placement> {
        let (auto, manual) = self.router().split(rows);
        let clusterer = self.clusterer()?;
        let mut clustering = clusterer.cluster(auto.iter().map(|r| r.accountant.as_str()));

        let mut targets: HashMap<usize, usize> = HashMap::new();
        let mut people: Vec<PersonEntry> = Vec::new();
        let mut placed: Vec<(Row, Option<usize>)> = Vec::with_capacity(auto.len() + manual.len());

        for (mut row, rule) in manual {
            let over = &self.config.person_overrides[rule];
            let id = match targets.get(&rule) {
                Some(&id) => id,
                None => {
                    let id = clusterer.resolve_target(&mut clustering, &over.accountant);
                    targets.insert(rule, id);
                    id
                }
            };

            let person = row.person();
            if !people.iter().any(|p| p.person == person) {
                let canonical = clustering
                    .identity(id)
                    .map(|i| i.canonical.clone())
                    .unwrap_or_default();
                people.push(PersonEntry {
                    person,
                    rule: over.person.clone(),
                    canonical,
                });
            }

            row.source = RowSource::Manual;
            placed.push((row, Some(id)));
        }
        if !placed.is_empty() {
            info!(
                rows = placed.len(),
                people = people.len(),
                "routed rows by person override"
            );
        }

        placed.extend(auto.into_iter().map(|row| (row, None)));
        placed.sort_by_key(|(row, _)| row.index);

        Ok(Placement {
            clustering,
            rows: placed,
            people,
        })
    }

    fn normalizer(&self) -> Normalizer {
        Normalizer::with_options(self.config.normalize.clone())
    }

    fn router(&self) -> PersonRouter {
        PersonRouter::new(self.normalizer(), &self.config.person_overrides)
    }

    fn filter(&self) -> BusinessFilter {
        BusinessFilter::new(self.normalizer(), &self.config.excluded_businesses)
    }

    fn clusterer(&self) -> Result<Clusterer> {
        Ok(Clusterer::new(
            self.normalizer(),
            SimilarityScorer::new(self.config.metric),
            self.config.similarity_threshold,
        )?
        .with_aliases(&self.config.aliases))
    }
}

/// Every projected row must land in exactly one bucket or in the excluded
/// list. Anything else means a row was lost or duplicated.
fn check_coverage(partition: &Partition, input_rows: usize, excluded: usize) -> Result<()> {
    let placed = partition.row_count();
    if placed + excluded != input_rows {
        return Err(SplitError::Internal(format!(
            "{} rows in, {} partitioned and {} excluded",
            input_rows, placed, excluded
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::HeaderPreset;

    fn table(rows: &[(&str, &str)]) -> DataTable {
        let mut headers: Vec<String> = HeaderPreset::English
            .headers()
            .into_iter()
            .map(str::to_string)
            .collect();
        headers.push("Accountant".to_string());
        let amount = headers.iter().position(|h| h == "Amount").unwrap();
        let records = rows
            .iter()
            .map(|(name, value)| {
                let mut r = vec![String::new(); headers.len()];
                r[amount] = value.to_string();
                r[headers.len() - 1] = name.to_string();
                r
            })
            .collect();
        DataTable::new(headers, records, b',')
    }

    fn splitter(threshold: f64) -> Splitter {
        Splitter::new(SplitterConfig::default().with_threshold(threshold)).unwrap()
    }

    #[test]
    fn test_splits_case_variants_together() {
        let report = splitter(0.85)
            .split_table(&table(&[
                ("Yossi Cohen", "100"),
                ("yossi cohen", "50"),
                ("Dana Levi", "30"),
            ]))
            .unwrap();

        assert_eq!(report.partition.len(), 2);
        assert_eq!(report.mapping.len(), 2);
        let yossi = &report.summary.accountants[0];
        assert_eq!(yossi.canonical, "Yossi Cohen");
        assert_eq!(yossi.totals.amount, 150.0);
        assert_eq!(report.summary.merges, 1);
        assert!(report.source.is_none());
    }

    #[test]
    fn test_empty_table_is_not_an_error() {
        let report = splitter(0.9).split_table(&table(&[])).unwrap();
        assert!(report.is_empty());
        assert!(report.partition.is_empty());
        assert_eq!(report.archive.entries, vec!["mapping.csv", "summary.csv"]);
    }

    #[test]
    fn test_excluded_rows_skip_clustering() {
        let mut t = table(&[("Dana Levi", "10"), ("Dana Levi", "20")]);
        let business = t.headers.iter().position(|h| h == "Business Name").unwrap();
        t.rows[1][business] = "Internal Test".to_string();

        let config = SplitterConfig::default()
            .with_excluded_businesses(vec!["internal test".to_string()]);
        let report = Splitter::new(config).unwrap().split_table(&t).unwrap();

        assert_eq!(report.summary.excluded_rows, 1);
        assert_eq!(report.partition.row_count(), 1);
        assert!(report.archive.entries.iter().any(|e| e == "excluded.csv"));
    }

    #[test]
    fn test_person_override_joins_existing_identity() {
        let mut t = table(&[
            ("CPA Aharon Pardo", "100"),
            ("Dana Levi", "40"),
            ("Dana Levi", "25"),
        ]);
        let first = t.headers.iter().position(|h| h == "First Name").unwrap();
        let last = t.headers.iter().position(|h| h == "Last Name").unwrap();
        t.rows[2][first] = "Eitan".to_string();
        t.rows[2][last] = "Kazaz".to_string();

        let config = SplitterConfig::default().with_person_overrides(vec![
            crate::route::PersonOverride::new("Eitan Kazaz", "Aharon Pardo"),
        ]);
        let report = Splitter::new(config).unwrap().split_table(&t).unwrap();

        assert_eq!(report.summary.manual_rows, 1);
        assert_eq!(report.partition.len(), 2);
        let pardo = report.partition.get("CPA Aharon Pardo").unwrap();
        assert_eq!(pardo.iter().map(|r| r.index).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(pardo[1].source, RowSource::Manual);
        assert_eq!(
            report.people,
            vec![PersonEntry {
                person: "Eitan Kazaz".into(),
                rule: "Eitan Kazaz".into(),
                canonical: "CPA Aharon Pardo".into(),
            }]
        );
        assert!(report.archive.entries.iter().any(|e| e == "people.csv"));
        assert_eq!(report.mapping.len(), 2);

        let sources: Vec<_> = report
            .summary
            .accountants
            .iter()
            .map(|a| (a.canonical.as_str(), a.source, a.rows))
            .collect();
        assert_eq!(
            sources,
            vec![
                ("CPA Aharon Pardo", RowSource::Auto, 1),
                ("CPA Aharon Pardo", RowSource::Manual, 1),
                ("Dana Levi", RowSource::Auto, 1),
            ]
        );
    }

    #[test]
    fn test_person_override_founds_missing_accountant() {
        let mut t = table(&[("Dana Levi", "10"), ("Dana Levi", "20")]);
        let first = t.headers.iter().position(|h| h == "First Name").unwrap();
        t.rows[0][first] = "Shir".to_string();

        let config = SplitterConfig::default().with_person_overrides(vec![
            crate::route::PersonOverride::new("Shir", "Doron Falk"),
        ]);
        let report = Splitter::new(config).unwrap().split_table(&t).unwrap();

        assert_eq!(
            report.partition.canonicals().collect::<Vec<_>>(),
            vec!["Doron Falk", "Dana Levi"]
        );
        assert_eq!(report.people[0].canonical, "Doron Falk");
        assert_eq!(report.partition.row_count(), 2);
    }

    #[test]
    fn test_splits_workbook_upload() {
        let mut header: Vec<&str> = HeaderPreset::English.headers();
        header.push("Accountant");
        let amount = header.iter().position(|h| *h == "Amount").unwrap();
        let row = |name: &'static str, value: &'static str| {
            let mut r = vec![""; header.len()];
            r[amount] = value;
            r[header.len() - 1] = name;
            r
        };
        let rows = [header.clone(), row("Yossi Cohen", "100"), row("yossi  cohen", "50")];
        let rows: Vec<&[&str]> = rows.iter().map(Vec::as_slice).collect();
        let bytes = crate::testing::xlsx(&rows);

        let report = splitter(0.9).split_bytes(&bytes, "payments.xlsx").unwrap();
        assert_eq!(report.source.unwrap().format, "xlsx");
        assert_eq!(report.partition.len(), 1);
        assert_eq!(report.summary.accountants[0].totals.amount, 150.0);
    }

    #[test]
    fn test_preview_does_not_pack() {
        let preview = splitter(0.9)
            .preview(&table(&[("Aharon Pardo", "1"), ("Aharon Pardu", "2")]))
            .unwrap();
        assert_eq!(preview.clustering.len(), 1);
        assert!(preview.excluded.is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(Splitter::new(SplitterConfig::default().with_threshold(0.0)).is_err());
    }

    #[test]
    fn test_splitter_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Splitter>();
    }
}
