//! Splitter configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cluster::{AliasGroup, DEFAULT_THRESHOLD, validate_threshold};
use crate::error::{Result, SplitError};
use crate::export::ExportOptions;
use crate::input::ParserConfig;
use crate::normalize::NormalizeOptions;
use crate::route::PersonOverride;
use crate::schema::{AccountantSource, HeaderPreset, RequiredSchema};
use crate::similarity::SimilarityMetric;

/// Everything the pipeline can be tuned with. Loadable from JSON; missing
/// fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Minimum similarity to the canonical name for a merge, in (0, 1).
    pub similarity_threshold: f64,
    /// String metric used for similarity.
    pub metric: SimilarityMetric,
    /// Name normalization knobs.
    pub normalize: NormalizeOptions,
    /// Header language of the input and output tables.
    pub headers: HeaderPreset,
    /// Where accountant names come from.
    pub accountant_source: AccountantSource,
    /// Forced merges.
    pub aliases: Vec<AliasGroup>,
    /// Business names whose rows are set aside before clustering.
    pub excluded_businesses: Vec<String>,
    /// Customers whose rows go to a fixed accountant, first match wins.
    pub person_overrides: Vec<PersonOverride>,
    /// Append a totals row to each per-accountant table.
    pub totals_row: bool,
    /// Delimited-text parsing options.
    #[serde(skip)]
    pub parser: ParserConfig,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_THRESHOLD,
            metric: SimilarityMetric::default(),
            normalize: NormalizeOptions::default(),
            headers: HeaderPreset::default(),
            accountant_source: AccountantSource::default(),
            aliases: Vec::new(),
            excluded_businesses: Vec::new(),
            person_overrides: Vec::new(),
            totals_row: true,
            parser: ParserConfig::default(),
        }
    }
}

impl SplitterConfig {
    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SplitError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| SplitError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.similarity_threshold)?;
        if self
            .aliases
            .iter()
            .any(|g| g.variants.iter().all(|v| v.trim().is_empty()))
        {
            return Err(SplitError::Config(
                "alias groups need at least one non-blank variant".to_string(),
            ));
        }
        if let Some(o) = self
            .person_overrides
            .iter()
            .find(|o| o.person.trim().is_empty() || o.accountant.trim().is_empty())
        {
            return Err(SplitError::Config(format!(
                "person override needs a person and an accountant: {:?} -> {:?}",
                o.person, o.accountant
            )));
        }
        Ok(())
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_headers(mut self, headers: HeaderPreset) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_accountant_source(mut self, source: AccountantSource) -> Self {
        self.accountant_source = source;
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<AliasGroup>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_excluded_businesses(mut self, businesses: Vec<String>) -> Self {
        self.excluded_businesses = businesses;
        self
    }

    pub fn with_person_overrides(mut self, overrides: Vec<PersonOverride>) -> Self {
        self.person_overrides = overrides;
        self
    }

    pub fn with_totals_row(mut self, totals_row: bool) -> Self {
        self.totals_row = totals_row;
        self
    }

    pub(crate) fn schema(&self) -> RequiredSchema {
        RequiredSchema::new(self.headers, self.accountant_source)
    }

    pub(crate) fn export_options(&self) -> ExportOptions {
        ExportOptions {
            headers: self.headers,
            totals_row: self.totals_row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = SplitterConfig::default();
        assert_eq!(config.similarity_threshold, 0.90);
        assert!(config.totals_row);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "similarity_threshold": 0.8,
                "metric": "token_sort_ratio",
                "headers": "hebrew",
                "aliases": [{{"variants": ["Aharon Pardo", "Aharon Pardu"]}}],
                "person_overrides": [{{"person": "Eitan Kazaz", "accountant": "Aharon Pardo"}}],
                "normalize": {{"strip_prefixes": ["CPA"]}}
            }}"#
        )
        .unwrap();

        let config = SplitterConfig::load(file.path()).unwrap();
        assert_eq!(config.similarity_threshold, 0.8);
        assert_eq!(config.metric, SimilarityMetric::TokenSortRatio);
        assert_eq!(config.headers, HeaderPreset::Hebrew);
        assert_eq!(config.aliases.len(), 1);
        assert_eq!(
            config.person_overrides,
            vec![PersonOverride::new("Eitan Kazaz", "Aharon Pardo")]
        );
        assert!(config.normalize.fold_case);
        assert_eq!(config.normalize.strip_prefixes, vec!["CPA"]);
        assert_eq!(config.accountant_source, AccountantSource::Column);
    }

    #[test]
    fn test_load_rejects_bad_threshold() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"similarity_threshold": 1.0}}"#).unwrap();
        assert!(matches!(
            SplitterConfig::load(file.path()),
            Err(SplitError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_blank_alias_group() {
        let config = SplitterConfig::default().with_aliases(vec![AliasGroup::new(["  "])]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_half_empty_person_override() {
        let config = SplitterConfig::default()
            .with_person_overrides(vec![PersonOverride::new("Eitan Kazaz", " ")]);
        assert!(matches!(config.validate(), Err(SplitError::Config(_))));

        let config = SplitterConfig::default()
            .with_person_overrides(vec![PersonOverride::new("", "Aharon Pardo")]);
        assert!(config.validate().is_err());
    }
}
