//! Symmetric similarity scores between normalized names.

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_damerau_levenshtein, normalized_levenshtein};

use crate::normalize::NormalizedName;

/// Which string metric the scorer uses. All of them are symmetric, give
/// 1.0 for identical inputs and stay within [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Indel ratio: `2 * LCS / (|a| + |b|)` over chars.
    #[default]
    Ratio,
    /// [`SimilarityMetric::Ratio`] over whitespace tokens sorted first, so
    /// "cohen yossi" matches "yossi cohen".
    TokenSortRatio,
    /// `1 - levenshtein / max(|a|, |b|)`.
    Levenshtein,
    /// Levenshtein that also counts adjacent transpositions as one edit.
    DamerauLevenshtein,
    /// Jaro-Winkler, which favors a shared prefix.
    JaroWinkler,
}

impl std::str::FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "ratio" | "indel" => Ok(SimilarityMetric::Ratio),
            "token_sort_ratio" | "token_sort" => Ok(SimilarityMetric::TokenSortRatio),
            "levenshtein" => Ok(SimilarityMetric::Levenshtein),
            "damerau_levenshtein" | "damerau" => Ok(SimilarityMetric::DamerauLevenshtein),
            "jaro_winkler" | "jaro" => Ok(SimilarityMetric::JaroWinkler),
            _ => Err(format!(
                "Unknown metric: {}. Use ratio, token-sort-ratio, levenshtein, damerau-levenshtein or jaro-winkler.",
                s
            )),
        }
    }
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityMetric::Ratio => write!(f, "ratio"),
            SimilarityMetric::TokenSortRatio => write!(f, "token-sort-ratio"),
            SimilarityMetric::Levenshtein => write!(f, "levenshtein"),
            SimilarityMetric::DamerauLevenshtein => write!(f, "damerau-levenshtein"),
            SimilarityMetric::JaroWinkler => write!(f, "jaro-winkler"),
        }
    }
}

/// Scores pairs of normalized names.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer {
    metric: SimilarityMetric,
}

impl SimilarityScorer {
    pub fn new(metric: SimilarityMetric) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    /// Similarity in [0, 1].
    pub fn similarity(&self, a: &NormalizedName, b: &NormalizedName) -> f64 {
        self.score_str(a.as_str(), b.as_str())
    }

    pub(crate) fn score_str(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        // Fixed argument order keeps every metric exactly symmetric.
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        let score = match self.metric {
            SimilarityMetric::Ratio => ratio(a, b),
            SimilarityMetric::TokenSortRatio => ratio(&sorted_tokens(a), &sorted_tokens(b)),
            SimilarityMetric::Levenshtein => normalized_levenshtein(a, b),
            SimilarityMetric::DamerauLevenshtein => normalized_damerau_levenshtein(a, b),
            SimilarityMetric::JaroWinkler => jaro_winkler(a, b),
        };
        score.clamp(0.0, 1.0)
    }
}

/// Indel similarity, the metric of `fuzz.ratio` style matchers.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// Longest common subsequence length, two-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];

    for &x in long {
        for (j, &y) in short.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

fn sorted_tokens(s: &str) -> String {
    let mut words: Vec<&str> = s.split_whitespace().collect();
    words.sort_unstable();
    words.join(" ")
}
