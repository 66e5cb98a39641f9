//! Fuzz target for name normalization and scoring.
//!
//! Normalization must be idempotent and similarity symmetric, reflexive
//! and bounded for every UTF-8 input.

#![no_main]

use arbitrary::Arbitrary;
use ledgersplit::normalize::normalize;
use ledgersplit::{SimilarityMetric, SimilarityScorer};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    a: &'a str,
    b: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    let a = normalize(input.a);
    let b = normalize(input.b);
    assert_eq!(normalize(a.as_str()), a);

    for metric in [
        SimilarityMetric::Ratio,
        SimilarityMetric::TokenSortRatio,
        SimilarityMetric::Levenshtein,
        SimilarityMetric::DamerauLevenshtein,
        SimilarityMetric::JaroWinkler,
    ] {
        let scorer = SimilarityScorer::new(metric);
        let ab = scorer.similarity(&a, &b);
        assert_eq!(ab, scorer.similarity(&b, &a));
        assert!((0.0..=1.0).contains(&ab));
        assert_eq!(scorer.similarity(&a, &a), 1.0);
    }
});
