//! Fuzz target for the clusterer.
//!
//! Identities must partition the distinct names and every canonical name
//! must be the first member of its own identity.

#![no_main]

use std::collections::HashSet;

use ledgersplit::{Clusterer, Normalizer, SimilarityScorer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Vec<String>, u8)| {
    let (names, t) = input;
    if names.len() > 200 {
        return;
    }
    let threshold = (f64::from(t) + 1.0) / 257.0;

    let Ok(clusterer) = Clusterer::new(Normalizer::new(), SimilarityScorer::default(), threshold)
    else {
        return;
    };
    let clustering = clusterer.cluster(&names);

    let mut seen = HashSet::new();
    for identity in clustering.identities() {
        assert_eq!(identity.members.first(), Some(&identity.canonical));
        for member in &identity.members {
            assert!(seen.insert(member.clone()));
        }
    }
    let distinct: HashSet<String> = names.into_iter().collect();
    assert_eq!(seen, distinct);
});
