//! Greedy representative clustering of accountant names.
//!
//! Distinct RawNames are processed in first-appearance order. Each one is
//! compared against the canonical representative of every identity formed
//! so far, never against the other members, and joins the best-scoring
//! identity when that score reaches the threshold. Ties go to the identity
//! created first. Otherwise it founds a new identity and becomes its
//! canonical name. Merges are therefore not transitive: A~B and B~C put C
//! with A only if C also scores against A's representative.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SplitError};
use crate::normalize::{NormalizedName, Normalizer};
use crate::similarity::SimilarityScorer;

/// Default merge threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.90;

/// Spellings that must end up in one identity regardless of score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AliasGroup {
    pub variants: Vec<String>,
}

impl AliasGroup {
    pub fn new<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }
}

/// A set of RawNames judged to be one accountant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Creation index; also the position in [`Clustering::identities`].
    pub id: usize,
    /// The representative, always one of `members`.
    pub canonical: String,
    /// Member RawNames in first-appearance order; `members[0] == canonical`.
    pub members: Vec<String>,
    /// Comparison form of the canonical name.
    pub key: NormalizedName,
    /// Alias group this identity is pinned to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_group: Option<usize>,
}

/// Why a RawName landed where it did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum JoinReason {
    /// First name of a new identity.
    Founded,
    /// Same normalized form as an earlier name.
    SameNormalized,
    /// Listed in the same alias group as the identity.
    Alias { group: usize },
    /// Scored at or above the threshold against the canonical name.
    Similar { score: f64 },
    /// Accountant named by a person override that matched no identity.
    Override,
}

/// Placement of one distinct RawName.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub raw: String,
    pub identity: usize,
    #[serde(flatten)]
    pub reason: JoinReason,
}

/// Result of clustering: identities plus the RawName -> identity map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Clustering {
    identities: Vec<Identity>,
    assignments: IndexMap<String, Assignment>,
}

impl Clustering {
    /// Identities in creation order.
    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    /// Placements in first-appearance order.
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.values()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Number of distinct RawNames clustered.
    pub fn name_count(&self) -> usize {
        self.assignments.len()
    }

    /// Merges performed: names that did not found their own identity.
    pub fn merge_count(&self) -> usize {
        self.name_count() - self.len()
    }

    /// Identity holding a RawName.
    pub fn identity_of(&self, raw: &str) -> Option<&Identity> {
        let assignment = self.assignments.get(raw)?;
        self.identities.get(assignment.identity)
    }

    /// Canonical name for a RawName.
    pub fn canonical_of(&self, raw: &str) -> Option<&str> {
        self.identity_of(raw).map(|i| i.canonical.as_str())
    }

    /// Identity by creation index.
    pub fn identity(&self, id: usize) -> Option<&Identity> {
        self.identities.get(id)
    }

    /// Start a new identity with `raw` as its canonical name.
    fn found(&mut self, raw: &str, key: NormalizedName) -> usize {
        let id = self.identities.len();
        self.identities.push(Identity {
            id,
            canonical: raw.to_string(),
            members: vec![raw.to_string()],
            key,
            alias_group: None,
        });
        id
    }
}

/// Groups RawNames into identities.
#[derive(Debug, Clone)]
pub struct Clusterer {
    normalizer: Normalizer,
    scorer: SimilarityScorer,
    threshold: f64,
    /// Normalized variant -> alias group index; first listing wins.
    aliases: HashMap<NormalizedName, usize>,
}

impl Clusterer {
    /// Create a clusterer. `threshold` must lie strictly between 0 and 1.
    pub fn new(normalizer: Normalizer, scorer: SimilarityScorer, threshold: f64) -> Result<Self> {
        validate_threshold(threshold)?;
        Ok(Self {
            normalizer,
            scorer,
            threshold,
            aliases: HashMap::new(),
        })
    }

    /// Register alias groups. A variant listed in two groups belongs to the
    /// one listed first.
    pub fn with_aliases(mut self, groups: &[AliasGroup]) -> Self {
        for (index, group) in groups.iter().enumerate() {
            for variant in &group.variants {
                let key = self.normalizer.normalize(variant);
                if key.is_empty() {
                    continue;
                }
                self.aliases.entry(key).or_insert(index);
            }
        }
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Cluster names given in first-appearance order. Repeats are ignored,
    /// so the raw column can be passed as-is. An empty input gives an empty
    /// clustering.
    pub fn cluster<I, S>(&self, names: I) -> Clustering
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut clustering = Clustering::default();
        let mut by_key: HashMap<NormalizedName, usize> = HashMap::new();
        let mut pinned: HashMap<usize, usize> = HashMap::new();

        for name in names {
            let raw = name.as_ref();
            if clustering.assignments.contains_key(raw) {
                continue;
            }

            let key = self.normalizer.normalize(raw);
            let group = self.aliases.get(&key).copied();

            let (identity, reason) = if let Some(&id) = by_key.get(&key) {
                (Some(id), JoinReason::SameNormalized)
            } else if let Some((g, id)) = group.and_then(|g| pinned.get(&g).map(|&id| (g, id))) {
                (Some(id), JoinReason::Alias { group: g })
            } else {
                match self.best_match(&clustering.identities, &key, group) {
                    Some((id, score)) if score >= self.threshold => {
                        (Some(id), JoinReason::Similar { score })
                    }
                    _ => (None, JoinReason::Founded),
                }
            };

            let id = match identity {
                Some(id) => {
                    clustering.identities[id].members.push(raw.to_string());
                    id
                }
                None => clustering.found(raw, key.clone()),
            };

            if let Some(g) = group {
                let slot = &mut clustering.identities[id].alias_group;
                if slot.is_none() && !pinned.contains_key(&g) {
                    *slot = Some(g);
                    pinned.insert(g, id);
                }
            }

            debug!(raw, identity = id, ?reason, "placed accountant name");

            by_key.entry(key).or_insert(id);
            clustering.assignments.insert(
                raw.to_string(),
                Assignment {
                    raw: raw.to_string(),
                    identity: id,
                    reason,
                },
            );
        }

        clustering
    }

    /// Identity receiving the rows of a person override for `accountant`,
    /// founding one when nothing fits. Tried in order: an identity holding
    /// a name with the same normalized form, the first identity whose
    /// canonical name and `accountant` share a whole-word run (a title
    /// prefix on either side does not matter), then the best similarity
    /// at or above the threshold.
    pub fn resolve_target(&self, clustering: &mut Clustering, accountant: &str) -> usize {
        let key = self.normalizer.normalize(accountant);

        let same = clustering
            .assignments
            .values()
            .find(|a| self.normalizer.normalize(&a.raw) == key)
            .map(|a| a.identity);
        let overlapping = || {
            clustering
                .identities
                .iter()
                .find(|i| i.key.overlaps(&key))
                .map(|i| i.id)
        };
        let similar = || {
            self.best_match(&clustering.identities, &key, None)
                .filter(|&(_, score)| score >= self.threshold)
                .map(|(id, _)| id)
        };

        if let Some(id) = same.or_else(overlapping).or_else(similar) {
            debug!(accountant, identity = id, "override joins identity");
            return id;
        }

        let id = clustering.found(accountant, key);
        clustering.assignments.insert(
            accountant.to_string(),
            Assignment {
                raw: accountant.to_string(),
                identity: id,
                reason: JoinReason::Override,
            },
        );
        debug!(accountant, identity = id, "override founds identity");
        id
    }

    /// Highest-scoring identity the name may join; the earliest one wins
    /// ties. Identities pinned to an alias group other than `group` are
    /// skipped.
    fn best_match(
        &self,
        identities: &[Identity],
        key: &NormalizedName,
        group: Option<usize>,
    ) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for identity in identities {
            if let (Some(g), Some(pinned)) = (group, identity.alias_group) {
                if g != pinned {
                    continue;
                }
            }
            let score = self.scorer.similarity(key, &identity.key);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((identity.id, score));
            }
        }
        best
    }
}

/// Thresholds must lie in the open interval (0, 1).
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold > 0.0 && threshold < 1.0 {
        Ok(())
    } else {
        Err(SplitError::Config(format!(
            "similarity_threshold must be strictly between 0 and 1, got {}",
            threshold
        )))
    }
}
