//! Comparison-friendly name normalization.
//!
//! A [`NormalizedName`] is only ever used to compare names. Display and
//! output always keep the raw string.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Knobs of the normalization step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Apply Unicode compatibility composition (NFKC) first.
    pub unicode_compat: bool,
    /// Lowercase the name.
    pub fold_case: bool,
    /// Leading title tokens to drop, e.g. `CPA` or `רו"ח`. Matched after the
    /// rest of normalization, repeatedly, and never when they are the whole
    /// name.
    pub strip_prefixes: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            unicode_compat: true,
            fold_case: true,
            strip_prefixes: Vec::new(),
        }
    }
}

/// A name in comparison form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedName(String);

impl NormalizedName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl NormalizedName {
    /// Whether either name's words appear as a contiguous run in the
    /// other's. Empty names contain nothing.
    pub fn overlaps(&self, other: &NormalizedName) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let a: Vec<&str> = self.0.split(' ').collect();
        let b: Vec<&str> = other.0.split(' ').collect();
        let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
        long.windows(short.len()).any(|w| w == short.as_slice())
    }
}

impl std::fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns raw names into [`NormalizedName`]s. Pure and idempotent.
#[derive(Debug, Clone)]
pub struct Normalizer {
    options: NormalizeOptions,
    /// Prefixes pre-split into normalized tokens.
    prefixes: Vec<Vec<String>>,
}

impl Normalizer {
    /// Create a normalizer with default options.
    pub fn new() -> Self {
        Self::with_options(NormalizeOptions::default())
    }

    /// Create a normalizer with custom options.
    pub fn with_options(options: NormalizeOptions) -> Self {
        let mut prefixes: Vec<Vec<String>> = options
            .strip_prefixes
            .iter()
            .map(|p| tokens(&base_form(p, &options)))
            .filter(|t| !t.is_empty())
            .collect();
        // Longest first so "cpa firm" wins over "cpa".
        prefixes.sort_by(|a, b| b.len().cmp(&a.len()));

        Self { options, prefixes }
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Normalize a raw name. Total: every string, including the empty one,
    /// has a normalized form.
    pub fn normalize(&self, raw: &str) -> NormalizedName {
        let mut words = tokens(&base_form(raw, &self.options));

        loop {
            let hit = self
                .prefixes
                .iter()
                .find(|p| words.len() > p.len() && words.starts_with(p));
            match hit {
                Some(p) => {
                    words.drain(..p.len());
                }
                None => break,
            }
        }

        NormalizedName(words.join(" "))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize with default options.
pub fn normalize(raw: &str) -> NormalizedName {
    Normalizer::new().normalize(raw)
}

/// Map typographic dash and quote variants to their ASCII forms and leave
/// everything else intact.
pub fn unify_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' | '\u{05BE}' => '-',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{05F4}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{05F3}' | '`' => '\'',
            other => other,
        })
        .collect()
}

/// Everything but prefix stripping: compatibility composition, punctuation
/// unification, case folding, then every char that is not a letter, digit
/// or quote becomes a separator. Combining marks (e.g. Hebrew niqqud) are
/// dropped rather than split on.
///
/// Dropping a mark can leave two chars side by side that compose, so the
/// text is composed again afterwards. Without that a second pass would
/// compose them and the result would not be a fixed point.
fn base_form(raw: &str, options: &NormalizeOptions) -> String {
    let composed: String = if options.unicode_compat {
        raw.nfkc().collect()
    } else {
        raw.to_string()
    };
    let unified = unify_punctuation(&composed);
    let folded = if options.fold_case {
        unified.to_lowercase()
    } else {
        unified
    };

    let unmarked = folded.chars().filter(|c| !is_combining_mark(*c));
    let recomposed: String = if options.unicode_compat {
        unmarked.nfkc().collect()
    } else {
        unmarked.collect()
    };

    recomposed
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '\'' || c == '"' {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn tokens(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_collapses_and_folds() {
        assert_eq!(normalize("  Yossi   Cohen ").as_str(), "yossi cohen");
        assert_eq!(normalize("yossi cohen"), normalize("YOSSI COHEN"));
        assert_eq!(normalize("Yossi\tCohen\n").as_str(), "yossi cohen");
    }

    #[test]
    fn test_empty_and_blank() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \t ").is_empty());
        assert!(normalize(" -- ").is_empty());
    }

    #[test]
    fn test_punctuation_becomes_separator() {
        assert_eq!(normalize("Cohen, Yossi.").as_str(), "cohen yossi");
        assert_eq!(normalize("Levi-Cohen").as_str(), "levi cohen");
        assert_eq!(normalize("Levi \u{2013} Cohen").as_str(), "levi cohen");
    }

    #[test]
    fn test_hebrew_quotes_are_unified_and_kept() {
        // Gershayim and typographic quotes both become ASCII '"'.
        assert_eq!(normalize("רו\u{05F4}ח דנה").as_str(), "רו\"ח דנה");
        assert_eq!(normalize("רו\u{201D}ח דנה").as_str(), "רו\"ח דנה");
        assert_eq!(normalize("מיצ\u{05F3}ניק").as_str(), "מיצ'ניק");
    }

    #[test]
    fn test_niqqud_is_dropped_not_split() {
        // Shin with a qamats under it is still one word.
        assert_eq!(normalize("שָׁרה").as_str(), "שרה");
    }

    #[test]
    fn test_compat_composition() {
        // Fullwidth latin letters fold to ASCII.
        assert_eq!(normalize("ＤＡＮＡ").as_str(), "dana");
        let plain = Normalizer::with_options(NormalizeOptions {
            unicode_compat: false,
            ..NormalizeOptions::default()
        });
        assert_ne!(plain.normalize("ＤＡＮＡ").as_str(), "dana");
    }

    #[test]
    fn test_case_folding_can_be_disabled() {
        let n = Normalizer::with_options(NormalizeOptions {
            fold_case: false,
            ..NormalizeOptions::default()
        });
        assert_eq!(n.normalize(" Dana  Levi ").as_str(), "Dana Levi");
    }

    #[test]
    fn test_strip_prefixes() {
        let n = Normalizer::with_options(NormalizeOptions {
            strip_prefixes: vec!["CPA".into(), "רו\"ח".into()],
            ..NormalizeOptions::default()
        });
        assert_eq!(n.normalize("CPA Dana Levi").as_str(), "dana levi");
        assert_eq!(n.normalize("רו״ח דנה לוי").as_str(), "דנה לוי");
        assert_eq!(n.normalize("cpa cpa Dana").as_str(), "dana");
        // A prefix on its own is a name, not a title.
        assert_eq!(n.normalize("CPA").as_str(), "cpa");
    }

    #[test]
    fn test_idempotent() {
        let n = Normalizer::with_options(NormalizeOptions {
            strip_prefixes: vec!["cpa".into()],
            ..NormalizeOptions::default()
        });
        for raw in [
            "  Yossi   COHEN ",
            "cpa cpa x",
            "רו\u{05F4}ח  אהרון פארדו",
            "Ἀθῆναι",
            "ß straße",
            "ΟΔΟΣ",
            "\u{1100}\u{0301}\u{1161}",
            "\u{0130}stanbul",
            "",
        ] {
            let once = n.normalize(raw);
            let twice = n.normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_overlaps_matches_whole_word_runs() {
        let full = normalize("Vladimir Shayegandrov");
        assert!(normalize("Shayegandrov").overlaps(&full));
        assert!(full.overlaps(&normalize("vladimir")));
        assert!(full.overlaps(&full));
        assert!(!normalize("Vlad").overlaps(&full));
        assert!(!normalize("Shayegandrov Vladimir").overlaps(&full));
        assert!(!normalize("").overlaps(&full));
    }

    #[test]
    fn test_marks_between_composable_chars_recompose() {
        // A mark between two Hangul jamo blocks composition until it is
        // dropped; the syllable must come out precomposed on the first pass.
        assert_eq!(normalize("\u{1100}\u{0301}\u{1161}").as_str(), "\u{AC00}");
    }

    #[test]
    fn test_unify_punctuation_leaves_letters() {
        assert_eq!(unify_punctuation("a\u{2014}b \u{201C}c\u{201D}"), "a-b \"c\"");
        assert_eq!(unify_punctuation("שלום"), "שלום");
    }
}
