//! Canonical request-type resolution: hybrid prefix + fuzzy matching.
//!
//! The report's "request type" column is routinely clipped mid-word by the
//! table layout, so the engine sees strings like `ALVARA DE FUNCIONAMENTO -
//! BAI` where the register holds `ALVARÁ DE FUNCIONAMENTO - BAIXO RISCO`.
//! The [`Resolver`] reconciles those against a fixed reference vocabulary in
//! three phases, first success wins:
//!
//! 1. **Exact prefix** — regular truncation. The input (normalised) must be
//!    at least [`MIN_PREFIX_LEN`] characters; the match returned is the
//!    *first* vocabulary entry in file order whose normalised form starts
//!    with the input. File order beats match specificity on purpose: output
//!    must be deterministic across runs, so no longest-match shortcut.
//! 2. **Fuzzy** — irregular/garbled truncation. A Ratcliff–Obershelp
//!    sequence-matching ratio against every entry; best score wins when it
//!    reaches [`FUZZY_CUTOFF`].
//! 3. **Passthrough** — the input is returned unchanged. A wrong canonical
//!    substitution is worse than an unresolved label, so unknown text is
//!    never rewritten.
//!
//! The vocabulary is loaded once at engine initialisation and immutable for
//! the lifetime of the resolver; reloading means building a new resolver.
//! A missing or unreadable asset degrades the resolver to pure passthrough —
//! logged once, never an error.

use std::path::Path;
use tracing::{debug, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Minimum normalised input length for prefix matching, to avoid spurious
/// hits on fragments like `"IP"`.
pub const MIN_PREFIX_LEN: usize = 5;

/// Similarity ratio a fuzzy candidate must reach to be accepted.
pub const FUZZY_CUTOFF: f64 = 0.72;

/// Vocabulary bundled with the crate, used when no external asset is
/// configured.
const DEFAULT_VOCABULARY: &str = include_str!("../assets/request_types.md");

/// The canonical request-type vocabulary plus its precomputed normalised
/// table.
///
/// Stateless after construction: [`Resolver::resolve`] is a pure function of
/// the input string and the two tables.
pub struct Resolver {
    /// Canonical entries, in asset file order, original casing and accents.
    canonical: Vec<String>,
    /// `normalize()` of each canonical entry, same order.
    normalized: Vec<String>,
}

impl Resolver {
    /// Build a resolver from the configured vocabulary source.
    ///
    /// `None` selects the vocabulary bundled with the crate. A path that
    /// cannot be read yields an *empty* resolver (passthrough for every
    /// input) with a single warning — extraction must not fail because a
    /// side asset is missing.
    pub fn from_config(vocabulary_path: Option<&Path>) -> Self {
        match vocabulary_path {
            None => Self::from_asset(DEFAULT_VOCABULARY),
            Some(path) => match std::fs::read_to_string(path) {
                Ok(text) => {
                    let resolver = Self::from_asset(&text);
                    if resolver.is_empty() {
                        warn!(
                            "Vocabulary asset '{}' contains no entries; request types pass through unresolved",
                            path.display()
                        );
                    }
                    resolver
                }
                Err(e) => {
                    warn!(
                        "Failed to read vocabulary asset '{}': {}; request types pass through unresolved",
                        path.display(),
                        e
                    );
                    Self::from_entries(Vec::new())
                }
            },
        }
    }

    /// Parse a vocabulary asset and build the resolver from it.
    pub fn from_asset(text: &str) -> Self {
        Self::from_entries(parse_vocabulary(text))
    }

    /// Build a resolver from explicit canonical entries (file order).
    pub fn from_entries(entries: Vec<String>) -> Self {
        let normalized = entries.iter().map(|e| normalize(e)).collect();
        Self {
            canonical: entries,
            normalized,
        }
    }

    /// Number of canonical entries.
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    /// True when the vocabulary is empty and every input passes through.
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    /// The canonical entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.canonical.iter().map(String::as_str)
    }

    /// Resolve a (possibly truncated) raw label to its canonical form.
    ///
    /// Never fails: when no confident match exists the input is returned
    /// unchanged.
    pub fn resolve(&self, raw: &str) -> String {
        if raw.is_empty() || self.canonical.is_empty() {
            return raw.to_string();
        }

        let needle = normalize(raw);
        if needle.chars().count() < MIN_PREFIX_LEN {
            return raw.to_string();
        }

        // Phase 1: exact prefix, first entry in file order.
        for (idx, entry) in self.normalized.iter().enumerate() {
            if entry.starts_with(&needle) {
                return self.canonical[idx].clone();
            }
        }

        // Phase 2: fuzzy fallback. Ties keep the earlier entry.
        let mut best: Option<(usize, f64)> = None;
        for (idx, entry) in self.normalized.iter().enumerate() {
            let score = sequence_ratio(&needle, entry);
            if score >= FUZZY_CUTOFF && best.map_or(true, |(_, s)| score > s) {
                best = Some((idx, score));
            }
        }
        if let Some((idx, score)) = best {
            debug!(
                "Fuzzy-resolved request type '{}' -> '{}' (score {:.3})",
                raw, self.canonical[idx], score
            );
            return self.canonical[idx].clone();
        }

        // Phase 3: no confident match — keep the original.
        raw.to_string()
    }
}

/// Parse a vocabulary asset into canonical entries.
///
/// Each relevant line begins with a two-character bullet marker (`- ` or
/// `* `) followed by the canonical label; blank lines, headings, and prose
/// are ignored.
pub fn parse_vocabulary(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
        })
        .collect()
}

/// Normalise for matching: NFKD-decompose and drop combining marks (accent
/// stripping), uppercase, collapse internal whitespace, trim.
fn normalize(text: &str) -> String {
    let stripped: String = text.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    stripped
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ratcliff–Obershelp similarity ratio over characters: `2·M / T` where `M`
/// is the total size of the recursively-found matching blocks and `T` the
/// combined length of both inputs.
fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matched_size(&a, &b, 0, a.len(), 0, b.len());
    2.0 * matched as f64 / total as f64
}

/// Total length of matching blocks: the longest common block, plus whatever
/// matches recursively to its left and right.
fn matched_size(a: &[char], b: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> usize {
    let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
    if size == 0 {
        return 0;
    }
    size + matched_size(a, b, alo, i, blo, j) + matched_size(a, b, i + size, ahi, j + size, bhi)
}

/// Longest matching block of `a[alo..ahi]` and `b[blo..bhi]`, leftmost on
/// ties. Returns `(start_in_a, start_in_b, length)`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0usize);
    let mut run_lengths = vec![0usize; width];

    for i in alo..ahi {
        let mut next = vec![0usize; width];
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = if j > blo { run_lengths[j - blo - 1] } else { 0 } + 1;
                next[j - blo] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        run_lengths = next;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_resolver() -> Resolver {
        Resolver::from_entries(vec![
            "ALVARÁ DE FUNCIONAMENTO - BAIXO RISCO".to_string(),
            "CERTIDÃO NEGATIVA DE DÉBITOS".to_string(),
            "ISSQN - LANÇAMENTO".to_string(),
            "IPTU - REVISÃO DE LANÇAMENTO".to_string(),
        ])
    }

    // ── Normalisation ────────────────────────────────────────────────────

    #[test]
    fn normalize_strips_accents_and_collapses_whitespace() {
        assert_eq!(normalize("Certidão  Negativa "), "CERTIDAO NEGATIVA");
        assert_eq!(normalize("ALVARÁ DE CONSTRUÇÃO"), "ALVARA DE CONSTRUCAO");
        assert_eq!(normalize(""), "");
    }

    // ── Sequence ratio ───────────────────────────────────────────────────

    #[test]
    fn ratio_of_identical_strings_is_one() {
        assert_eq!(sequence_ratio("ABCD", "ABCD"), 1.0);
        assert_eq!(sequence_ratio("", ""), 1.0);
    }

    #[test]
    fn ratio_of_disjoint_strings_is_zero() {
        assert_eq!(sequence_ratio("ABC", "XYZ"), 0.0);
    }

    #[test]
    fn ratio_counts_split_blocks() {
        // Blocks "AB" and "CD" around a one-char mismatch:
        // 2·4 / (5 + 4) ≈ 0.889
        let r = sequence_ratio("ABXCD", "ABCD");
        assert!((r - 8.0 / 9.0).abs() < 1e-9, "got {r}");
    }

    // ── Prefix phase ─────────────────────────────────────────────────────

    #[test]
    fn truncated_label_resolves_to_full_entry() {
        let r = sample_resolver();
        assert_eq!(
            r.resolve("ALVARA DE FUNCIONAMENTO - BAI"),
            "ALVARÁ DE FUNCIONAMENTO - BAIXO RISCO"
        );
    }

    #[test]
    fn prefix_match_ignores_accents_both_ways() {
        let r = sample_resolver();
        assert_eq!(
            r.resolve("CERTIDAO NEGATIVA DE DEBITO"),
            "CERTIDÃO NEGATIVA DE DÉBITOS"
        );
    }

    #[test]
    fn file_order_beats_match_specificity() {
        // Both entries share the prefix; the first in file order must win
        // even though the second is the longer (more specific) candidate.
        let r = Resolver::from_entries(vec![
            "BAIXA DE DÉBITOS".to_string(),
            "BAIXA DE DÉBITOS SIMPLES NACIONAL".to_string(),
        ]);
        assert_eq!(r.resolve("BAIXA DE DEB"), "BAIXA DE DÉBITOS");
    }

    // ── Fuzzy phase ──────────────────────────────────────────────────────

    #[test]
    fn garbled_truncation_resolves_fuzzily() {
        let r = sample_resolver();
        // Not a prefix of any entry (missing chars mid-word), but close.
        assert_eq!(r.resolve("ISSQN - LANCAMNT"), "ISSQN - LANÇAMENTO");
    }

    // ── Passthrough guarantees ───────────────────────────────────────────

    #[test]
    fn idempotent_on_canonical_input() {
        let r = Resolver::from_config(None);
        assert!(!r.is_empty(), "bundled vocabulary must not be empty");
        let entries: Vec<String> = r.entries().map(str::to_string).collect();
        for entry in entries {
            assert_eq!(r.resolve(&entry), entry);
        }
    }

    #[test]
    fn unknown_text_passes_through() {
        let r = sample_resolver();
        let raw = "TEXTO INVALIDO QUALQUER";
        assert_eq!(r.resolve(raw), raw);
    }

    #[test]
    fn short_input_is_never_substituted() {
        let r = sample_resolver();
        assert_eq!(r.resolve("IP"), "IP");
        assert_eq!(r.resolve("ALVA"), "ALVA");
    }

    #[test]
    fn empty_input_stays_empty() {
        let r = sample_resolver();
        assert_eq!(r.resolve(""), "");
    }

    #[test]
    fn empty_vocabulary_passes_everything_through() {
        let r = Resolver::from_entries(Vec::new());
        assert!(r.is_empty());
        assert_eq!(
            r.resolve("ALVARA DE FUNCIONAMENTO - BAI"),
            "ALVARA DE FUNCIONAMENTO - BAI"
        );
    }

    #[test]
    fn unreadable_asset_degrades_to_passthrough() {
        let r = Resolver::from_config(Some(std::path::Path::new(
            "/nonexistent/request_types.md",
        )));
        assert!(r.is_empty());
        assert_eq!(r.resolve("CERTIDAO NEGATIVA"), "CERTIDAO NEGATIVA");
    }

    // ── Asset parsing ────────────────────────────────────────────────────

    #[test]
    fn parse_vocabulary_keeps_only_bullet_lines() {
        let text = "# Heading\n\nprose line\n- FIRST ENTRY\n*  SECOND ENTRY\n-   \n- THIRD ENTRY\n";
        assert_eq!(
            parse_vocabulary(text),
            vec!["FIRST ENTRY", "SECOND ENTRY", "THIRD ENTRY"]
        );
    }

    #[test]
    fn bundled_vocabulary_parses() {
        let entries = parse_vocabulary(DEFAULT_VOCABULARY);
        assert!(entries.len() >= 20, "got {} entries", entries.len());
        assert!(entries
            .iter()
            .any(|e| e == "ALVARÁ DE FUNCIONAMENTO - BAIXO RISCO"));
    }
}
