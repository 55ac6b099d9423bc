//! Content similarity and duplicate detection
//!
//! Texts are compared as bags of lower-cased word tokens. Cosine similarity
//! over term-frequency vectors drives duplicate detection and change
//! detection; Jaccard similarity and shingle fingerprints are available for
//! callers that want set-based comparisons.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

/// Similarity above which a pair is an exact duplicate
pub const EXACT_DUPLICATE_THRESHOLD: f64 = 0.95;

/// Similarity below which a page counts as changed
pub const CHANGE_THRESHOLD: f64 = 0.95;

/// Default threshold for [`detect_duplicates`]
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 0.8;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("TOKEN: hardcoded regex is valid"));

/// Splits text into lower-cased word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Jaccard similarity of the token sets of two texts
///
/// Two texts without any tokens have similarity 0.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    let set_a: HashSet<&str> = tokens_a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = tokens_b.iter().map(String::as_str).collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f64 / union as f64
}

/// Cosine similarity of the term-frequency vectors of two texts
///
/// Returns 0 when either text has no tokens.
pub fn cosine_similarity(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    let freq_a = term_frequencies(&tokens_a);
    let freq_b = term_frequencies(&tokens_b);

    let dot: f64 = freq_a
        .iter()
        .filter_map(|(term, &count)| freq_b.get(term).map(|&other| (count * other) as f64))
        .sum();
    let squared_a = squared_magnitude(&freq_a);
    let squared_b = squared_magnitude(&freq_b);

    if squared_a == 0.0 || squared_b == 0.0 {
        return 0.0;
    }
    // One square root keeps identical texts at exactly 1
    (dot / (squared_a * squared_b).sqrt()).min(1.0)
}

fn term_frequencies(tokens: &[String]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0) += 1;
    }
    counts
}

fn squared_magnitude(freq: &HashMap<&str, usize>) -> f64 {
    freq.values().map(|&c| (c * c) as f64).sum()
}

/// Hashes every 3-word shingle of a text
///
/// Each shingle is hashed with the 32-bit rolling hash `h = h * 31 + c` over
/// its UTF-16 code units, then made non-negative. Texts with fewer than three
/// tokens have an empty fingerprint.
pub fn fingerprint(text: &str) -> Vec<u32> {
    tokenize(text)
        .windows(3)
        .map(|shingle| shingle_hash(&shingle.join(" ")))
        .collect()
}

fn shingle_hash(shingle: &str) -> u32 {
    shingle
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_shl(5)
                .wrapping_sub(hash)
                .wrapping_add(i32::from(unit))
        })
        .unsigned_abs()
}

/// Returns true when a similarity score means the content changed
pub fn has_changed(similarity: f64) -> bool {
    similarity < CHANGE_THRESHOLD
}

/// Text of a crawled page kept for duplicate detection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityRecord {
    pub url: String,
    pub text: String,
    pub recorded_at: DateTime<Utc>,
}

impl SimilarityRecord {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Append-only log of page texts
#[derive(Debug, Clone, Default)]
pub struct SimilarityLog {
    records: Vec<SimilarityRecord>,
}

impl SimilarityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: SimilarityRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[SimilarityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Runs [`detect_duplicates`] over the logged records
    pub fn duplicates(&self, threshold: f64) -> Vec<DuplicatePair> {
        detect_duplicates(&self.records, threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateKind {
    Exact,
    NearDuplicate,
}

impl fmt::Display for DuplicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::NearDuplicate => f.write_str("near-duplicate"),
        }
    }
}

/// Two records whose texts are at least as similar as the threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicatePair {
    pub first_url: String,
    pub second_url: String,
    pub similarity: f64,
    pub kind: DuplicateKind,
}

/// Compares every unordered pair of records
///
/// Pairs with cosine similarity at or above `threshold` are returned, most
/// similar first. Equal similarities keep the order in which the pairs were
/// compared (`(0,1), (0,2), ..., (1,2), ...`).
pub fn detect_duplicates(records: &[SimilarityRecord], threshold: f64) -> Vec<DuplicatePair> {
    let mut pairs = Vec::new();

    for (i, first) in records.iter().enumerate() {
        for second in &records[i + 1..] {
            let similarity = cosine_similarity(&first.text, &second.text);
            if similarity >= threshold {
                pairs.push(DuplicatePair {
                    first_url: first.url.clone(),
                    second_url: second.url.clone(),
                    similarity,
                    kind: if similarity > EXACT_DUPLICATE_THRESHOLD {
                        DuplicateKind::Exact
                    } else {
                        DuplicateKind::NearDuplicate
                    },
                });
            }
        }
    }

    // Stable sort keeps pair order among ties
    pairs.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    pairs
}
