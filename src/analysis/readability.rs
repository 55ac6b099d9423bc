//! Flesch reading-ease analysis

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("WORD: hardcoded regex is valid"));

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("SENTENCE_BREAK: hardcoded regex is valid"));

static SILENT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[^laeiouy]es|ed|[^laeiouy]e)$").expect("SILENT_SUFFIX: hardcoded regex is valid")
});

static VOWEL_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[aeiouy]{1,2}").expect("VOWEL_GROUP: hardcoded regex is valid"));

/// Reading level bands of the Flesch scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadingLevel {
    NoContent,
    VeryEasy,
    Easy,
    FairlyEasy,
    Standard,
    FairlyDifficult,
    Difficult,
    VeryDifficult,
}

impl ReadingLevel {
    fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Self::VeryEasy,
            s if s >= 80.0 => Self::Easy,
            s if s >= 70.0 => Self::FairlyEasy,
            s if s >= 60.0 => Self::Standard,
            s if s >= 50.0 => Self::FairlyDifficult,
            s if s >= 30.0 => Self::Difficult,
            _ => Self::VeryDifficult,
        }
    }
}

impl fmt::Display for ReadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NoContent => "No content",
            Self::VeryEasy => "Very Easy",
            Self::Easy => "Easy",
            Self::FairlyEasy => "Fairly Easy",
            Self::Standard => "Standard",
            Self::FairlyDifficult => "Fairly Difficult",
            Self::Difficult => "Difficult",
            Self::VeryDifficult => "Very Difficult",
        };
        f.write_str(label)
    }
}

/// Readability statistics for a block of text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Readability {
    /// Flesch reading ease, rounded and floored at 0
    pub flesch_score: f64,
    pub reading_level: ReadingLevel,
    pub sentences: usize,
    pub words: usize,
    pub avg_words_per_sentence: f64,
    pub avg_syllables_per_word: f64,
}

/// Computes Flesch reading-ease statistics
///
/// Sentences are runs of text between `.`, `!` and `?`; text with no
/// sentences or no words scores 0.
pub fn analyze_readability(text: &str) -> Readability {
    let sentences = SENTENCE_BREAK
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .count();
    let words: Vec<&str> = WORD.find_iter(text).map(|m| m.as_str()).collect();

    if sentences == 0 || words.is_empty() {
        return Readability {
            flesch_score: 0.0,
            reading_level: ReadingLevel::NoContent,
            sentences: 0,
            words: 0,
            avg_words_per_sentence: 0.0,
            avg_syllables_per_word: 0.0,
        };
    }

    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let words_per_sentence = words.len() as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / words.len() as f64;
    let score = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;

    Readability {
        flesch_score: score.round().max(0.0),
        reading_level: ReadingLevel::from_score(score),
        sentences,
        words: words.len(),
        avg_words_per_sentence: round_tenth(words_per_sentence),
        avg_syllables_per_word: round_tenth(syllables_per_word),
    }
}

/// Flesch reading ease of `text`, rounded and floored at 0
pub fn flesch_reading_ease(text: &str) -> f64 {
    analyze_readability(text).flesch_score
}

/// Estimates the syllable count of an English word
pub fn count_syllables(word: &str) -> usize {
    let word = word.to_lowercase();
    if word.chars().count() <= 3 {
        return 1;
    }

    let stripped = SILENT_SUFFIX.replace(&word, "");
    let stripped = stripped.strip_prefix('y').unwrap_or(&stripped);

    match VOWEL_GROUP.find_iter(stripped).count() {
        0 => 1,
        n => n,
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
