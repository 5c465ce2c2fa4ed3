use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::EngineError;

/// Rough difficulty of a reference text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Inverse of the `Display` label, used when reading stored sessions back
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Classify from the three text densities.
    ///
    /// Each measure past its soft limit adds one point and past its hard limit
    /// another; 0 points is easy, 1-2 medium, 3 or more hard.
    pub fn classify(avg_word_len: f64, symbol_density: f64, digit_density: f64) -> Self {
        let mut score = 0;
        if avg_word_len > 5.5 {
            score += 1;
        }
        if avg_word_len > 7.0 {
            score += 1;
        }
        if symbol_density > 0.05 {
            score += 1;
        }
        if symbol_density > 0.10 {
            score += 1;
        }
        if digit_density > 0.03 {
            score += 1;
        }
        if digit_density > 0.08 {
            score += 1;
        }

        match score {
            0 => Difficulty::Easy,
            1 | 2 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }
}

pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The text a session asks the user to reproduce.
///
/// Indices everywhere in the crate are char indices, not byte offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceText {
    text: String,
    chars: Vec<char>,
    words: Vec<Range<usize>>,
    difficulty: Difficulty,
}

impl ReferenceText {
    pub fn new(text: &str) -> Result<Self, EngineError> {
        if text.is_empty() {
            return Err(EngineError::EmptyReferenceText);
        }

        let chars: Vec<char> = text.chars().collect();
        let words = word_boundaries(&chars);

        let word_chars: usize = words.iter().map(|w| w.len()).sum();
        let avg_word_len = if words.is_empty() {
            0.0
        } else {
            word_chars as f64 / words.len() as f64
        };
        let len = chars.len() as f64;
        let symbols = chars
            .iter()
            .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
            .count();
        let digits = chars.iter().filter(|c| c.is_numeric()).count();

        let difficulty =
            Difficulty::classify(avg_word_len, symbols as f64 / len, digits as f64 / len);

        Ok(Self {
            text: text.to_string(),
            chars,
            words,
            difficulty,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn words(&self) -> &[Range<usize>] {
        &self.words
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Index of the word containing char `idx`, if `idx` sits inside one
    pub fn word_at(&self, idx: usize) -> Option<usize> {
        let pos = self.words.partition_point(|w| w.end <= idx);
        self.words
            .get(pos)
            .filter(|w| w.contains(&idx))
            .map(|_| pos)
    }

    /// Number of words fully covered by the first `typed_len` chars
    pub fn words_within(&self, typed_len: usize) -> usize {
        self.words.partition_point(|w| w.end <= typed_len)
    }

    /// First `max_chars` chars, with "..." appended when the text is longer
    pub fn preview(&self, max_chars: usize) -> String {
        if self.chars.len() <= max_chars {
            self.text.clone()
        } else {
            let mut preview: String = self.chars[..max_chars].iter().collect();
            preview.push_str("...");
            preview
        }
    }
}

fn word_boundaries(chars: &[char]) -> Vec<Range<usize>> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, c) in chars.iter().enumerate() {
        match (is_word_char(*c), start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                words.push(s..idx);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push(s..chars.len());
    }

    words
}
