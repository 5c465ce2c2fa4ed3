use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-character aggregate for the running session
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterStat {
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub cumulative_time_ms: f64,
}

impl CharacterStat {
    pub fn record(&mut self, was_correct: bool, time_ms: f64) {
        self.total_attempts += 1;
        if was_correct {
            self.correct_attempts += 1;
        }
        self.cumulative_time_ms += time_ms;
    }

    /// Percentage of attempts that were correct
    pub fn accuracy(&self) -> f64 {
        if self.total_attempts == 0 {
            return 100.0;
        }
        self.correct_attempts as f64 / self.total_attempts as f64 * 100.0
    }

    /// Percentage of attempts that were wrong
    pub fn miss_rate(&self) -> f64 {
        100.0 - self.accuracy()
    }

    /// Average dwell time per attempt
    pub fn avg_time_ms(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        self.cumulative_time_ms / self.total_attempts as f64
    }
}

/// Character statistics keyed by the expected character
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharStats {
    by_char: HashMap<char, CharacterStat>,
}

impl CharStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, expected: char, was_correct: bool, time_ms: f64) {
        self.by_char
            .entry(expected)
            .or_default()
            .record(was_correct, time_ms);
    }

    pub fn get(&self, c: char) -> Option<&CharacterStat> {
        self.by_char.get(&c)
    }

    pub fn len(&self) -> usize {
        self.by_char.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_char.is_empty()
    }

    /// All entries sorted by character
    pub fn sorted(&self) -> Vec<(char, CharacterStat)> {
        let mut entries: Vec<(char, CharacterStat)> =
            self.by_char.iter().map(|(c, s)| (*c, *s)).collect();
        entries.sort_by_key(|(c, _)| *c);
        entries
    }

    /// Characters with the highest miss rate first; ties go to the slower one
    pub fn weakest(&self, n: usize) -> Vec<(char, CharacterStat)> {
        let mut entries = self.sorted();
        entries.retain(|(_, s)| s.correct_attempts < s.total_attempts);
        entries.sort_by(|(_, a), (_, b)| {
            b.miss_rate()
                .total_cmp(&a.miss_rate())
                .then(b.avg_time_ms().total_cmp(&a.avg_time_ms()))
        });
        entries.truncate(n);
        entries
    }
}
