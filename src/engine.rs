use chrono::Utc;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;
use tracing::{debug, trace, warn};

use crate::error::EngineError;
use crate::session::SessionClock;
use crate::stats::CharStats;
use crate::summary::SessionSummary;
use crate::text::ReferenceText;
use crate::time_series::TimeSeriesPoint;
use crate::util::{coefficient_of_variation, per_minute, percent, wpm};

/// A single accepted character, in the order it was typed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Keystroke {
    pub index: usize,
    pub typed_char: char,
    pub expected_char: char,
    pub correct: bool,
    pub timestamp_ms: f64,
    /// Active time since the previous keystroke, 0 for the first
    pub interval_ms: f64,
}

/// A wrong character that was deleted again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub index: usize,
    pub expected_char: char,
    pub typed_char: char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// The typed buffer now mirrors the new value
    Accepted,
    /// Same length as the committed input; nothing to do
    Unchanged,
    /// Longer than the reference text; state untouched
    Rejected,
    /// The session is complete and no longer mutates
    Frozen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessResult {
    pub outcome: InputOutcome,
    pub is_complete: bool,
    pub accuracy_so_far: u8,
    pub error_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharDisplayState {
    Correct,
    Incorrect,
    Current,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Speed {
    pub wpm: u32,
    pub cpm: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Trailing keystrokes considered for burst speed
    pub burst_window: usize,
    /// Length of the text excerpt stored with a summary
    pub preview_chars: usize,
    /// Report at least one second of duration in summaries
    pub clamp_min_duration: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            burst_window: 10,
            preview_chars: 50,
            clamp_min_duration: true,
        }
    }
}

/// Live metrics for one practice session.
///
/// One instance per session, owned by the caller; nothing is shared between
/// instances. Timestamps are caller-supplied milliseconds on any monotonic
/// timeline.
#[derive(Debug, Clone)]
pub struct TypingEngine {
    config: EngineConfig,
    text: ReferenceText,
    typed: Vec<char>,
    /// UTF-8 length of `typed`, so appended input can be sliced off directly
    typed_bytes: usize,
    errors: BTreeSet<usize>,
    keystrokes: Vec<Keystroke>,
    corrections: Vec<Correction>,
    corrected_chars: HashMap<char, usize>,
    char_stats: CharStats,
    clock: SessionClock,
    last_timestamp_ms: Option<f64>,
    last_active_ms: f64,
    wpm_history: Vec<TimeSeriesPoint>,
    summary: Option<SessionSummary>,
}

impl TypingEngine {
    pub fn new(reference_text: &str, config: EngineConfig) -> Result<Self, EngineError> {
        let text = ReferenceText::new(reference_text)?;
        debug!(
            len = text.len(),
            words = text.words().len(),
            difficulty = %text.difficulty(),
            "engine initialized"
        );

        Ok(Self {
            config,
            text,
            typed: Vec::new(),
            typed_bytes: 0,
            errors: BTreeSet::new(),
            keystrokes: Vec::new(),
            corrections: Vec::new(),
            corrected_chars: HashMap::new(),
            char_stats: CharStats::new(),
            clock: SessionClock::new(),
            last_timestamp_ms: None,
            last_active_ms: 0.0,
            wpm_history: Vec::new(),
            summary: None,
        })
    }

    /// Apply the current value of the input box.
    ///
    /// Only characters appended or removed since the last call are inspected,
    /// so the cost is proportional to the change, not to the text.
    pub fn process_input(
        &mut self,
        new_value: &str,
        timestamp_ms: f64,
    ) -> Result<ProcessResult, EngineError> {
        if self.is_complete() {
            return Ok(self.result(InputOutcome::Frozen));
        }
        validate_timestamp(timestamp_ms)?;

        // the appended tail, when the value still extends the committed bytes
        let tail = new_value.get(self.typed_bytes..);
        let new_len = match tail {
            Some(tail) => self.typed.len() + tail.chars().count(),
            None => self
                .len_within(new_value.len())
                .unwrap_or_else(|| new_value.chars().count()),
        };
        if new_len > self.text.len() {
            trace!(new_len, limit = self.text.len(), "input longer than reference rejected");
            return Ok(self.result(InputOutcome::Rejected));
        }

        let current_len = self.typed.len();
        if new_len == current_len {
            return Ok(self.result(InputOutcome::Unchanged));
        }

        let timestamp_ms = self.ordered(timestamp_ms);

        if new_len > current_len {
            match tail {
                Some(tail) => tail.chars().for_each(|c| self.push_char(c, timestamp_ms)),
                None => new_value
                    .chars()
                    .skip(current_len)
                    .for_each(|c| self.push_char(c, timestamp_ms)),
            }
        } else {
            while self.typed.len() > new_len {
                self.pop_char();
            }
        }
        self.last_timestamp_ms = Some(timestamp_ms);

        if self.typed.len() == self.text.len() {
            self.complete(timestamp_ms);
        }

        Ok(self.result(InputOutcome::Accepted))
    }

    /// Clamp a timestamp that runs behind the last one seen
    fn ordered(&self, timestamp_ms: f64) -> f64 {
        match self.last_timestamp_ms {
            Some(last) if timestamp_ms < last => {
                warn!(
                    timestamp_ms,
                    last_ms = last,
                    "out-of-order timestamp, using previous event time"
                );
                last
            }
            _ => timestamp_ms,
        }
    }

    /// Number of committed chars spanning exactly `bytes` bytes, if any
    fn len_within(&self, bytes: usize) -> Option<usize> {
        let mut len = self.typed.len();
        let mut used = self.typed_bytes;
        while used > bytes && len > 0 {
            len -= 1;
            used -= self.typed[len].len_utf8();
        }
        (used == bytes).then_some(len)
    }

    fn push_char(&mut self, c: char, timestamp_ms: f64) {
        let index = self.typed.len();
        let Some(expected) = self.text.char_at(index) else {
            return;
        };

        self.clock.start(timestamp_ms);
        let active = self.clock.active_ms(timestamp_ms);
        let interval_ms = if self.keystrokes.is_empty() {
            0.0
        } else {
            (active - self.last_active_ms).max(0.0)
        };
        self.last_active_ms = active;

        let correct = c == expected;
        self.keystrokes.push(Keystroke {
            index,
            typed_char: c,
            expected_char: expected,
            correct,
            timestamp_ms,
            interval_ms,
        });
        self.char_stats.record(expected, correct, interval_ms);

        if correct {
            self.errors.remove(&index);
        } else {
            self.errors.insert(index);
        }
        self.typed.push(c);
        self.typed_bytes += c.len_utf8();
    }

    fn pop_char(&mut self) {
        let Some(typed_char) = self.typed.pop() else {
            return;
        };
        let index = self.typed.len();
        self.typed_bytes -= typed_char.len_utf8();

        if self.errors.remove(&index) {
            let expected_char = self.text.char_at(index).unwrap_or(typed_char);
            self.corrections.push(Correction {
                index,
                expected_char,
                typed_char,
            });
            *self.corrected_chars.entry(expected_char).or_insert(0) += 1;
        }
    }

    fn complete(&mut self, timestamp_ms: f64) {
        self.clock.finish(timestamp_ms);
        self.record_sample(timestamp_ms);

        let elapsed_ms = self.clock.active_ms(timestamp_ms);
        let speed = self.speed(timestamp_ms);
        let mut duration_seconds = (elapsed_ms / 1000.0).round() as u64;
        if self.config.clamp_min_duration {
            duration_seconds = duration_seconds.max(1);
        }

        let summary = SessionSummary {
            wpm: speed.wpm,
            accuracy: self.accuracy(None),
            duration_seconds,
            error_count: self.errors.len(),
            total_characters: self.text.len(),
            characters_per_minute: speed.cpm,
            completed_at: Utc::now(),
            text_preview: self.text.preview(self.config.preview_chars),
            difficulty: self.text.difficulty(),
            consistency: self.consistency(),
            corrections: self.corrections.len(),
        };
        debug!(
            wpm = summary.wpm,
            accuracy = summary.accuracy,
            errors = summary.error_count,
            "session complete"
        );
        self.summary = Some(summary);
    }

    fn result(&self, outcome: InputOutcome) -> ProcessResult {
        ProcessResult {
            outcome,
            is_complete: self.is_complete(),
            accuracy_so_far: self.accuracy(None),
            error_count: self.errors.len(),
        }
    }

    pub fn display_state(&self, index: usize) -> CharDisplayState {
        let typed_len = self.typed.len();
        if index < typed_len {
            if self.errors.contains(&index) {
                CharDisplayState::Incorrect
            } else {
                CharDisplayState::Correct
            }
        } else if index == typed_len && index < self.text.len() {
            CharDisplayState::Current
        } else {
            CharDisplayState::Pending
        }
    }

    /// Display states for a visible window of the text
    pub fn display_states(&self, range: Range<usize>) -> Vec<CharDisplayState> {
        let end = range.end.min(self.text.len());
        (range.start.min(end)..end)
            .map(|i| self.display_state(i))
            .collect()
    }

    /// Share of correct characters among the first `prefix_len` typed ones
    /// (all typed characters by default); 100 before anything is typed
    pub fn accuracy(&self, prefix_len: Option<usize>) -> u8 {
        let considered = prefix_len.map_or(self.typed.len(), |p| p.min(self.typed.len()));
        let wrong = if considered == self.typed.len() {
            self.errors.len()
        } else {
            self.errors.range(..considered).count()
        };

        percent(considered - wrong, considered).unwrap_or(100)
    }

    pub fn speed(&self, now_ms: f64) -> Speed {
        let elapsed_ms = self.clock.active_ms(now_ms);
        let typed = self.typed.len();

        Speed {
            wpm: wpm(typed, elapsed_ms),
            cpm: per_minute(typed as f64, elapsed_ms).round() as u32,
        }
    }

    /// 100 minus the coefficient of variation of inter-key intervals, in percent
    pub fn consistency(&self) -> u8 {
        let intervals: Vec<f64> = self
            .keystrokes
            .iter()
            .skip(1)
            .map(|k| k.interval_ms)
            .collect();
        if intervals.len() < 2 {
            return 100;
        }

        match coefficient_of_variation(&intervals) {
            Some(cv) => (100.0 - cv * 100.0).max(0.0).round() as u8,
            None => 100,
        }
    }

    /// WPM over the trailing burst window of keystrokes
    pub fn burst_wpm(&self) -> u32 {
        let window = self.config.burst_window.min(self.keystrokes.len());
        if window == 0 {
            return 0;
        }

        let start = self.keystrokes.len() - window;
        let elapsed_ms: f64 = self.keystrokes[start..].iter().map(|k| k.interval_ms).sum();
        // the very first keystroke carries no interval of its own
        let chars = if start == 0 { window - 1 } else { window };

        wpm(chars, elapsed_ms)
    }

    /// Returns whether the session is paused afterwards
    pub fn toggle_pause(&mut self, now_ms: f64) -> Result<bool, EngineError> {
        if self.clock.is_paused() {
            self.resume(now_ms)?;
            return Ok(false);
        }
        validate_timestamp(now_ms)?;
        let now_ms = self.ordered(now_ms);
        if self.clock.pause(now_ms) {
            self.last_timestamp_ms = Some(now_ms);
            debug!(at = now_ms, "session paused");
        }
        Ok(self.clock.is_paused())
    }

    pub fn resume(&mut self, now_ms: f64) -> Result<(), EngineError> {
        validate_timestamp(now_ms)?;
        let now_ms = self.ordered(now_ms);
        if self.clock.resume(now_ms) {
            self.last_timestamp_ms = Some(now_ms);
            debug!(
                at = now_ms,
                paused_ms = self.clock.paused_accum_ms(),
                "session resumed"
            );
        }
        Ok(())
    }

    /// Clear every buffer; optionally swap in a new reference text.
    ///
    /// On error the engine is left as it was.
    pub fn reset(&mut self, new_text: Option<&str>) -> Result<(), EngineError> {
        let text = match new_text {
            Some(t) => ReferenceText::new(t)?,
            None => self.text.clone(),
        };
        *self = Self::new(text.as_str(), self.config.clone())?;
        Ok(())
    }

    /// The cached summary once the session is complete
    pub fn finalize(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// Append a point to the WPM history; ignored before start and after completion
    pub fn sample(&mut self, now_ms: f64) {
        if !self.clock.has_started() || self.is_complete() {
            return;
        }
        self.record_sample(now_ms);
    }

    fn record_sample(&mut self, now_ms: f64) {
        let t = self.clock.active_ms(now_ms) / 1000.0;
        if self.wpm_history.last().is_some_and(|p| p.t >= t) {
            return;
        }
        let point = TimeSeriesPoint::new(
            t,
            self.speed(now_ms).wpm as f64,
            self.burst_wpm() as f64,
        );
        self.wpm_history.push(point);
    }

    /// Expected characters corrected most often, most frequent first
    pub fn most_corrected(&self, n: usize) -> Vec<(char, usize)> {
        self.corrected_chars
            .iter()
            .map(|(c, count)| (*c, *count))
            .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
            .take(n)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn has_started(&self) -> bool {
        self.clock.has_started()
    }

    pub fn text(&self) -> &ReferenceText {
        &self.text
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn typed_len(&self) -> usize {
        self.typed.len()
    }

    pub fn typed_text(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn typed_char(&self, index: usize) -> Option<char> {
        self.typed.get(index).copied()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn error_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.errors.iter().copied()
    }

    pub fn keystrokes(&self) -> &[Keystroke] {
        &self.keystrokes
    }

    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    pub fn char_stats(&self) -> &CharStats {
        &self.char_stats
    }

    pub fn wpm_history(&self) -> &[TimeSeriesPoint] {
        &self.wpm_history
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    /// Percent of the reference text typed so far
    pub fn progress(&self) -> u8 {
        percent(self.typed.len(), self.text.len()).unwrap_or(0)
    }

    /// Index of the word under the cursor
    pub fn current_word(&self) -> Option<usize> {
        self.text.word_at(self.typed.len())
    }

    pub fn words_completed(&self) -> usize {
        self.text.words_within(self.typed.len())
    }
}

fn validate_timestamp(value: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::InvalidTimestamp { value });
    }
    Ok(())
}
