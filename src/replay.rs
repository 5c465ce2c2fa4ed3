//! Headless driver: feed a recorded stream of input-box values to the engine.
//!
//! The log is a JSON array of `{ "value": "...", "timestampMs": 123.0 }`
//! events, optionally interleaved with `{ "pause": true, "timestampMs": ... }`
//! toggles.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::engine::{EngineConfig, InputOutcome, TypingEngine};
use crate::error::EngineError;
use crate::summary::{SavePayload, SessionSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplayEvent {
    #[serde(rename_all = "camelCase")]
    Input { value: String, timestamp_ms: f64 },
    #[serde(rename_all = "camelCase")]
    Pause { pause: bool, timestamp_ms: f64 },
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read replay log: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse replay log: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("event {index}: {source}")]
    Engine {
        index: usize,
        #[source]
        source: EngineError,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub accepted: usize,
    pub rejected: usize,
    pub summary: Option<SessionSummary>,
    /// What a persistence collaborator would send to the backend
    pub payload: Option<SavePayload>,
    /// Live figures at the last event when the log ends before completion
    pub accuracy: u8,
    pub wpm: u32,
}

pub fn load_events(path: &Path) -> Result<Vec<ReplayEvent>, ReplayError> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn replay(
    text: &str,
    events: &[ReplayEvent],
    config: EngineConfig,
) -> Result<ReplayReport, ReplayError> {
    let mut engine =
        TypingEngine::new(text, config).map_err(|source| ReplayError::Engine { index: 0, source })?;
    let mut report = ReplayReport::default();
    let mut last_ms = 0.0;

    for (index, event) in events.iter().enumerate() {
        let engine_err = |source: EngineError| ReplayError::Engine { index, source };
        match event {
            ReplayEvent::Input {
                value,
                timestamp_ms,
            } => {
                let result = engine
                    .process_input(value, *timestamp_ms)
                    .map_err(engine_err)?;
                match result.outcome {
                    InputOutcome::Accepted => report.accepted += 1,
                    InputOutcome::Rejected => report.rejected += 1,
                    InputOutcome::Unchanged | InputOutcome::Frozen => {}
                }
                last_ms = *timestamp_ms;
            }
            ReplayEvent::Pause {
                pause,
                timestamp_ms,
            } => {
                if *pause != engine.is_paused() {
                    engine.toggle_pause(*timestamp_ms).map_err(engine_err)?;
                }
                last_ms = *timestamp_ms;
            }
        }
    }

    debug!(
        events = events.len(),
        accepted = report.accepted,
        complete = engine.is_complete(),
        "replay finished"
    );
    report.summary = engine.finalize().cloned();
    report.payload = engine.finalize().map(SessionSummary::payload);
    report.accuracy = engine.accuracy(None);
    report.wpm = engine.speed(last_ms).wpm;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn input(value: &str, ts: f64) -> ReplayEvent {
        ReplayEvent::Input {
            value: value.to_string(),
            timestamp_ms: ts,
        }
    }

    #[test]
    fn test_parse_events() {
        let json = r#"[
            { "value": "h", "timestampMs": 0 },
            { "pause": true, "timestampMs": 10.5 },
            { "value": "hi", "timestampMs": 20 }
        ]"#;
        let events: Vec<ReplayEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events[0], input("h", 0.0));
        assert_eq!(
            events[1],
            ReplayEvent::Pause {
                pause: true,
                timestamp_ms: 10.5
            }
        );
    }

    #[test]
    fn test_replay_to_completion() {
        let events = vec![input("h", 0.0), input("hx", 500.0), input("hxy", 1_000.0)];
        let report = replay("hey", &events, EngineConfig::default()).unwrap();

        assert_eq!(report.accepted, 3);
        assert_eq!(report.payload.as_ref().unwrap().errors, 1);
        let summary = report.summary.unwrap();
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.accuracy, 67);
    }

    #[test]
    fn test_replay_counts_rejections() {
        let events = vec![input("h", 0.0), input("hiya", 100.0)];
        let report = replay("hi!", &events, EngineConfig::default()).unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected, 1);
        assert!(report.summary.is_none());
        assert!(report.payload.is_none());
        assert_eq!(report.accuracy, 100);
    }

    #[test]
    fn test_replay_pause_excluded() {
        let events = vec![
            input("ab", 0.0),
            ReplayEvent::Pause {
                pause: true,
                timestamp_ms: 1_000.0,
            },
            ReplayEvent::Pause {
                pause: false,
                timestamp_ms: 61_000.0,
            },
            input("abcd", 62_000.0),
        ];
        let report = replay("abcd", &events, EngineConfig::default()).unwrap();
        assert_eq!(report.summary.unwrap().duration_seconds, 2);
    }

    #[test]
    fn test_replay_reports_bad_event_index() {
        let events = vec![input("a", 0.0), input("ab", -5.0)];
        let err = replay("abc", &events, EngineConfig::default()).unwrap_err();
        assert_matches!(err, ReplayError::Engine { index: 1, .. });
    }

    #[test]
    fn test_replay_empty_text() {
        assert_matches!(
            replay("", &[], EngineConfig::default()),
            Err(ReplayError::Engine {
                source: EngineError::EmptyReferenceText,
                ..
            })
        );
    }
}
