use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text::Difficulty;

/// Finalized metrics of a completed session, computed once and cached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub wpm: u32,
    pub accuracy: u8,
    pub duration_seconds: u64,
    pub error_count: usize,
    pub total_characters: usize,
    pub characters_per_minute: u32,
    pub completed_at: DateTime<Utc>,
    pub text_preview: String,
    pub difficulty: Difficulty,
    pub consistency: u8,
    /// Wrong characters that were backspaced over during the session
    pub corrections: usize,
}

/// Wire shape the stats backend accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    pub wpm: u32,
    pub accuracy: u8,
    /// Whole seconds, at least 1
    pub duration: u64,
    pub errors: usize,
    pub total_characters: usize,
    pub completed_at: DateTime<Utc>,
}

impl From<&SessionSummary> for SavePayload {
    fn from(s: &SessionSummary) -> Self {
        Self {
            wpm: s.wpm,
            accuracy: s.accuracy,
            duration: s.duration_seconds.max(1),
            errors: s.error_count,
            total_characters: s.total_characters,
            completed_at: s.completed_at,
        }
    }
}

impl SessionSummary {
    pub fn payload(&self) -> SavePayload {
        SavePayload::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary() -> SessionSummary {
        SessionSummary {
            wpm: 42,
            accuracy: 97,
            duration_seconds: 0,
            error_count: 2,
            total_characters: 120,
            characters_per_minute: 210,
            completed_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            text_preview: "the quick".to_string(),
            difficulty: Difficulty::Easy,
            consistency: 81,
            corrections: 3,
        }
    }

    #[test]
    fn payload_uses_backend_field_names() {
        let json = serde_json::to_value(summary().payload()).unwrap();
        let obj = json.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "accuracy",
                "completedAt",
                "duration",
                "errors",
                "totalCharacters",
                "wpm"
            ]
        );
        assert_eq!(obj["completedAt"], "2024-03-01T12:30:00Z");
        assert_eq!(obj["errors"], 2);
    }

    #[test]
    fn payload_duration_never_below_one() {
        assert_eq!(summary().payload().duration, 1);
    }

    #[test]
    fn summary_serializes_difficulty_lowercase() {
        let json = serde_json::to_value(summary()).unwrap();
        assert_eq!(json["difficulty"], "easy");
        assert_eq!(json["textPreview"], "the quick");
    }
}
