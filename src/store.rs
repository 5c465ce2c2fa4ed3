use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::info;

use crate::error::StoreError;
use crate::stats::{CharStats, CharacterStat};
use crate::summary::SessionSummary;
use crate::text::Difficulty;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    wpm INTEGER NOT NULL,
    accuracy INTEGER NOT NULL,
    duration_seconds INTEGER NOT NULL,
    error_count INTEGER NOT NULL,
    total_characters INTEGER NOT NULL,
    characters_per_minute INTEGER NOT NULL,
    completed_at TEXT NOT NULL,
    text_preview TEXT NOT NULL,
    difficulty TEXT NOT NULL,
    consistency INTEGER NOT NULL,
    corrections INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS character_stats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL REFERENCES sessions(id),
    character TEXT NOT NULL,
    total_attempts INTEGER NOT NULL,
    correct_attempts INTEGER NOT NULL,
    cumulative_time_ms REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
CREATE INDEX IF NOT EXISTS idx_character_stats_char ON character_stats(character);
"#;

/// A summary read back from storage
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub id: i64,
    pub summary: SessionSummary,
}

/// Sink for finished sessions.
///
/// Failures here never reach back into the engine: by the time a summary is
/// saved the session is already complete.
pub trait SessionStore {
    fn save(&mut self, summary: &SessionSummary, char_stats: &CharStats) -> Result<i64, StoreError>;
    fn recent(&self, limit: usize) -> Result<Vec<StoredSession>, StoreError>;
}

#[derive(Debug)]
pub struct SqliteSessionStore {
    conn: Connection,
}

impl SqliteSessionStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn session_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Character statistics summed over every stored session
    pub fn char_summary(&self) -> Result<Vec<(char, CharacterStat)>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                character,
                SUM(total_attempts),
                SUM(correct_attempts),
                SUM(cumulative_time_ms)
            FROM character_stats
            GROUP BY character
            ORDER BY character
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?;

        let mut summary = Vec::new();
        for row in rows {
            let (character, total, correct, time_ms) = row?;
            let character = character.chars().next().ok_or(StoreError::Corrupt {
                column: "character",
                message: "empty character".to_string(),
            })?;
            summary.push((
                character,
                CharacterStat {
                    total_attempts: total as u32,
                    correct_attempts: correct as u32,
                    cumulative_time_ms: time_ms,
                },
            ));
        }

        Ok(summary)
    }

    /// Write every stored session to `path` as CSV, oldest first
    pub fn export_csv(&self, path: &Path) -> Result<usize, StoreError> {
        let mut sessions = self.recent(usize::MAX)?;
        sessions.reverse();

        let mut writer = csv::Writer::from_path(path)?;
        for session in &sessions {
            writer.serialize(&session.summary)?;
        }
        writer.flush()?;

        Ok(sessions.len())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch("DELETE FROM character_stats; DELETE FROM sessions;")?;
        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    fn save(&mut self, summary: &SessionSummary, char_stats: &CharStats) -> Result<i64, StoreError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO sessions
            (wpm, accuracy, duration_seconds, error_count, total_characters,
             characters_per_minute, completed_at, text_preview, difficulty,
             consistency, corrections)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                summary.wpm,
                summary.accuracy,
                summary.duration_seconds as i64,
                summary.error_count as i64,
                summary.total_characters as i64,
                summary.characters_per_minute,
                summary.completed_at.to_rfc3339(),
                summary.text_preview,
                summary.difficulty.to_string(),
                summary.consistency,
                summary.corrections as i64,
            ],
        )?;
        let session_id = tx.last_insert_rowid();

        for (character, stat) in char_stats.sorted() {
            tx.execute(
                r#"
                INSERT INTO character_stats
                (session_id, character, total_attempts, correct_attempts, cumulative_time_ms)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    session_id,
                    character.to_string(),
                    stat.total_attempts,
                    stat.correct_attempts,
                    stat.cumulative_time_ms,
                ],
            )?;
        }

        tx.commit()?;
        info!(session_id, wpm = summary.wpm, "session stored");
        Ok(session_id)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredSession>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, wpm, accuracy, duration_seconds, error_count, total_characters,
                   characters_per_minute, completed_at, text_preview, difficulty,
                   consistency, corrections
            FROM sessions
            ORDER BY completed_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map([limit], |row| {
            Ok(RawSession {
                id: row.get(0)?,
                wpm: row.get(1)?,
                accuracy: row.get(2)?,
                duration_seconds: row.get(3)?,
                error_count: row.get(4)?,
                total_characters: row.get(5)?,
                characters_per_minute: row.get(6)?,
                completed_at: row.get(7)?,
                text_preview: row.get(8)?,
                difficulty: row.get(9)?,
                consistency: row.get(10)?,
                corrections: row.get(11)?,
            })
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.into_stored()?);
        }
        Ok(sessions)
    }
}

struct RawSession {
    id: i64,
    wpm: u32,
    accuracy: u8,
    duration_seconds: i64,
    error_count: i64,
    total_characters: i64,
    characters_per_minute: u32,
    completed_at: String,
    text_preview: String,
    difficulty: String,
    consistency: u8,
    corrections: i64,
}

impl RawSession {
    fn into_stored(self) -> Result<StoredSession, StoreError> {
        let completed_at = DateTime::parse_from_rfc3339(&self.completed_at)
            .map_err(|e| StoreError::Corrupt {
                column: "completed_at",
                message: e.to_string(),
            })?
            .with_timezone(&Utc);
        let difficulty =
            Difficulty::from_label(&self.difficulty).ok_or_else(|| StoreError::Corrupt {
                column: "difficulty",
                message: format!("unknown difficulty {:?}", self.difficulty),
            })?;

        Ok(StoredSession {
            id: self.id,
            summary: SessionSummary {
                wpm: self.wpm,
                accuracy: self.accuracy,
                duration_seconds: self.duration_seconds.max(0) as u64,
                error_count: self.error_count.max(0) as usize,
                total_characters: self.total_characters.max(0) as usize,
                characters_per_minute: self.characters_per_minute,
                completed_at,
                text_preview: self.text_preview,
                difficulty,
                consistency: self.consistency,
                corrections: self.corrections.max(0) as usize,
            },
        })
    }
}
