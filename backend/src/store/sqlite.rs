use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use review_insight_common::Sentiment;
use rusqlite::{params, Connection, Row};

use crate::models::{AnalysisRecord, NewAnalysis, ValidationError};

/// SQLite-backed, append-only store of sentiment analyses.
pub struct AnalysisStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Invalid record: {0}")]
    Validation(#[from] ValidationError),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

impl AnalysisStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::IoError(e.to_string()))?;
            }
            Connection::open(path)?
        };

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sentiment_analyses (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                text TEXT NOT NULL,
                sentiment TEXT NOT NULL CHECK (sentiment IN ('positive', 'negative', 'neutral')),
                confidence REAL CHECK (confidence IS NULL OR (confidence >= 0.0 AND confidence <= 1.0)),
                model TEXT NOT NULL,
                is_fallback INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sentiment_user_id ON sentiment_analyses(user_id)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sentiment_created_at ON sentiment_analyses(created_at)",
            [],
        )?;

        tracing::info!("Analysis store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Validate and append a record, assigning its id and timestamp.
    pub fn create(&self, analysis: NewAnalysis) -> Result<AnalysisRecord, StoreError> {
        analysis.validate()?;

        let record = AnalysisRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: analysis.user_id.trim().to_string(),
            text: analysis.text.trim().to_string(),
            sentiment: analysis.sentiment,
            confidence: analysis.confidence,
            model: analysis.model,
            fallback: analysis.fallback,
            created_at: Utc::now(),
        };

        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        conn.execute(
            "INSERT INTO sentiment_analyses (id, user_id, text, sentiment, confidence, model, is_fallback, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id,
                record.user_id,
                record.text,
                record.sentiment.as_str(),
                record.confidence,
                record.model,
                record.fallback,
                record.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ],
        )?;

        tracing::debug!("Stored analysis: {}", record.id);
        Ok(record)
    }

    /// Records for `user_id`, newest first, plus the user's total count.
    pub fn find_page(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<(u64, Vec<AnalysisRecord>), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sentiment_analyses WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        // rowid breaks ties between records created in the same instant.
        let mut stmt = conn.prepare(
            "SELECT id, user_id, text, sentiment, confidence, model, is_fallback, created_at
             FROM sentiment_analyses
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2 OFFSET ?3",
        )?;

        let rows = stmt
            .query_map(params![user_id, limit, offset], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total as u64, rows))
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<AnalysisRecord> {
    let sentiment: String = row.get(3)?;
    let created_at: String = row.get(7)?;

    let sentiment = Sentiment::from_label(&sentiment).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown sentiment {:?}", sentiment).into(),
        )
    })?;

    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(AnalysisRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        text: row.get(2)?,
        sentiment,
        confidence: row.get(4)?,
        model: row.get(5)?,
        fallback: row.get(6)?,
        created_at,
    })
}
