//! Paginated read path over stored analyses.

use std::sync::Arc;

use review_insight_common::{HistoryEntry, HistoryResponse};
use serde::Deserialize;

use crate::config::HistoryConfig;
use crate::models::AnalysisRecord;
use crate::store::{AnalysisStore, StoreError};

/// Optional pagination parameters; negative values fail to deserialize.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

pub struct HistoryService {
    store: Arc<AnalysisStore>,
    config: HistoryConfig,
}

impl HistoryService {
    pub fn new(store: Arc<AnalysisStore>, config: HistoryConfig) -> Self {
        Self { store, config }
    }

    /// One page of a user's analyses, newest first. Text is cut to an excerpt
    /// here; stored records keep the full text.
    pub fn query(&self, user_id: &str, query: &HistoryQuery) -> Result<HistoryResponse, StoreError> {
        let limit = query.limit.unwrap_or(self.config.default_limit);
        let offset = query.offset.unwrap_or(0);

        let (total, rows) = self.store.find_page(user_id, limit, offset)?;

        tracing::info!(
            user_id = %user_id,
            count = rows.len(),
            total = total,
            "History retrieved"
        );

        Ok(HistoryResponse {
            user_id: user_id.to_string(),
            total,
            analyses: rows
                .into_iter()
                .map(|record| to_entry(record, self.config.excerpt_chars))
                .collect(),
        })
    }
}

fn to_entry(record: AnalysisRecord, excerpt_chars: usize) -> HistoryEntry {
    HistoryEntry {
        analysis_id: record.id,
        text: excerpt(&record.text, excerpt_chars),
        sentiment: record.sentiment,
        confidence: record.confidence,
        model: record.model,
        timestamp: record.created_at,
        fallback: record.fallback,
    }
}

/// First `max_chars` characters of `text`, with "..." when anything was cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
