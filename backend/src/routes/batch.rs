//! Batch analysis endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use super::extractors::ValidJson;
use serde::Deserialize;

use crate::error::{require, Result};
use crate::models::{NewAnalysis, WorkItem};
use crate::pipeline::{fallback, BatchJob, BatchReport, ExtractedResult, FallbackReason, OutcomeStatus};
use crate::sources::ReviewRow;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/batch/sentiment", post(batch_sentiment))
        .route("/batch/images", post(batch_images))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSentimentRequest {
    pub items: Vec<ReviewRow>,
    #[serde(default)]
    pub cap: Option<usize>,
    #[serde(default)]
    pub model: Option<String>,
    /// When set, every labelled outcome is stored for this user.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageUpload {
    pub filename: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchImagesRequest {
    pub images: Vec<ImageUpload>,
    #[serde(default)]
    pub cap: Option<usize>,
    #[serde(default)]
    pub model: Option<String>,
}

/// POST /api/batch/sentiment - one-word sentiment for each review.
async fn batch_sentiment(
    State(state): State<Arc<AppState>>,
    ValidJson(request): ValidJson<BatchSentimentRequest>,
) -> Result<Json<BatchReport>> {
    if let Some(ref user_id) = request.user_id {
        require(user_id, "userId")?;
    }

    let cap = request.cap.unwrap_or(state.config.batch.default_cap);
    let job = BatchJob::reviews(&state.config.ollama).with_model(request.model);
    let items: Vec<WorkItem> = request
        .items
        .into_iter()
        .map(|row| match row.subject_id {
            Some(subject) => WorkItem::text(row.id, row.text).with_subject(subject),
            None => WorkItem::text(row.id, row.text),
        })
        .collect();

    let report = state
        .orchestrator
        .run_until(items.clone(), cap, &job, state.shutdown_signal())
        .await;

    if let Some(user_id) = request.user_id {
        store_labels(&state, &user_id, &items, &report)?;
    }

    Ok(Json(report))
}

/// Outcomes line up with the first `outcomes.len()` items. Failed calls are
/// stored with the fallback label; items that never reached the model are not
/// stored.
fn store_labels(
    state: &AppState,
    user_id: &str,
    items: &[WorkItem],
    report: &BatchReport,
) -> Result<()> {
    for (item, outcome) in items.iter().zip(&report.outcomes) {
        let Some(text) = item.text_payload() else {
            continue;
        };
        let label = match &outcome.status {
            OutcomeStatus::Success {
                result: ExtractedResult::Category(label),
            } => *label,
            OutcomeStatus::Failure { reason } => match FallbackReason::for_failure(reason) {
                Some(reason) => fallback(reason),
                None => continue,
            },
            OutcomeStatus::Success { .. } => continue,
        };

        state.store.create(NewAnalysis {
            user_id: user_id.to_string(),
            text: text.to_string(),
            sentiment: label.sentiment,
            confidence: label.confidence,
            model: report.model.clone(),
            fallback: label.is_fallback(),
        })?;
    }
    Ok(())
}

/// POST /api/batch/images - animal profile for each uploaded image.
async fn batch_images(
    State(state): State<Arc<AppState>>,
    ValidJson(request): ValidJson<BatchImagesRequest>,
) -> Result<Json<BatchReport>> {
    let cap = request.cap.unwrap_or(state.config.batch.default_cap);
    let job = BatchJob::images(&state.config.ollama).with_model(request.model);
    let items: Vec<WorkItem> = request
        .images
        .into_iter()
        .map(|image| WorkItem::image(image.filename, image.data))
        .collect();

    let report = state
        .orchestrator
        .run_until(items, cap, &job, state.shutdown_signal())
        .await;

    Ok(Json(report))
}
