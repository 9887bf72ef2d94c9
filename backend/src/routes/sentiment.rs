//! Single-text sentiment analysis and per-user history.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use review_insight_common::{HistoryResponse, SentimentRequest, SentimentResponse};

use crate::error::{require, Result};
use crate::history::HistoryQuery;
use crate::llm::InferenceRequest;
use crate::models::NewAnalysis;
use crate::pipeline::{prompts, resolve_label, LabelSource};
use crate::AppState;

use super::extractors::{ValidJson, ValidQuery};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat/sentiment-analysis", post(analyze_sentiment))
        .route("/chat/sentiment-analysis/:user_id", get(sentiment_history))
}

/// POST /api/chat/sentiment-analysis - analyse and store one text.
///
/// Always answers 201 once input is valid: inference problems yield the
/// fallback label, flagged in the response.
async fn analyze_sentiment(
    State(state): State<Arc<AppState>>,
    ValidJson(request): ValidJson<SentimentRequest>,
) -> Result<(StatusCode, Json<SentimentResponse>)> {
    require(&request.text, "text")?;
    require(&request.user_id, "userId")?;

    let model = request
        .model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.config.ollama.text_model.clone());
    let text = request.text.trim();

    tracing::info!(
        user_id = %request.user_id,
        model = %model,
        text_len = text.len(),
        "Sentiment analysis requested"
    );

    let inference_request = InferenceRequest::text(
        &model,
        prompts::sentiment_json(text),
        state.config.ollama.text_deadline(),
    );
    let reply = state.inference.generate(&inference_request).await;
    if let Err(ref e) = reply {
        tracing::warn!(user_id = %request.user_id, error = %e, "Inference failed");
    }

    let label = resolve_label(&reply);

    let record = state.store.create(NewAnalysis {
        user_id: request.user_id.clone(),
        text: text.to_string(),
        sentiment: label.sentiment,
        confidence: label.confidence,
        model,
        fallback: label.is_fallback(),
    })?;

    match label.source {
        LabelSource::Fallback { reason } => tracing::warn!(
            analysis_id = %record.id,
            ?reason,
            "Fallback label used for sentiment analysis"
        ),
        _ => tracing::info!(
            analysis_id = %record.id,
            sentiment = %record.sentiment,
            confidence = ?record.confidence,
            "Sentiment analysis stored"
        ),
    }

    Ok((StatusCode::CREATED, Json(record.into_response())))
}

/// GET /api/chat/sentiment-analysis/:user_id - newest-first history page.
async fn sentiment_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    ValidQuery(query): ValidQuery<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    tracing::debug!(
        user_id = %user_id,
        limit = ?query.limit,
        offset = ?query.offset,
        "Sentiment history requested"
    );

    Ok(Json(state.history.query(&user_id, &query)?))
}
