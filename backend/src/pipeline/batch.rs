//! Batch orchestration.
//!
//! Runs a capped slice of work items through inference and extraction and
//! always hands back a report: one item's failure never aborts the others.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;

use super::extract;
use super::prompts;
use super::{ExtractedResult, FailureReason, ResultShape, Tally};
use crate::config::OllamaConfig;
use crate::llm::{InferenceClient, InferenceRequest};
use crate::models::{Payload, WorkItem};

/// How every item in a batch is sent and read back.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub shape: ResultShape,
    pub model: String,
    pub deadline: Duration,
}

impl BatchJob {
    /// One-word review sentiment with the text model.
    pub fn reviews(config: &OllamaConfig) -> Self {
        Self {
            shape: ResultShape::FreeformLabel,
            model: config.text_model.clone(),
            deadline: config.text_deadline(),
        }
    }

    /// Animal profile extraction with the vision model.
    pub fn images(config: &OllamaConfig) -> Self {
        Self {
            shape: ResultShape::StructuredObject,
            model: config.vision_model.clone(),
            deadline: config.vision_deadline(),
        }
    }

    /// Override the model, keeping the default when `None`.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.model = model;
        }
        self
    }

    fn request_for(&self, item: &WorkItem) -> Result<InferenceRequest, FailureReason> {
        match (self.shape, &item.payload) {
            (ResultShape::FreeformLabel, Payload::Text(text)) if !text.trim().is_empty() => Ok(
                InferenceRequest::text(&self.model, prompts::review_sentiment(text), self.deadline),
            ),
            (ResultShape::FreeformLabel, Payload::Text(_)) => Err(FailureReason::Validation {
                message: "text is empty".to_string(),
            }),
            (ResultShape::StructuredObject, Payload::Image(image)) if !image.is_empty() => {
                let filename = item.filename.as_deref().unwrap_or(&item.id);
                Ok(InferenceRequest::text(
                    &self.model,
                    prompts::animal_profile(filename),
                    self.deadline,
                )
                .with_image(image.clone()))
            }
            (ResultShape::StructuredObject, Payload::Image(_)) => Err(FailureReason::Validation {
                message: "image is empty".to_string(),
            }),
            (ResultShape::FreeformLabel, Payload::Image(_)) => Err(FailureReason::Validation {
                message: "label analysis needs a text payload".to_string(),
            }),
            (ResultShape::StructuredObject, Payload::Text(_)) => Err(FailureReason::Validation {
                message: "image analysis needs an image payload".to_string(),
            }),
        }
    }
}

/// Result for one work item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOutcome {
    pub item_id: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum OutcomeStatus {
    Success { result: ExtractedResult },
    Failure { reason: FailureReason },
}

impl ItemOutcome {
    fn new(item_id: String, outcome: Result<ExtractedResult, FailureReason>) -> Self {
        let status = match outcome {
            Ok(result) => OutcomeStatus::Success { result },
            Err(reason) => OutcomeStatus::Failure { reason },
        };
        Self { item_id, status }
    }

    pub fn result(&self) -> Option<&ExtractedResult> {
        match &self.status {
            OutcomeStatus::Success { result } => Some(result),
            OutcomeStatus::Failure { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failure { .. })
    }
}

/// Ordered per-item outcomes plus the aggregate tally.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub mode: ResultShape,
    pub model: String,
    pub outcomes: Vec<ItemOutcome>,
    #[serde(flatten)]
    pub tally: Tally,
    /// Tallies per `WorkItem::subject_id`; items without a subject only count
    /// in the overall tally.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub by_subject: BTreeMap<String, Tally>,
    /// Set when the run stopped early; `outcomes` then holds completed items only.
    pub cancelled: bool,
}

impl BatchReport {
    fn new(job: &BatchJob) -> Self {
        Self {
            mode: job.shape,
            model: job.model.clone(),
            outcomes: Vec::new(),
            tally: Tally::new(),
            by_subject: BTreeMap::new(),
            cancelled: false,
        }
    }

    fn push(
        &mut self,
        item_id: String,
        subject_id: Option<String>,
        outcome: Result<ExtractedResult, FailureReason>,
    ) {
        self.tally.record(&outcome);
        if let Some(subject_id) = subject_id {
            self.by_subject.entry(subject_id).or_default().record(&outcome);
        }
        self.outcomes.push(ItemOutcome::new(item_id, outcome));
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}

/// Drives work items through an [`InferenceClient`].
pub struct BatchOrchestrator {
    client: Arc<dyn InferenceClient>,
    concurrency: usize,
}

impl BatchOrchestrator {
    /// `concurrency` bounds in-flight calls; 0 is treated as 1.
    pub fn new(client: Arc<dyn InferenceClient>, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Process at most `cap` items and report on every one of them.
    pub async fn run(&self, items: Vec<WorkItem>, cap: usize, job: &BatchJob) -> BatchReport {
        self.run_until(items, cap, job, std::future::pending()).await
    }

    /// Like [`run`](Self::run), but stops when `shutdown` resolves. In-flight
    /// calls are dropped and the report holds only completed items.
    pub async fn run_until<F>(
        &self,
        items: Vec<WorkItem>,
        cap: usize,
        job: &BatchJob,
        shutdown: F,
    ) -> BatchReport
    where
        F: Future<Output = ()>,
    {
        let selected: Vec<WorkItem> = items.into_iter().take(cap).collect();
        let selected_len = selected.len();
        let mut report = BatchReport::new(job);

        tracing::info!(
            items = selected_len,
            model = %job.model,
            mode = ?job.shape,
            concurrency = self.concurrency,
            "Starting batch"
        );

        // `buffered` yields in input order even when calls finish out of order.
        let outcomes = stream::iter(selected)
            .map(|item| self.process(item, job))
            .buffered(self.concurrency);
        tokio::pin!(outcomes);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    report.cancelled = true;
                    tracing::warn!(
                        completed = report.outcomes.len(),
                        items = selected_len,
                        "Batch cancelled, returning partial report"
                    );
                    break;
                }
                next = outcomes.next() => match next {
                    Some((item_id, subject_id, outcome)) => report.push(item_id, subject_id, outcome),
                    None => break,
                },
            }
        }

        tracing::info!(
            items = report.outcomes.len(),
            failures = report.failures(),
            fallbacks = report.tally.fallbacks,
            cancelled = report.cancelled,
            "Batch finished"
        );

        report
    }

    async fn process(
        &self,
        item: WorkItem,
        job: &BatchJob,
    ) -> (String, Option<String>, Result<ExtractedResult, FailureReason>) {
        let request = match job.request_for(&item) {
            Ok(request) => request,
            Err(reason) => {
                tracing::warn!(item_id = %item.id, ?reason, "Skipping invalid work item");
                return (item.id, item.subject_id, Err(reason));
            }
        };

        let reply = self.client.generate(&request).await;
        if let Err(ref e) = reply {
            tracing::warn!(item_id = %item.id, error = %e, "Inference failed");
        }

        let outcome = extract::resolve(&reply, job.shape);
        if let Err(FailureReason::MalformedResponse { ref raw }) = outcome {
            tracing::warn!(item_id = %item.id, raw = %raw, "Reply did not match schema");
        }

        (item.id, item.subject_id, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::InferenceError;
    use crate::pipeline::{Category, FallbackReason, Label, LabelSource};
    use crate::test_util::ScriptedClient;
    use review_insight_common::Sentiment;

    fn reviews(n: usize) -> Vec<WorkItem> {
        (1..=n)
            .map(|i| WorkItem::text(format!("r{}", i), format!("review number {}", i)))
            .collect()
    }

    fn job() -> BatchJob {
        BatchJob::reviews(&OllamaConfig::default())
    }

    fn transport_error() -> InferenceError {
        InferenceError::Transport {
            status: Some(500),
            message: "500 Internal Server Error: boom".to_string(),
        }
    }

    #[tokio::test]
    async fn test_cap_limits_processed_items() {
        let client = Arc::new(ScriptedClient::replying("positive"));
        let orchestrator = BatchOrchestrator::new(client.clone(), 1);

        let report = orchestrator.run(reviews(5), 3, &job()).await;

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(client.calls().len(), 3);
        let ids: Vec<_> = report.outcomes.iter().map(|o| o.item_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
    }

    #[tokio::test]
    async fn test_cap_larger_than_input() {
        let orchestrator = BatchOrchestrator::new(Arc::new(ScriptedClient::replying("negative")), 1);
        let report = orchestrator.run(reviews(2), 10, &job()).await;
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.tally.total(), 2);
    }

    #[tokio::test]
    async fn test_label_transport_failure_is_reported_in_order() {
        let client = ScriptedClient::replying("positive").on("review number 3", Err(transport_error()));
        let orchestrator = BatchOrchestrator::new(Arc::new(client), 1);

        let report = orchestrator.run(reviews(5), 5, &job()).await;

        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(report.failures(), 1);
        assert_eq!(report.outcomes[2].item_id, "r3");
        assert_eq!(
            report.outcomes[2].status,
            OutcomeStatus::Failure {
                reason: FailureReason::Transport {
                    message: "500 Internal Server Error: boom".to_string()
                }
            }
        );
        assert_eq!(report.tally.count(Category::Positive), 4);
        assert_eq!(report.tally.count(Category::Error), 1);
        assert_eq!(report.tally.count(Category::Neutral), 0);
        assert_eq!(report.tally.fallbacks, 0);
    }

    #[tokio::test]
    async fn test_label_unreadable_reply_uses_fallback() {
        let client = ScriptedClient::replying("positive").on("review number 2", Ok("no idea".to_string()));
        let orchestrator = BatchOrchestrator::new(Arc::new(client), 1);

        let report = orchestrator.run(reviews(3), 3, &job()).await;

        assert_eq!(report.failures(), 0);
        assert_eq!(
            report.outcomes[1].result(),
            Some(&ExtractedResult::Category(Label {
                sentiment: Sentiment::Neutral,
                confidence: None,
                source: LabelSource::Fallback {
                    reason: FallbackReason::Unparsable
                },
            }))
        );
        assert_eq!(report.tally.count(Category::Neutral), 1);
        assert_eq!(report.tally.fallbacks, 1);
    }

    #[tokio::test]
    async fn test_tally_per_subject() {
        let items = vec![
            WorkItem::text("r1", "review number 1").with_subject("730"),
            WorkItem::text("r2", "review number 2").with_subject("570"),
            WorkItem::text("r3", "review number 3").with_subject("730"),
            WorkItem::text("r4", "review number 4"),
        ];
        let client = ScriptedClient::replying("positive")
            .on("review number 2", Ok("negative".to_string()))
            .on("review number 3", Err(transport_error()));
        let orchestrator = BatchOrchestrator::new(Arc::new(client), 1);

        let report = orchestrator.run(items, 4, &job()).await;

        assert_eq!(report.by_subject.len(), 2);
        let first = &report.by_subject["730"];
        assert_eq!(first.count(Category::Positive), 1);
        assert_eq!(first.count(Category::Error), 1);
        assert_eq!(first.total(), 2);
        assert_eq!(report.by_subject["570"].count(Category::Negative), 1);
        assert_eq!(report.tally.total(), 4);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["bySubject"]["730"]["counts"]["error"], 1);
    }

    #[tokio::test]
    async fn test_structured_transport_failure_is_reported_in_order() {
        let items: Vec<WorkItem> = (1..=5)
            .map(|i| WorkItem::image(format!("img{}.jpg", i), "aW1n"))
            .collect();
        let template = crate::pipeline::prompts::ANIMAL_PROFILE_TEMPLATE;
        let client = ScriptedClient::replying(template).on("img3.jpg", Err(transport_error()));
        let orchestrator = BatchOrchestrator::new(Arc::new(client), 1);
        let job = BatchJob::images(&OllamaConfig::default());

        let report = orchestrator.run(items, 5, &job).await;

        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(report.failures(), 1);
        assert!(report.outcomes[2].is_failure());
        assert_eq!(report.outcomes[2].item_id, "img3.jpg");
        assert_eq!(report.tally.count(Category::Structured), 4);
        assert_eq!(report.tally.count(Category::Error), 1);
    }

    #[tokio::test]
    async fn test_structured_timeout_is_failure_not_profile() {
        let client = ScriptedClient::new(Err(InferenceError::Timeout {
            after: Duration::from_secs(120),
        }));
        let orchestrator = BatchOrchestrator::new(Arc::new(client), 1);
        let job = BatchJob::images(&OllamaConfig::default());

        let report = orchestrator
            .run(vec![WorkItem::image("cat.png", "aW1n")], 1, &job)
            .await;

        assert_eq!(
            report.outcomes[0].status,
            OutcomeStatus::Failure {
                reason: FailureReason::Timeout
            }
        );
    }

    #[tokio::test]
    async fn test_every_item_failing_still_reports() {
        let orchestrator =
            BatchOrchestrator::new(Arc::new(ScriptedClient::new(Err(transport_error()))), 1);
        let job = BatchJob::images(&OllamaConfig::default());
        let items = vec![
            WorkItem::image("a.jpg", "aW1n"),
            WorkItem::image("b.jpg", "aW1n"),
        ];

        let report = orchestrator.run(items, 2, &job).await;

        assert_eq!(report.failures(), 2);
        assert_eq!(report.tally.count(Category::Error), 2);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_mismatched_payload_fails_without_inference() {
        let client = Arc::new(ScriptedClient::replying("positive"));
        let orchestrator = BatchOrchestrator::new(client.clone(), 1);
        let items = vec![WorkItem::image("a.jpg", "aW1n"), WorkItem::text("t", "   ")];

        let report = orchestrator.run(items, 2, &job()).await;

        assert_eq!(report.failures(), 2);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_run_preserves_input_order() {
        let client = ScriptedClient::replying("positive")
            .on_delayed("review number 1", Duration::from_millis(80), Ok("negative".to_string()))
            .on_delayed("review number 2", Duration::from_millis(40), Ok("neutral".to_string()));
        let orchestrator = BatchOrchestrator::new(Arc::new(client), 4);

        let report = orchestrator.run(reviews(4), 4, &job()).await;

        let ids: Vec<_> = report.outcomes.iter().map(|o| o.item_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3", "r4"]);
        assert_eq!(report.tally.count(Category::Negative), 1);
        assert_eq!(report.tally.count(Category::Neutral), 1);
        assert_eq!(report.tally.count(Category::Positive), 2);
    }

    #[tokio::test]
    async fn test_shutdown_returns_partial_report() {
        let client = ScriptedClient::replying("positive").on_delayed(
            "review number 3",
            Duration::from_secs(10),
            Ok("positive".to_string()),
        );
        let orchestrator = BatchOrchestrator::new(Arc::new(client), 1);
        let shutdown = tokio::time::sleep(Duration::from_millis(100));

        let report = orchestrator.run_until(reviews(5), 5, &job(), shutdown).await;

        assert!(report.cancelled);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.tally.total(), 2);
    }

    #[tokio::test]
    async fn test_with_model_override() {
        let client = Arc::new(ScriptedClient::replying("positive"));
        let orchestrator = BatchOrchestrator::new(client.clone(), 1);
        let job = job().with_model(Some("mistral".to_string()));

        let report = orchestrator.run(reviews(1), 1, &job).await;

        assert_eq!(report.model, "mistral");
        assert_eq!(client.calls()[0].model, "mistral");
        assert!(client.calls()[0].prompt.contains("one word"));
    }

    #[test]
    fn test_report_serialization_shape() {
        let mut report = BatchReport::new(&job());
        report.push("r1".to_string(), None, Err(FailureReason::EmptyResponse));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "freeform_label");
        assert_eq!(json["outcomes"][0]["itemId"], "r1");
        assert_eq!(json["outcomes"][0]["status"], "failure");
        assert_eq!(json["outcomes"][0]["reason"]["kind"], "empty_response");
        assert_eq!(json["counts"]["error"], 1);
        assert_eq!(json["fallbacks"], 0);
        assert_eq!(json["cancelled"], false);
        assert!(json.get("bySubject").is_none());
    }
}
