//! Inference pipeline: prompt building, reply extraction, tallying and
//! batch orchestration.

pub mod batch;
pub mod extract;
pub mod prompts;
pub mod tally;

pub use batch::{BatchJob, BatchOrchestrator, BatchReport, ItemOutcome, OutcomeStatus};
pub use extract::{extract, fallback, resolve, resolve_label};
pub use tally::{Category, Tally};

use review_insight_common::Sentiment;
use serde::{Deserialize, Serialize};

use crate::llm::InferenceError;
use crate::models::AnimalProfile;

/// What a reply is expected to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    /// A single sentiment label; malformed replies degrade to the fallback label.
    FreeformLabel,
    /// An [`AnimalProfile`] object; malformed replies are failures.
    StructuredObject,
}

/// Why the fallback label was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The model answered, but neither as a label nor with a usable object.
    Unparsable,
    Timeout,
    Transport,
    EmptyResponse,
}

impl From<&InferenceError> for FallbackReason {
    fn from(err: &InferenceError) -> Self {
        match err {
            InferenceError::Timeout { .. } => FallbackReason::Timeout,
            InferenceError::Transport { .. } => FallbackReason::Transport,
            InferenceError::EmptyResponse => FallbackReason::EmptyResponse,
        }
    }
}

impl FallbackReason {
    /// Fallback reason for a failed call; `None` for failures that never
    /// reached the model or produced a reply.
    pub fn for_failure(reason: &FailureReason) -> Option<Self> {
        match reason {
            FailureReason::Timeout => Some(FallbackReason::Timeout),
            FailureReason::Transport { .. } => Some(FallbackReason::Transport),
            FailureReason::EmptyResponse => Some(FallbackReason::EmptyResponse),
            FailureReason::MalformedResponse { .. } | FailureReason::Validation { .. } => None,
        }
    }
}

/// Where a sentiment label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LabelSource {
    /// The whole reply was a known label.
    Exact,
    /// Read from a JSON object embedded in the reply.
    Embedded,
    Fallback { reason: FallbackReason },
}

/// A sentiment label with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Label {
    pub sentiment: Sentiment,
    /// Only present when the model supplied one within [0.0, 1.0].
    pub confidence: Option<f64>,
    pub source: LabelSource,
}

impl Label {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, LabelSource::Fallback { .. })
    }
}

/// Validated content of one reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ExtractedResult {
    Category(Label),
    Structured {
        profile: Box<AnimalProfile>,
    },
    Unrecognized {
        raw: String,
    },
}

impl ExtractedResult {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ExtractedResult::Category(label) if label.is_fallback())
    }
}

/// Why an item has no result in a batch report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FailureReason {
    Timeout,
    Transport { message: String },
    EmptyResponse,
    /// The reply did not match the required schema.
    MalformedResponse { raw: String },
    /// The item itself is unusable; no inference was attempted.
    Validation { message: String },
}

impl From<&InferenceError> for FailureReason {
    fn from(err: &InferenceError) -> Self {
        match err {
            InferenceError::Timeout { .. } => FailureReason::Timeout,
            InferenceError::Transport { message, .. } => FailureReason::Transport {
                message: message.clone(),
            },
            InferenceError::EmptyResponse => FailureReason::EmptyResponse,
        }
    }
}
