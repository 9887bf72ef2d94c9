//! Turns raw reply text into an [`ExtractedResult`].
//!
//! Label replies go through two stages: an exact label match, then a scan for
//! the first embedded `{...}` object. The scan is a best-effort heuristic for
//! chatty models, not a parser guarantee; anything it cannot read becomes the
//! fallback label. Structured replies get no such repair.

use review_insight_common::Sentiment;
use serde_json::Value;

use super::{ExtractedResult, FailureReason, FallbackReason, Label, LabelSource, ResultShape};
use crate::llm::InferenceReply;
use crate::models::AnimalProfile;

/// Extract a result from raw reply text. Pure: same input, same output.
pub fn extract(raw: &str, shape: ResultShape) -> ExtractedResult {
    match shape {
        ResultShape::FreeformLabel => ExtractedResult::Category(extract_label(raw)),
        ResultShape::StructuredObject => extract_structured(raw),
    }
}

/// Resolve a reply, or the failure to get one, for the given shape.
///
/// Call failures are reported as failures in both shapes. A reply that
/// arrived but cannot be read degrades to the fallback label in label mode
/// and is a `MalformedResponse` in structured mode.
pub fn resolve(reply: &InferenceReply, shape: ResultShape) -> Result<ExtractedResult, FailureReason> {
    match (reply, shape) {
        (Err(err), _) => Err(FailureReason::from(err)),
        (Ok(raw), ResultShape::FreeformLabel) => Ok(ExtractedResult::Category(extract_label(raw))),
        (Ok(raw), ResultShape::StructuredObject) => match extract_structured(raw) {
            ExtractedResult::Unrecognized { raw } => Err(FailureReason::MalformedResponse { raw }),
            result => Ok(result),
        },
    }
}

/// Label for a reply; never fails. Call failures become the fallback label.
pub fn resolve_label(reply: &InferenceReply) -> Label {
    match reply {
        Ok(raw) => extract_label(raw),
        Err(err) => fallback(FallbackReason::from(err)),
    }
}

/// The default label.
pub fn fallback(reason: FallbackReason) -> Label {
    Label {
        sentiment: Sentiment::FALLBACK,
        confidence: None,
        source: LabelSource::Fallback { reason },
    }
}

fn extract_label(raw: &str) -> Label {
    if let Some(sentiment) = Sentiment::from_label(raw) {
        return Label {
            sentiment,
            confidence: None,
            source: LabelSource::Exact,
        };
    }

    let embedded = find_embedded_object(raw)
        .and_then(|object| serde_json::from_str::<Value>(object).ok());

    if let Some(Value::Object(fields)) = embedded {
        let sentiment = fields
            .get("sentiment")
            .and_then(Value::as_str)
            .and_then(Sentiment::from_label);

        if let Some(sentiment) = sentiment {
            // Out-of-range confidence is dropped rather than clamped.
            let confidence = fields
                .get("confidence")
                .and_then(Value::as_f64)
                .filter(|c| (0.0..=1.0).contains(c));

            return Label {
                sentiment,
                confidence,
                source: LabelSource::Embedded,
            };
        }
    }

    fallback(FallbackReason::Unparsable)
}

fn extract_structured(raw: &str) -> ExtractedResult {
    match serde_json::from_str::<AnimalProfile>(raw) {
        Ok(profile) => ExtractedResult::Structured {
            profile: Box::new(profile),
        },
        Err(e) => {
            tracing::debug!("Reply does not match the profile schema: {}", e);
            ExtractedResult::Unrecognized {
                raw: raw.to_string(),
            }
        }
    }
}

/// Slice of the first balanced `{...}` in `text`, skipping braces inside
/// string literals.
pub fn find_embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
