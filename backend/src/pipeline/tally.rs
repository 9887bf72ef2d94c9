//! Per-category counts for a batch.

use std::collections::BTreeMap;

use review_insight_common::Sentiment;
use serde::Serialize;

use super::{ExtractedResult, FailureReason};

/// Bucket an outcome is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Positive,
    Negative,
    Neutral,
    Structured,
    /// Failed or unrecognized items.
    Error,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Positive,
        Category::Negative,
        Category::Neutral,
        Category::Structured,
        Category::Error,
    ];

    /// Category of a single outcome.
    pub fn of(outcome: &Result<ExtractedResult, FailureReason>) -> Self {
        match outcome {
            Ok(ExtractedResult::Category(label)) => Category::from(label.sentiment),
            Ok(ExtractedResult::Structured { .. }) => Category::Structured,
            Ok(ExtractedResult::Unrecognized { .. }) | Err(_) => Category::Error,
        }
    }
}

impl From<Sentiment> for Category {
    fn from(sentiment: Sentiment) -> Self {
        match sentiment {
            Sentiment::Positive => Category::Positive,
            Sentiment::Negative => Category::Negative,
            Sentiment::Neutral => Category::Neutral,
        }
    }
}

/// Running counts. Exactly one counter moves per recorded outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tally {
    pub counts: BTreeMap<Category, usize>,
    /// Neutral outcomes that came from the fallback path (subset of `neutral`).
    pub fallbacks: usize,
}

impl Tally {
    pub fn new() -> Self {
        Self {
            counts: Category::ALL.into_iter().map(|c| (c, 0)).collect(),
            fallbacks: 0,
        }
    }

    /// Count one outcome and return the category it went to.
    pub fn record(&mut self, outcome: &Result<ExtractedResult, FailureReason>) -> Category {
        let category = Category::of(outcome);
        *self.counts.entry(category).or_insert(0) += 1;
        if matches!(outcome, Ok(result) if result.is_fallback()) {
            self.fallbacks += 1;
        }
        category
    }

    pub fn count(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl Default for Tally {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::fallback;
    use crate::pipeline::{FallbackReason, Label, LabelSource};

    fn labelled(sentiment: Sentiment) -> Result<ExtractedResult, FailureReason> {
        Ok(ExtractedResult::Category(Label {
            sentiment,
            confidence: None,
            source: LabelSource::Exact,
        }))
    }

    #[test]
    fn test_new_tally_has_every_bucket() {
        let tally = Tally::new();
        for category in Category::ALL {
            assert_eq!(tally.count(category), 0);
        }
        let json = serde_json::to_value(&tally).unwrap();
        assert_eq!(json["counts"]["error"], 0);
        assert_eq!(json["counts"]["positive"], 0);
    }

    #[test]
    fn test_record_increments_one_bucket() {
        let mut tally = Tally::new();
        assert_eq!(tally.record(&labelled(Sentiment::Positive)), Category::Positive);
        assert_eq!(tally.record(&labelled(Sentiment::Positive)), Category::Positive);
        assert_eq!(tally.record(&labelled(Sentiment::Negative)), Category::Negative);
        assert_eq!(tally.record(&Err(FailureReason::Timeout)), Category::Error);

        assert_eq!(tally.count(Category::Positive), 2);
        assert_eq!(tally.count(Category::Negative), 1);
        assert_eq!(tally.count(Category::Error), 1);
        assert_eq!(tally.total(), 4);
    }

    #[test]
    fn test_fallback_counts_as_neutral_and_is_flagged() {
        let mut tally = Tally::new();
        tally.record(&Ok(ExtractedResult::Category(fallback(FallbackReason::Transport))));
        tally.record(&labelled(Sentiment::Neutral));

        assert_eq!(tally.count(Category::Neutral), 2);
        assert_eq!(tally.fallbacks, 1);
        assert_eq!(tally.total(), 2);
    }

    #[test]
    fn test_unrecognized_is_error() {
        let outcome = Ok(ExtractedResult::Unrecognized {
            raw: "??".to_string(),
        });
        assert_eq!(Category::of(&outcome), Category::Error);
    }
}
