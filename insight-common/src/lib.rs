//! Review Insight Common Types
//!
//! Shared types used by the backend and its clients.

pub mod history;
pub mod sentiment;

pub use history::{HistoryEntry, HistoryResponse};
pub use sentiment::{Sentiment, SentimentRequest, SentimentResponse};
