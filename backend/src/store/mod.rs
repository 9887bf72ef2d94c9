mod sqlite;

pub use sqlite::{AnalysisStore, StoreError};
