pub mod analysis;
pub mod animal;
pub mod work_item;

pub use analysis::{AnalysisRecord, NewAnalysis, ValidationError};
pub use animal::AnimalProfile;
pub use work_item::{Payload, WorkItem};
