//! Semantic re-extraction: turn validation failures into bounded, hinted
//! retries of the extraction step.

pub mod orchestrator;
pub mod types;

pub use orchestrator::{RetryOrchestrator, RetryRun};
pub use types::{
    next_state, AttemptEvaluation, CorrectionHints, FieldCorrection, RetryConfig, RetryResult,
    RetryState,
};
