pub mod direction;
pub mod extraction;
pub mod gate;
pub mod mock;
pub mod parsing;
pub mod ports;
pub mod processor; // Classify → extract → validate → retry → resolve → gate
pub mod retry;
pub mod validation;

pub use gate::{CancellationFlag, Deadline, ModelGate, Throttled};
pub use processor::{DocumentPipeline, PipelineError, PipelineOutcome, RejectionReason};
