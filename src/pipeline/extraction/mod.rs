//! Extraction payloads: the per-type shapes the extractor returns and the
//! confidence capability shared by all of them.

pub mod confidence;
pub mod types;

pub use confidence::HasConfidence;
pub use types::*;
