//! Validation of extracted data: essential fields, audit checks and the
//! minimal threshold gate. Everything here is pure; failures are values.

pub mod audit;
pub mod essential;
pub mod threshold;

pub use audit::{AuditCheck, AuditSuite, RateTable, RateTables};
pub use essential::{check_essential_fields, EssentialFieldsCheck};
pub use threshold::meets_minimal_threshold;
