//! Leaf parsers shared by every validator.
//!
//! Parse failures are business data, not faults: every function here returns
//! `bool` or `Option` and none of them can panic on arbitrary input.

pub mod amount;
pub mod date;
pub mod reference;

pub use amount::{is_parseable, parse_amount};
pub use date::{is_date_present, parse_iso_date};
pub use reference::{classify_reference, is_valid_iban, is_valid_ogm, is_valid_rf, ReferenceKind};

/// Non-null and not blank.
pub fn has_text(raw: Option<&str>) -> bool {
    raw.is_some_and(|s| !s.trim().is_empty())
}
