pub mod enums;
pub mod tenant;

pub use enums::*;
pub use tenant::TenantIdentity;

use thiserror::Error;

/// A string that does not name any variant of a `str_enum!` enum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}
