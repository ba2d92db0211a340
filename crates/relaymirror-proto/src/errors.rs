//! Error types for reading the typed object model.
//!
//! The wire decoder is responsible for producing well-formed objects. These
//! errors describe what goes wrong when a well-formed object does not have the
//! shape a consumer expects: a field is absent, has another type, or a row has
//! no ancestry chain to route by.

use thiserror::Error;

use crate::ObjectType;

/// Result alias for object model accessors.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while reading fields out of typed objects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Row does not carry the requested field.
    #[error("missing field `{field}`")]
    MissingField {
        /// Field name that was requested
        field: String,
    },

    /// Field exists but holds an incompatible object type.
    #[error("field `{field}` has type {actual}, expected {expected}")]
    FieldType {
        /// Field name that was requested
        field: String,
        /// Human readable description of the accepted types
        expected: &'static str,
        /// Type actually found in the row
        actual: ObjectType,
    },

    /// Row has an empty ancestry chain and cannot be routed.
    #[error("hdata row has no ancestry pointers")]
    MissingAncestry,

    /// Unknown three-letter object type tag.
    #[error("unknown object type tag `{0}`")]
    UnknownType(String),
}
