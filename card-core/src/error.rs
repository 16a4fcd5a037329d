//! Error types for card document operations.

use thiserror::Error;

/// Result type for card operations.
pub type CardResult<T> = Result<T, CardError>;

/// Errors that can occur in card operations.
///
/// Every variant is local and recoverable: the document a failed call was
/// made against is left exactly as it was.
#[derive(Debug, Error)]
pub enum CardError {
    /// The request was rejected before touching the document.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Document text could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A document could not be written as text.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No component with the given id exists.
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// The persistent store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Rejected mutation requests.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A list index fell outside the component list.
    #[error("index {index} out of range for {len} components")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Length of the component list.
        len: usize,
    },

    /// A width or height was zero or negative.
    #[error("{field} must be positive, got {value}")]
    NonPositiveDimension {
        /// Field name.
        field: &'static str,
        /// Requested value.
        value: f64,
    },

    /// A field that must not be negative was.
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// Field name.
        field: &'static str,
        /// Requested value.
        value: f64,
    },

    /// A geometry field was NaN or infinite.
    #[error("{field} must be finite")]
    NonFinite {
        /// Field name.
        field: &'static str,
    },

    /// A component with this id is already present.
    #[error("duplicate component id: {0}")]
    DuplicateId(String),

    /// Grid steps must be positive and finite.
    #[error("invalid grid step: {0}")]
    InvalidGridStep(f64),
}

/// Failures while reading document text.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The text is not valid structured text for a document.
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The top-level value is not an object.
    #[error("document must be an object")]
    NotAnObject,

    /// Two components share an explicit id.
    #[error("duplicate component id in document: {0}")]
    DuplicateId(String),

    /// The document parsed but violates a document invariant.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Errors from the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The store was created without a data directory.
    #[error("No data directory configured")]
    NoDataDirectory,
}
