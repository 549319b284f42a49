//! Error types for detpipe.

use thiserror::Error;

/// Result alias for detpipe operations.
pub type DetResult<T> = std::result::Result<T, DetError>;

/// Errors that can occur when configuring or running the pipeline.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DetError {
    /// A configuration value is outside its accepted range.
    #[error("invalid config: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
    /// Fewer than four attributes per anchor, so no box can be read.
    #[error("shape error: {attributes} attributes per anchor, need at least 4")]
    TooFewAttributes { attributes: usize },
    /// The attribute count does not agree with the class count.
    #[error(
        "shape error: {attributes} attributes per anchor, expected {expected} for {num_classes} classes"
    )]
    AttributeMismatch {
        attributes: usize,
        expected: usize,
        num_classes: usize,
    },
    /// The buffer length does not equal `anchors * attributes`.
    #[error("shape error: buffer has {got} values, {anchors} anchors x {attributes} attributes needs {needed}")]
    BufferLength {
        anchors: usize,
        attributes: usize,
        needed: usize,
        got: usize,
    },
    /// The tensor dims cannot be read as `[batch?, a, b]` with batch 1.
    #[error("shape error: unsupported tensor dims {dims:?}")]
    UnsupportedDims { dims: Vec<usize> },
    /// `valid_count` exceeds the number of decoded entries.
    #[error("shape error: valid_count {valid_count} exceeds {len} decoded entries")]
    ValidCount { valid_count: usize, len: usize },
    /// Parallel arrays of a decoded output disagree in length.
    #[error("shape error: {context} has {got} entries, expected {expected}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
}

impl DetError {
    /// Returns true for per-frame shape errors, false for configuration errors.
    pub fn is_shape_error(&self) -> bool {
        !matches!(self, DetError::InvalidConfig { .. })
    }
}
