//! Error types for the exam scan pipelines.
//!
//! The error surface is deliberately small. Most "failures" in this crate are
//! not errors at all: a missing document contour, an unreliable skew estimate,
//! an empty foreground, or a degenerate per-question crop all degrade to
//! documented fallbacks and are reflected only in report fields or by omitting
//! a single result. Strategy fallbacks (enhanced ink removal falling back to
//! flat fill) are absorbed internally and never surfaced.
//!
//! What remains fatal is a malformed input buffer and invalid configuration.

use thiserror::Error;

/// Errors produced by the geometry and segmentation pipelines.
#[derive(Debug, Error)]
pub enum ExamScanError {
    /// The input pixel buffer is unusable (for example zero-sized).
    ///
    /// Geometry correction is all-or-nothing per image: when the input cannot
    /// be processed, no partial result is returned.
    #[error("invalid input image: {context}")]
    InvalidImage {
        /// Description of what made the buffer unusable.
        context: String,
    },

    /// A configuration value is out of its accepted range.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the offending value.
        message: String,
    },

    /// An internal processing step failed in a way that cannot be absorbed.
    #[error("{stage} failed: {context}")]
    Processing {
        /// Name of the pipeline stage that failed.
        stage: &'static str,
        /// Description of the failure.
        context: String,
    },
}

impl ExamScanError {
    /// Creates an [`ExamScanError::InvalidImage`] with the given context.
    pub fn invalid_image(context: impl Into<String>) -> Self {
        Self::InvalidImage {
            context: context.into(),
        }
    }

    /// Creates an [`ExamScanError::Config`] with the given message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an [`ExamScanError::Processing`] for the named stage.
    pub fn processing(stage: &'static str, context: impl Into<String>) -> Self {
        Self::Processing {
            stage,
            context: context.into(),
        }
    }
}

/// Convenient result alias for exam scan operations.
pub type ScanResult<T> = Result<T, ExamScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExamScanError::invalid_image("zero-sized buffer");
        assert_eq!(err.to_string(), "invalid input image: zero-sized buffer");

        let err = ExamScanError::processing("rectify", "homography not invertible");
        assert_eq!(err.to_string(), "rectify failed: homography not invertible");
    }
}
