//! Text line records from the recognition collaborator.

use serde::{Deserialize, Serialize};

use super::question::QuestionType;

/// One recognized text line with its bounding box in source-image
/// coordinates.
///
/// Produced by the external text-recognition engine; this crate only reads
/// it. Lines are expected pre-sorted by `y0` ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    /// Recognized text content.
    pub text: String,
    /// Recognition confidence in `[0, 1]`.
    pub confidence: f32,
    /// Left edge of the bounding box.
    pub x0: i32,
    /// Top edge of the bounding box.
    pub y0: i32,
    /// Right edge of the bounding box.
    pub x1: i32,
    /// Bottom edge of the bounding box.
    pub y1: i32,
}

impl LineRecord {
    /// Creates a line record.
    pub fn new(text: impl Into<String>, confidence: f32, x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            text: text.into(),
            confidence,
            x0,
            y0,
            x1,
            y1,
        }
    }
}

/// Classification of a single text line within a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Administrative boilerplate. Dropped entirely: it never joins a
    /// question and never closes one.
    Noise,
    /// A section title ("一、选择题"). Updates the shared section-type
    /// context without starting or ending a question.
    SectionHeader(QuestionType),
    /// The first line of a new question.
    QuestionStart {
        /// Extracted question number, validated to `[1, 100]` and unused on
        /// this page.
        number: u32,
        /// Type detected from the line itself, if any.
        question_type: Option<QuestionType>,
    },
    /// Any other line: body text of whichever question is currently open.
    Continuation,
}
