//! Question records assembled from classified text lines.

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Structural type of an exam question, derived from section headers or from
/// type keywords in the question text.
///
/// Serialized as its Chinese label, matching what callers display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    /// 选择题 — multiple choice.
    #[serde(rename = "选择题")]
    MultipleChoice,
    /// 填空题 — fill in the blank.
    #[serde(rename = "填空题")]
    FillInBlank,
    /// 判断题 — true/false.
    #[serde(rename = "判断题")]
    TrueFalse,
    /// 解答题 — worked solution.
    #[serde(rename = "解答题")]
    Solution,
    /// 简答题 — short answer.
    #[serde(rename = "简答题")]
    ShortAnswer,
    /// 论述题 — essay discussion.
    #[serde(rename = "论述题")]
    Essay,
    /// 词汇题 — vocabulary.
    #[serde(rename = "词汇题")]
    Vocabulary,
    /// 阅读理解 — reading comprehension.
    #[serde(rename = "阅读理解")]
    ReadingComprehension,
    /// 写作题 — composition.
    #[serde(rename = "写作题")]
    Writing,
}

impl QuestionType {
    /// The Chinese display label for this type.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "选择题",
            QuestionType::FillInBlank => "填空题",
            QuestionType::TrueFalse => "判断题",
            QuestionType::Solution => "解答题",
            QuestionType::ShortAnswer => "简答题",
            QuestionType::Essay => "论述题",
            QuestionType::Vocabulary => "词汇题",
            QuestionType::ReadingComprehension => "阅读理解",
            QuestionType::Writing => "写作题",
        }
    }
}

/// A single labeled answer choice within a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Uppercase option letter, unique within its question.
    pub label: char,
    /// Option body text.
    pub content: String,
}

/// A question assembled from classified lines, before cropping and content
/// parsing.
///
/// Created when a valid unseen question-start line is encountered, mutated
/// while open (lines appended, type filled opportunistically), and immutable
/// once closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question number as printed on the page; unique within a page.
    pub index: u32,
    /// Top of the question's vertical range in source-image coordinates.
    pub y0: i32,
    /// Exclusive bottom of the vertical range.
    pub y1: i32,
    /// The question's text lines in reading order, starting with the
    /// numbered line.
    pub raw_lines: Vec<String>,
    /// Structural type, when one was detected.
    pub question_type: Option<QuestionType>,
}

/// A fully segmented question: cropped sub-image plus parsed content.
#[derive(Debug, Clone)]
pub struct SegmentedQuestion {
    /// Question number as printed on the page.
    pub index: u32,
    /// Full-width crop of the question's vertical range.
    pub image: RgbImage,
    /// All question text joined with newlines, as recognized.
    pub ocr_text: String,
    /// Question body text preceding the answer options.
    pub stem: String,
    /// Labeled answer options, sorted by label.
    pub options: Vec<QuestionOption>,
    /// Structural type, when one was detected.
    pub question_type: Option<QuestionType>,
    /// Top of the cropped range in source-image coordinates.
    pub y0: i32,
    /// Exclusive bottom of the cropped range.
    pub y1: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_type_serializes_as_label() {
        let json = serde_json::to_string(&QuestionType::MultipleChoice).unwrap();
        assert_eq!(json, "\"选择题\"");
        let back: QuestionType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, QuestionType::MultipleChoice);
    }
}
