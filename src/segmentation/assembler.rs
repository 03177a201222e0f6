//! Question assembly.
//!
//! Folds a page's classified text lines into question records. The core is a
//! pure transition function over a small state machine (no open question /
//! one open question); the [`QuestionAssembler`] wrapper owns the evolving
//! page context around it.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{LineClass, LineRecord, Question, QuestionType};
use crate::segmentation::classifier::LineClassifier;

/// Vertical gap assumed between the end of one question and the start of the
/// next, in pixels.
pub(crate) const QUESTION_GAP: i32 = 5;

/// A question currently being accumulated. Its bottom edge is unknown until
/// the next question starts or the page ends.
#[derive(Debug, Clone, PartialEq)]
struct OpenQuestion {
    index: u32,
    y0: i32,
    raw_lines: Vec<String>,
    question_type: Option<QuestionType>,
}

impl OpenQuestion {
    fn close(self, y1: i32) -> Question {
        Question {
            index: self.index,
            y0: self.y0,
            y1,
            raw_lines: self.raw_lines,
            question_type: self.question_type,
        }
    }
}

/// Assembler state: at most one question is open at any time.
#[derive(Debug, Clone, PartialEq, Default)]
enum State {
    #[default]
    Idle,
    Open(OpenQuestion),
}

/// Applies one classified line to the current state.
///
/// Returns the new state and the question closed by this line, if any. Pure:
/// the section context is read-only here and updated by the caller.
fn transition(
    state: State,
    class: &LineClass,
    line: &LineRecord,
    section_type: Option<QuestionType>,
) -> (State, Option<Question>) {
    match class {
        LineClass::Noise | LineClass::SectionHeader(_) => (state, None),
        LineClass::QuestionStart {
            number,
            question_type,
        } => {
            let closed = match state {
                State::Idle => None,
                State::Open(open) => Some(open.close(line.y0 - QUESTION_GAP)),
            };
            let opened = OpenQuestion {
                index: *number,
                y0: line.y0,
                raw_lines: vec![line.text.clone()],
                question_type: question_type.or(section_type),
            };
            (State::Open(opened), closed)
        }
        LineClass::Continuation => match state {
            State::Idle => {
                debug!(text = %line.text, "continuation line before any question, dropped");
                (State::Idle, None)
            }
            State::Open(mut open) => {
                open.raw_lines.push(line.text.clone());
                (State::Open(open), None)
            }
        },
    }
}

/// Assembles a page's text lines into question records.
///
/// Feed lines in reading order with [`push`](Self::push), then call
/// [`finish`](Self::finish) to close the last question and obtain all
/// questions sorted by index.
#[derive(Debug, Default)]
pub struct QuestionAssembler {
    classifier: LineClassifier,
    state: State,
    section_type: Option<QuestionType>,
    used_numbers: HashSet<u32>,
    closed: Vec<Question>,
}

impl QuestionAssembler {
    /// Creates an assembler with empty page context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies one line and folds it into the page state.
    pub fn push(&mut self, line: &LineRecord) {
        let class = self.classifier.classify(&line.text, &self.used_numbers);

        match &class {
            LineClass::SectionHeader(question_type) => {
                debug!(section = question_type.label(), "section context updated");
                self.section_type = Some(*question_type);
            }
            LineClass::QuestionStart { number, .. } => {
                self.used_numbers.insert(*number);
            }
            LineClass::Continuation => {
                // A typeless open question picks its type up from later
                // keyword-bearing lines.
                if let State::Open(open) = &mut self.state {
                    if open.question_type.is_none() {
                        open.question_type = self.classifier.detect_type(&line.text);
                    }
                }
            }
            LineClass::Noise => {}
        }

        let state = std::mem::take(&mut self.state);
        let (state, emitted) = transition(state, &class, line, self.section_type);
        self.state = state;
        if let Some(question) = emitted {
            self.closed.push(question);
        }
    }

    /// Closes the last open question at `image_height` and returns all
    /// questions sorted ascending by index.
    pub fn finish(mut self, image_height: i32) -> Vec<Question> {
        if let State::Open(open) = self.state {
            self.closed.push(open.close(image_height));
        }
        self.closed.sort_by_key(|question| question.index);
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, y0: i32) -> LineRecord {
        LineRecord::new(text, 0.95, 0, y0, 600, y0 + 20)
    }

    fn assemble(lines: &[LineRecord], height: i32) -> Vec<Question> {
        let mut assembler = QuestionAssembler::new();
        for record in lines {
            assembler.push(record);
        }
        assembler.finish(height)
    }

    #[test]
    fn test_two_questions_split_at_second_start() {
        let questions = assemble(
            &[
                line("1. 求x的值", 100),
                line("x + 2 = 5", 130),
                line("2. 求y的值", 200),
            ],
            600,
        );

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].index, 1);
        assert_eq!(questions[0].y0, 100);
        assert_eq!(questions[0].y1, 195);
        assert_eq!(questions[0].raw_lines, vec!["1. 求x的值", "x + 2 = 5"]);
        assert_eq!(questions[1].index, 2);
        assert_eq!(questions[1].y0, 200);
        assert_eq!(questions[1].y1, 600);
    }

    #[test]
    fn test_duplicate_number_folds_into_open_question() {
        let questions = assemble(
            &[
                line("1. 第一题", 100),
                line("2. 第二题", 200),
                line("1. 看起来像题号的正文", 260),
            ],
            600,
        );

        assert_eq!(questions.len(), 2);
        assert_eq!(
            questions[1].raw_lines,
            vec!["2. 第二题", "1. 看起来像题号的正文"]
        );
        assert_eq!(questions[1].y1, 600);
    }

    #[test]
    fn test_section_header_sets_type_without_closing() {
        let questions = assemble(
            &[
                line("一、选择题", 50),
                line("1. 下列说法中", 100),
                line("二、填空题", 200),
                line("2. 在空格处", 250),
            ],
            600,
        );

        assert_eq!(questions.len(), 2);
        assert_eq!(
            questions[0].question_type,
            Some(QuestionType::MultipleChoice)
        );
        assert_eq!(questions[1].question_type, Some(QuestionType::FillInBlank));
        // The header between questions does not close question 1 early.
        assert_eq!(questions[0].y1, 250 - QUESTION_GAP);
    }

    #[test]
    fn test_own_keywords_beat_section_context() {
        let questions = assemble(
            &[line("一、选择题", 50), line("1. 在____处填入答案", 100)],
            600,
        );

        assert_eq!(questions[0].question_type, Some(QuestionType::FillInBlank));
    }

    #[test]
    fn test_type_filled_from_continuation_line() {
        let questions = assemble(
            &[line("1. 下列描述", 100), line("A.对 B.错", 130)],
            600,
        );

        assert_eq!(
            questions[0].question_type,
            Some(QuestionType::MultipleChoice)
        );
    }

    #[test]
    fn test_leading_continuation_and_noise_dropped() {
        let questions = assemble(
            &[
                line("孤立的正文", 20),
                line("姓名：某某", 40),
                line("1. 正式开始", 100),
            ],
            600,
        );

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].raw_lines, vec!["1. 正式开始"]);
    }

    #[test]
    fn test_output_sorted_by_index() {
        let questions = assemble(
            &[
                line("3. 丙", 100),
                line("1. 甲", 200),
                line("2. 乙", 300),
            ],
            600,
        );

        let indices: Vec<u32> = questions.iter().map(|q| q.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }
}
