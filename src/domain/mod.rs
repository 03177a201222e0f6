//! Domain types: text-line records and question records.

pub mod line;
pub mod question;

pub use line::{LineClass, LineRecord};
pub use question::{Question, QuestionOption, QuestionType, SegmentedQuestion};
