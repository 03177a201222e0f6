//! Layout-driven question segmentation.
//!
//! Three stages, all purely textual until the final crop: line
//! classification ([`classifier`]), question assembly ([`assembler`]), and
//! content parsing ([`parser`]).

pub mod assembler;
pub mod classifier;
pub mod parser;

pub use assembler::QuestionAssembler;
pub use classifier::LineClassifier;
pub use parser::{ContentParser, ParsedContent};
