//! # examscan
//!
//! A Rust library that normalizes scanned exam pages and splits them into
//! individual questions. Handwriting erasure, geometry correction, and
//! layout-driven question segmentation over recognized text lines.
//!
//! ## Components
//!
//! - **Handwriting Erasure**: Detect colored and dark ink strokes and paint
//!   them out by diffusion inpainting or flat fill
//! - **Geometry Correction**: Rectify perspective distortion, de-skew along
//!   detected text lines, and trim near-white borders
//! - **Question Segmentation**: Classify recognized text lines, assemble
//!   numbered questions, and crop one image band per question
//!
//! Text recognition itself is out of scope; segmentation consumes
//! [`LineRecord`](domain::LineRecord)s produced by an external engine.
//!
//! ## Modules
//!
//! * [`core`] - Error handling and configuration
//! * [`domain`] - Text-line and question records
//! * [`processors`] - Leaf image processors
//! * [`segmentation`] - Line classification, assembly, and content parsing
//! * [`pipeline`] - Page-level erase, geometry, and segmentation pipelines
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use examscan::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let page = image::open("exam_page.jpg")?.to_rgb8();
//!
//! // Erase handwriting, then straighten and crop the page.
//! let erased = ErasePipeline::new(EraseConfig::default()).erase(&page)?;
//! let corrected = GeometryPipeline::with_defaults().correct(erased)?;
//!
//! // Split into questions using text lines from a recognition engine.
//! let lines: Vec<LineRecord> = Vec::new(); // supplied by the OCR step
//! let questions = SegmentationPipeline::new().split(&corrected.image, &lines)?;
//! for question in &questions {
//!     println!("{}: {}", question.index, question.stem);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;
pub mod segmentation;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error handling
    pub use crate::core::{ExamScanError, ScanResult};

    // Configuration
    pub use crate::core::{EraseConfig, EraseMode, GeometryConfig};

    // Domain types
    pub use crate::domain::{LineRecord, Question, QuestionOption, QuestionType, SegmentedQuestion};

    // Pipelines (high-level API)
    pub use crate::pipeline::{
        ErasePipeline, GeometryPipeline, GeometryReport, GeometryResult, SegmentationPipeline,
    };
}
