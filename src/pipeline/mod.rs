//! Page-level pipelines.
//!
//! Each pipeline owns its processors and configuration, validates once at
//! construction, and exposes single-page plus rayon-parallel batch entry
//! points.

pub mod erase;
pub mod geometry;
pub mod segmentation;

pub use erase::ErasePipeline;
pub use geometry::{GeometryPipeline, GeometryReport, GeometryResult};
pub use segmentation::SegmentationPipeline;
