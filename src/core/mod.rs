//! Core types shared across the crate: errors and configuration.

pub mod config;
pub mod errors;

pub use config::{EraseConfig, EraseMode, GeometryConfig};
pub use errors::{ExamScanError, ScanResult};
