//! Leaf image processors.
//!
//! Each processor is a pure, synchronous transformation over explicitly
//! owned pixel buffers. None of them touch shared state, so independent
//! instances can run on separate threads without coordination.

pub mod contour;
pub mod crop;
pub mod geometry;
pub mod ink_mask;
pub mod ink_removal;
pub mod rectify;
pub mod skew;

pub use contour::DocumentContourLocator;
pub use crop::WhitespaceCropper;
pub use geometry::{OrderedRect, Point, Polygon, Quad};
pub use ink_mask::InkMaskBuilder;
pub use ink_removal::{InkRemover, RemovalStrategy};
pub use rectify::PerspectiveRectifier;
pub use skew::{Rotator, SkewEstimator};
