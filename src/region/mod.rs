pub mod annotation;
pub mod capture;
pub mod input;
pub mod set;

pub use annotation::{Point, RectAnnotation, RectLocation};
pub use capture::{Gesture, PageCapture, RegionCapture};
pub use set::{RegionSet, SharedRegionSet};
