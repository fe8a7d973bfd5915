use crate::geometry_utilities::types::*;

/// Default maximum distance between a curve and its flattened approximation.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Parameters for traversing a path.
///
/// Without a tolerance the traversal yields curves as they are stored.
/// With one, curves are subdivided into line segments no further than
/// `tolerance` from the true curve. The transform, if any, is applied
/// before subdivision.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SegmentOptions {
    pub transform: Option<CanvasTransform>,
    pub tolerance: Option<f64>,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentOptions {
    pub const fn new() -> Self {
        SegmentOptions {
            transform: None,
            tolerance: None,
        }
    }

    pub fn transformed(transform: CanvasTransform) -> Self {
        Self::new().with_transform(transform)
    }

    pub fn flattened(tolerance: f64) -> Self {
        Self::new().with_tolerance(tolerance)
    }

    pub fn with_transform(mut self, transform: CanvasTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
}
