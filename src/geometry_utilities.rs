use types::*;

pub mod types {
    #[derive(Debug, Copy, Clone, PartialEq)]
    pub struct CanvasSpace;
    pub type CanvasPoint = euclid::Point2D<f64, CanvasSpace>;
    pub type CanvasVector = euclid::Vector2D<f64, CanvasSpace>;
    pub type CanvasBox = euclid::Box2D<f64, CanvasSpace>;
    pub type CanvasTransform = euclid::Transform2D<f64, CanvasSpace, CanvasSpace>;
}

#[inline]
pub fn canvas_point(x: f64, y: f64) -> CanvasPoint {
    CanvasPoint::new(x, y)
}

#[inline]
pub fn to_kurbo(p: CanvasPoint) -> kurbo::Point {
    kurbo::Point::new(p.x, p.y)
}

#[inline]
pub fn from_kurbo(p: kurbo::Point) -> CanvasPoint {
    CanvasPoint::new(p.x, p.y)
}

/// Lyon renders in single precision
#[inline]
pub fn to_lyon(p: CanvasPoint) -> lyon::math::Point {
    lyon::math::point(p.x as f32, p.y as f32)
}

#[inline]
pub fn to_geom(p: CanvasPoint) -> lyon::geom::Point<f64> {
    p.to_untyped()
}

#[inline]
pub fn from_geom(p: lyon::geom::Point<f64>) -> CanvasPoint {
    CanvasPoint::from_untyped(p)
}

/// Closed on all sides, unlike `Box2D::contains`
pub fn box_contains_inclusive(bounds: &CanvasBox, p: CanvasPoint) -> bool {
    p.x >= bounds.min.x && p.x <= bounds.max.x && p.y >= bounds.min.y && p.y <= bounds.max.y
}

pub fn segment_intersects_box(a: CanvasPoint, b: CanvasPoint, bounds: &CanvasBox) -> bool {
    if box_contains_inclusive(bounds, a) || box_contains_inclusive(bounds, b) {
        return true;
    }

    let corners = [
        bounds.min,
        canvas_point(bounds.max.x, bounds.min.y),
        bounds.max,
        canvas_point(bounds.min.x, bounds.max.y),
    ];
    let segment = lyon::geom::LineSegment {
        from: to_geom(a),
        to: to_geom(b),
    };
    (0..4).any(|i| {
        let edge = lyon::geom::LineSegment {
            from: to_geom(corners[i]),
            to: to_geom(corners[(i + 1) % 4]),
        };
        segment.intersects(&edge)
    })
}
