use crate::geometry_utilities::types::*;
use crate::geometry_utilities::{from_kurbo, to_kurbo};
use kurbo::{CubicBez, Line, PathEl, PathSeg, QuadBez};

/// A single drawing command yielded while traversing a path.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PathSegment {
    MoveTo(CanvasPoint),
    LineTo(CanvasPoint),
    QuadTo(CanvasPoint, CanvasPoint),
    CubicTo(CanvasPoint, CanvasPoint, CanvasPoint),
    Close,
}

impl PathSegment {
    /// The point the segment ends at. `Close` carries no coordinates.
    pub fn end_point(&self) -> Option<CanvasPoint> {
        match *self {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) | PathSegment::QuadTo(_, p) | PathSegment::CubicTo(_, _, p) => Some(p),
            PathSegment::Close => None,
        }
    }

    /// The drawable curve starting at `start`, if this command draws anything.
    pub fn to_kurbo_segment(&self, start: CanvasPoint) -> Option<PathSeg> {
        let s = to_kurbo(start);
        match *self {
            PathSegment::LineTo(p) => Some(PathSeg::Line(Line::new(s, to_kurbo(p)))),
            PathSegment::QuadTo(c, p) => Some(PathSeg::Quad(QuadBez::new(s, to_kurbo(c), to_kurbo(p)))),
            PathSegment::CubicTo(c1, c2, p) => Some(PathSeg::Cubic(CubicBez::new(s, to_kurbo(c1), to_kurbo(c2), to_kurbo(p)))),
            PathSegment::MoveTo(_) | PathSegment::Close => None,
        }
    }

    pub fn transformed(&self, transform: &CanvasTransform) -> PathSegment {
        let t = |p: CanvasPoint| transform.transform_point(p);
        match *self {
            PathSegment::MoveTo(p) => PathSegment::MoveTo(t(p)),
            PathSegment::LineTo(p) => PathSegment::LineTo(t(p)),
            PathSegment::QuadTo(c, p) => PathSegment::QuadTo(t(c), t(p)),
            PathSegment::CubicTo(c1, c2, p) => PathSegment::CubicTo(t(c1), t(c2), t(p)),
            PathSegment::Close => PathSegment::Close,
        }
    }
}

impl From<PathSegment> for PathEl {
    fn from(segment: PathSegment) -> Self {
        match segment {
            PathSegment::MoveTo(p) => PathEl::MoveTo(to_kurbo(p)),
            PathSegment::LineTo(p) => PathEl::LineTo(to_kurbo(p)),
            PathSegment::QuadTo(c, p) => PathEl::QuadTo(to_kurbo(c), to_kurbo(p)),
            PathSegment::CubicTo(c1, c2, p) => PathEl::CurveTo(to_kurbo(c1), to_kurbo(c2), to_kurbo(p)),
            PathSegment::Close => PathEl::ClosePath,
        }
    }
}

impl From<PathEl> for PathSegment {
    fn from(el: PathEl) -> Self {
        match el {
            PathEl::MoveTo(p) => PathSegment::MoveTo(from_kurbo(p)),
            PathEl::LineTo(p) => PathSegment::LineTo(from_kurbo(p)),
            PathEl::QuadTo(c, p) => PathSegment::QuadTo(from_kurbo(c), from_kurbo(p)),
            PathEl::CurveTo(c1, c2, p) => PathSegment::CubicTo(from_kurbo(c1), from_kurbo(c2), from_kurbo(p)),
            PathEl::ClosePath => PathSegment::Close,
        }
    }
}
