use crate::geometry_utilities::types::*;
use crate::geometry_utilities::{box_contains_inclusive, from_kurbo, segment_intersects_box, to_kurbo, to_lyon};
use crate::path::WindingRule;
use crate::segment::PathSegment;
use kurbo::{BezPath, ParamCurveExtrema, PathEl};
use lyon::path::builder::SvgPathBuilder;

/// The materialized form of a path.
///
/// Built in one pass from a segment traversal and never modified afterwards.
/// Owners drop it on every edit and rebuild it on the next geometry query.
#[derive(Clone, Debug)]
pub struct BuiltPath {
    path: BezPath,
    /// `path` with every open run closed, used for containment
    fill: BezPath,
    bounds: Option<CanvasBox>,
    /// Flattened outline of each run, used for rect intersection
    polygons: Vec<Vec<CanvasPoint>>,
    winding_rule: WindingRule,
}

impl BuiltPath {
    /// `tolerance` must be finite and positive.
    pub(crate) fn build<I: IntoIterator<Item = PathSegment>>(segments: I, winding_rule: WindingRule, tolerance: f64) -> BuiltPath {
        let path: BezPath = segments.into_iter().map(PathEl::from).collect();
        let fill = close_runs(&path);
        let bounds = exact_bounds(&path);

        let mut polygons: Vec<Vec<CanvasPoint>> = vec![];
        kurbo::flatten(path.elements().iter().copied(), tolerance, |el| match el {
            PathEl::MoveTo(p) => polygons.push(vec![from_kurbo(p)]),
            PathEl::LineTo(p) => {
                if let Some(polygon) = polygons.last_mut() {
                    polygon.push(from_kurbo(p));
                }
            }
            PathEl::ClosePath => {
                // Keep the closing edge so outline tests see it
                if let Some(polygon) = polygons.last_mut() {
                    let first = polygon[0];
                    if polygon.len() > 1 && polygon[polygon.len() - 1] != first {
                        polygon.push(first);
                    }
                }
            }
            _ => {}
        });

        BuiltPath {
            path,
            fill,
            bounds,
            polygons,
            winding_rule,
        }
    }

    pub fn bez_path(&self) -> &BezPath {
        &self.path
    }

    pub fn polygons(&self) -> &[Vec<CanvasPoint>] {
        &self.polygons
    }

    pub fn winding_rule(&self) -> WindingRule {
        self.winding_rule
    }

    /// Axis aligned bounds of the exact curves, `None` when there is nothing to bound.
    pub fn bounds(&self) -> Option<CanvasBox> {
        self.bounds
    }

    pub fn contains(&self, point: CanvasPoint) -> bool {
        match &self.bounds {
            Some(bounds) if box_contains_inclusive(bounds, point) => {}
            _ => return false,
        }

        let winding = kurbo::Shape::winding(&self.fill, to_kurbo(point));
        match self.winding_rule {
            WindingRule::NonZero => winding != 0,
            WindingRule::EvenOdd => winding % 2 != 0,
        }
    }

    /// True if the outline or the filled interior touches `rect`.
    pub fn intersects(&self, rect: &CanvasBox) -> bool {
        let bounds = match &self.bounds {
            Some(bounds) => bounds,
            None => return false,
        };
        if bounds.max.x < rect.min.x || bounds.min.x > rect.max.x || bounds.max.y < rect.min.y || bounds.min.y > rect.max.y {
            return false;
        }

        for polygon in &self.polygons {
            if polygon.len() == 1 && box_contains_inclusive(rect, polygon[0]) {
                return true;
            }
            for (i, &a) in polygon.iter().enumerate().skip(1) {
                if segment_intersects_box(polygon[i - 1], a, rect) {
                    return true;
                }
            }
        }

        // Fully inside the fill
        self.contains(rect.center())
    }

    pub fn to_lyon_path(&self) -> lyon::path::Path {
        let mut builder = lyon::path::Path::svg_builder();
        self.build_lyon(&mut builder);
        builder.build()
    }

    pub fn build_lyon<B: SvgPathBuilder>(&self, builder: &mut B) {
        for el in self.path.elements() {
            match PathSegment::from(*el) {
                PathSegment::MoveTo(p) => {
                    builder.move_to(to_lyon(p));
                }
                PathSegment::LineTo(p) => {
                    builder.line_to(to_lyon(p));
                }
                PathSegment::QuadTo(c, p) => {
                    builder.quadratic_bezier_to(to_lyon(c), to_lyon(p));
                }
                PathSegment::CubicTo(c1, c2, p) => {
                    builder.cubic_bezier_to(to_lyon(c1), to_lyon(c2), to_lyon(p));
                }
                PathSegment::Close => {
                    builder.close();
                }
            }
        }
    }
}

fn close_runs(path: &BezPath) -> BezPath {
    let mut fill = BezPath::new();
    let mut open = false;
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(_) => {
                if open {
                    fill.close_path();
                }
                open = true;
            }
            PathEl::ClosePath => open = false,
            _ => {}
        }
        fill.push(el);
    }
    if open {
        fill.close_path();
    }
    fill
}

fn exact_bounds(path: &BezPath) -> Option<CanvasBox> {
    let mut bounds: Option<kurbo::Rect> = None;
    let mut include = |r: kurbo::Rect| {
        bounds = Some(match bounds {
            Some(b) => b.union(r),
            None => r,
        });
    };

    // Lone movetos have no segment but still count
    for el in path.elements() {
        if let PathEl::MoveTo(p) = el {
            include(kurbo::Rect::from_points(*p, *p));
        }
    }
    for segment in path.segments() {
        include(segment.bounding_box());
    }

    bounds.map(|r| CanvasBox::new(CanvasPoint::new(r.x0, r.y0), CanvasPoint::new(r.x1, r.y1)))
}
