use crate::built_path::BuiltPath;
use crate::config::{SegmentOptions, DEFAULT_TOLERANCE};
use crate::error::{check_index, check_insert_index, PathError, Result};
use crate::geometry_utilities::to_kurbo;
use crate::geometry_utilities::types::*;
use crate::iter::{Flattened, PathCursor};
use crate::path::WindingRule;
use crate::segment::PathSegment;
use kurbo::ParamCurveNearest;
use log::trace;
use once_cell::unsync::OnceCell;
use std::fmt::{Display, Formatter};

const NEAREST_ACCURACY: f64 = 1e-9;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PolyNodeKind {
    /// Starts a new run
    MoveTo,
    /// Continues the current run
    LineTo,
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolyNode {
    pub point: CanvasPoint,
    pub kind: PolyNodeKind,
}

impl PolyNode {
    pub fn move_to(point: CanvasPoint) -> PolyNode {
        PolyNode {
            point,
            kind: PolyNodeKind::MoveTo,
        }
    }

    pub fn line_to(point: CanvasPoint) -> PolyNode {
        PolyNode {
            point,
            kind: PolyNodeKind::LineTo,
        }
    }
}

/// A path of straight segments split into runs by moveto nodes.
///
/// The first node always starts a run, whatever its kind. When closed, a
/// single close command follows the last node.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polyline {
    nodes: Vec<PolyNode>,
    closed: bool,
    winding_rule: WindingRule,
    #[cfg_attr(feature = "serde", serde(skip))]
    cache: OnceCell<BuiltPath>,
}

impl PartialEq for Polyline {
    fn eq(&self, other: &Self) -> bool {
        self.closed == other.closed && self.winding_rule == other.winding_rule && self.nodes == other.nodes
    }
}

impl Default for Polyline {
    fn default() -> Self {
        Self::new()
    }
}

impl Polyline {
    pub fn new() -> Polyline {
        Polyline {
            nodes: vec![],
            closed: false,
            winding_rule: WindingRule::default(),
            cache: OnceCell::new(),
        }
    }

    pub fn from_point(point: CanvasPoint) -> Polyline {
        let mut polyline = Polyline::new();
        polyline.nodes.push(PolyNode::move_to(point));
        polyline
    }

    fn dirty(&mut self) {
        self.cache.take();
    }

    /// Starts a new run. A moveto directly after another moveto replaces it,
    /// including the implicit moveto of a lone first node.
    pub fn move_to(&mut self, point: CanvasPoint) {
        let n = self.nodes.len();
        match self.nodes.last_mut() {
            Some(last) if n == 1 || last.kind == PolyNodeKind::MoveTo => *last = PolyNode::move_to(point),
            _ => self.nodes.push(PolyNode::move_to(point)),
        }
        self.dirty();
    }

    pub fn line_to(&mut self, point: CanvasPoint) {
        self.nodes.push(PolyNode::line_to(point));
        self.dirty();
    }

    pub fn insert_node(&mut self, index: usize, node: PolyNode) -> Result<()> {
        check_insert_index(index, self.nodes.len())?;
        self.nodes.insert(index, node);
        self.dirty();
        Ok(())
    }

    pub fn remove_node(&mut self, index: usize) -> Result<PolyNode> {
        check_index(index, self.nodes.len())?;
        let node = self.nodes.remove(index);
        self.dirty();
        Ok(node)
    }

    pub fn set_node(&mut self, index: usize, node: PolyNode) -> Result<PolyNode> {
        check_index(index, self.nodes.len())?;
        let old = std::mem::replace(&mut self.nodes[index], node);
        self.dirty();
        Ok(old)
    }

    pub fn mutate_node<R, F: FnOnce(&mut PolyNode) -> R>(&mut self, index: usize, f: F) -> Result<R> {
        check_index(index, self.nodes.len())?;
        let result = f(&mut self.nodes[index]);
        self.dirty();
        Ok(result)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.closed = false;
        self.dirty();
    }

    pub fn transform(&mut self, transform: &CanvasTransform) {
        for node in &mut self.nodes {
            node.point = transform.transform_point(node.point);
        }
        self.dirty();
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[PolyNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Result<&PolyNode> {
        check_index(index, self.nodes.len())?;
        Ok(&self.nodes[index])
    }

    pub fn node_point(&self, index: usize) -> Result<CanvasPoint> {
        Ok(self.node(index)?.point)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
        self.dirty();
    }

    pub fn winding_rule(&self) -> WindingRule {
        self.winding_rule
    }

    pub fn set_winding_rule(&mut self, winding_rule: WindingRule) {
        self.winding_rule = winding_rule;
        self.dirty();
    }

    pub fn segments(&self) -> PolylineIter<'_> {
        PolylineIter::new(self, None)
    }

    /// Fails if `options` asks for flattening with an unusable tolerance.
    pub fn segments_with(&self, options: &SegmentOptions) -> Result<PolylineSegments<'_>> {
        let iter = PolylineIter::new(self, options.transform);
        Ok(match options.tolerance {
            // Nothing to subdivide, but callers still get the same traversal type back
            Some(tolerance) => PolylineSegments::Flattened(Flattened::new(iter, self.winding_rule, tolerance)?),
            None => PolylineSegments::Lines(iter),
        })
    }

    pub fn built(&self) -> &BuiltPath {
        self.cache.get_or_init(|| {
            let built = BuiltPath::build(self.segments(), self.winding_rule, DEFAULT_TOLERANCE);
            trace!("Built polyline with {} nodes, bounds {:?}", self.nodes.len(), built.bounds());
            built
        })
    }

    pub fn bounds(&self) -> Option<CanvasBox> {
        self.built().bounds()
    }

    pub fn contains(&self, point: CanvasPoint) -> bool {
        self.built().contains(point)
    }

    pub fn intersects(&self, rect: &CanvasBox) -> bool {
        self.built().intersects(rect)
    }

    pub fn find_node(&self, point: CanvasPoint, tolerance: f64) -> Option<usize> {
        let max = tolerance * tolerance;
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (i, (node.point - point).square_length()))
            .filter(|&(_, dist)| dist <= max)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Index of the start node of the segment closest to `point`, if within `tolerance`.
    /// The closing segment of a closed polyline starts at the last node.
    pub fn find_segment(&self, point: CanvasPoint, tolerance: f64) -> Option<usize> {
        let n = self.nodes.len();
        let mut segments: Vec<(usize, CanvasPoint, CanvasPoint)> = (1..n)
            .filter(|&i| self.nodes[i].kind == PolyNodeKind::LineTo)
            .map(|i| (i - 1, self.nodes[i - 1].point, self.nodes[i].point))
            .collect();
        if self.closed && n > 1 {
            let run_start = (1..n)
                .rev()
                .find(|&i| self.nodes[i].kind == PolyNodeKind::MoveTo)
                .unwrap_or(0);
            segments.push((n - 1, self.nodes[n - 1].point, self.nodes[run_start].point));
        }

        let max = tolerance * tolerance;
        segments
            .into_iter()
            .map(|(i, a, b)| {
                let line = kurbo::Line::new(to_kurbo(a), to_kurbo(b));
                (i, line.nearest(to_kurbo(point), NEAREST_ACCURACY).distance_sq)
            })
            .filter(|&(_, dist)| dist <= max)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

/// Writes the coordinate stream, `*` marking every node that starts a run.
impl Display for Polyline {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i == 0 || node.kind == PolyNodeKind::MoveTo {
                write!(f, "*")?;
            }
            write!(f, "({},{})", node.point.x, node.point.y)?;
        }
        if self.closed && !self.nodes.is_empty() {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

pub struct PolylineIter<'a> {
    nodes: &'a [PolyNode],
    winding_rule: WindingRule,
    transform: Option<CanvasTransform>,
    index: usize,
    bound: usize,
}

impl<'a> PolylineIter<'a> {
    fn new(polyline: &'a Polyline, transform: Option<CanvasTransform>) -> Self {
        let n = polyline.nodes.len();
        let bound = if polyline.closed && n > 0 { n + 1 } else { n };
        PolylineIter {
            nodes: &polyline.nodes,
            winding_rule: polyline.winding_rule,
            transform,
            index: 0,
            bound,
        }
    }
}

impl<'a> PathCursor for PolylineIter<'a> {
    fn winding_rule(&self) -> WindingRule {
        self.winding_rule
    }

    fn is_done(&self) -> bool {
        self.index >= self.bound
    }

    fn advance(&mut self) {
        if !self.is_done() {
            self.index += 1;
        }
    }

    fn current_segment(&self) -> Result<PathSegment> {
        if self.is_done() {
            return Err(PathError::IteratorDone);
        }
        let segment = match self.nodes.get(self.index) {
            Some(node) if self.index == 0 || node.kind == PolyNodeKind::MoveTo => PathSegment::MoveTo(node.point),
            Some(node) => PathSegment::LineTo(node.point),
            None => PathSegment::Close,
        };
        Ok(match &self.transform {
            Some(transform) => segment.transformed(transform),
            None => segment,
        })
    }
}

impl<'a> Iterator for PolylineIter<'a> {
    type Item = PathSegment;

    fn next(&mut self) -> Option<Self::Item> {
        let segment = self.current_segment().ok()?;
        self.advance();
        Some(segment)
    }
}

pub enum PolylineSegments<'a> {
    Lines(PolylineIter<'a>),
    Flattened(Flattened),
}

impl<'a> PathCursor for PolylineSegments<'a> {
    fn winding_rule(&self) -> WindingRule {
        match self {
            PolylineSegments::Lines(it) => it.winding_rule(),
            PolylineSegments::Flattened(it) => it.winding_rule(),
        }
    }

    fn is_done(&self) -> bool {
        match self {
            PolylineSegments::Lines(it) => it.is_done(),
            PolylineSegments::Flattened(it) => it.is_done(),
        }
    }

    fn advance(&mut self) {
        match self {
            PolylineSegments::Lines(it) => it.advance(),
            PolylineSegments::Flattened(it) => it.advance(),
        }
    }

    fn current_segment(&self) -> Result<PathSegment> {
        match self {
            PolylineSegments::Lines(it) => it.current_segment(),
            PolylineSegments::Flattened(it) => it.current_segment(),
        }
    }
}

impl<'a> Iterator for PolylineSegments<'a> {
    type Item = PathSegment;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            PolylineSegments::Lines(it) => it.next(),
            PolylineSegments::Flattened(it) => it.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry_utilities::canvas_point;

    fn zigzag() -> Polyline {
        let mut polyline = Polyline::new();
        polyline.move_to(canvas_point(10.0, 20.0));
        polyline.line_to(canvas_point(30.0, 50.0));
        polyline.line_to(canvas_point(40.0, 70.0));
        polyline
    }

    #[test]
    fn consecutive_movetos_coalesce() {
        let mut polyline = Polyline::new();
        polyline.move_to(canvas_point(10.0, 20.0));
        polyline.move_to(canvas_point(11.0, 21.0));
        assert_eq!(polyline.node_count(), 1);
        assert_eq!(polyline.node_point(0), Ok(canvas_point(11.0, 21.0)));

        polyline.line_to(canvas_point(5.0, 5.0));
        polyline.move_to(canvas_point(7.0, 7.0));
        assert_eq!(polyline.node_count(), 3);
    }

    #[test]
    fn moveto_replaces_lone_first_node() {
        let mut polyline = Polyline::new();
        polyline.line_to(canvas_point(1.0, 1.0));
        polyline.move_to(canvas_point(7.0, 7.0));
        assert_eq!(polyline.node_count(), 1);
        assert_eq!(polyline.node(0), Ok(&PolyNode::move_to(canvas_point(7.0, 7.0))));
        assert_eq!(
            polyline.segments().collect::<Vec<_>>(),
            vec![PathSegment::MoveTo(canvas_point(7.0, 7.0))]
        );
        assert_eq!(polyline.to_string(), "*(7,7)");
    }

    #[test]
    fn coordinate_stream_follows_edits() {
        let mut polyline = zigzag();
        assert_eq!(polyline.to_string(), "*(10,20)(30,50)(40,70)");
        assert_eq!(polyline.bounds().unwrap().max, canvas_point(40.0, 70.0));

        polyline
            .set_node(1, PolyNode::line_to(canvas_point(100.0, 30.0)))
            .unwrap();
        assert_eq!(polyline.to_string(), "*(10,20)(100,30)(40,70)");
        assert_eq!(polyline.bounds().unwrap().max, canvas_point(100.0, 70.0));

        let segments: Vec<_> = polyline.segments().collect();
        assert_eq!(
            segments,
            vec![
                PathSegment::MoveTo(canvas_point(10.0, 20.0)),
                PathSegment::LineTo(canvas_point(100.0, 30.0)),
                PathSegment::LineTo(canvas_point(40.0, 70.0)),
            ]
        );
    }

    #[test]
    fn close_is_emitted_once() {
        let mut polyline = zigzag();
        polyline.move_to(canvas_point(0.0, 0.0));
        polyline.line_to(canvas_point(1.0, 0.0));
        polyline.set_closed(true);

        let segments: Vec<_> = polyline.segments().collect();
        assert_eq!(segments.len(), 6);
        assert_eq!(segments[3], PathSegment::MoveTo(canvas_point(0.0, 0.0)));
        assert_eq!(segments[5], PathSegment::Close);
        assert_eq!(segments.iter().filter(|s| **s == PathSegment::Close).count(), 1);
        assert_eq!(polyline.to_string(), "*(10,20)(30,50)(40,70)*(0,0)(1,0)Z");
    }

    #[test]
    fn first_node_always_moves() {
        let mut polyline = Polyline::new();
        polyline.line_to(canvas_point(1.0, 1.0));
        polyline.line_to(canvas_point(2.0, 1.0));
        let mut it = polyline.segments();
        assert_eq!(it.current_segment(), Ok(PathSegment::MoveTo(canvas_point(1.0, 1.0))));
        it.advance();
        it.advance();
        assert!(it.is_done());
        assert_eq!(it.current_segment(), Err(PathError::IteratorDone));
    }

    #[test]
    fn empty_polyline() {
        let mut polyline = Polyline::new();
        polyline.set_closed(true);
        assert!(polyline.segments().is_done());
        assert_eq!(polyline.bounds(), None);
        assert_eq!(polyline.to_string(), "");
    }

    #[test]
    fn bad_indices_never_mutate() {
        let mut polyline = zigzag();
        let before = polyline.clone();
        assert_eq!(
            polyline.remove_node(3),
            Err(PathError::IndexOutOfBounds { index: 3, len: 3 })
        );
        assert!(polyline.set_node(9, PolyNode::line_to(canvas_point(0.0, 0.0))).is_err());
        assert!(polyline.insert_node(4, PolyNode::line_to(canvas_point(0.0, 0.0))).is_err());
        assert!(polyline.mutate_node(3, |node| node.point.x = 1.0).is_err());
        assert_eq!(polyline, before);
    }

    #[test]
    fn runs_fill_with_winding_rule() {
        let mut polyline = Polyline::new();
        for &(offset, size) in &[(0.0, 30.0), (10.0, 10.0)] {
            polyline.move_to(canvas_point(offset, offset));
            polyline.line_to(canvas_point(offset + size, offset));
            polyline.line_to(canvas_point(offset + size, offset + size));
            polyline.line_to(canvas_point(offset, offset + size));
        }
        assert!(polyline.contains(canvas_point(15.0, 15.0)));
        polyline.set_winding_rule(WindingRule::EvenOdd);
        assert!(!polyline.contains(canvas_point(15.0, 15.0)));
        assert!(polyline.contains(canvas_point(5.0, 5.0)));
        assert!(polyline.intersects(&CanvasBox::new(canvas_point(2.0, 2.0), canvas_point(3.0, 3.0))));
    }

    #[test]
    fn transformed_traversal() {
        let polyline = zigzag();
        let options = SegmentOptions::transformed(CanvasTransform::scale(2.0, 2.0));
        let segments: Vec<_> = polyline.segments_with(&options).unwrap().collect();
        assert_eq!(segments[0], PathSegment::MoveTo(canvas_point(20.0, 40.0)));
        assert_eq!(segments[2], PathSegment::LineTo(canvas_point(80.0, 140.0)));

        let flat: Vec<_> = polyline.segments_with(&SegmentOptions::flattened(0.1)).unwrap().collect();
        assert_eq!(flat, polyline.segments().collect::<Vec<_>>());
    }

    #[test]
    fn pull_protocol_on_options_traversal() {
        let mut polyline = zigzag();
        polyline.set_closed(true);
        polyline.set_winding_rule(WindingRule::EvenOdd);

        for options in [
            SegmentOptions::transformed(CanvasTransform::translation(1.0, 0.0)),
            SegmentOptions::flattened(0.5).with_transform(CanvasTransform::translation(1.0, 0.0)),
        ] {
            let mut it = polyline.segments_with(&options).unwrap();
            assert_eq!(it.winding_rule(), WindingRule::EvenOdd);
            let mut segments = vec![];
            while !it.is_done() {
                segments.push(it.current_segment().unwrap());
                it.advance();
            }
            assert_eq!(
                segments,
                vec![
                    PathSegment::MoveTo(canvas_point(11.0, 20.0)),
                    PathSegment::LineTo(canvas_point(31.0, 50.0)),
                    PathSegment::LineTo(canvas_point(41.0, 70.0)),
                    PathSegment::Close,
                ]
            );
            it.advance();
            assert_eq!(it.current_segment(), Err(PathError::IteratorDone));
        }

        assert!(matches!(
            polyline.segments_with(&SegmentOptions::flattened(0.0)),
            Err(PathError::InvalidTolerance)
        ));
    }

    #[test]
    fn every_edit_is_reflected_in_queries() {
        let mut polyline = Polyline::new();
        polyline.move_to(canvas_point(0.0, 0.0));
        polyline.line_to(canvas_point(10.0, 0.0));
        polyline.line_to(canvas_point(10.0, 10.0));
        polyline.line_to(canvas_point(0.0, 10.0));
        assert_eq!(polyline.bounds().unwrap().max, canvas_point(10.0, 10.0));
        assert!(polyline.contains(canvas_point(5.0, 5.0)));

        polyline.insert_node(2, PolyNode::line_to(canvas_point(20.0, 5.0))).unwrap();
        assert_eq!(polyline.bounds().unwrap().max.x, 20.0);
        assert!(polyline.contains(canvas_point(14.0, 5.0)));

        polyline.remove_node(2).unwrap();
        assert_eq!(polyline.bounds().unwrap().max.x, 10.0);
        assert!(!polyline.contains(canvas_point(14.0, 5.0)));

        polyline.mutate_node(3, |node| node.point.y = 30.0).unwrap();
        assert_eq!(polyline.bounds().unwrap().max.y, 30.0);
        assert!(polyline.contains(canvas_point(2.0, 20.0)));

        polyline.move_to(canvas_point(50.0, 50.0));
        assert_eq!(polyline.bounds().unwrap().max, canvas_point(50.0, 50.0));
        // The second moveto replaces the first instead of leaving a point behind
        polyline.move_to(canvas_point(40.0, 40.0));
        assert_eq!(polyline.bounds().unwrap().max, canvas_point(40.0, 40.0));
        polyline.line_to(canvas_point(60.0, 40.0));
        polyline.line_to(canvas_point(60.0, 60.0));
        assert!(polyline.contains(canvas_point(55.0, 45.0)));

        polyline.set_winding_rule(WindingRule::EvenOdd);
        assert!(polyline.contains(canvas_point(55.0, 45.0)));
        assert!(polyline.contains(canvas_point(5.0, 5.0)));

        assert!(!polyline.segments().any(|s| s == PathSegment::Close));
        polyline.set_closed(true);
        assert_eq!(polyline.segments().last(), Some(PathSegment::Close));
        assert!(polyline.contains(canvas_point(55.0, 45.0)));

        polyline.clear();
        assert_eq!(polyline.bounds(), None);
        assert!(!polyline.contains(canvas_point(5.0, 5.0)));
    }

    #[test]
    fn hit_and_transform() {
        let mut polyline = zigzag();
        assert_eq!(polyline.find_node(canvas_point(31.0, 50.0), 2.0), Some(1));
        polyline.transform(&CanvasTransform::translation(-10.0, -20.0));
        assert_eq!(polyline.node_point(0), Ok(canvas_point(0.0, 0.0)));
        assert_eq!(polyline.bounds().unwrap().min, canvas_point(0.0, 0.0));
    }

    #[test]
    fn segment_hits_skip_run_gaps() {
        let mut polyline = zigzag();
        polyline.move_to(canvas_point(100.0, 0.0));
        polyline.line_to(canvas_point(110.0, 0.0));
        polyline.line_to(canvas_point(110.0, 10.0));

        assert_eq!(polyline.find_segment(canvas_point(20.0, 35.0), 1.0), Some(0));
        assert_eq!(polyline.find_segment(canvas_point(105.0, 0.5), 1.0), Some(3));
        // No segment joins the two runs
        assert_eq!(polyline.find_segment(canvas_point(70.0, 35.0), 1.0), None);

        // Closing returns to the start of the last run only
        assert_eq!(polyline.find_segment(canvas_point(105.0, 5.0), 0.5), None);
        polyline.set_closed(true);
        assert_eq!(polyline.find_segment(canvas_point(105.0, 5.0), 0.5), Some(5));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let mut polyline = zigzag();
        polyline.move_to(canvas_point(1.0, 1.0));
        polyline.set_closed(true);
        let json = serde_json::to_string(&polyline).unwrap();
        let restored: Polyline = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, polyline);
        assert_eq!(restored.to_string(), polyline.to_string());
    }
}
