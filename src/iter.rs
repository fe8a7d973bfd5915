use crate::error::{check_tolerance, PathError, Result};
use crate::geometry_utilities::types::*;
use crate::node::Node;
use crate::path::WindingRule;
use crate::segment::PathSegment;

/// Pull-style traversal of a path's drawing commands.
///
/// Callers check [`is_done`](PathCursor::is_done) before each
/// [`current_segment`](PathCursor::current_segment) / [`advance`](PathCursor::advance) pair.
pub trait PathCursor {
    fn winding_rule(&self) -> WindingRule;
    fn is_done(&self) -> bool;
    /// Steps to the next command. Does nothing once done.
    fn advance(&mut self);
    fn current_segment(&self) -> Result<PathSegment>;
}

/// Walks the nodes of a bezier path.
///
/// For a closed path with more than one node the two slots after the last node
/// hold the wrap-around segment from the last node back to the first, then the
/// close command. A closed single node path only gets the close command.
pub struct SegmentIter<'a> {
    nodes: &'a [Node],
    closed: bool,
    winding_rule: WindingRule,
    transform: Option<CanvasTransform>,
    index: usize,
    bound: usize,
}

impl<'a> SegmentIter<'a> {
    pub(crate) fn new(nodes: &'a [Node], closed: bool, winding_rule: WindingRule, transform: Option<CanvasTransform>) -> Self {
        let n = nodes.len();
        let bound = match (n, closed) {
            (0, _) => 0,
            (_, false) => n,
            (1, true) => 2,
            (_, true) => n + 2,
        };
        SegmentIter {
            nodes,
            closed,
            winding_rule,
            transform,
            index: 0,
            bound,
        }
    }

    fn untransformed_segment(&self) -> PathSegment {
        let n = self.nodes.len();
        if self.index == 0 {
            // The first node always starts the path, its incoming control only matters for the wrap-around
            PathSegment::MoveTo(self.nodes[0].anchor)
        } else if self.index < n {
            self.nodes[self.index - 1].segment_to(&self.nodes[self.index])
        } else if self.closed && n > 1 && self.index == n {
            self.nodes[n - 1].segment_to(&self.nodes[0])
        } else {
            PathSegment::Close
        }
    }
}

impl<'a> PathCursor for SegmentIter<'a> {
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
        let segment = self.untransformed_segment();
        Ok(match &self.transform {
            Some(transform) => segment.transformed(transform),
            None => segment,
        })
    }
}

impl<'a> Iterator for SegmentIter<'a> {
    type Item = PathSegment;

    fn next(&mut self) -> Option<Self::Item> {
        let segment = self.current_segment().ok()?;
        self.advance();
        Some(segment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bound.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for SegmentIter<'a> {}

/// Subdivides the curves of another traversal into line segments.
///
/// Subdivision is done by kurbo up front; this only replays the result.
/// Fails with [`PathError::InvalidTolerance`] unless `tolerance` is finite and positive.
pub struct Flattened {
    segments: Vec<PathSegment>,
    winding_rule: WindingRule,
    index: usize,
}

impl Flattened {
    pub fn new<I: IntoIterator<Item = PathSegment>>(segments: I, winding_rule: WindingRule, tolerance: f64) -> Result<Self> {
        check_tolerance(tolerance)?;
        let mut flat = Vec::new();
        kurbo::flatten(segments.into_iter().map(kurbo::PathEl::from), tolerance, |el| {
            flat.push(PathSegment::from(el))
        });
        Ok(Flattened {
            segments: flat,
            winding_rule,
            index: 0,
        })
    }
}

impl PathCursor for Flattened {
    fn winding_rule(&self) -> WindingRule {
        self.winding_rule
    }

    fn is_done(&self) -> bool {
        self.index >= self.segments.len()
    }

    fn advance(&mut self) {
        if !self.is_done() {
            self.index += 1;
        }
    }

    fn current_segment(&self) -> Result<PathSegment> {
        self.segments.get(self.index).copied().ok_or(PathError::IteratorDone)
    }
}

impl Iterator for Flattened {
    type Item = PathSegment;

    fn next(&mut self) -> Option<Self::Item> {
        let segment = self.current_segment().ok()?;
        self.advance();
        Some(segment)
    }
}

/// A traversal that may or may not flatten curves, as chosen by [`SegmentOptions`](crate::config::SegmentOptions).
pub enum Segments<'a> {
    Curves(SegmentIter<'a>),
    Flattened(Flattened),
}

impl<'a> PathCursor for Segments<'a> {
    fn winding_rule(&self) -> WindingRule {
        match self {
            Segments::Curves(it) => it.winding_rule(),
            Segments::Flattened(it) => it.winding_rule(),
        }
    }

    fn is_done(&self) -> bool {
        match self {
            Segments::Curves(it) => it.is_done(),
            Segments::Flattened(it) => it.is_done(),
        }
    }

    fn advance(&mut self) {
        match self {
            Segments::Curves(it) => it.advance(),
            Segments::Flattened(it) => it.advance(),
        }
    }

    fn current_segment(&self) -> Result<PathSegment> {
        match self {
            Segments::Curves(it) => it.current_segment(),
            Segments::Flattened(it) => it.current_segment(),
        }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = PathSegment;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Segments::Curves(it) => it.next(),
            Segments::Flattened(it) => it.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry_utilities::canvas_point;

    fn triangle() -> Vec<Node> {
        vec![
            Node::new(canvas_point(0.0, 0.0)),
            Node::new(canvas_point(10.0, 0.0)),
            Node::new(canvas_point(0.0, 10.0)),
        ]
    }

    #[test]
    fn empty_is_done_immediately() {
        for closed in [false, true] {
            let it = SegmentIter::new(&[], closed, WindingRule::NonZero, None);
            assert!(it.is_done());
            assert_eq!(it.current_segment(), Err(PathError::IteratorDone));
        }
    }

    #[test]
    fn single_node() {
        let nodes = [Node::new(canvas_point(3.0, 4.0)).with_control_in(canvas_point(9.0, 9.0))];
        let open: Vec<_> = SegmentIter::new(&nodes, false, WindingRule::NonZero, None).collect();
        assert_eq!(open, vec![PathSegment::MoveTo(canvas_point(3.0, 4.0))]);

        let closed: Vec<_> = SegmentIter::new(&nodes, true, WindingRule::NonZero, None).collect();
        assert_eq!(closed, vec![PathSegment::MoveTo(canvas_point(3.0, 4.0)), PathSegment::Close]);
    }

    #[test]
    fn pull_protocol() {
        let nodes = triangle();
        let mut it = SegmentIter::new(&nodes, true, WindingRule::EvenOdd, None);
        assert_eq!(it.winding_rule(), WindingRule::EvenOdd);
        let mut segments = vec![];
        while !it.is_done() {
            segments.push(it.current_segment().unwrap());
            it.advance();
        }
        assert_eq!(
            segments,
            vec![
                PathSegment::MoveTo(canvas_point(0.0, 0.0)),
                PathSegment::LineTo(canvas_point(10.0, 0.0)),
                PathSegment::LineTo(canvas_point(0.0, 10.0)),
                PathSegment::LineTo(canvas_point(0.0, 0.0)),
                PathSegment::Close,
            ]
        );

        // Advancing past the end stays at the end
        it.advance();
        it.advance();
        assert!(it.is_done());
        assert_eq!(it.current_segment(), Err(PathError::IteratorDone));
    }

    #[test]
    fn wrap_around_uses_segment_table() {
        let mut nodes = triangle();
        nodes[2].control_out = Some(canvas_point(-5.0, 5.0));
        nodes[0].control_in = Some(canvas_point(-5.0, 0.0));
        let segments: Vec<_> = SegmentIter::new(&nodes, true, WindingRule::NonZero, None).collect();
        assert_eq!(segments[0], PathSegment::MoveTo(canvas_point(0.0, 0.0)));
        assert_eq!(
            segments[3],
            PathSegment::CubicTo(canvas_point(-5.0, 5.0), canvas_point(-5.0, 0.0), canvas_point(0.0, 0.0))
        );
        assert_eq!(segments[4], PathSegment::Close);
    }

    #[test]
    fn transform_is_not_accumulated() {
        let nodes = triangle();
        let t = CanvasTransform::translation(1.0, 1.0);
        let it = SegmentIter::new(&nodes, false, WindingRule::NonZero, Some(t));
        let first = it.current_segment().unwrap();
        let again = it.current_segment().unwrap();
        assert_eq!(first, PathSegment::MoveTo(canvas_point(1.0, 1.0)));
        assert_eq!(first, again);
    }

    #[test]
    fn size_hint_counts_remaining() {
        let nodes = triangle();
        let mut it = SegmentIter::new(&nodes, true, WindingRule::NonZero, None);
        assert_eq!(it.len(), 5);
        it.advance();
        assert_eq!(it.len(), 4);
    }

    #[test]
    fn flattened_contains_only_lines() {
        let nodes = [
            Node::new(canvas_point(0.0, 0.0)).with_control_out(canvas_point(0.0, 50.0)),
            Node::new(canvas_point(100.0, 0.0)).with_control_in(canvas_point(100.0, 50.0)),
        ];
        let flat = Flattened::new(SegmentIter::new(&nodes, false, WindingRule::NonZero, None), WindingRule::NonZero, 0.1).unwrap();
        let segments: Vec<_> = flat.collect();
        assert!(segments.len() > 3);
        assert_eq!(segments[0], PathSegment::MoveTo(canvas_point(0.0, 0.0)));
        assert!(segments[1..].iter().all(|s| matches!(s, PathSegment::LineTo(_))));
        let end = segments.last().and_then(|s| s.end_point()).unwrap();
        assert!((end - canvas_point(100.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn unusable_tolerance_is_rejected() {
        let nodes = triangle();
        for tolerance in [0.0, -0.5, f64::NAN] {
            let flat = Flattened::new(SegmentIter::new(&nodes, true, WindingRule::NonZero, None), WindingRule::NonZero, tolerance);
            assert!(matches!(flat, Err(PathError::InvalidTolerance)));
        }
    }
}
