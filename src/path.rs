use crate::built_path::BuiltPath;
use crate::config::{SegmentOptions, DEFAULT_TOLERANCE};
use crate::error::{check_index, check_insert_index, PathError, Result};
use crate::geometry_utilities::types::*;
use crate::geometry_utilities::{from_geom, to_geom, to_kurbo};
use crate::iter::{Flattened, SegmentIter, Segments};
use crate::node::{Node, NodePoint};
use crate::segment::PathSegment;
use kurbo::{ParamCurveArclen, ParamCurveNearest};
use log::{debug, trace};
use lyon::geom::{CubicBezierSegment, QuadraticBezierSegment};
use lyon::path::builder::SvgPathBuilder;
use once_cell::unsync::OnceCell;
use std::cell::Cell;
use std::collections::hash_map::DefaultHasher;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};

const ARCLEN_ACCURACY: f64 = 1e-6;
const NEAREST_ACCURACY: f64 = 1e-9;

/// Rule deciding which points are inside a closed path.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WindingRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl From<WindingRule> for lyon::path::FillRule {
    fn from(rule: WindingRule) -> Self {
        match rule {
            WindingRule::NonZero => lyon::path::FillRule::NonZero,
            WindingRule::EvenOdd => lyon::path::FillRule::EvenOdd,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BorderRadii {
    pub top_left: f64,
    pub top_right: f64,
    pub bottom_left: f64,
    pub bottom_right: f64,
}

impl BorderRadii {
    pub fn new_uniform(radius: f64) -> BorderRadii {
        BorderRadii {
            top_left: radius,
            top_right: radius,
            bottom_left: radius,
            bottom_right: radius,
        }
    }
}

/// An editable path made of [`Node`]s.
///
/// Segment types are never stored. They are derived from each pair of
/// adjacent nodes while traversing, see [`Node::segment_to`]. Geometry
/// queries go through a [`BuiltPath`] that is built on first use and
/// dropped by every edit.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BezierPath {
    nodes: Vec<Node>,
    closed: bool,
    winding_rule: WindingRule,
    #[cfg_attr(feature = "serde", serde(skip))]
    version: u32,
    #[cfg_attr(feature = "serde", serde(skip))]
    last_hash: Cell<Option<(u32, u64)>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    cache: OnceCell<BuiltPath>,
}

impl Debug for BezierPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BezierPath")
            .field("closed", &self.closed)
            .field("winding_rule", &self.winding_rule)
            .field("nodes", &self.nodes)
            .finish()
    }
}

impl PartialEq for BezierPath {
    fn eq(&self, other: &Self) -> bool {
        self.closed == other.closed && self.winding_rule == other.winding_rule && self.nodes == other.nodes
    }
}

impl Default for BezierPath {
    fn default() -> Self {
        Self::new()
    }
}

impl BezierPath {
    pub fn new() -> BezierPath {
        BezierPath {
            nodes: vec![],
            closed: false,
            winding_rule: WindingRule::default(),
            version: 0,
            last_hash: Cell::new(None),
            cache: OnceCell::new(),
        }
    }

    pub fn from_point(point: CanvasPoint) -> BezierPath {
        let mut path = BezierPath::new();
        path.nodes.push(Node::new(point));
        path
    }

    pub fn from_nodes<I: IntoIterator<Item = Node>>(nodes: I, closed: bool) -> BezierPath {
        let mut path = BezierPath::new();
        path.nodes.extend(nodes);
        path.closed = closed;
        path
    }

    /// Drops the built representation. Every edit goes through here.
    fn dirty(&mut self) {
        self.version = self.version.wrapping_add(1);
        if self.cache.take().is_some() {
            trace!("Dropped built path at version {}", self.version);
        }
    }

    /// Incremented by every edit.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Hash of the node sequence and flags, memoized per version.
    pub fn content_hash(&self) -> u64 {
        if let Some((version, hash)) = self.last_hash.get() {
            if version == self.version {
                return hash;
            }
        }

        fn write_point(h: &mut DefaultHasher, p: Option<CanvasPoint>) {
            match p {
                Some(p) => {
                    h.write_u8(1);
                    h.write_u64(p.x.to_bits());
                    h.write_u64(p.y.to_bits());
                }
                None => h.write_u8(0),
            }
        }

        let mut h = DefaultHasher::new();
        for node in &self.nodes {
            write_point(&mut h, Some(node.anchor));
            write_point(&mut h, node.control_in);
            write_point(&mut h, node.control_out);
        }
        self.closed.hash(&mut h);
        self.winding_rule.hash(&mut h);
        let hash = h.finish();
        self.last_hash.set(Some((self.version, hash)));
        hash
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Result<&Node> {
        check_index(index, self.nodes.len())?;
        Ok(&self.nodes[index])
    }

    /// The anchor of the node at `index`
    pub fn node_point(&self, index: usize) -> Result<CanvasPoint> {
        Ok(self.node(index)?.anchor)
    }

    pub fn node_point_at(&self, index: usize, which: NodePoint) -> Result<Option<CanvasPoint>> {
        Ok(self.node(index)?.point(which))
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

    pub fn fill_rule(&self) -> lyon::path::FillRule {
        self.winding_rule.into()
    }

    /// Starts the path. Only valid while the path is empty.
    pub fn move_to(&mut self, point: CanvasPoint) -> Result<()> {
        if !self.nodes.is_empty() {
            return Err(PathError::NotEmpty);
        }
        self.nodes.push(Node::new(point));
        self.dirty();
        Ok(())
    }

    pub fn line_to(&mut self, point: CanvasPoint) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(PathError::NoCurrentPoint);
        }
        self.nodes.push(Node::new(point));
        self.dirty();
        Ok(())
    }

    /// Sets the outgoing control of the last node and appends `point`.
    pub fn quad_to(&mut self, control: CanvasPoint, point: CanvasPoint) -> Result<()> {
        let last = self.nodes.last_mut().ok_or(PathError::NoCurrentPoint)?;
        last.control_out = Some(control);
        self.nodes.push(Node::new(point));
        self.dirty();
        Ok(())
    }

    pub fn curve_to(&mut self, control1: CanvasPoint, control2: CanvasPoint, point: CanvasPoint) -> Result<()> {
        let last = self.nodes.last_mut().ok_or(PathError::NoCurrentPoint)?;
        last.control_out = Some(control1);
        self.nodes.push(Node::new(point).with_control_in(control2));
        self.dirty();
        Ok(())
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
        self.dirty();
    }

    /// Inserts before `index`. `index == node_count()` appends.
    pub fn insert_node(&mut self, index: usize, node: Node) -> Result<()> {
        check_insert_index(index, self.nodes.len())?;
        self.nodes.insert(index, node);
        self.dirty();
        Ok(())
    }

    pub fn remove_node(&mut self, index: usize) -> Result<Node> {
        check_index(index, self.nodes.len())?;
        let node = self.nodes.remove(index);
        self.dirty();
        Ok(node)
    }

    /// Replaces the node at `index`, returning the old one.
    pub fn set_node(&mut self, index: usize, node: Node) -> Result<Node> {
        check_index(index, self.nodes.len())?;
        let old = std::mem::replace(&mut self.nodes[index], node);
        self.dirty();
        Ok(old)
    }

    pub fn mutate_node<R, F: FnOnce(&mut Node) -> R>(&mut self, index: usize, f: F) -> Result<R> {
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
            node.transform(transform);
        }
        self.dirty();
    }

    /// Reverses the traversal direction without changing the shape.
    pub fn reverse(&mut self) {
        self.nodes.reverse();
        for node in &mut self.nodes {
            *node = node.reversed();
        }
        if self.closed && self.nodes.len() > 1 {
            // Keep the same start node, otherwise the wrap-around segment would move
            self.nodes.rotate_right(1);
        }
        debug!("Reversed path with {} nodes", self.nodes.len());
        self.dirty();
    }

    pub fn segments(&self) -> SegmentIter<'_> {
        SegmentIter::new(&self.nodes, self.closed, self.winding_rule, None)
    }

    /// Fails if `options` asks for flattening with an unusable tolerance.
    pub fn segments_with(&self, options: &SegmentOptions) -> Result<Segments<'_>> {
        let iter = SegmentIter::new(&self.nodes, self.closed, self.winding_rule, options.transform);
        Ok(match options.tolerance {
            Some(tolerance) => Segments::Flattened(Flattened::new(iter, self.winding_rule, tolerance)?),
            None => Segments::Curves(iter),
        })
    }

    /// The built representation, rebuilt if an edit dropped it.
    pub fn built(&self) -> &BuiltPath {
        self.cache.get_or_init(|| {
            let built = BuiltPath::build(self.segments(), self.winding_rule, DEFAULT_TOLERANCE);
            trace!(
                "Built path with {} nodes at version {}, bounds {:?}",
                self.nodes.len(),
                self.version,
                built.bounds()
            );
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

    pub fn center(&self) -> Option<CanvasPoint> {
        self.bounds().map(|b| b.center())
    }

    pub fn length(&self) -> f64 {
        self.built()
            .bez_path()
            .segments()
            .map(|segment| segment.arclen(ARCLEN_ACCURACY))
            .sum()
    }

    pub fn to_lyon_path(&self) -> lyon::path::Path {
        self.built().to_lyon_path()
    }

    pub fn build_lyon<B: SvgPathBuilder>(&self, builder: &mut B) {
        self.built().build_lyon(builder)
    }

    /// Index of the node whose anchor is closest to `point`, if within `tolerance`.
    pub fn find_node(&self, point: CanvasPoint, tolerance: f64) -> Option<usize> {
        let max = tolerance * tolerance;
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (i, (node.anchor - point).square_length()))
            .filter(|&(_, dist)| dist <= max)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Index of the start node of the segment closest to `point`, if within `tolerance`.
    pub fn find_segment(&self, point: CanvasPoint, tolerance: f64) -> Option<usize> {
        self.nearest_segment(point, tolerance).map(|(i, _)| i)
    }

    /// Inserts a node on the segment hit by `point` without changing the shape.
    /// Returns the index of the new node.
    pub fn split_segment(&mut self, point: CanvasPoint, tolerance: f64) -> Option<usize> {
        let (i, t) = self.nearest_segment(point, tolerance)?;
        let j = (i + 1) % self.nodes.len();
        let prev = self.nodes[i];
        let next = self.nodes[j];
        let from = to_geom(prev.anchor);

        let (control_out, middle, control_in) = match prev.segment_to(&next) {
            PathSegment::LineTo(to) => (None, Node::new(prev.anchor.lerp(to, t)), None),
            PathSegment::QuadTo(ctrl, to) => {
                let (a, b) = QuadraticBezierSegment {
                    from,
                    ctrl: to_geom(ctrl),
                    to: to_geom(to),
                }
                .split(t);
                let middle = Node::new(from_geom(a.to)).with_control_out(from_geom(b.ctrl));
                (Some(from_geom(a.ctrl)), middle, None)
            }
            PathSegment::CubicTo(ctrl1, ctrl2, to) => {
                let (a, b) = CubicBezierSegment {
                    from,
                    ctrl1: to_geom(ctrl1),
                    ctrl2: to_geom(ctrl2),
                    to: to_geom(to),
                }
                .split(t);
                let middle = Node::with_controls(Some(from_geom(a.ctrl2)), from_geom(a.to), Some(from_geom(b.ctrl1)));
                (Some(from_geom(a.ctrl1)), middle, Some(from_geom(b.ctrl2)))
            }
            PathSegment::MoveTo(_) | PathSegment::Close => return None,
        };

        self.nodes[i].control_out = control_out;
        self.nodes[j].control_in = control_in;
        self.nodes.insert(i + 1, middle);
        debug!("Split segment {} at t={} into node {}", i, t, i + 1);
        self.dirty();
        Some(i + 1)
    }

    /// Removes the node hit by `point`, merging its two segments into one.
    /// Returns the index the node had.
    pub fn join_segments(&mut self, point: CanvasPoint, tolerance: f64) -> Option<usize> {
        let index = self.find_node(point, tolerance)?;
        self.nodes.remove(index);
        debug!("Joined segments at node {}", index);
        self.dirty();
        Some(index)
    }

    fn nearest_segment(&self, point: CanvasPoint, tolerance: f64) -> Option<(usize, f64)> {
        let n = self.nodes.len();
        let count = match n {
            0 | 1 => 0,
            _ if self.closed => n,
            _ => n - 1,
        };
        let p = to_kurbo(point);
        let max = tolerance * tolerance;

        let mut best: Option<(usize, f64, f64)> = None;
        for i in 0..count {
            let start = &self.nodes[i];
            let segment = match start.segment_to(&self.nodes[(i + 1) % n]).to_kurbo_segment(start.anchor) {
                Some(segment) => segment,
                None => continue,
            };
            let nearest = segment.nearest(p, NEAREST_ACCURACY);
            if nearest.distance_sq <= max && best.map_or(true, |(_, _, d)| nearest.distance_sq < d) {
                best = Some((i, nearest.t, nearest.distance_sq));
            }
        }
        best.map(|(i, t, _)| (i, t))
    }

    /// A closed path approximating a circle with cubic segments.
    pub fn circle(center: CanvasPoint, radius: f64) -> BezierPath {
        let mut beziers = vec![];
        lyon::geom::Arc::circle(to_geom(center), radius).for_each_cubic_bezier(&mut |bezier: &CubicBezierSegment<f64>| {
            beziers.push(*bezier);
        });

        let n = beziers.len();
        let nodes = (0..n).map(|i| {
            let incoming = &beziers[(i + n - 1) % n];
            Node::with_controls(
                Some(from_geom(incoming.ctrl2)),
                from_geom(beziers[i].from),
                Some(from_geom(beziers[i].ctrl1)),
            )
        });
        BezierPath::from_nodes(nodes, true)
    }

    pub fn rounded_rect(rect: &CanvasBox, mut radii: BorderRadii) -> BezierPath {
        fn clamp(r1: &mut f64, r2: &mut f64, max: f64) {
            if *r1 + *r2 > max {
                let delta = (*r1 + *r2 - max) * 0.5;
                *r1 -= delta;
                *r2 -= delta;
            }
        }

        let min_wh = rect.width().min(rect.height());
        radii.bottom_left = radii.bottom_left.min(min_wh);
        radii.bottom_right = radii.bottom_right.min(min_wh);
        radii.top_left = radii.top_left.min(min_wh);
        radii.top_right = radii.top_right.min(min_wh);

        clamp(&mut radii.bottom_left, &mut radii.bottom_right, rect.width());
        clamp(&mut radii.top_left, &mut radii.top_right, rect.width());
        clamp(&mut radii.top_left, &mut radii.bottom_left, rect.height());
        clamp(&mut radii.top_right, &mut radii.bottom_right, rect.height());

        fn corner_arc(corner: CanvasPoint, radius: f64, start_angle: f64, offset: CanvasVector) -> lyon::geom::Arc<f64> {
            lyon::geom::Arc {
                center: to_geom(corner + offset * radius),
                radii: euclid::default::Vector2D::new(radius, radius),
                start_angle: euclid::Angle::degrees(start_angle),
                sweep_angle: euclid::Angle::frac_pi_2(),
                x_rotation: euclid::Angle::zero(),
            }
        }

        let arcs = [
            corner_arc(
                CanvasPoint::new(rect.min.x, rect.min.y),
                radii.top_left,
                180.0,
                CanvasVector::new(1.0, 1.0),
            ),
            corner_arc(
                CanvasPoint::new(rect.max.x, rect.min.y),
                radii.top_right,
                270.0,
                CanvasVector::new(-1.0, 1.0),
            ),
            corner_arc(
                CanvasPoint::new(rect.max.x, rect.max.y),
                radii.bottom_right,
                0.0,
                CanvasVector::new(-1.0, -1.0),
            ),
            corner_arc(
                CanvasPoint::new(rect.min.x, rect.max.y),
                radii.bottom_left,
                90.0,
                CanvasVector::new(1.0, -1.0),
            ),
        ];

        let mut nodes: Vec<Node> = vec![];
        for arc in &arcs {
            if arc.radii.x > 0.0 {
                arc.for_each_cubic_bezier(&mut |bezier: &CubicBezierSegment<f64>| {
                    append_cubic(&mut nodes, bezier);
                });
            }
            append_point(&mut nodes, from_geom(arc.to()));
        }

        // The last arc may end where the first one started
        if nodes.len() > 1 && same_point(nodes[0].anchor, nodes[nodes.len() - 1].anchor) {
            if let Some(last) = nodes.pop() {
                nodes[0].control_in = last.control_in;
            }
        }
        BezierPath::from_nodes(nodes, true)
    }
}

fn same_point(a: CanvasPoint, b: CanvasPoint) -> bool {
    (a - b).square_length() < 1e-12
}

fn append_point(nodes: &mut Vec<Node>, point: CanvasPoint) {
    match nodes.last() {
        Some(last) if same_point(last.anchor, point) => {}
        _ => nodes.push(Node::new(point)),
    }
}

fn append_cubic(nodes: &mut Vec<Node>, bezier: &CubicBezierSegment<f64>) {
    append_point(nodes, from_geom(bezier.from));
    if let Some(last) = nodes.last_mut() {
        last.control_out = Some(from_geom(bezier.ctrl1));
    }
    nodes.push(Node::new(from_geom(bezier.to)).with_control_in(from_geom(bezier.ctrl2)));
}
