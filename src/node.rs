use crate::geometry_utilities::types::*;
use crate::segment::PathSegment;
use std::fmt::{Debug, Formatter, Result};

/// A single path vertex with up to two optional control points.
///
/// `control_in` shapes the segment arriving at this node and `control_out`
/// the segment leaving it. Which of the two are present is all that is
/// needed to decide the type of the segment between two adjacent nodes,
/// see [`Node::segment_to`].
#[derive(Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub anchor: CanvasPoint,
    pub control_in: Option<CanvasPoint>,
    pub control_out: Option<CanvasPoint>,
}

/// Selects one of the points stored in a [`Node`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodePoint {
    Anchor,
    ControlIn,
    ControlOut,
}

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "anchor: {:?}", self.anchor)?;
        match self.control_in {
            Some(p) => write!(f, ", in: {:?}", p)?,
            None => write!(f, ", in: n/a")?,
        }
        match self.control_out {
            Some(p) => write!(f, ", out: {:?}", p),
            None => write!(f, ", out: n/a"),
        }
    }
}

impl From<CanvasPoint> for Node {
    fn from(anchor: CanvasPoint) -> Self {
        Node::new(anchor)
    }
}

impl Node {
    pub fn new(anchor: CanvasPoint) -> Node {
        Node {
            anchor,
            control_in: None,
            control_out: None,
        }
    }

    pub fn with_controls(control_in: Option<CanvasPoint>, anchor: CanvasPoint, control_out: Option<CanvasPoint>) -> Node {
        Node {
            anchor,
            control_in,
            control_out,
        }
    }

    pub fn with_control_in(mut self, control: CanvasPoint) -> Node {
        self.control_in = Some(control);
        self
    }

    pub fn with_control_out(mut self, control: CanvasPoint) -> Node {
        self.control_out = Some(control);
        self
    }

    pub fn has_control_in(&self) -> bool {
        self.control_in.is_some()
    }

    pub fn has_control_out(&self) -> bool {
        self.control_out.is_some()
    }

    pub fn point(&self, which: NodePoint) -> Option<CanvasPoint> {
        match which {
            NodePoint::Anchor => Some(self.anchor),
            NodePoint::ControlIn => self.control_in,
            NodePoint::ControlOut => self.control_out,
        }
    }

    /// Setting a control point also makes it present.
    pub fn set_point(&mut self, which: NodePoint, value: CanvasPoint) {
        match which {
            NodePoint::Anchor => self.anchor = value,
            NodePoint::ControlIn => self.control_in = Some(value),
            NodePoint::ControlOut => self.control_out = Some(value),
        }
    }

    /// Moves the anchor, dragging the control points along with it.
    pub fn translate(&mut self, offset: CanvasVector) {
        self.anchor += offset;
        if let Some(c) = self.control_in.as_mut() {
            *c += offset;
        }
        if let Some(c) = self.control_out.as_mut() {
            *c += offset;
        }
    }

    pub fn transform(&mut self, transform: &CanvasTransform) {
        self.anchor = transform.transform_point(self.anchor);
        self.control_in = self.control_in.map(|c| transform.transform_point(c));
        self.control_out = self.control_out.map(|c| transform.transform_point(c));
    }

    /// The same node seen while walking the path backwards
    pub fn reversed(&self) -> Node {
        Node {
            anchor: self.anchor,
            control_in: self.control_out,
            control_out: self.control_in,
        }
    }

    /// The segment from this node to `next`.
    ///
    /// | `self.control_out` | `next.control_in` | segment |
    /// |---|---|---|
    /// | absent | absent | line |
    /// | absent | present | quadratic through `next.control_in` |
    /// | present | absent | quadratic through `self.control_out` |
    /// | present | present | cubic through both, outgoing first |
    pub fn segment_to(&self, next: &Node) -> PathSegment {
        match (self.control_out, next.control_in) {
            (None, None) => PathSegment::LineTo(next.anchor),
            (Some(control), None) | (None, Some(control)) => PathSegment::QuadTo(control, next.anchor),
            (Some(control1), Some(control2)) => PathSegment::CubicTo(control1, control2, next.anchor),
        }
    }
}
