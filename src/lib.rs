pub mod built_path;
pub mod config;
pub mod error;
pub mod geometry_utilities;
pub mod iter;
pub mod node;
pub mod path;
pub mod polyline;
pub mod segment;

pub use built_path::BuiltPath;
pub use config::{SegmentOptions, DEFAULT_TOLERANCE};
pub use error::{PathError, Result};
pub use geometry_utilities::types::*;
pub use iter::{Flattened, PathCursor, SegmentIter, Segments};
pub use node::{Node, NodePoint};
pub use path::{BezierPath, BorderRadii, WindingRule};
pub use polyline::{PolyNode, PolyNodeKind, Polyline, PolylineIter, PolylineSegments};
pub use segment::PathSegment;
