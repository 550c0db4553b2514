//! Per-element classification records.

use crate::state::Transition;
use kestrel_math::{Point3, Vec3};
use kestrel_topo::{EdgeId, FaceId, VertexId};

/// A classifiable topology element: the key space of the per-ray ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    /// A vertex.
    Vertex(VertexId),
    /// An edge.
    Edge(EdgeId),
    /// A face.
    Face(FaceId),
}

/// Role of a vertex hit within a colinear ray/edge segment pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRole {
    /// The nearer endpoint: the ray enters the edge here.
    Enter,
    /// The farther endpoint: the ray leaves the edge here.
    Leave,
}

/// One touch of the ray on a boundary element.
#[derive(Debug, Clone)]
pub struct HitPoint {
    /// The element that owns this hit.
    pub element: Element,
    /// Signed distance along the ray.
    pub dist: f64,
    /// The touch point in model space.
    pub point: Point3,
    /// The in/out transition across the touch.
    pub in_out: Transition,
    /// Outward normal of the geometry deciding the inbound side.
    pub inbound_norm: Vec3,
    /// Outward normal of the geometry deciding the outbound side.
    pub outbound_norm: Vec3,
    /// Sub-element that decided the inbound side (debug/plot only).
    pub inbound_use: Option<Element>,
    /// Sub-element that decided the outbound side (debug/plot only).
    pub outbound_use: Option<Element>,
    /// Colinear-segment role when this hit is half of an edge-aligned
    /// enter/leave pair.
    pub segment: Option<SegmentRole>,
}

/// The ledger's verdict for one element against one ray.
#[derive(Debug, Clone)]
pub enum ClassRecord {
    /// The ray does not touch the element.
    Miss,
    /// The ray touches the element, but the touch is recorded on a more
    /// specific sub-element (an edge deferring to its vertex, a face
    /// deferring to a boundary edge).
    SubHit,
    /// The ray touches the element here.
    Hit(HitPoint),
}

impl ClassRecord {
    /// Whether this record represents a direct hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, ClassRecord::Hit(_))
    }
}
