//! The per-ray hit/miss ledger.

use std::collections::HashMap;

use tracing::trace;

use crate::ray::Ray;
use crate::record::{ClassRecord, Element, HitPoint, SegmentRole};
use kestrel_math::Tolerance;
use kestrel_topo::{Manifolds, ShellId, Topology, VertexId};

/// Per-ray evaluation state: the ray, tolerances, and the ledger of
/// element classifications built up during one traversal.
///
/// A context is local to one ray evaluation and must never be shared
/// across concurrent rays; the topology and manifold annotation it borrows
/// are the only shared (read-only) resources.
pub struct RayContext<'a> {
    pub(crate) topo: &'a Topology,
    pub(crate) manifolds: &'a Manifolds,
    pub(crate) ray: Ray,
    pub(crate) tol: Tolerance,
    /// Radius for the degenerate-case probe points: the model bounding
    /// diagonal, large enough to be unambiguous.
    pub(crate) pole_radius: f64,
    /// The shell currently being traversed.
    pub(crate) shell: ShellId,
    records: HashMap<Element, ClassRecord>,
    hits: Vec<HitPoint>,
    misses: Vec<Element>,
}

impl<'a> RayContext<'a> {
    /// Create a fresh context for one ray against `topo`.
    pub fn new(topo: &'a Topology, manifolds: &'a Manifolds, ray: Ray, tol: Tolerance) -> Self {
        let diagonal = topo.model_aabb().diagonal();
        Self {
            topo,
            manifolds,
            ray,
            tol,
            pole_radius: if diagonal > 0.0 { diagonal } else { 1.0 },
            shell: ShellId::default(),
            records: HashMap::new(),
            hits: Vec::new(),
            misses: Vec::new(),
        }
    }

    /// The ray being evaluated.
    pub fn ray(&self) -> &Ray {
        &self.ray
    }

    /// Look up the cached record for an element.
    pub fn lookup(&self, element: Element) -> Option<&ClassRecord> {
        self.records.get(&element)
    }

    /// The hit list so far, ascending by signed distance.
    pub fn hit_points(&self) -> &[HitPoint] {
        &self.hits
    }

    /// Elements recorded as missed or deferred to sub-elements.
    pub fn misses(&self) -> &[Element] {
        &self.misses
    }

    /// Consume the context, yielding the sorted hit list.
    pub fn into_hits(self) -> Vec<HitPoint> {
        self.hits
    }

    /// Record that the ray misses `element`. No-op if the element already
    /// has a record.
    pub(crate) fn record_miss(&mut self, element: Element) {
        if self.records.contains_key(&element) {
            return;
        }
        trace!(?element, "miss");
        self.records.insert(element, ClassRecord::Miss);
        self.misses.push(element);
    }

    /// Record that `element` is touched via one of its sub-elements.
    /// Upgrades an existing miss; never downgrades a hit.
    pub(crate) fn record_sub_hit(&mut self, element: Element) {
        match self.records.get(&element) {
            Some(ClassRecord::Hit(_)) | Some(ClassRecord::SubHit) => return,
            Some(ClassRecord::Miss) => {
                self.misses.retain(|e| *e != element);
            }
            None => {
                self.misses.push(element);
            }
        }
        trace!(?element, "hit via sub-element");
        self.records.insert(element, ClassRecord::SubHit);
    }

    /// Record a direct hit, inserting it into the distance-sorted hit
    /// list. An existing hit for the element short-circuits (idempotent
    /// re-intersection); an existing miss is upgraded.
    ///
    /// Returns false when the element already had a direct hit.
    pub(crate) fn record_hit(&mut self, hit: HitPoint) -> bool {
        let element = hit.element;
        match self.records.get(&element) {
            Some(ClassRecord::Hit(_)) => return false,
            Some(ClassRecord::Miss) | Some(ClassRecord::SubHit) => {
                self.misses.retain(|e| *e != element);
            }
            None => {}
        }
        trace!(?element, dist = hit.dist, transition = %hit.in_out, "hit");
        self.records.insert(element, ClassRecord::Hit(hit.clone()));
        self.insert_sorted(hit);
        true
    }

    /// Add a further crossing of an element that already has a hit record
    /// (a curved face crossed more than once). The ledger entry keeps the
    /// first crossing; the hit list gains them all.
    pub(crate) fn push_extra_hit(&mut self, hit: HitPoint) {
        trace!(element = ?hit.element, dist = hit.dist, "additional crossing");
        self.insert_sorted(hit);
    }

    /// Linear scan from the list head; ties keep insertion order. This
    /// runs once per touched element per ray, not per candidate.
    fn insert_sorted(&mut self, hit: HitPoint) {
        let idx = self
            .hits
            .iter()
            .position(|h| h.dist > hit.dist)
            .unwrap_or(self.hits.len());
        self.hits.insert(idx, hit);
    }

    /// Stamp the colinear enter/leave roles onto a linked pair of vertex
    /// hits.
    pub(crate) fn link_colinear_pair(&mut self, enter: VertexId, leave: VertexId) {
        self.set_segment_role(enter, SegmentRole::Enter);
        self.set_segment_role(leave, SegmentRole::Leave);
    }

    fn set_segment_role(&mut self, v: VertexId, role: SegmentRole) {
        let element = Element::Vertex(v);
        if let Some(ClassRecord::Hit(hp)) = self.records.get_mut(&element) {
            hp.segment = Some(role);
        }
        for h in &mut self.hits {
            if h.element == element {
                h.segment = Some(role);
            }
        }
    }
}
