//! Ray/vertex intersection.

use tracing::trace;

use crate::context::RayContext;
use crate::neighborhood::resolve_vertex;
use crate::record::{ClassRecord, Element, HitPoint};
use kestrel_geom::line_point_distance;
use kestrel_topo::VertexId;

/// Tolerance-gated vertex test: hit when the ray's carrier line passes
/// within linear tolerance of the vertex point.
///
/// Returns true when the vertex is (or already was) hit.
pub(crate) fn isect_ray_vertex(cx: &mut RayContext<'_>, v: VertexId) -> bool {
    let element = Element::Vertex(v);
    match cx.lookup(element) {
        Some(ClassRecord::Hit(_)) => return true,
        Some(_) => return false,
        None => {}
    }

    let point = cx.topo.vertices[v].point;
    let dist = line_point_distance(&cx.ray.origin, &cx.ray.direction, &point);
    if dist > cx.tol.linear {
        cx.record_miss(element);
        return false;
    }

    ray_hit_vertex(cx, v);
    true
}

/// Record a hit on a vertex the caller has already established the ray
/// touches (an edge endpoint within crossing tolerance, a colinear edge
/// end). The pole resolver supplies the transition, since a point alone
/// carries no in/out information. Upgrades a prior miss; a prior hit
/// short-circuits.
pub(crate) fn ray_hit_vertex(cx: &mut RayContext<'_>, v: VertexId) {
    let element = Element::Vertex(v);
    if let Some(ClassRecord::Hit(_)) = cx.lookup(element) {
        return;
    }

    let point = cx.topo.vertices[v].point;
    let dist = (point - cx.ray.origin).dot(cx.ray.direction.as_ref());
    trace!(?v, dist, "vertex hit");

    let res = resolve_vertex(cx, v);
    cx.record_hit(HitPoint {
        element,
        dist,
        point,
        in_out: res.transition,
        inbound_norm: res.inbound_norm,
        outbound_norm: res.outbound_norm,
        inbound_use: res.inbound_use,
        outbound_use: res.outbound_use,
        segment: None,
    });
}
