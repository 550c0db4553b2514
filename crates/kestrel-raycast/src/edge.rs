//! Ray/edge intersection and the edge in/out state machine.

use tracing::trace;

use crate::context::RayContext;
use crate::error::{CastError, Result};
use crate::record::{ClassRecord, Element, HitPoint};
use crate::state::{RayState, Transition};
use crate::vertex::{isect_ray_vertex, ray_hit_vertex};
use kestrel_geom::{line_segment_crossing, SegmentCrossing};
use kestrel_math::{Point2, Vec3};
use kestrel_topo::{EdgeId, EdgeUse, Topology};

/// Intersect the ray with one edge, recording the outcome in the ledger.
///
/// Six outcomes are distinguished: a zero-length edge delegates to its
/// vertices; a carrier-line graze beyond an endpoint and a clean miss both
/// record misses; a colinear edge records its endpoints as a linked
/// enter/leave pair; an endpoint touch records that vertex; a transversal
/// interior crossing records an edge hit whose transition comes from the
/// state machine over the radial face fan.
pub(crate) fn isect_ray_edge(cx: &mut RayContext<'_>, e: EdgeId) -> Result<()> {
    let element = Element::Edge(e);
    if cx.lookup(element).is_some() {
        return Ok(());
    }

    let topo = cx.topo;
    let edge = &topo.edges[e];
    let (start, end) = (edge.start, edge.end);
    let (a, b) = topo.edge_points(e);

    match line_segment_crossing(&cx.ray.origin, &cx.ray.direction, &a, &b, &cx.tol) {
        SegmentCrossing::ZeroLength => {
            trace!(?e, "zero-length edge, delegating to vertices");
            let hit1 = isect_ray_vertex(cx, start);
            let hit2 = isect_ray_vertex(cx, end);
            if hit1 || hit2 {
                cx.record_sub_hit(element);
            } else {
                cx.record_miss(element);
            }
        }
        SegmentCrossing::BeyondStart | SegmentCrossing::BeyondEnd | SegmentCrossing::Miss => {
            cx.record_miss(Element::Vertex(start));
            cx.record_miss(Element::Vertex(end));
            cx.record_miss(element);
        }
        SegmentCrossing::Colinear => {
            trace!(?e, "ray colinear with edge");
            ray_hit_vertex(cx, start);
            ray_hit_vertex(cx, end);
            let da = (a - cx.ray.origin).dot(cx.ray.direction.as_ref());
            let db = (b - cx.ray.origin).dot(cx.ray.direction.as_ref());
            if da <= db {
                cx.link_colinear_pair(start, end);
            } else {
                cx.link_colinear_pair(end, start);
            }
            cx.record_sub_hit(element);
        }
        SegmentCrossing::AtStart(_) => {
            ray_hit_vertex(cx, start);
            cx.record_sub_hit(element);
        }
        SegmentCrossing::AtEnd(_) => {
            ray_hit_vertex(cx, end);
            cx.record_sub_hit(element);
        }
        SegmentCrossing::Interior(t) => {
            cx.record_miss(Element::Vertex(start));
            cx.record_miss(Element::Vertex(end));
            ray_hit_edge(cx, e, t)?;
        }
    }
    Ok(())
}

/// Record a transversal hit in the edge interior.
pub(crate) fn ray_hit_edge(cx: &mut RayContext<'_>, e: EdgeId, dist: f64) -> Result<()> {
    let element = Element::Edge(e);
    match cx.lookup(element) {
        Some(ClassRecord::Hit(_)) | Some(ClassRecord::SubHit) => return Ok(()),
        _ => {}
    }

    let point = cx.ray.at(dist);
    trace!(?e, dist, "edge hit");
    let st = edge_transition(cx, e)?;
    cx.record_hit(HitPoint {
        element,
        dist,
        point,
        in_out: st.transition,
        inbound_norm: st.inbound_norm,
        outbound_norm: st.outbound_norm,
        inbound_use: st.inbound_use,
        outbound_use: st.outbound_use,
        segment: None,
    });
    Ok(())
}

pub(crate) struct EdgeTransition {
    pub transition: Transition,
    pub inbound_norm: Vec3,
    pub outbound_norm: Vec3,
    pub inbound_use: Option<Element>,
    pub outbound_use: Option<Element>,
}

/// The in/out state machine for an interior edge hit.
///
/// Over every 2-manifold face of the traversed shell sharing the edge,
/// the cosine of the face's left vector against the ray direction is
/// computed; the smallest cosine selects the face bounding the inbound
/// side, the largest the outbound side. Among the faces fanning around a
/// non-manifold edge this picks the two that actually bound the solid as
/// seen along this ray. An edge with no participating faces is a wire:
/// its touch carries no in/out information.
pub(crate) fn edge_transition(cx: &RayContext<'_>, e: EdgeId) -> Result<EdgeTransition> {
    let topo = cx.topo;
    let dir = cx.ray.direction.into_inner();

    let mut inb: Option<(f64, &EdgeUse, Point2)> = None;
    let mut outb: Option<(f64, &EdgeUse, Point2)> = None;

    for use_ in &topo.edges[e].uses {
        if topo.faces[use_.face].shell != cx.shell || !cx.manifolds.is_two_manifold(use_.face) {
            continue;
        }
        let uv = edge_use_uv(topo, use_, e);
        let de = kestrel_topo::DirectedEdge {
            edge: e,
            forward: use_.forward,
        };
        let Some(left) = topo.edge_use_left(use_.face, &de, uv) else {
            continue;
        };
        let cos = left.dot(&dir);
        if inb.as_ref().map_or(true, |(c, _, _)| cos < *c) {
            inb = Some((cos, use_, uv));
        }
        if outb.as_ref().map_or(true, |(c, _, _)| cos > *c) {
            outb = Some((cos, use_, uv));
        }
    }

    let (Some((_, inb_use, inb_uv)), Some((_, outb_use, outb_uv))) = (inb, outb) else {
        trace!(?e, "wire edge, any/any");
        return Ok(EdgeTransition {
            transition: Transition::AnyAny,
            inbound_norm: Vec3::zeros(),
            outbound_norm: Vec3::zeros(),
            inbound_use: Some(Element::Edge(e)),
            outbound_use: Some(Element::Edge(e)),
        });
    };

    let inb_norm = topo
        .face_outward_normal(inb_use.face, inb_uv)
        .ok_or(CastError::ZeroNormal { face: inb_use.face })?
        .into_inner();
    let outb_norm = topo
        .face_outward_normal(outb_use.face, outb_uv)
        .ok_or(CastError::ZeroNormal {
            face: outb_use.face,
        })?
        .into_inner();

    let cos = inb_norm.dot(&dir);
    let inbound = if cx.tol.near_perpendicular(cos) {
        RayState::On
    } else if cos < 0.0 {
        RayState::Outside
    } else {
        RayState::Inside
    };

    let cos = outb_norm.dot(&dir);
    let outbound = if cx.tol.near_perpendicular(cos) {
        RayState::On
    } else if cos > 0.0 {
        RayState::Outside
    } else {
        RayState::Inside
    };

    let transition = Transition::new(inbound, outbound);
    let (in_el, out_el) = (
        Element::Face(inb_use.face),
        Element::Face(outb_use.face),
    );
    // Double touches retain both deciding faces; single touches retain
    // the face on the deciding side.
    let (inbound_use, outbound_use) = if transition.is_double_touch() {
        (Some(in_el), Some(out_el))
    } else {
        match transition {
            Transition::InOut | Transition::OnOut => (Some(out_el), Some(out_el)),
            _ => (Some(in_el), Some(in_el)),
        }
    };

    Ok(EdgeTransition {
        transition,
        inbound_norm: inb_norm,
        outbound_norm: outb_norm,
        inbound_use,
        outbound_use,
    })
}

/// UV of an edge's start within the loop that uses it, for normals on
/// curved carriers.
fn edge_use_uv(topo: &Topology, use_: &EdgeUse, e: EdgeId) -> Point2 {
    let lp = &topo.loops[use_.loop_id];
    lp.edges
        .iter()
        .position(|de| de.edge == e)
        .and_then(|k| topo.loop_uv_at(use_.loop_id, k))
        .unwrap_or_else(Point2::origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ray::Ray;
    use crate::record::SegmentRole;
    use approx::assert_relative_eq;
    use kestrel_math::{Point3, Tolerance};
    use kestrel_primitives::make_cube;
    use kestrel_topo::Manifolds;

    fn edge_between(topo: &Topology, a: Point3, b: Point3) -> EdgeId {
        topo.edges
            .iter()
            .find(|(_, edge)| {
                let (pa, pb) = (
                    topo.vertices[edge.start].point,
                    topo.vertices[edge.end].point,
                );
                (pa == a && pb == b) || (pa == b && pb == a)
            })
            .map(|(id, _)| id)
            .unwrap()
    }

    fn unit_cube() -> (kestrel_primitives::Solid, Manifolds) {
        let cube = make_cube(1.0, 1.0, 1.0);
        let manifolds = Manifolds::compute(&cube.topology);
        (cube, manifolds)
    }

    #[test]
    fn test_transversal_crossing_grazes_bottom() {
        let (cube, manifolds) = unit_cube();
        // Crosses the bottom-front edge at (0.5, 0, 0), then continues in
        // the plane of the bottom face.
        let ray = Ray::new(Point3::new(0.5, -1.0, 0.0), Vec3::y());
        let mut cx = RayContext::new(&cube.topology, &manifolds, ray, Tolerance::DEFAULT);
        cx.shell = cube.shell;

        let front = edge_between(
            &cube.topology,
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        );
        let back = edge_between(
            &cube.topology,
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        );

        isect_ray_edge(&mut cx, front).unwrap();
        isect_ray_edge(&mut cx, back).unwrap();

        let hits = cx.hit_points();
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0].dist, 1.0, epsilon = 1e-10);
        assert_eq!(hits[0].in_out, Transition::OutOn);
        assert_relative_eq!(hits[1].dist, 2.0, epsilon = 1e-10);
        assert_eq!(hits[1].in_out, Transition::OnOut);
    }

    #[test]
    fn test_crossing_into_solid_enters() {
        let (cube, manifolds) = unit_cube();
        // Through the top-right edge at (1, 0.5, 1), cutting into the
        // solid.
        let ray = Ray::new(Point3::new(2.0, 0.5, 2.0), Vec3::new(-1.0, 0.0, -1.0));
        let mut cx = RayContext::new(&cube.topology, &manifolds, ray, Tolerance::DEFAULT);
        cx.shell = cube.shell;

        let edge = edge_between(
            &cube.topology,
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        );
        isect_ray_edge(&mut cx, edge).unwrap();

        let hits = cx.hit_points();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].in_out, Transition::OutIn);
    }

    #[test]
    fn test_grazing_edge_stays_outside() {
        let (cube, manifolds) = unit_cube();
        // Through the top-right edge, but deflecting away from the solid.
        let ray = Ray::new(Point3::new(2.0, 0.5, 0.0), Vec3::new(-1.0, 0.0, 1.0));
        let mut cx = RayContext::new(&cube.topology, &manifolds, ray, Tolerance::DEFAULT);
        cx.shell = cube.shell;

        let edge = edge_between(
            &cube.topology,
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        );
        isect_ray_edge(&mut cx, edge).unwrap();

        let hits = cx.hit_points();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].in_out, Transition::OutOut);
    }

    #[test]
    fn test_colinear_ray_links_enter_leave() {
        let (cube, manifolds) = unit_cube();
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vec3::z());
        let mut cx = RayContext::new(&cube.topology, &manifolds, ray, Tolerance::DEFAULT);
        cx.shell = cube.shell;

        let edge = edge_between(
            &cube.topology,
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        );
        isect_ray_edge(&mut cx, edge).unwrap();

        assert!(matches!(
            cx.lookup(Element::Edge(edge)),
            Some(ClassRecord::SubHit)
        ));
        let hits = cx.hit_points();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].segment, Some(SegmentRole::Enter));
        assert_eq!(hits[1].segment, Some(SegmentRole::Leave));
        assert!(hits[0].dist < hits[1].dist);
    }

    #[test]
    fn test_endpoint_touch_defers_to_vertex() {
        let (cube, manifolds) = unit_cube();
        // Crosses the bottom-front edge exactly at its start vertex.
        let ray = Ray::new(Point3::new(0.0, -1.0, 0.0), Vec3::y());
        let mut cx = RayContext::new(&cube.topology, &manifolds, ray, Tolerance::DEFAULT);
        cx.shell = cube.shell;

        let edge = edge_between(
            &cube.topology,
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        );
        isect_ray_edge(&mut cx, edge).unwrap();

        assert!(matches!(
            cx.lookup(Element::Edge(edge)),
            Some(ClassRecord::SubHit)
        ));
        assert_eq!(cx.hit_points().len(), 1);
        assert!(matches!(cx.hit_points()[0].element, Element::Vertex(_)));
    }

    #[test]
    fn test_plain_miss_records_edge_and_vertices() {
        let (cube, manifolds) = unit_cube();
        let ray = Ray::new(Point3::new(0.5, -1.0, 5.0), Vec3::y());
        let mut cx = RayContext::new(&cube.topology, &manifolds, ray, Tolerance::DEFAULT);
        cx.shell = cube.shell;

        let edge = edge_between(
            &cube.topology,
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        );
        isect_ray_edge(&mut cx, edge).unwrap();

        assert!(matches!(
            cx.lookup(Element::Edge(edge)),
            Some(ClassRecord::Miss)
        ));
        assert!(cx.hit_points().is_empty());
        assert_eq!(cx.misses().len(), 3);
    }

    #[test]
    fn test_wire_edge_is_any_any() {
        let mut topo = Topology::new();
        let shell = topo.add_shell();
        let a = topo.add_vertex(Point3::new(0.0, -1.0, 0.0));
        let b = topo.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let wire = topo.add_wire_edge(shell, a, b);
        let manifolds = Manifolds::compute(&topo);

        let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vec3::x());
        let mut cx = RayContext::new(&topo, &manifolds, ray, Tolerance::DEFAULT);
        cx.shell = shell;

        isect_ray_edge(&mut cx, wire).unwrap();
        let hits = cx.hit_points();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].in_out, Transition::AnyAny);
    }

    #[test]
    fn test_zero_length_edge_delegates() {
        let mut topo = Topology::new();
        let shell = topo.add_shell();
        let a = topo.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let degenerate = topo.add_wire_edge(shell, a, a);
        let manifolds = Manifolds::compute(&topo);

        let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vec3::x());
        let mut cx = RayContext::new(&topo, &manifolds, ray, Tolerance::DEFAULT);
        cx.shell = shell;

        isect_ray_edge(&mut cx, degenerate).unwrap();
        assert!(matches!(
            cx.lookup(Element::Edge(degenerate)),
            Some(ClassRecord::SubHit)
        ));
        assert_eq!(cx.hit_points().len(), 1);
    }
}
