//! Degenerate-case resolution for direct vertex hits.
//!
//! A vertex has no normal, so a ray passing exactly through one cannot be
//! classified from local surface data. Instead, two probe points ("poles")
//! are placed on the ray at the model bounding diagonal's distance from
//! the vertex, one on each side, and every 2-manifold face corner at the
//! vertex is ranked by its distance to each pole. The nearest face's
//! orientation decides that side's ray state.

use tracing::{debug, trace};

use crate::context::RayContext;
use crate::record::Element;
use crate::state::{RayState, Transition};
use kestrel_geom::{point_segment_proximity, SegmentZone};
use kestrel_math::{Point2, Point3, Tolerance, Vec3};
use kestrel_topo::{FaceId, Topology, VertexCorner, VertexId};

/// The resolver's verdict for one vertex hit.
pub(crate) struct PoleResolution {
    pub transition: Transition,
    pub inbound_norm: Vec3,
    pub outbound_norm: Vec3,
    pub inbound_use: Option<Element>,
    pub outbound_use: Option<Element>,
}

/// The winning face for one pole.
struct PoleVote {
    dist: f64,
    /// |cos| of the face normal against the vertex-to-pole direction;
    /// distance ties go to the more decisive vote.
    weight: f64,
    face: FaceId,
    normal: Vec3,
    state: RayState,
}

/// Resolve the in/out transition at a directly-hit vertex.
pub(crate) fn resolve_vertex(cx: &RayContext<'_>, v: VertexId) -> PoleResolution {
    let topo = cx.topo;
    let p = topo.vertices[v].point;
    let dir = cx.ray.direction.into_inner();
    let r = cx.pole_radius;

    // Entry-side and exit-side probes on the conceptual sphere.
    let north = p - r * dir;
    let south = p + r * dir;

    let corners: Vec<VertexCorner> = topo
        .vertex_corners(v)
        .into_iter()
        .filter(|c| {
            topo.faces[c.face].shell == cx.shell && cx.manifolds.is_two_manifold(c.face)
        })
        .collect();

    if corners.is_empty() {
        // Isolated point, or only wire/dangling geometry meets here.
        trace!(?v, "no manifold face corners at vertex, any/any");
        return PoleResolution {
            transition: Transition::AnyAny,
            inbound_norm: -dir,
            outbound_norm: dir,
            inbound_use: None,
            outbound_use: None,
        };
    }

    let mut north_vote: Option<PoleVote> = None;
    let mut south_vote: Option<PoleVote> = None;

    for corner in &corners {
        let uv = corner_uv(topo, corner, v);
        let Some(n) = topo.face_outward_normal(corner.face, uv) else {
            continue;
        };
        let n = n.into_inner();

        // Wedge geometry: sphere points along the two boundary edges at
        // the vertex, and the edge-use left vectors.
        let out_vec = topo.directed_vector(&corner.outgoing);
        let in_vec = topo.directed_vector(&corner.incoming);
        let (out_len, in_len) = (out_vec.norm(), in_vec.norm());
        if out_len < cx.tol.linear || in_len < cx.tol.linear {
            continue;
        }
        let point_a = p + r * (out_vec / out_len);
        let point_b = p - r * (in_vec / in_len);
        let Some(left_a) = topo.edge_use_left(corner.face, &corner.outgoing, uv) else {
            continue;
        };
        let Some(left_b) = topo.edge_use_left(corner.face, &corner.incoming, uv) else {
            continue;
        };

        for (pole, vote) in [(north, &mut north_vote), (south, &mut south_vote)] {
            let prj = pole - (pole - p).dot(&n) * n;
            let dist =
                pole_face_distance(&p, &prj, &pole, &point_a, &left_a, &point_b, &left_b, &cx.tol);

            let to_pole = (pole - p).normalize();
            let cos = n.dot(&to_pole);
            let state = if cx.tol.near_perpendicular(cos) {
                RayState::On
            } else if cos > 0.0 {
                RayState::Outside
            } else {
                RayState::Inside
            };

            let better = match vote.as_ref() {
                None => true,
                Some(best) => {
                    dist < best.dist - cx.tol.linear
                        || ((dist - best.dist).abs() <= cx.tol.linear && cos.abs() > best.weight)
                }
            };
            if better {
                *vote = Some(PoleVote {
                    dist,
                    weight: cos.abs(),
                    face: corner.face,
                    normal: n,
                    state,
                });
            }
        }
    }

    let (Some(north), Some(south)) = (north_vote, south_vote) else {
        return PoleResolution {
            transition: Transition::AnyAny,
            inbound_norm: -dir,
            outbound_norm: dir,
            inbound_use: None,
            outbound_use: None,
        };
    };

    debug!(
        ?v,
        inbound = ?north.state,
        outbound = ?south.state,
        "pole resolution"
    );
    PoleResolution {
        transition: Transition::new(north.state, south.state),
        inbound_norm: north.normal,
        outbound_norm: south.normal,
        inbound_use: Some(Element::Face(north.face)),
        outbound_use: Some(Element::Face(south.face)),
    }
}

/// Distance from a pole to a face corner.
///
/// When the pole's plane projection lies within the corner's angular
/// wedge the projection distance counts; otherwise the distance runs to
/// the closest approach on the nearer of the two wedge edges. A
/// projection beyond both edges is classified against the edge whose
/// left vector it is most outside of.
#[allow(clippy::too_many_arguments)]
fn pole_face_distance(
    vertex: &Point3,
    prj: &Point3,
    pole: &Point3,
    point_a: &Point3,
    left_a: &Vec3,
    point_b: &Point3,
    left_b: &Vec3,
    tol: &Tolerance,
) -> f64 {
    let on_line = |zone: SegmentZone| {
        matches!(
            zone,
            SegmentZone::OnSegment | SegmentZone::AtStart | SegmentZone::AtEnd
        )
    };

    let prox_a = point_segment_proximity(prj, vertex, point_a, tol);
    if on_line(prox_a.zone) {
        return (pole - prj).norm();
    }
    let prox_b = point_segment_proximity(prj, vertex, point_b, tol);
    if on_line(prox_b.zone) {
        return (pole - prj).norm();
    }

    let v_to_prj = prj - vertex;
    match (prox_a.zone, prox_b.zone) {
        (SegmentZone::BeyondStart, SegmentZone::Offside) => {
            if left_b.dot(&v_to_prj) > -f64::EPSILON {
                (pole - prj).norm()
            } else {
                (pole - prox_b.pca).norm()
            }
        }
        (SegmentZone::Offside, SegmentZone::BeyondStart) => {
            if left_a.dot(&v_to_prj) > -f64::EPSILON {
                (pole - prj).norm()
            } else {
                (pole - prox_a.pca).norm()
            }
        }
        (SegmentZone::Offside, SegmentZone::Offside) => {
            let (left, pca) = if prox_a.dist < prox_b.dist {
                (left_a, prox_a.pca)
            } else {
                (left_b, prox_b.pca)
            };
            if left.dot(&v_to_prj) > -f64::EPSILON {
                (pole - prj).norm()
            } else {
                (pole - pca).norm()
            }
        }
        (SegmentZone::BeyondStart, SegmentZone::BeyondStart) => {
            let dot = left_a.dot(&v_to_prj).min(left_b.dot(&v_to_prj));
            if dot > -f64::EPSILON {
                (pole - prj).norm()
            } else {
                (pole - vertex).norm()
            }
        }
        _ => (pole - prox_a.pca).norm().min((pole - prox_b.pca).norm()),
    }
}

/// UV of a corner's vertex in its face's parameter space.
fn corner_uv(topo: &Topology, corner: &VertexCorner, v: VertexId) -> Point2 {
    let lp = &topo.loops[corner.loop_id];
    lp.edges
        .iter()
        .position(|de| *de == corner.outgoing && topo.directed_start(de) == v)
        .and_then(|k| topo.loop_uv_at(corner.loop_id, k))
        .unwrap_or_else(Point2::origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ray::Ray;
    use kestrel_primitives::{make_cube, make_patch_sheet};
    use kestrel_topo::Manifolds;

    fn corner_of(topo: &Topology, p: Point3) -> VertexId {
        topo.vertices
            .iter()
            .find(|(_, vx)| vx.point == p)
            .map(|(id, _)| id)
            .unwrap()
    }

    fn context<'a>(
        topo: &'a Topology,
        manifolds: &'a Manifolds,
        shell: kestrel_topo::ShellId,
        origin: Point3,
        dir: Vec3,
    ) -> RayContext<'a> {
        let mut cx = RayContext::new(topo, manifolds, Ray::new(origin, dir), Tolerance::DEFAULT);
        cx.shell = shell;
        cx
    }

    #[test]
    fn test_diagonal_through_corner_enters() {
        let cube = make_cube(1.0, 1.0, 1.0);
        let manifolds = Manifolds::compute(&cube.topology);
        let cx = context(
            &cube.topology,
            &manifolds,
            cube.shell,
            Point3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
        );

        let near = corner_of(&cube.topology, Point3::origin());
        let far = corner_of(&cube.topology, Point3::new(1.0, 1.0, 1.0));

        assert_eq!(resolve_vertex(&cx, near).transition, Transition::OutIn);
        assert_eq!(resolve_vertex(&cx, far).transition, Transition::InOut);
    }

    #[test]
    fn test_ray_along_cube_edge_grazes() {
        let cube = make_cube(1.0, 1.0, 1.0);
        let manifolds = Manifolds::compute(&cube.topology);
        // Up the x=0, y=0 edge.
        let cx = context(
            &cube.topology,
            &manifolds,
            cube.shell,
            Point3::new(0.0, 0.0, -5.0),
            Vec3::z(),
        );

        let bottom = corner_of(&cube.topology, Point3::origin());
        let top = corner_of(&cube.topology, Point3::new(0.0, 0.0, 1.0));

        // Before the bottom corner the ray is outside; between the two it
        // runs along the boundary.
        assert_eq!(resolve_vertex(&cx, bottom).transition, Transition::OutOn);
        assert_eq!(resolve_vertex(&cx, top).transition, Transition::OnOut);
    }

    #[test]
    fn test_corner_exit_reverses_with_ray() {
        let cube = make_cube(1.0, 1.0, 1.0);
        let manifolds = Manifolds::compute(&cube.topology);
        let cx = context(
            &cube.topology,
            &manifolds,
            cube.shell,
            Point3::new(2.0, 2.0, 2.0),
            Vec3::new(-1.0, -1.0, -1.0),
        );

        let near = corner_of(&cube.topology, Point3::new(1.0, 1.0, 1.0));
        let res = resolve_vertex(&cx, near);
        assert_eq!(res.transition, Transition::OutIn);
        assert!(res.inbound_use.is_some());
        assert!(res.outbound_use.is_some());
    }

    #[test]
    fn test_isolated_vertex_is_any_any() {
        let mut topo = Topology::new();
        let shell = topo.add_shell();
        let v = topo.add_vertex(Point3::new(1.0, 2.0, 3.0));
        topo.add_isolated_vertex(shell, v);
        let manifolds = Manifolds::compute(&topo);
        let cx = context(&topo, &manifolds, shell, Point3::origin(), Vec3::x());

        let res = resolve_vertex(&cx, v);
        assert_eq!(res.transition, Transition::AnyAny);
        assert!(res.inbound_use.is_none());
    }

    #[test]
    fn test_open_sheet_rim_vertex_is_any_any() {
        let sheet = make_patch_sheet(2.0, 0.5);
        let manifolds = Manifolds::compute(&sheet.topology);
        let cx = context(
            &sheet.topology,
            &manifolds,
            sheet.shell,
            Point3::new(0.0, 0.0, -5.0),
            Vec3::z(),
        );

        // The sheet's single face is not 2-manifold, so its corners carry
        // no in/out vote.
        let rim = corner_of(&sheet.topology, Point3::origin());
        assert_eq!(resolve_vertex(&cx, rim).transition, Transition::AnyAny);
    }
}
