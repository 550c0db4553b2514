//! Ray/face intersection for planar and patch-grid carriers.

use tracing::trace;

use crate::context::RayContext;
use crate::edge::isect_ray_edge;
use crate::error::{CastError, Result};
use crate::record::{Element, HitPoint};
use crate::state::Transition;
use crate::vertex::ray_hit_vertex;
use kestrel_geom::{
    line_plane_intersection, point_in_polygon_even_odd, point_segment_proximity, PatchGrid, Plane,
    SegmentZone,
};
use kestrel_math::{Point2, Point3};
use kestrel_topo::{FaceId, FaceSurface};

/// Intersect the ray with one face, recording the outcome in the ledger.
///
/// A candidate point on the carrier is first tested against the face's
/// loop structure: within tolerance of a boundary edge or vertex the face
/// defers entirely to that sub-element's record; inside the trimming
/// loops it becomes a face hit whose transition comes from the face's own
/// orientation. The face's loop edges are swept afterwards so grazing
/// contacts away from the carrier-piercing point are still recorded.
pub(crate) fn isect_ray_face(cx: &mut RayContext<'_>, f: FaceId) -> Result<()> {
    if cx.lookup(Element::Face(f)).is_some() {
        return Ok(());
    }
    let topo = cx.topo;
    match &topo.faces[f].surface {
        FaceSurface::Plane(plane) => isect_planar_face(cx, f, plane),
        FaceSurface::Patch(grid) => isect_patch_face(cx, f, grid),
    }
}

fn isect_planar_face(cx: &mut RayContext<'_>, f: FaceId, plane: &Plane) -> Result<()> {
    let element = Element::Face(f);

    let Some(t) = line_plane_intersection(&cx.ray.origin, &cx.ray.direction, plane) else {
        trace!(?f, "ray parallel to face plane");
        cx.record_miss(element);
        return Ok(());
    };
    let point = cx.ray.at(t);
    if !cx.topo.faces[f]
        .aabb
        .expanded(cx.tol.linear)
        .contains_point(&point, 0.0)
    {
        trace!(?f, "plane point outside face box");
        cx.record_miss(element);
        return Ok(());
    }

    let uv = plane.project(&point);
    match classify_face_point(cx, f, &point, uv)? {
        LoopClass::Boundary => cx.record_sub_hit(element),
        LoopClass::Exterior => cx.record_miss(element),
        LoopClass::Interior => {
            let hit = face_hit_point(cx, f, t, point, uv)?;
            cx.record_hit(hit);
        }
    }

    sweep_face_edges(cx, f)
}

fn isect_patch_face(cx: &mut RayContext<'_>, f: FaceId, grid: &PatchGrid) -> Result<()> {
    let element = Element::Face(f);

    if cx
        .ray
        .clip_to_aabb(&cx.topo.faces[f].aabb.expanded(cx.tol.linear))
        .is_none()
    {
        cx.record_miss(element);
        return Ok(());
    }

    // A curved face can cross the carrier line more than once; every
    // accepted crossing enters the hit list, the ledger keeps the first.
    let mut touched = false;
    for (t, uv) in grid.line_intersections(&cx.ray.origin, &cx.ray.direction) {
        let point = cx.ray.at(t);
        match classify_face_point(cx, f, &point, uv)? {
            LoopClass::Boundary => {
                touched = true;
                cx.record_sub_hit(element);
            }
            LoopClass::Exterior => {}
            LoopClass::Interior => {
                touched = true;
                let hit = face_hit_point(cx, f, t, point, uv)?;
                if !cx.record_hit(hit.clone()) {
                    cx.push_extra_hit(hit);
                }
            }
        }
    }
    if !touched {
        cx.record_miss(element);
    }

    sweep_face_edges(cx, f)
}

enum LoopClass {
    /// Within tolerance of a boundary edge or vertex; the sub-element's
    /// hit has been recorded.
    Boundary,
    /// Inside the outer loop and outside every inner loop.
    Interior,
    /// Outside the trimmed region.
    Exterior,
}

/// Classify a carrier point against the face's loop structure, recording
/// sub-element hits for boundary contacts as a side effect.
fn classify_face_point(
    cx: &mut RayContext<'_>,
    f: FaceId,
    point: &Point3,
    uv: Point2,
) -> Result<LoopClass> {
    let topo = cx.topo;
    let face = &topo.faces[f];
    let mut loops = vec![face.outer_loop];
    loops.extend_from_slice(&face.inner_loops);

    let mut boundary = false;
    for &loop_id in &loops {
        for de in &topo.loops[loop_id].edges {
            let (a, b) = topo.edge_points(de.edge);
            match point_segment_proximity(point, &a, &b, &cx.tol).zone {
                SegmentZone::AtStart => {
                    ray_hit_vertex(cx, topo.edges[de.edge].start);
                    boundary = true;
                }
                SegmentZone::AtEnd => {
                    ray_hit_vertex(cx, topo.edges[de.edge].end);
                    boundary = true;
                }
                SegmentZone::OnSegment => {
                    isect_ray_edge(cx, de.edge)?;
                    boundary = true;
                }
                _ => {}
            }
        }
    }
    if boundary {
        return Ok(LoopClass::Boundary);
    }

    if !point_in_polygon_even_odd(&uv, &topo.loops[face.outer_loop].uvs) {
        return Ok(LoopClass::Exterior);
    }
    for &inner in &face.inner_loops {
        if point_in_polygon_even_odd(&uv, &topo.loops[inner].uvs) {
            return Ok(LoopClass::Exterior);
        }
    }
    Ok(LoopClass::Interior)
}

/// Build the hit record for a genuine interior face hit.
///
/// There is no second face as with edges: one side of the touch is the
/// face's front, the other its back, so the outward normal against the
/// ray direction decides the transition. A ray lying in the carrier
/// within the perpendicularity tolerance yet piercing the loop interior
/// is a consistency violation.
fn face_hit_point(
    cx: &RayContext<'_>,
    f: FaceId,
    dist: f64,
    point: Point3,
    uv: Point2,
) -> Result<HitPoint> {
    let element = Element::Face(f);
    let n = cx
        .topo
        .face_outward_normal(f, uv)
        .ok_or(CastError::ZeroNormal { face: f })?
        .into_inner();
    let dir = cx.ray.direction.into_inner();
    let cos = n.dot(&dir);

    if !cx.manifolds.is_two_manifold(f) {
        // Dangling face: bounds no volume, normals split by approach
        // side.
        let (inbound_norm, outbound_norm) = if cos < cx.tol.perp { (n, -n) } else { (-n, n) };
        trace!(?f, dist, "non-manifold face touch");
        return Ok(HitPoint {
            element,
            dist,
            point,
            in_out: Transition::AnyAny,
            inbound_norm,
            outbound_norm,
            inbound_use: Some(element),
            outbound_use: Some(element),
            segment: None,
        });
    }

    if cx.tol.near_perpendicular(cos) {
        return Err(CastError::RayInFacePlane { face: f });
    }
    let in_out = if cos > 0.0 {
        Transition::InOut
    } else {
        Transition::OutIn
    };
    trace!(?f, dist, transition = %in_out, "face hit");
    Ok(HitPoint {
        element,
        dist,
        point,
        in_out,
        inbound_norm: n,
        outbound_norm: n,
        inbound_use: Some(element),
        outbound_use: Some(element),
        segment: None,
    })
}

fn sweep_face_edges(cx: &mut RayContext<'_>, f: FaceId) -> Result<()> {
    let topo = cx.topo;
    let face = &topo.faces[f];
    let mut loops = vec![face.outer_loop];
    loops.extend_from_slice(&face.inner_loops);
    for loop_id in loops {
        for de in &topo.loops[loop_id].edges {
            isect_ray_edge(cx, de.edge)?;
        }
    }
    Ok(())
}
