//! Shell and model traversal, and the hit-list consistency oracle.

use tracing::{debug, trace};

use crate::context::RayContext;
use crate::edge::isect_ray_edge;
use crate::error::{CastError, Result};
use crate::face::isect_ray_face;
use crate::ray::Ray;
use crate::record::HitPoint;
use crate::state::RayState;
use crate::vertex::isect_ray_vertex;
use kestrel_math::Tolerance;
use kestrel_topo::{Manifolds, ShellId, Topology};

/// Intersect a ray with one shell, returning every boundary touch sorted
/// by ascending signed distance along the ray.
///
/// Faces are visited first (each behind its own bounding-box cull), then
/// wire loops, wire edges and isolated vertices, so mixed face/wire
/// content is fully covered; the ledger's idempotence guarantees nothing
/// is double-processed.
pub fn intersect_ray_shell(
    topo: &Topology,
    shell: ShellId,
    ray: Ray,
    tol: Tolerance,
    manifolds: &Manifolds,
) -> Result<Vec<HitPoint>> {
    let mut cx = RayContext::new(topo, manifolds, ray, tol);
    isect_shell(&mut cx, shell)?;
    Ok(cx.into_hits())
}

/// Intersect a ray with every shell of a model, sharing one ledger so
/// elements reachable from several shells classify once.
pub fn intersect_ray_model(
    topo: &Topology,
    ray: Ray,
    tol: Tolerance,
    manifolds: &Manifolds,
) -> Result<Vec<HitPoint>> {
    let mut cx = RayContext::new(topo, manifolds, ray, tol);
    if cx.ray().clip_to_aabb(&topo.model_aabb().expanded(tol.linear)).is_none() {
        return Ok(Vec::new());
    }
    let shells: Vec<ShellId> = topo.shells.keys().collect();
    for shell in shells {
        isect_shell(&mut cx, shell)?;
    }
    Ok(cx.into_hits())
}

pub(crate) fn isect_shell(cx: &mut RayContext<'_>, shell: ShellId) -> Result<()> {
    let topo = cx.topo;
    let shell_data = &topo.shells[shell];

    if cx
        .ray
        .clip_to_aabb(&shell_data.aabb.expanded(cx.tol.linear))
        .is_none()
    {
        trace!(?shell, "shell box culled");
        return Ok(());
    }
    debug!(?shell, "traversing shell");
    cx.shell = shell;

    for &f in &shell_data.faces {
        isect_ray_face(cx, f)?;
    }
    for &loop_id in &shell_data.wire_loops {
        for de in &topo.loops[loop_id].edges {
            isect_ray_edge(cx, de.edge)?;
        }
    }
    for &e in &shell_data.wire_edges {
        isect_ray_edge(cx, e)?;
    }
    for &v in &shell_data.isolated_vertices {
        isect_ray_vertex(cx, v);
    }
    Ok(())
}

/// Walk a completed, distance-sorted hit list and verify its in/out
/// transition chain: skipping non-manifold touches, each hit's inbound
/// state must equal the previous hit's outbound state, and the chain must
/// start and end in the outside state.
///
/// A mismatch indicates corrupted input topology or a logic defect and is
/// reported as a fatal error rather than silently propagated.
pub fn check_transitions(hits: &[HitPoint]) -> Result<()> {
    let mut state = RayState::Outside;
    for hit in hits {
        let Some(inbound) = hit.in_out.inbound() else {
            continue;
        };
        if inbound != state {
            return Err(CastError::BrokenTransition {
                dist: hit.dist,
                was: state,
                transition: hit.in_out,
            });
        }
        // inbound() and outbound() are both present except for AnyAny.
        state = hit.in_out.outbound().unwrap_or(state);
    }
    if state != RayState::Outside {
        return Err(CastError::OpenEnded(state));
    }
    Ok(())
}
