//! Ray-parity point classification.

use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::ray::Ray;
use crate::record::HitPoint;
use crate::state::RayState;
use crate::traverse::{check_transitions, intersect_ray_shell};
use kestrel_math::{Point3, Tolerance, Vec3};
use kestrel_topo::{Manifolds, ShellId, Topology};

/// Verdict of classifying a point against a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The point lies in solid material.
    Inside,
    /// The point lies in empty space.
    Outside,
    /// The point lies on the boundary surface.
    On,
    /// The two parity scans disagreed or tied; retry with a different
    /// ray direction.
    Unknown,
}

/// Classify a ray's origin against a shell.
///
/// The completed hit list is scanned twice, independently: the positive
/// scan reads the nearest non-negative hit's inbound state, the negative
/// scan the nearest non-positive hit's outbound state. Non-manifold
/// touches carry no information and are skipped. A coincident-distance
/// tie with conflicting states on either side, or disagreement between
/// the two scans, yields [`Classification::Unknown`]; picking the retry
/// direction is the caller's business. With `in_or_out_only` set, On
/// verdicts are suppressed by excluding hits within tolerance of the
/// origin.
pub fn classify_ray(
    topo: &Topology,
    shell: ShellId,
    ray: Ray,
    in_or_out_only: bool,
    tol: Tolerance,
    manifolds: &Manifolds,
) -> Result<Classification> {
    let hits = intersect_ray_shell(topo, shell, ray, tol, manifolds)?;
    check_transitions(&hits)?;

    let plus = scan_side(hits.iter(), &tol, in_or_out_only, true);
    let minus = scan_side(hits.iter().rev(), &tol, in_or_out_only, false);
    debug!(?plus, ?minus, "parity scans");

    Ok(match (plus, minus) {
        (Classification::Unknown, _) | (_, Classification::Unknown) => Classification::Unknown,
        (p, m) if p == m => p,
        _ => Classification::Unknown,
    })
}

/// Classify an arbitrary point against a shell by firing a ray from it in
/// `direction`.
pub fn classify_point(
    topo: &Topology,
    shell: ShellId,
    point: &Point3,
    direction: Vec3,
    in_or_out_only: bool,
    tol: Tolerance,
    manifolds: &Manifolds,
) -> Result<Classification> {
    classify_ray(
        topo,
        shell,
        Ray::new(*point, direction),
        in_or_out_only,
        tol,
        manifolds,
    )
}

/// Classify a batch of points in parallel, one independent ray context
/// per point.
pub fn classify_points(
    topo: &Topology,
    shell: ShellId,
    points: &[Point3],
    direction: Vec3,
    in_or_out_only: bool,
    tol: Tolerance,
    manifolds: &Manifolds,
) -> Result<Vec<Classification>> {
    points
        .par_iter()
        .map(|p| classify_point(topo, shell, p, direction, in_or_out_only, tol, manifolds))
        .collect()
}

/// One parity scan over hits ordered near-to-far on its half-line.
///
/// `forward` selects the positive half-line (reading inbound states) as
/// opposed to the negative one (reading outbound states).
fn scan_side<'a>(
    hits: impl Iterator<Item = &'a HitPoint>,
    tol: &Tolerance,
    in_or_out_only: bool,
    forward: bool,
) -> Classification {
    let mut nearest: Option<(f64, RayState)> = None;

    for hit in hits {
        // A hit at the origin itself clinches the verdict.
        if !in_or_out_only && tol.is_zero(hit.dist) {
            return Classification::On;
        }
        let kept = if forward {
            if in_or_out_only {
                hit.dist > tol.linear
            } else {
                hit.dist > -tol.linear
            }
        } else if in_or_out_only {
            hit.dist < -tol.linear
        } else {
            hit.dist < tol.linear
        };
        if !kept {
            continue;
        }
        let state = if forward {
            hit.in_out.inbound()
        } else {
            hit.in_out.outbound()
        };
        let Some(state) = state else {
            continue; // non-manifold touch
        };

        match nearest {
            None => nearest = Some((hit.dist, state)),
            Some((dist, best)) => {
                if (hit.dist - dist).abs() <= tol.linear {
                    if state != best {
                        return Classification::Unknown;
                    }
                } else {
                    break;
                }
            }
        }
    }

    match nearest {
        None => Classification::Outside,
        Some((_, RayState::Inside)) => Classification::Inside,
        Some((_, RayState::Outside)) => Classification::Outside,
        Some((_, RayState::On)) => Classification::On,
    }
}
