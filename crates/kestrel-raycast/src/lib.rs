#![warn(missing_docs)]

//! Ray/shell intersection and topological classification for the kestrel
//! B-rep kernel.
//!
//! Given a ray and a shell, this crate finds every point where the ray
//! touches the shell's boundary, classifies each touch as an entry, exit or
//! tangential event, and uses the resulting distance-sorted event sequence
//! to decide whether an arbitrary point lies inside, outside, or on the
//! solid. Exact and near-degenerate configurations (a ray through a vertex,
//! along an edge, tangent to a face) are resolved topologically rather than
//! by perturbation, so repeated evaluation is deterministic.
//!
//! # Architecture
//!
//! - [`Ray`] - ray representation with slab-clipping against boxes
//! - [`RayContext`] - per-ray ledger of hit/miss records, never shared
//! - [`intersect_ray_shell`] / [`intersect_ray_model`] - traversal entry
//!   points producing the sorted hit list
//! - [`classify_point`] / [`classify_ray`] - ray-parity point classification
//! - [`check_transitions`] - consistency oracle over a completed hit list
//!
//! # Example
//!
//! ```ignore
//! use kestrel_raycast::{classify_point, Classification};
//! use kestrel_topo::Manifolds;
//! use kestrel_primitives::make_cube;
//!
//! let cube = make_cube(1.0, 1.0, 1.0);
//! let manifolds = Manifolds::compute(&cube.topology);
//! let class = classify_point(
//!     &cube.topology,
//!     cube.shell,
//!     &Point3::new(0.5, 0.5, 0.5),
//!     Vec3::z(),
//!     false,
//!     Tolerance::DEFAULT,
//!     &manifolds,
//! )?;
//! assert_eq!(class, Classification::Inside);
//! ```

mod classify;
mod context;
mod edge;
mod error;
mod face;
mod neighborhood;
mod ray;
mod record;
mod state;
mod traverse;
mod vertex;

pub use classify::{classify_point, classify_points, classify_ray, Classification};
pub use context::RayContext;
pub use error::{CastError, Result};
pub use ray::Ray;
pub use record::{ClassRecord, Element, HitPoint, SegmentRole};
pub use state::{RayState, Transition};
pub use traverse::{check_transitions, intersect_ray_model, intersect_ray_shell};
