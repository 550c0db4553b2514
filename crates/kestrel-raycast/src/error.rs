//! Error types for ray intersection and classification.

use crate::state::{RayState, Transition};
use kestrel_topo::FaceId;
use thiserror::Error;

/// Fatal consistency violations during ray evaluation.
///
/// These indicate corrupted input topology or a logic defect; the current
/// ray evaluation is aborted loudly rather than propagating silently
/// incorrect geometry. Ambiguity (a parity tie) is NOT an error: it is
/// surfaced as [`crate::Classification::Unknown`] and the caller retries
/// with a different ray direction.
#[derive(Error, Debug)]
pub enum CastError {
    /// The in/out transition chain of a completed hit list does not
    /// alternate consistently.
    #[error("transition chain broken at distance {dist}: ray state was {was:?}, hit transitions {transition}")]
    BrokenTransition {
        /// Distance of the offending hit along the ray.
        dist: f64,
        /// Ray state arriving at the hit.
        was: RayState,
        /// The hit's transition.
        transition: Transition,
    },

    /// A completed hit list does not leave the ray outside the shell.
    #[error("hit list ends in state {0:?}, not outside the shell")]
    OpenEnded(RayState),

    /// An interior face hit whose plane contains the ray direction within
    /// the perpendicularity tolerance.
    #[error("ray lies in the plane of face {face:?} it crosses")]
    RayInFacePlane {
        /// The offending face.
        face: FaceId,
    },

    /// A surface normal degenerated to zero length during classification.
    #[error("zero-length normal on face {face:?}")]
    ZeroNormal {
        /// The offending face.
        face: FaceId,
    },
}

/// Result type for ray evaluation.
pub type Result<T> = std::result::Result<T, CastError>;
