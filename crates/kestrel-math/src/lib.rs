#![warn(missing_docs)]

//! Math types for the kestrel B-rep classification kernel.
//!
//! Thin wrappers around nalgebra providing domain-specific types for the
//! ray/solid classification engine: points, vectors, directions, and the
//! tolerance bundle every geometric comparison threads through.

use nalgebra::{Unit, Vector2, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in 2D parameter space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// Tolerance constants for geometric comparisons.
///
/// `linear` bounds point/point and point/carrier distances, `angular`
/// bounds angle comparisons, and `perp` is the cosine magnitude below
/// which two unit vectors are treated as perpendicular (equivalently, a
/// vector as lying in a plane).
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in model units.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
    /// Cosine threshold for perpendicularity tests.
    pub perp: f64,
}

impl Tolerance {
    /// Default CAD tolerances (1e-6 linear, 1e-9 rad angular, 1e-6 perp).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
        perp: 1e-6,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if two angles are effectively equal (in radians).
    pub fn angles_equal(&self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.angular
    }

    /// Check if a cosine between unit vectors indicates perpendicularity.
    pub fn near_perpendicular(&self, cos_angle: f64) -> bool {
        cos_angle.abs() < self.perp
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
