//! Ray representation and box clipping.

use kestrel_geom::Aabb3;
use kestrel_math::{Dir3, Point3, Vec3};

/// A ray in 3D space defined by origin and unit direction.
///
/// Intersection and classification treat the ray's carrier line as
/// infinite in both directions; the signed distance distinguishes the
/// sides. Direction reciprocals are precomputed for slab tests.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    inv_direction: Vec3,
    sign: [usize; 3],
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let dir = Dir3::new_normalize(direction);
        let inv = Vec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let sign = [
            if inv.x < 0.0 { 1 } else { 0 },
            if inv.y < 0.0 { 1 } else { 0 },
            if inv.z < 0.0 { 1 } else { 0 },
        ];
        Self {
            origin,
            direction: dir,
            inv_direction: inv,
            sign,
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Clip the ray's carrier line against an AABB using the slab method.
    ///
    /// Returns `Some((t_min, t_max))` when the line passes through the box;
    /// both parameters may be negative. Returns `None` when the line misses
    /// entirely. Axis-aligned rays are handled through the precomputed
    /// infinite reciprocals.
    #[inline]
    pub fn clip_to_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let bounds = [aabb.min, aabb.max];

        let mut t_min = (bounds[self.sign[0]].x - self.origin.x) * self.inv_direction.x;
        let mut t_max = (bounds[1 - self.sign[0]].x - self.origin.x) * self.inv_direction.x;

        let ty1 = (bounds[self.sign[1]].y - self.origin.y) * self.inv_direction.y;
        let ty2 = (bounds[1 - self.sign[1]].y - self.origin.y) * self.inv_direction.y;

        t_min = t_min.max(ty1);
        t_max = t_max.min(ty2);

        let tz1 = (bounds[self.sign[2]].z - self.origin.z) * self.inv_direction.z;
        let tz2 = (bounds[1 - self.sign[2]].z - self.origin.z) * self.inv_direction.z;

        t_min = t_min.max(tz1);
        t_max = t_max.min(tz2);

        if t_max >= t_min {
            Some((t_min, t_max))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kestrel_math::Point3;

    fn unit_box() -> Aabb3 {
        Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0));
        let p = ray.at(3.0);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clip_hit() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let (t_min, t_max) = ray.clip_to_aabb(&unit_box()).unwrap();
        assert_relative_eq!(t_min, 5.0, epsilon = 1e-10);
        assert_relative_eq!(t_max, 6.0, epsilon = 1e-10);
    }

    #[test]
    fn test_clip_miss() {
        let ray = Ray::new(Point3::new(-5.0, 5.0, 5.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(ray.clip_to_aabb(&unit_box()).is_none());
    }

    #[test]
    fn test_clip_box_behind_origin() {
        // The carrier line runs both ways: a box entirely behind the
        // origin still clips, at negative parameters.
        let ray = Ray::new(Point3::new(5.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let (t_min, t_max) = ray.clip_to_aabb(&unit_box()).unwrap();
        assert_relative_eq!(t_min, -5.0, epsilon = 1e-10);
        assert_relative_eq!(t_max, -4.0, epsilon = 1e-10);
    }

    #[test]
    fn test_clip_origin_inside() {
        let ray = Ray::new(Point3::new(0.5, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let (t_min, t_max) = ray.clip_to_aabb(&unit_box()).unwrap();
        assert!(t_min <= 0.0 && t_max >= 0.0);
        assert_relative_eq!(t_max, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_clip_diagonal() {
        let ray = Ray::new(Point3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(ray.clip_to_aabb(&unit_box()).is_some());
    }
}
