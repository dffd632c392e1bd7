//! Bounding volumes
//!
//! The local box is cached by the mesh component and only recomputed on
//! structural mutation; world bounds are produced on demand by transforming it.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Point3, Transform, Vec3};

/// Axis-Aligned Bounding Box
///
/// The canonical empty box has `min = +inf` and `max = -inf`, so encapsulating
/// the first point yields a degenerate box around that point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::empty()
    }
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The canonical empty/invalid box
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::INFINITY),
            max: Vec3::repeat(f32::NEG_INFINITY),
        }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing every point; empty for an empty iterator
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut aabb = Self::empty();
        for point in points {
            aabb.encapsulate_point(point);
        }
        aabb
    }

    /// True once at least one point has been added
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Grow the box to include a point
    pub fn encapsulate_point(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Grow the box to include another box
    pub fn encapsulate(&mut self, other: &AABB) {
        if other.is_valid() {
            self.encapsulate_point(other.min);
            self.encapsulate_point(other.max);
        }
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// The eight corners, used when transforming the box
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }
}

/// Combined box and sphere bounds, the unit the host scene culls with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSphereBounds {
    /// Center shared by the box and the sphere
    pub origin: Vec3,
    /// Half-size of the box
    pub box_extent: Vec3,
    /// Radius of the bounding sphere
    pub sphere_radius: f32,
}

impl Default for BoxSphereBounds {
    fn default() -> Self {
        Self {
            origin: Vec3::zeros(),
            box_extent: Vec3::zeros(),
            sphere_radius: 0.0,
        }
    }
}

impl BoxSphereBounds {
    /// Bounds enclosing a box; an invalid box yields zero bounds at the origin
    pub fn from_box(aabb: &AABB) -> Self {
        if !aabb.is_valid() {
            return Self::default();
        }
        let box_extent = aabb.extents();
        Self {
            origin: aabb.center(),
            box_extent,
            sphere_radius: box_extent.magnitude(),
        }
    }

    /// The box part as an AABB
    pub fn to_box(&self) -> AABB {
        AABB::from_center_extents(self.origin, self.box_extent)
    }

    /// Transform local bounds into world space
    ///
    /// The box is rebuilt from its transformed corners; the sphere radius is
    /// scaled by the largest axis scale.
    pub fn transform_by(&self, transform: &Transform) -> Self {
        let matrix = transform.to_matrix();
        let world_box = AABB::from_points(
            self.to_box()
                .corners()
                .iter()
                .map(|c| matrix.transform_point(&Point3::from(*c)).coords),
        );
        Self {
            origin: world_box.center(),
            box_extent: world_box.extents(),
            sphere_radius: self.sphere_radius * transform.max_axis_scale(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;

    #[test]
    fn test_aabb_contains_point() {
        let aabb = AABB::new(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
        );

        assert!(aabb.contains_point(Vec3::zeros()));
        assert!(aabb.contains_point(Vec3::new(0.5, 0.5, 0.5)));
        assert!(!aabb.contains_point(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_aabb_intersects() {
        let aabb1 = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let aabb2 = AABB::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        let aabb3 = AABB::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(7.0, 7.0, 7.0));

        assert!(aabb1.intersects(&aabb2));
        assert!(!aabb1.intersects(&aabb3));
    }

    #[test]
    fn test_empty_box_is_invalid_until_encapsulated() {
        let mut aabb = AABB::empty();
        assert!(!aabb.is_valid());

        aabb.encapsulate_point(Vec3::new(1.0, 2.0, 3.0));
        assert!(aabb.is_valid());
        assert_eq!(aabb.min, aabb.max);

        aabb.encapsulate(&AABB::empty());
        assert_eq!(aabb.min, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_empty_box_gives_zero_bounds() {
        let bounds = BoxSphereBounds::from_box(&AABB::empty());
        assert_eq!(bounds, BoxSphereBounds::default());
    }

    #[test]
    fn test_transform_by_translation_and_scale() {
        let local = BoxSphereBounds::from_box(&AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 0.0)));
        let transform = Transform::from_translation(Vec3::new(5.0, 0.0, 0.0))
            .with_scale(Vec3::new(2.0, 2.0, 2.0));

        let world = local.transform_by(&transform);

        assert_relative_eq!(world.origin.x, 6.0);
        assert_relative_eq!(world.origin.y, 1.0);
        assert_relative_eq!(world.box_extent.x, 1.0);
        assert_relative_eq!(world.sphere_radius, local.sphere_radius * 2.0);
    }

    #[test]
    fn test_transform_by_rotation_grows_box() {
        let local = BoxSphereBounds::from_box(&AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)));
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_4);
        let world = local.transform_by(&Transform::from_position_rotation(Vec3::zeros(), rotation));

        assert_relative_eq!(world.box_extent.x, 2.0_f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(world.box_extent.z, 1.0, epsilon = 1e-5);
        assert_relative_eq!(world.sphere_radius, local.sphere_radius, epsilon = 1e-5);
    }
}
