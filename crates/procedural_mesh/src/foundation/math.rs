//! Math utilities and types
//!
//! Provides the vector, matrix and transform types shared by the section
//! store, the bounds engine, the collision synchronizer and the scene proxy.

pub use nalgebra::{Vector3, Matrix4, Quaternion, Unit};
use serde::{Deserialize, Serialize};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform from a translation vector
    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Builder-style scale override
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        self.to_matrix().transform_point(&point)
    }

    /// Largest absolute scale factor, used to scale bounding spheres
    pub fn max_axis_scale(&self) -> f32 {
        self.scale.x.abs().max(self.scale.y.abs()).max(self.scale.z.abs())
    }

    /// Determinant of the linear part; negative means the transform mirrors geometry
    pub fn determinant(&self) -> f32 {
        self.scale.x * self.scale.y * self.scale.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_point_applies_scale_then_translation() {
        let transform = Transform::from_translation(Vec3::new(10.0, 0.0, 0.0))
            .with_scale(Vec3::new(2.0, 2.0, 2.0));
        let p = transform.transform_point(Point3::new(1.0, 1.0, 1.0));

        assert_relative_eq!(p.x, 12.0);
        assert_relative_eq!(p.y, 2.0);
        assert_relative_eq!(p.z, 2.0);
    }

    #[test]
    fn test_negative_scale_flips_determinant() {
        let mirrored = Transform::identity().with_scale(Vec3::new(-1.0, 1.0, 1.0));
        assert!(mirrored.determinant() < 0.0);
        assert_relative_eq!(mirrored.max_axis_scale(), 1.0);
    }
}
