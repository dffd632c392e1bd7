//! Convex hull descriptors for simple collision

use crate::foundation::math::Vec3;
use crate::mesh::{MeshError, MeshResult};
use crate::scene::AABB;

/// Minimum number of points for a convex volume
pub const MIN_HULL_POINTS: usize = 4;

/// One convex hull element
///
/// Points are stored as given; non-coplanarity is the caller's responsibility.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexElem {
    vertices: Vec<Vec3>,
    elem_box: AABB,
}

impl ConvexElem {
    /// Build a hull from a point set, rejecting fewer than [`MIN_HULL_POINTS`] points
    pub fn new(points: &[Vec3]) -> MeshResult<Self> {
        if points.len() < MIN_HULL_POINTS {
            return Err(MeshError::TooFewHullPoints(points.len()));
        }
        Ok(Self {
            vertices: points.to_vec(),
            elem_box: AABB::from_points(points.iter().copied()),
        })
    }

    /// Hull points
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Bounding box of the hull points
    pub fn elem_box(&self) -> &AABB {
        &self.elem_box
    }
}
