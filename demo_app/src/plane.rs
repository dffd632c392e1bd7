//! Subdivided plane generator

use procedural_mesh::prelude::Vec3;

/// A flat grid in the XY plane, ready to hand to a mesh section
#[derive(Debug, Clone)]
pub struct PlaneGrid {
    /// Row-major vertex positions, `(subdivisions + 1)^2` of them
    pub vertices: Vec<Vec3>,
    /// Two triangles per cell
    pub triangles: Vec<i32>,
    subdivisions: usize,
}

impl PlaneGrid {
    /// Square grid of side `size` with its minimum corner at `origin`
    pub fn new(origin: Vec3, size: f32, subdivisions: usize) -> Self {
        let subdivisions = subdivisions.max(1);
        let row = subdivisions + 1;
        let step = size / subdivisions as f32;

        let mut vertices = Vec::with_capacity(row * row);
        for y in 0..row {
            for x in 0..row {
                vertices.push(origin + Vec3::new(x as f32 * step, y as f32 * step, 0.0));
            }
        }

        let mut triangles = Vec::with_capacity(subdivisions * subdivisions * 6);
        let n = subdivisions as i32;
        for y in 0..n {
            for x in 0..n {
                let i = y * (n + 1) + x;
                triangles.extend_from_slice(&[i, i + n + 1, i + 1]);
                triangles.extend_from_slice(&[i + 1, i + n + 1, i + n + 2]);
            }
        }

        Self { vertices, triangles, subdivisions }
    }

    /// Cells per side
    pub fn subdivisions(&self) -> usize {
        self.subdivisions
    }

    /// Copy of the grid with each vertex lifted along Z by `height(x, y)`
    pub fn displaced(&self, height: impl Fn(f32, f32) -> f32) -> Vec<Vec3> {
        self.vertices
            .iter()
            .map(|v| Vec3::new(v.x, v.y, v.z + height(v.x, v.y)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_counts() {
        let grid = PlaneGrid::new(Vec3::zeros(), 100.0, 4);
        assert_eq!(grid.vertices.len(), 25);
        assert_eq!(grid.triangles.len(), 4 * 4 * 6);
        assert_eq!(grid.subdivisions(), 4);
    }

    #[test]
    fn test_indices_stay_in_range() {
        let grid = PlaneGrid::new(Vec3::zeros(), 10.0, 3);
        let count = grid.vertices.len() as i32;
        assert!(grid.triangles.iter().all(|&i| (0..count).contains(&i)));
    }

    #[test]
    fn test_first_cell_winding() {
        let grid = PlaneGrid::new(Vec3::zeros(), 1.0, 2);
        assert_eq!(&grid.triangles[..6], &[0, 3, 1, 1, 3, 4]);
    }

    #[test]
    fn test_zero_subdivisions_clamped() {
        let grid = PlaneGrid::new(Vec3::new(5.0, 0.0, 0.0), 2.0, 0);
        assert_eq!(grid.vertices.len(), 4);
        assert_eq!(grid.vertices[3], Vec3::new(7.0, 2.0, 0.0));
    }
}
