//! Physics body description handed to the cooker
//!
//! A body setup is a self-contained snapshot: convex hulls, the merged
//! triangle mesh and the flags the cooker needs. Once submitted for async
//! cooking it is shared read-only with the worker, so later edits to the
//! component never reach an in-flight cook.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::collision::{ConvexElem, TriMeshCollisionData};
use super::cooking::CookedCollision;

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one body setup's cooked geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u64);

impl GeometryId {
    /// Allocate a fresh id
    pub fn new() -> Self {
        Self(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl Default for GeometryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which geometry physics queries trace against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionTraceFlag {
    /// Simple shapes for simple queries, triangles for complex ones
    #[default]
    UseDefault,
    /// Use the triangle mesh for simple queries as well
    UseComplexAsSimple,
}

/// Simple-collision shapes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateGeometry {
    /// Convex hull elements
    pub convex_elems: Vec<ConvexElem>,
}

impl AggregateGeometry {
    /// No simple shapes present
    pub fn is_empty(&self) -> bool {
        self.convex_elems.is_empty()
    }
}

/// Everything needed to cook a physics body for one mesh component
#[derive(Debug, Clone)]
pub struct BodySetup {
    /// Identity of this setup's geometry
    pub geometry_id: GeometryId,
    /// Simple collision shapes
    pub agg_geom: AggregateGeometry,
    /// Complex collision triangles, `None` when no section participates
    pub tri_mesh: Option<TriMeshCollisionData>,
    /// Trace behavior
    pub trace_flag: CollisionTraceFlag,
    /// Triangles collide from both sides
    pub double_sided_geometry: bool,
    /// Never build mirrored geometry
    pub generate_mirrored_collision: bool,
    /// Cooked result, set once cooking succeeds
    pub cooked: Option<Arc<CookedCollision>>,
}

impl BodySetup {
    /// Create an empty setup with the procedural-mesh defaults
    pub fn new() -> Self {
        Self {
            geometry_id: GeometryId::new(),
            agg_geom: AggregateGeometry::default(),
            tri_mesh: None,
            trace_flag: CollisionTraceFlag::UseDefault,
            double_sided_geometry: true,
            generate_mirrored_collision: false,
            cooked: None,
        }
    }

    /// Use a trace flag matching the component's complex-as-simple setting
    pub fn with_complex_as_simple(mut self, complex_as_simple: bool) -> Self {
        self.trace_flag = if complex_as_simple {
            CollisionTraceFlag::UseComplexAsSimple
        } else {
            CollisionTraceFlag::UseDefault
        };
        self
    }

    /// Replace simple shapes
    pub fn with_convex_elems(mut self, convex_elems: Vec<ConvexElem>) -> Self {
        self.agg_geom.convex_elems = convex_elems;
        self
    }

    /// Replace the triangle mesh
    pub fn with_tri_mesh(mut self, tri_mesh: Option<TriMeshCollisionData>) -> Self {
        self.tri_mesh = tri_mesh;
        self
    }

    /// Drop any cooked data and take a fresh geometry id
    pub fn invalidate_physics_data(&mut self) {
        self.cooked = None;
        self.geometry_id = GeometryId::new();
    }

    /// Cooking has produced usable data
    pub fn is_cooked(&self) -> bool {
        self.cooked.is_some()
    }

    /// Nothing to cook
    pub fn has_no_geometry(&self) -> bool {
        self.agg_geom.is_empty() && self.tri_mesh.as_ref().map_or(true, TriMeshCollisionData::is_empty)
    }
}

impl Default for BodySetup {
    fn default() -> Self {
        Self::new()
    }
}
