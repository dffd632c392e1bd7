//! Physics collision for procedural meshes
//!
//! Builds collision geometry from collision-enabled sections plus explicitly
//! added convex hulls, cooks it synchronously or on a background worker, and
//! keeps track of which cooked body is authoritative.
//!
//! This is not a physics engine: cooking produces data for one to consume.

pub mod collision;
pub mod body_setup;
pub mod cooking;
pub mod async_cook;
pub mod collision_sync;

pub use collision::{
    ConvexElem,
    TriMeshCollisionData,
    TriMeshSizeEstimates,
    CollisionDataProvider,
    MIN_HULL_POINTS,
};
pub use body_setup::{BodySetup, AggregateGeometry, CollisionTraceFlag, GeometryId};
pub use cooking::{CollisionCooker, MeshCooker, CookedCollision, CookedTriMesh, CookedConvex, CookError};
pub use async_cook::{
    AsyncCookService,
    CookTicket,
    CookCompletion,
    ThreadedCookService,
    DeferredCookService,
};
pub use collision_sync::{CollisionSynchronizer, CollisionSyncState, PhysicsScene, PhysicsState};
