//! Collision synchronization
//!
//! Owns the authoritative [`BodySetup`] for one mesh component and keeps it in
//! step with the section store.
//!
//! # State Machine
//!
//! ```text
//! sync:   Idle -> CookingSync -> Idle
//! async:  Idle -> CookingAsync(n) -> [Superseded | Completed] -> Idle
//! ```
//!
//! In async mode every rebuild submits a new setup. Setups that are still
//! queued (not started) are aborted when a newer one arrives; started ones run
//! to completion. A successful completion is installed only if its setup is
//! still in the pending queue, and installing it discards every setup queued
//! before it. Arrival order therefore never matters: position in the queue
//! decides staleness.

use std::sync::Arc;

use super::async_cook::{AsyncCookService, CookCompletion, CookTicket};
use super::body_setup::{BodySetup, GeometryId};
use super::collision::{CollisionDataProvider, ConvexElem};
use super::cooking::{CollisionCooker, CookError};

/// Receiver for "recreate runtime physics state" signals
pub trait PhysicsScene: Send {
    /// A new body setup became authoritative
    fn recreate_body(&mut self, setup: &Arc<BodySetup>);
}

/// Observable runtime physics state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicsState {
    /// Times the runtime state has been recreated
    pub recreate_count: u64,
    /// Geometry the runtime state was last built from
    pub geometry_id: Option<GeometryId>,
}

/// Where the synchronizer is in its cook cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionSyncState {
    /// No cooks outstanding
    Idle,
    /// Async cooks submitted and not yet resolved
    CookingAsync {
        /// Pending request count
        pending: usize,
    },
}

#[derive(Debug)]
struct PendingCook {
    ticket: CookTicket,
    setup: Arc<BodySetup>,
}

/// Keeps collision data consistent with section geometry
pub struct CollisionSynchronizer {
    convex_elems: Vec<ConvexElem>,
    body_setup: Option<Arc<BodySetup>>,
    async_queue: Vec<PendingCook>,
    cooker: Arc<dyn CollisionCooker>,
    async_service: Option<Box<dyn AsyncCookService>>,
    physics_scene: Option<Box<dyn PhysicsScene>>,
    physics_state: PhysicsState,
    use_async_cooking: bool,
    use_complex_as_simple: bool,
}

impl CollisionSynchronizer {
    /// Create a synchronizer that cooks synchronously with `cooker`
    pub fn new(cooker: Arc<dyn CollisionCooker>) -> Self {
        Self {
            convex_elems: Vec::new(),
            body_setup: None,
            async_queue: Vec::new(),
            cooker,
            async_service: None,
            physics_scene: None,
            physics_state: PhysicsState::default(),
            use_async_cooking: false,
            use_complex_as_simple: true,
        }
    }

    /// Route cooks through a background service when async cooking is enabled
    pub fn with_async_service(mut self, service: Box<dyn AsyncCookService>) -> Self {
        self.async_service = Some(service);
        self
    }

    /// Forward recreate signals to the host physics scene
    pub fn with_physics_scene(mut self, scene: Box<dyn PhysicsScene>) -> Self {
        self.physics_scene = Some(scene);
        self
    }

    /// Choose between sync and async cooking
    ///
    /// Async cooking needs a service; without one cooks stay synchronous.
    pub fn set_use_async_cooking(&mut self, use_async: bool) {
        if use_async && self.async_service.is_none() {
            log::warn!("Async cooking requested without a cook service, cooking synchronously");
        }
        self.use_async_cooking = use_async;
    }

    /// Trace against the triangle mesh for simple queries too
    pub fn set_use_complex_as_simple(&mut self, complex_as_simple: bool) {
        self.use_complex_as_simple = complex_as_simple;
    }

    /// Whether cooks go through the async service
    pub fn is_async(&self) -> bool {
        self.use_async_cooking && self.async_service.is_some()
    }

    /// Current cook-cycle state
    pub fn state(&self) -> CollisionSyncState {
        if self.async_queue.is_empty() {
            CollisionSyncState::Idle
        } else {
            CollisionSyncState::CookingAsync { pending: self.async_queue.len() }
        }
    }

    /// The authoritative body setup
    pub fn body_setup(&self) -> Option<&Arc<BodySetup>> {
        self.body_setup.as_ref()
    }

    /// Runtime physics state
    pub fn physics_state(&self) -> PhysicsState {
        self.physics_state
    }

    /// Explicitly added convex hulls
    pub fn convex_elems(&self) -> &[ConvexElem] {
        &self.convex_elems
    }

    /// Append a convex hull
    pub fn add_convex_elem(&mut self, elem: ConvexElem) {
        self.convex_elems.push(elem);
    }

    /// Replace all convex hulls
    pub fn set_convex_elems(&mut self, elems: Vec<ConvexElem>) {
        self.convex_elems = elems;
    }

    /// Remove all convex hulls
    pub fn clear_convex_elems(&mut self) {
        self.convex_elems.clear();
    }

    /// Rebuild collision from the provider's current geometry plus convex hulls
    ///
    /// In sync mode the cook happens here; a failed cook leaves the previous
    /// body authoritative. In async mode the setup is submitted and the result
    /// is applied by [`Self::process_async_cook_results`].
    pub fn update_collision(&mut self, provider: &dyn CollisionDataProvider) -> Result<(), CookError> {
        let tri_mesh = if provider.contains_physics_tri_mesh_data() {
            provider.physics_tri_mesh_data()
        } else {
            None
        };

        let setup = BodySetup::new()
            .with_complex_as_simple(self.use_complex_as_simple)
            .with_convex_elems(self.convex_elems.clone())
            .with_tri_mesh(tri_mesh);

        if self.is_async() {
            self.submit_async(setup);
            Ok(())
        } else {
            self.cook_sync(setup)
        }
    }

    fn cook_sync(&mut self, mut setup: BodySetup) -> Result<(), CookError> {
        if let Some(previous) = &self.body_setup {
            log::trace!(
                "Replacing collision geometry {} with {}",
                previous.geometry_id.value(),
                setup.geometry_id.value()
            );
        }
        setup.invalidate_physics_data();

        match self.cooker.cook(&setup) {
            Ok(cooked) => {
                setup.cooked = Some(Arc::new(cooked));
                self.install(Arc::new(setup));
                Ok(())
            }
            Err(e) => {
                log::error!("Collision cook failed, keeping previous body: {}", e);
                Err(e)
            }
        }
    }

    fn submit_async(&mut self, setup: BodySetup) {
        let Some(service) = self.async_service.as_mut() else {
            return;
        };

        // Superseded requests that have not started are cancelled outright.
        self.async_queue.retain(|pending| !service.abort(pending.ticket));

        let setup = Arc::new(setup);
        let ticket = service.submit(Arc::clone(&setup));
        log::debug!(
            "Submitted async cook {} ({} pending)",
            ticket.value(),
            self.async_queue.len() + 1
        );
        self.async_queue.push(PendingCook { ticket, setup });
    }

    /// Drain the async service and apply any finished cooks
    ///
    /// Returns the number of completions that changed the authoritative body.
    pub fn process_async_cook_results(&mut self) -> usize {
        let Some(service) = self.async_service.as_mut() else {
            return 0;
        };
        let completions = service.drain_completed();
        completions
            .into_iter()
            .map(|completion| self.finish_async_cook(completion))
            .filter(|installed| *installed)
            .count()
    }

    /// Apply one async completion
    ///
    /// Returns `true` if the completion became the authoritative body.
    pub fn finish_async_cook(&mut self, completion: CookCompletion) -> bool {
        let Some(index) = self
            .async_queue
            .iter()
            .position(|pending| pending.ticket == completion.ticket)
        else {
            log::trace!("Ignoring stale cook completion {}", completion.ticket.value());
            return false;
        };

        match completion.result {
            Ok(cooked) => {
                let finished: Vec<_> = self.async_queue.drain(..=index).collect();
                let Some(PendingCook { setup, .. }) = finished.into_iter().last() else {
                    return false;
                };
                let mut setup = Arc::try_unwrap(setup).unwrap_or_else(|shared| (*shared).clone());
                setup.cooked = Some(Arc::new(cooked));
                self.install(Arc::new(setup));
                true
            }
            Err(e) => {
                log::warn!("Async collision cook {} failed: {}", completion.ticket.value(), e);
                self.async_queue.remove(index);
                false
            }
        }
    }

    /// Abort everything still queued; started cooks are left to finish and ignored
    pub fn cancel_pending(&mut self) {
        if let Some(service) = self.async_service.as_mut() {
            for pending in &self.async_queue {
                service.abort(pending.ticket);
            }
        }
        self.async_queue.clear();
    }

    fn install(&mut self, setup: Arc<BodySetup>) {
        self.physics_state.recreate_count += 1;
        self.physics_state.geometry_id = Some(setup.geometry_id);
        if let Some(scene) = self.physics_scene.as_mut() {
            scene.recreate_body(&setup);
        }
        log::debug!(
            "Collision body {} installed ({} triangles, {} hulls)",
            setup.geometry_id.value(),
            setup.cooked.as_ref().map_or(0, |c| c.num_triangles()),
            setup.agg_geom.convex_elems.len()
        );
        self.body_setup = Some(setup);
    }
}

impl std::fmt::Debug for CollisionSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionSynchronizer")
            .field("convex_elems", &self.convex_elems.len())
            .field("body_setup", &self.body_setup.as_ref().map(|s| s.geometry_id))
            .field("pending", &self.async_queue.len())
            .field("async", &self.is_async())
            .finish()
    }
}
