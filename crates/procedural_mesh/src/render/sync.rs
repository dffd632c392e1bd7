//! Owning-thread to render-thread handoff
//!
//! The owning thread marks render state dirty on every structural change.
//! When the host reaches its sync point the component turns the dirty flag
//! into a [`RenderSnapshot`] with a fresh generation and publishes it. The
//! render thread's [`SceneProxyHost`] drains messages once per frame, builds
//! only the newest generation, and never writes back.

use std::sync::Arc;

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::core::config::RenderSettings;
use crate::foundation::math::Transform;
use crate::mesh::vertex::MeshVertex;
use crate::scene::{BoxSphereBounds, Mobility, AABB};
use super::device::RenderDevice;
use super::material::Material;
use super::proxy::SceneProxy;

/// Copy of one section taken on the owning thread
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSnapshot {
    /// Index in the section store
    pub section_index: usize,
    /// Vertex data
    pub vertices: Vec<MeshVertex>,
    /// Triangle list
    pub indices: Vec<u32>,
    /// Resolved material, never empty
    pub material: Arc<Material>,
    /// Section visibility
    pub visible: bool,
    /// Section local bounds
    pub local_box: AABB,
}

impl SectionSnapshot {
    /// At least three vertices and a non-empty whole triangle list
    pub fn is_valid_for_rendering(&self) -> bool {
        self.vertices.len() >= 3 && self.indices.len() >= 3 && self.indices.len() % 3 == 0
    }
}

/// Everything the render thread needs to build a proxy
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    /// Monotonic generation, one per published rebuild
    pub generation: u64,
    /// Sections in store order
    pub sections: Vec<SectionSnapshot>,
    /// Primitive transform
    pub local_to_world: Transform,
    /// World bounds
    pub bounds: BoxSphereBounds,
    /// Component mobility
    pub mobility: Mobility,
    /// Draw in the main pass
    pub render_in_main_pass: bool,
    /// Cast shadows
    pub cast_shadow: bool,
    /// Draw into custom depth
    pub render_custom_depth: bool,
    /// Lighting channel mask
    pub lighting_channels: u8,
    /// Selected in an editor
    pub selected: bool,
    /// Render settings
    pub settings: RenderSettings,
}

/// Dirty flag and generation counter for one component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStateTracker {
    generation: u64,
    dirty: bool,
    transform_dirty: bool,
}

impl RenderStateTracker {
    /// Clean tracker at generation zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a full proxy rebuild
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Request a transform-only update
    pub fn mark_transform_dirty(&mut self) {
        self.transform_dirty = true;
    }

    /// A rebuild is pending
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// A transform update is pending
    pub fn is_transform_dirty(&self) -> bool {
        self.transform_dirty
    }

    /// Last generation handed out
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Consume a pending rebuild, returning its new generation
    ///
    /// A rebuild also covers any pending transform update.
    pub fn take_rebuild(&mut self) -> Option<u64> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        self.transform_dirty = false;
        self.generation += 1;
        Some(self.generation)
    }

    /// Consume a pending transform update
    pub fn take_transform_update(&mut self) -> bool {
        std::mem::take(&mut self.transform_dirty)
    }
}

/// Message from the owning thread to the render thread
#[derive(Debug, Clone, PartialEq)]
pub enum RenderMessage {
    /// Replace the proxy with one built from this snapshot
    Rebuild(Box<RenderSnapshot>),
    /// Move the existing proxy
    UpdateTransform {
        /// New transform
        local_to_world: Transform,
        /// New world bounds
        bounds: BoxSphereBounds,
    },
    /// The component is gone; drop the proxy
    Destroy,
}

/// Owning-thread end of the render channel
#[derive(Debug, Clone)]
pub struct RenderStatePublisher {
    sender: Sender<RenderMessage>,
}

impl RenderStatePublisher {
    /// Send a message, returning `false` if the render side has gone away
    pub fn publish(&self, message: RenderMessage) -> bool {
        match self.sender.send(message) {
            Ok(()) => true,
            Err(_) => {
                log::debug!("Render thread receiver dropped, discarding message");
                false
            }
        }
    }
}

/// Render-thread end of the render channel
#[derive(Debug)]
pub struct RenderStateReceiver {
    receiver: Receiver<RenderMessage>,
}

impl RenderStateReceiver {
    /// Everything published since the last drain, in order
    pub fn drain(&self) -> Vec<RenderMessage> {
        self.receiver.try_iter().collect()
    }
}

/// Create a connected publisher/receiver pair
pub fn render_channel() -> (RenderStatePublisher, RenderStateReceiver) {
    let (sender, receiver) = unbounded();
    (RenderStatePublisher { sender }, RenderStateReceiver { receiver })
}

/// Owns the current scene proxy on the render thread
pub struct SceneProxyHost {
    device: Arc<dyn RenderDevice>,
    receiver: RenderStateReceiver,
    proxy: Option<SceneProxy>,
    last_generation: u64,
    rebuild_count: usize,
}

impl SceneProxyHost {
    /// Host with no proxy yet
    pub fn new(device: Arc<dyn RenderDevice>, receiver: RenderStateReceiver) -> Self {
        Self {
            device,
            receiver,
            proxy: None,
            last_generation: 0,
            rebuild_count: 0,
        }
    }

    /// Current proxy
    pub fn proxy(&self) -> Option<&SceneProxy> {
        self.proxy.as_ref()
    }

    /// Current proxy, mutable for ray-tracing queries
    pub fn proxy_mut(&mut self) -> Option<&mut SceneProxy> {
        self.proxy.as_mut()
    }

    /// Generation of the last snapshot consumed
    pub fn last_generation(&self) -> u64 {
        self.last_generation
    }

    /// Proxies built so far
    pub fn rebuild_count(&self) -> usize {
        self.rebuild_count
    }

    /// Apply everything published since the last sync
    ///
    /// Rebuilds are coalesced to the newest generation; generations at or
    /// below the last one consumed are ignored. Returns `true` if a new proxy
    /// was installed.
    pub fn sync(&mut self) -> bool {
        let mut pending: Option<Box<RenderSnapshot>> = None;
        let mut destroyed = false;

        for message in self.receiver.drain() {
            match message {
                RenderMessage::Rebuild(snapshot) => {
                    if snapshot.generation <= self.last_generation {
                        log::trace!("Ignoring stale render snapshot {}", snapshot.generation);
                        continue;
                    }
                    if pending.as_ref().map_or(true, |p| snapshot.generation > p.generation) {
                        pending = Some(snapshot);
                        destroyed = false;
                    }
                }
                RenderMessage::UpdateTransform { local_to_world, bounds } => match pending.as_mut() {
                    Some(snapshot) => {
                        snapshot.local_to_world = local_to_world;
                        snapshot.bounds = bounds;
                    }
                    None => {
                        if let Some(proxy) = self.proxy.as_mut() {
                            proxy.set_transform(local_to_world, bounds);
                        }
                    }
                },
                RenderMessage::Destroy => {
                    pending = None;
                    destroyed = true;
                }
            }
        }

        if destroyed {
            self.proxy = None;
        }

        let Some(snapshot) = pending else {
            return false;
        };

        // Release the old proxy's resources before allocating new ones.
        self.proxy = None;
        self.last_generation = snapshot.generation;

        match SceneProxy::from_snapshot(&snapshot, Arc::clone(&self.device)) {
            Ok(proxy) => {
                self.proxy = Some(proxy);
                self.rebuild_count += 1;
                true
            }
            Err(e) => {
                log::error!("Failed to build scene proxy generation {}: {}", snapshot.generation, e);
                false
            }
        }
    }
}

impl std::fmt::Debug for SceneProxyHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneProxyHost")
            .field("proxy", &self.proxy)
            .field("last_generation", &self.last_generation)
            .field("rebuild_count", &self.rebuild_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_generation_only_advances_when_dirty() {
        let mut tracker = RenderStateTracker::new();
        assert_eq!(tracker.take_rebuild(), None);

        tracker.mark_dirty();
        tracker.mark_dirty();
        assert_eq!(tracker.take_rebuild(), Some(1));
        assert_eq!(tracker.take_rebuild(), None);

        tracker.mark_transform_dirty();
        tracker.mark_dirty();
        assert_eq!(tracker.take_rebuild(), Some(2));
        assert!(!tracker.take_transform_update());
    }

    #[test]
    fn test_publish_after_receiver_dropped() {
        let (publisher, receiver) = render_channel();
        drop(receiver);
        assert!(!publisher.publish(RenderMessage::Destroy));
    }
}
