//! Specialized collection types

pub use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Key for a GPU resource tracked by a render device
    pub struct ResourceKey;
}

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<ResourceKey, T>;

/// Typed handle for type-safe resource references
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct TypedHandle<T> {
    key: ResourceKey,
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T> TypedHandle<T> {
    /// Create a new typed handle from a key
    pub fn new(key: ResourceKey) -> Self {
        Self {
            key,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Get the underlying key
    pub fn key(&self) -> ResourceKey {
        self.key
    }
}

// Manual impls so `T` does not need to be Clone/Copy itself.
impl<T> Clone for TypedHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedHandle<T> {}
