use terra_quadtree::NodeId;

/// A texture quadtree registered with a cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(pub(crate) u32);

/// Stable reference to one cached texture. Only meaningful for the cache
/// that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub(crate) u32);

impl TextureHandle {
    /// Position in the issuing cache's registry, in creation order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identity of a cached texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureKey {
    pub tree: TreeId,
    pub node: NodeId,
}

/// Lifecycle state of a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryState {
    /// No resident resource.
    Unloaded,
    /// Resident but not in use this frame; may be evicted.
    Inactive,
    /// In use this frame; never evicted.
    Active,
}
