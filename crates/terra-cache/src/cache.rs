//! Handle registry, active/inactive partition, and LRU eviction.

use rustc_hash::FxHashMap;
use terra_quadtree::NodeId;
use terra_store::TextureStore;

use crate::{
    CacheError, DEFAULT_SOFT_LIMIT, EntryState, TextureHandle, TextureKey, TextureUploader,
    TreeId, UploadRequest,
};

struct Entry<R> {
    key: TextureKey,
    state: EntryState,
    resource: Option<R>,
    /// Clock value at the most recent activation or release.
    last_used: u64,
    /// Position in `active` or `inactive`, whichever matches `state`.
    slot: usize,
}

/// Snapshot of cache occupancy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub handles: usize,
    pub active: usize,
    pub inactive: usize,
    pub resident_bytes: usize,
    pub loads: u64,
    pub evictions: u64,
    pub failed_loads: u64,
}

/// Cache of resident textures backed by texture quadtrees.
///
/// Call [`new_frame`](Self::new_frame) once per frame before that frame's
/// activations.
pub struct ResourceCache<U: TextureUploader> {
    uploader: U,
    trees: Vec<TextureStore>,
    table: FxHashMap<TextureKey, TextureHandle>,
    entries: Vec<Entry<U::Resource>>,
    active: Vec<TextureHandle>,
    inactive: Vec<TextureHandle>,
    clock: u64,
    soft_limit: usize,
    mipmaps: bool,
    resident_bytes: usize,
    loads: u64,
    evictions: u64,
    failed_loads: u64,
}

impl<U: TextureUploader> ResourceCache<U> {
    #[must_use]
    pub fn new(uploader: U) -> Self {
        Self::with_soft_limit(uploader, DEFAULT_SOFT_LIMIT)
    }

    #[must_use]
    pub fn with_soft_limit(uploader: U, soft_limit: usize) -> Self {
        Self {
            uploader,
            trees: Vec::new(),
            table: FxHashMap::default(),
            entries: Vec::new(),
            active: Vec::new(),
            inactive: Vec::new(),
            clock: 0,
            soft_limit,
            mipmaps: false,
            resident_bytes: 0,
            loads: 0,
            evictions: 0,
            failed_loads: 0,
        }
    }

    /// Request mip chains on subsequent uploads.
    #[must_use]
    pub fn with_mipmaps(mut self, mipmaps: bool) -> Self {
        self.mipmaps = mipmaps;
        self
    }

    /// Change the soft limit. Takes effect at the next activation, release
    /// or [`enforce_limit`](Self::enforce_limit).
    pub fn set_soft_limit(&mut self, soft_limit: usize) {
        self.soft_limit = soft_limit;
    }

    #[must_use]
    pub fn soft_limit(&self) -> usize {
        self.soft_limit
    }

    /// Take ownership of a texture quadtree and return its id.
    pub fn register_tree(&mut self, store: TextureStore) -> TreeId {
        let id = TreeId(self.trees.len() as u32);
        tracing::debug!(
            tree = id.0,
            path = %store.path().display(),
            depth = store.depth(),
            "Registered texture tree"
        );
        self.trees.push(store);
        id
    }

    /// # Panics
    ///
    /// Panics if `tree` was not issued by this cache.
    #[must_use]
    pub fn tree(&self, tree: TreeId) -> &TextureStore {
        &self.trees[tree.0 as usize]
    }

    /// Handle for `node` of `tree`, creating an unloaded one on first use.
    ///
    /// # Panics
    ///
    /// Panics if `tree` was not issued by this cache or `(level, row, col)`
    /// is outside the tree.
    pub fn make(&mut self, tree: TreeId, level: u32, row: u32, col: u32) -> TextureHandle {
        let depth = self.tree(tree).depth();
        assert!(level < depth, "level {level} outside texture tree of depth {depth}");
        let key = TextureKey {
            tree,
            node: NodeId::new(level, row, col),
        };
        if let Some(&handle) = self.table.get(&key) {
            return handle;
        }
        let handle = TextureHandle(self.entries.len() as u32);
        self.entries.push(Entry {
            key,
            state: EntryState::Unloaded,
            resource: None,
            last_used: 0,
            slot: 0,
        });
        self.table.insert(key, handle);
        handle
    }

    /// Advance the frame clock.
    pub fn new_frame(&mut self) {
        self.clock += 1;
    }

    /// Mark `handle` in use this frame, loading and uploading it if needed.
    ///
    /// # Errors
    ///
    /// [`CacheError`] if the tile cannot be read or uploaded; the handle
    /// then stays unloaded.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is already active.
    pub fn activate(&mut self, handle: TextureHandle) -> Result<(), CacheError> {
        let state = self.entry(handle).state;
        assert!(state != EntryState::Active, "activating active texture {handle:?}");

        match state {
            EntryState::Unloaded => self.load(handle)?,
            EntryState::Inactive => {
                let slot = self.entry(handle).slot;
                Self::swap_remove(&mut self.inactive, &mut self.entries, slot);
            }
            EntryState::Active => unreachable!(),
        }

        let slot = self.active.len();
        self.active.push(handle);
        let clock = self.clock;
        let entry = self.entry_mut(handle);
        entry.state = EntryState::Active;
        entry.slot = slot;
        entry.last_used = clock;
        tracing::trace!(handle = handle.0, clock, "Texture activated");

        self.enforce_limit();
        Ok(())
    }

    /// Mark an active handle as no longer in use, stamping it with the
    /// current clock. Its resource stays resident until evicted.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is not active.
    pub fn release(&mut self, handle: TextureHandle) {
        let entry = self.entry(handle);
        assert!(
            entry.state == EntryState::Active,
            "releasing texture {handle:?} in state {:?}",
            entry.state
        );
        let slot = entry.slot;
        Self::swap_remove(&mut self.active, &mut self.entries, slot);

        let slot = self.inactive.len();
        self.inactive.push(handle);
        let clock = self.clock;
        let entry = self.entry_mut(handle);
        entry.state = EntryState::Inactive;
        entry.slot = slot;
        entry.last_used = clock;
        tracing::trace!(handle = handle.0, clock, "Texture released");

        self.enforce_limit();
    }

    /// The resident resource for `handle`, activating it first if it is not
    /// already active.
    ///
    /// # Errors
    ///
    /// See [`activate`](Self::activate).
    pub fn descriptor(&mut self, handle: TextureHandle) -> Result<&U::Resource, CacheError> {
        if !self.is_active(handle) {
            self.activate(handle)?;
        }
        match &self.entry(handle).resource {
            Some(resource) => Ok(resource),
            None => unreachable!("active texture without a resource"),
        }
    }

    /// Free least-recently-used inactive textures until the resident count is
    /// within the soft limit or nothing inactive remains. Returns the evicted
    /// handles, oldest first.
    pub fn enforce_limit(&mut self) -> Vec<TextureHandle> {
        let excess = self.resident_count().saturating_sub(self.soft_limit);
        if excess == 0 || self.inactive.is_empty() {
            return Vec::new();
        }

        let mut order = std::mem::take(&mut self.inactive);
        order.sort_by_key(|&h| (self.entry(h).last_used, h));
        let keep = order.split_off(excess.min(order.len()));
        let evicted = order;

        for &handle in &evicted {
            let entry = self.entry_mut(handle);
            entry.state = EntryState::Unloaded;
            let bytes = entry.resource.take().map_or(0, |r| U::resident_bytes(&r));
            self.resident_bytes -= bytes;
            self.evictions += 1;
            tracing::trace!(handle = handle.0, bytes, "Texture evicted");
        }
        for (slot, &handle) in keep.iter().enumerate() {
            self.entry_mut(handle).slot = slot;
        }
        self.inactive = keep;

        tracing::debug!(
            evicted = evicted.len(),
            resident = self.resident_count(),
            soft_limit = self.soft_limit,
            "Evicted inactive textures"
        );
        evicted
    }

    #[must_use]
    pub fn state(&self, handle: TextureHandle) -> EntryState {
        self.entry(handle).state
    }

    #[must_use]
    pub fn is_active(&self, handle: TextureHandle) -> bool {
        self.state(handle) == EntryState::Active
    }

    /// True if `handle` has a resident resource.
    #[must_use]
    pub fn is_loaded(&self, handle: TextureHandle) -> bool {
        self.state(handle) != EntryState::Unloaded
    }

    #[must_use]
    pub fn key(&self, handle: TextureHandle) -> TextureKey {
        self.entry(handle).key
    }

    /// Clock value when `handle` was last activated or released.
    #[must_use]
    pub fn last_used(&self, handle: TextureHandle) -> u64 {
        self.entry(handle).last_used
    }

    #[must_use]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Number of textures with a resident resource.
    #[must_use]
    pub fn resident_count(&self) -> usize {
        self.active.len() + self.inactive.len()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }

    #[must_use]
    pub fn resident_bytes(&self) -> usize {
        self.resident_bytes
    }

    /// Handles currently active, in no particular order.
    #[must_use]
    pub fn active_handles(&self) -> &[TextureHandle] {
        &self.active
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            handles: self.entries.len(),
            active: self.active.len(),
            inactive: self.inactive.len(),
            resident_bytes: self.resident_bytes,
            loads: self.loads,
            evictions: self.evictions,
            failed_loads: self.failed_loads,
        }
    }

    #[must_use]
    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    fn load(&mut self, handle: TextureHandle) -> Result<(), CacheError> {
        let TextureKey { tree, node } = self.entry(handle).key;
        let store = &mut self.trees[tree.0 as usize];
        let request = UploadRequest {
            srgb: store.is_srgb(),
            mipmaps: self.mipmaps,
        };
        let result = store
            .load_node(node.level, node.row, node.col)
            .map_err(|source| CacheError::Load { tree, node, source })
            .and_then(|tile| {
                self.uploader
                    .upload(&tile, request)
                    .map_err(CacheError::from)
            });
        let resource = match result {
            Ok(resource) => resource,
            Err(err) => {
                self.failed_loads += 1;
                return Err(err);
            }
        };

        let bytes = U::resident_bytes(&resource);
        self.resident_bytes += bytes;
        self.loads += 1;
        self.entry_mut(handle).resource = Some(resource);
        tracing::trace!(handle = handle.0, %node, bytes, "Texture loaded");
        Ok(())
    }

    /// Remove `list[slot]` by moving the last element into its place.
    fn swap_remove(
        list: &mut Vec<TextureHandle>,
        entries: &mut [Entry<U::Resource>],
        slot: usize,
    ) {
        list.swap_remove(slot);
        if let Some(&moved) = list.get(slot) {
            entries[moved.index()].slot = slot;
        }
    }

    fn entry(&self, handle: TextureHandle) -> &Entry<U::Resource> {
        &self.entries[handle.index()]
    }

    fn entry_mut(&mut self, handle: TextureHandle) -> &mut Entry<U::Resource> {
        &mut self.entries[handle.index()]
    }
}
