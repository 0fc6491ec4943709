//! GPU texture cache with LRU tracking and deferred invalidation
//!
//! Maps a [`CacheKey`] plus [`ParameterFingerprint`] to a refcounted GPU
//! texture. The cache keeps one reference to every entry; callers get
//! [`TextureHandle`]s that share it. A texture is destroyed once the cache has
//! evicted it and the last handle is gone.
//!
//! Entries leave the cache in two ways: the pixel source they were built from
//! changes (a message is queued on the [`InvalidationBus`] and acted on in
//! [`GpuTextureCache::purge_invalidated`]), or the [`CapacityPolicy`] selects
//! them after an insert.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use texcache_render::{PixelConfig, PixelSource};

use crate::backend::{BackendTexture, TextureDesc};
use crate::invalidation::{self, InvalidationBus, InvalidationMessage};
use crate::key::CacheKey;
use crate::memory_budget::{CacheFootprint, CapacityPolicy, EvictionCandidate, Unbounded};
use crate::params::{ParameterFingerprint, ResourceKey};

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// A GPU texture with fixed shape and format
///
/// Wraps the platform object returned by a
/// [`GpuBackend`](crate::backend::GpuBackend). Contents are only changed
/// through the backend's write operation.
pub struct GpuTexture {
    id: u64,
    desc: TextureDesc,

    /// Opaque handle to the platform texture (Metal, Vulkan, an in-memory
    /// buffer, ...)
    handle: BackendTexture,
}

impl GpuTexture {
    /// Wrap a platform texture created for `desc`
    pub fn new(desc: TextureDesc, handle: BackendTexture) -> Self {
        Self {
            id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            desc,
            handle,
        }
    }

    /// Process-unique id of this texture
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn config(&self) -> PixelConfig {
        self.desc.config
    }

    /// Estimated VRAM usage in bytes
    pub fn vram_size(&self) -> usize {
        self.desc.vram_size()
    }

    /// Get a reference to the underlying platform texture
    ///
    /// Returns `None` if the type doesn't match.
    pub fn backend_handle<T: 'static>(&self) -> Option<&T> {
        self.handle.downcast_ref::<T>()
    }
}

impl fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuTexture")
            .field("id", &self.id)
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
enum TextureOrigin {
    Cached(ResourceKey),
    Scratch,
}

/// A counted reference to a GPU texture handed out to callers
///
/// Cloning the handle adds a reference; dropping it removes one.
#[derive(Debug, Clone)]
pub struct TextureHandle {
    texture: Arc<GpuTexture>,
    origin: TextureOrigin,
}

impl TextureHandle {
    pub(crate) fn cached(texture: Arc<GpuTexture>, key: ResourceKey) -> Self {
        Self {
            texture,
            origin: TextureOrigin::Cached(key),
        }
    }

    pub(crate) fn scratch(texture: Arc<GpuTexture>) -> Self {
        Self {
            texture,
            origin: TextureOrigin::Scratch,
        }
    }

    pub(crate) fn into_texture(self) -> Arc<GpuTexture> {
        self.texture
    }

    pub fn texture(&self) -> &GpuTexture {
        &self.texture
    }

    /// Live references to the texture, the cache's own included
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.texture)
    }

    /// Returns true if the texture came from the scratch pool
    pub fn is_scratch(&self) -> bool {
        matches!(self.origin, TextureOrigin::Scratch)
    }

    /// The cache slot this texture was created for, if any
    pub fn resource_key(&self) -> Option<&ResourceKey> {
        match &self.origin {
            TextureOrigin::Cached(key) => Some(key),
            TextureOrigin::Scratch => None,
        }
    }

    /// Returns true if both handles refer to the same texture
    pub fn same_texture(&self, other: &TextureHandle) -> bool {
        Arc::ptr_eq(&self.texture, &other.texture)
    }
}

impl Deref for TextureHandle {
    type Target = GpuTexture;

    fn deref(&self) -> &GpuTexture {
        &self.texture
    }
}

/// Lifecycle of one cache slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Nothing cached under the key and fingerprint
    Empty,
    /// A texture is cached and no invalidation is queued for it
    Populated,
    /// A texture is cached but its source has changed; the next purge evicts it
    Invalidated,
}

/// Statistics about GPU texture cache usage
#[derive(Debug, Clone, Copy, Default)]
pub struct GpuCacheStats {
    /// Number of textures currently in cache
    pub texture_count: usize,

    /// Total VRAM used by cached textures (bytes)
    pub vram_used: usize,

    /// Number of cache hits
    pub hits: u64,

    /// Number of cache misses
    pub misses: u64,

    /// Number of textures evicted by the capacity policy
    pub evictions: u64,

    /// Number of textures evicted because their source changed
    pub invalidations: u64,
}

impl GpuCacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Identity-keyed cache of GPU textures
///
/// Owned by a single rendering context and mutated through `&mut self`; the
/// only state shared with other threads is the invalidation bus.
///
/// # Example
///
/// ```no_run
/// use texcache_cache::{CacheKey, GpuTextureCache, ParameterFingerprint};
/// # fn demo(key: CacheKey, fingerprint: ParameterFingerprint) {
/// let mut cache = GpuTextureCache::new();
///
/// if let Some(texture) = cache.lookup(&key, &fingerprint) {
///     println!("Cache hit! {}x{}", texture.width(), texture.height());
/// }
///
/// let stats = cache.stats();
/// println!("Hit rate: {:.2}%", stats.hit_rate() * 100.0);
/// # }
/// ```
#[derive(Debug)]
pub struct GpuTextureCache {
    entries: HashMap<ResourceKey, Arc<GpuTexture>>,

    /// LRU queue (most recently used at back, least recently used at front)
    lru_queue: VecDeque<ResourceKey>,

    vram_used: usize,
    bus: InvalidationBus,

    /// Keys with a listener attached that has not been drained yet
    watched: HashSet<CacheKey>,

    policy: Box<dyn CapacityPolicy + Send>,
    stats: GpuCacheStats,
}

impl GpuTextureCache {
    /// Create a cache that never evicts for capacity reasons
    pub fn new() -> Self {
        Self::with_policy(Box::new(Unbounded))
    }

    /// Create a cache that reports its footprint to `policy` after inserts
    pub fn with_policy(policy: Box<dyn CapacityPolicy + Send>) -> Self {
        Self {
            entries: HashMap::new(),
            lru_queue: VecDeque::new(),
            vram_used: 0,
            bus: InvalidationBus::new(),
            watched: HashSet::new(),
            policy,
            stats: GpuCacheStats::default(),
        }
    }

    /// Find a texture and take a reference to it
    ///
    /// Requires an exact match of both key and fingerprint. Updates LRU
    /// tracking and hit/miss statistics.
    pub fn lookup(
        &mut self,
        key: &CacheKey,
        fingerprint: &ParameterFingerprint,
    ) -> Option<TextureHandle> {
        let resource_key = ResourceKey::new(*key, *fingerprint);
        match self.entries.get(&resource_key) {
            Some(texture) => {
                let handle = TextureHandle::cached(Arc::clone(texture), resource_key);
                self.touch(resource_key);
                self.stats.hits += 1;
                Some(handle)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Check if a texture is cached without updating LRU tracking or stats
    pub fn contains(&self, key: &CacheKey, fingerprint: &ParameterFingerprint) -> bool {
        self.entries
            .contains_key(&ResourceKey::new(*key, *fingerprint))
    }

    /// Cache `texture` for `key` and `fingerprint` and return a handle to it
    ///
    /// A listener is attached to `source` so the entry is invalidated when
    /// the source changes, unless one for `key` is still pending. If `source`
    /// has already moved past the generation `key` was derived from, the
    /// invalidation is queued right away. An entry already cached under the
    /// same key and fingerprint is replaced. The capacity policy then runs and may evict
    /// older entries, never the one just inserted.
    pub fn insert(
        &mut self,
        key: CacheKey,
        fingerprint: ParameterFingerprint,
        texture: GpuTexture,
        source: &dyn PixelSource,
    ) -> TextureHandle {
        let resource_key = ResourceKey::new(key, fingerprint);
        self.remove_entry(&resource_key);

        self.watch(source, key);

        let texture = Arc::new(texture);
        self.vram_used += texture.vram_size();
        self.entries.insert(resource_key, Arc::clone(&texture));
        self.touch(resource_key);
        self.update_size_stats();

        log::debug!(
            "cached texture {} for {:?} ({} bytes, {} entries)",
            texture.id(),
            key,
            texture.vram_size(),
            self.entries.len()
        );

        self.enforce_capacity(&resource_key);
        TextureHandle::cached(texture, resource_key)
    }

    /// Remove every entry cached under `key`, whatever its fingerprint
    ///
    /// Returns the number of entries removed. Outstanding handles stay valid.
    pub fn evict(&mut self, key: &CacheKey) -> usize {
        let doomed: Vec<ResourceKey> = self
            .entries
            .keys()
            .filter(|resource_key| resource_key.key == *key)
            .copied()
            .collect();
        for resource_key in &doomed {
            self.remove_entry(resource_key);
        }
        doomed.len()
    }

    /// Drain the invalidation bus and evict every key found there
    ///
    /// Messages for keys that are no longer cached are ignored. Returns the
    /// number of entries removed.
    pub fn purge_invalidated(&mut self) -> usize {
        let messages = self.bus.drain();
        if messages.is_empty() {
            return 0;
        }

        let removed: usize = messages
            .iter()
            .map(|message| {
                self.watched.remove(&message.key);
                self.evict(&message.key)
            })
            .sum();
        self.stats.invalidations += removed as u64;

        log::debug!(
            "drained {} invalidation messages, evicted {} textures",
            messages.len(),
            removed
        );
        removed
    }

    pub fn slot_state(&self, key: &CacheKey, fingerprint: &ParameterFingerprint) -> SlotState {
        if !self.contains(key, fingerprint) {
            SlotState::Empty
        } else if self.bus.is_pending(key) {
            SlotState::Invalidated
        } else {
            SlotState::Populated
        }
    }

    /// The bus invalidation listeners of this cache post to
    pub fn bus(&self) -> &InvalidationBus {
        &self.bus
    }

    pub fn footprint(&self) -> CacheFootprint {
        CacheFootprint {
            texture_count: self.entries.len(),
            vram_used: self.vram_used,
        }
    }

    /// Get current cache statistics
    pub fn stats(&self) -> GpuCacheStats {
        self.stats
    }

    pub fn texture_count(&self) -> usize {
        self.entries.len()
    }

    pub fn vram_used(&self) -> usize {
        self.vram_used
    }

    /// Drop the cache's reference to every texture
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru_queue.clear();
        self.vram_used = 0;
        self.update_size_stats();
    }

    fn watch(&mut self, source: &dyn PixelSource, key: CacheKey) {
        if !self.watched.insert(key) {
            return;
        }

        let subscription = invalidation::attach(source, key, &self.bus);
        let stale = key
            .generation_id()
            .is_some_and(|generation| generation != source.generation_id());

        // A listener that fired already has posted for us
        if stale && source.unsubscribe(subscription) {
            log::debug!("{:?} changed before it was cached", key);
            self.bus.poster().post(InvalidationMessage { key });
        }
    }

    /// Move a key to the back of the LRU queue (mark as most recently used)
    fn touch(&mut self, key: ResourceKey) {
        self.lru_queue.retain(|k| *k != key);
        self.lru_queue.push_back(key);
    }

    fn remove_entry(&mut self, key: &ResourceKey) -> Option<Arc<GpuTexture>> {
        let texture = self.entries.remove(key)?;
        self.vram_used = self.vram_used.saturating_sub(texture.vram_size());
        self.lru_queue.retain(|k| k != key);
        self.update_size_stats();
        Some(texture)
    }

    fn enforce_capacity(&mut self, protected: &ResourceKey) {
        let candidates: Vec<EvictionCandidate> = self
            .lru_queue
            .iter()
            .filter(|key| *key != protected)
            .filter_map(|key| {
                self.entries.get(key).map(|texture| EvictionCandidate {
                    key: *key,
                    vram_size: texture.vram_size(),
                    in_use: Arc::strong_count(texture) > 1,
                })
            })
            .collect();

        let footprint = self.footprint();
        let victims = self.policy.select_evictions(footprint, &candidates);
        for victim in victims.iter().filter(|key| *key != protected) {
            if self.remove_entry(victim).is_some() {
                self.stats.evictions += 1;
            }
        }
    }

    fn update_size_stats(&mut self) {
        self.stats.texture_count = self.entries.len();
        self.stats.vram_used = self.vram_used;
    }
}

impl Default for GpuTextureCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_budget::BudgetPolicy;
    use crate::params::{FilterMode, TextureParams, TileMode};
    use texcache_render::{Bitmap, ColorType, ImageInfo, PixelRef};

    // Mock GPU texture handle for testing
    #[derive(Debug, Clone, PartialEq)]
    struct MockTexture {
        id: u32,
    }

    fn source(width: i32, height: i32) -> Bitmap {
        let info = ImageInfo::new(width, height, ColorType::Rgba8888);
        let pixels = vec![0; info.min_row_bytes() * height as usize];
        Bitmap::new(PixelRef::tight(info, pixels, None).unwrap())
    }

    fn desc_of(source: &Bitmap) -> TextureDesc {
        TextureDesc::new(
            source.width() as u32,
            source.height() as u32,
            PixelConfig::Rgba8888,
        )
    }

    fn key_of(source: &Bitmap) -> CacheKey {
        CacheKey::derive(&source.identity()).unwrap()
    }

    fn texture(desc: TextureDesc, id: u32) -> GpuTexture {
        GpuTexture::new(desc, Box::new(MockTexture { id }))
    }

    fn insert(cache: &mut GpuTextureCache, source: &Bitmap, id: u32) -> TextureHandle {
        let desc = desc_of(source);
        let fingerprint = ParameterFingerprint::new(None, &desc);
        cache.insert(key_of(source), fingerprint, texture(desc, id), source)
    }

    #[test]
    fn test_basic_insert_lookup() {
        let mut cache = GpuTextureCache::new();
        let bitmap = source(16, 16);
        let desc = desc_of(&bitmap);
        let fingerprint = ParameterFingerprint::new(None, &desc);

        let inserted = insert(&mut cache, &bitmap, 42);
        let found = cache
            .lookup(&key_of(&bitmap), &fingerprint)
            .expect("Texture should be in cache");

        assert!(found.same_texture(&inserted));
        assert_eq!(found.width(), 16);
        assert_eq!(found.vram_size(), 16 * 16 * 4);
        assert!(!found.is_scratch());
        assert_eq!(found.resource_key().map(|k| k.key), Some(key_of(&bitmap)));

        let handle = found
            .backend_handle::<MockTexture>()
            .expect("Should downcast");
        assert_eq!(handle.id, 42);
    }

    #[test]
    fn test_lookup_takes_reference() {
        let mut cache = GpuTextureCache::new();
        let bitmap = source(4, 4);
        let fingerprint = ParameterFingerprint::new(None, &desc_of(&bitmap));

        let first = insert(&mut cache, &bitmap, 1);
        assert_eq!(first.ref_count(), 2);

        let second = cache.lookup(&key_of(&bitmap), &fingerprint).unwrap();
        assert_eq!(second.ref_count(), 3);

        drop(first);
        assert_eq!(second.ref_count(), 2);
    }

    #[test]
    fn test_cache_miss() {
        let mut cache = GpuTextureCache::new();
        let bitmap = source(4, 4);
        let fingerprint = ParameterFingerprint::new(None, &desc_of(&bitmap));

        assert!(cache.lookup(&key_of(&bitmap), &fingerprint).is_none());

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn test_fingerprint_must_match() {
        let mut cache = GpuTextureCache::new();
        let bitmap = source(4, 4);
        let desc = desc_of(&bitmap);
        insert(&mut cache, &bitmap, 1);

        let tiled = TextureParams::tiled(TileMode::Repeat, FilterMode::Bilinear);
        let other = ParameterFingerprint::new(Some(&tiled), &desc);
        assert!(cache.lookup(&key_of(&bitmap), &other).is_none());
        assert!(cache.contains(&key_of(&bitmap), &ParameterFingerprint::new(None, &desc)));
    }

    #[test]
    fn test_insert_replaces_existing_entry() {
        let mut cache = GpuTextureCache::new();
        let bitmap = source(8, 8);

        let old = insert(&mut cache, &bitmap, 1);
        let new = insert(&mut cache, &bitmap, 2);

        assert!(!old.same_texture(&new));
        assert_eq!(old.ref_count(), 1);
        assert_eq!(cache.texture_count(), 1);
        assert_eq!(cache.vram_used(), 8 * 8 * 4);
    }

    #[test]
    fn test_evict_removes_all_fingerprints() {
        let mut cache = GpuTextureCache::new();
        let bitmap = source(4, 4);
        let desc = desc_of(&bitmap);
        let key = key_of(&bitmap);
        let tiled = TextureParams::tiled(TileMode::Mirror, FilterMode::Nearest);

        cache.insert(key, ParameterFingerprint::new(None, &desc), texture(desc, 1), &bitmap);
        let handle = cache.insert(
            key,
            ParameterFingerprint::new(Some(&tiled), &desc),
            texture(desc, 2),
            &bitmap,
        );
        assert_eq!(cache.texture_count(), 2);

        assert_eq!(cache.evict(&key), 2);
        assert_eq!(cache.texture_count(), 0);
        assert_eq!(cache.vram_used(), 0);

        // Outstanding handles outlive the entry
        assert_eq!(handle.ref_count(), 1);
        assert_eq!(cache.evict(&key), 0);
    }

    #[test]
    fn test_invalidation_lifecycle() {
        let mut cache = GpuTextureCache::new();
        let bitmap = source(4, 4);
        let key = key_of(&bitmap);
        let fingerprint = ParameterFingerprint::new(None, &desc_of(&bitmap));

        assert_eq!(cache.slot_state(&key, &fingerprint), SlotState::Empty);
        insert(&mut cache, &bitmap, 1);
        assert_eq!(cache.slot_state(&key, &fingerprint), SlotState::Populated);

        bitmap.pixel_ref().notify_pixels_changed();
        assert_eq!(cache.slot_state(&key, &fingerprint), SlotState::Invalidated);

        // Not evicted until the bus is drained
        assert!(cache.contains(&key, &fingerprint));

        assert_eq!(cache.purge_invalidated(), 1);
        assert_eq!(cache.slot_state(&key, &fingerprint), SlotState::Empty);
        assert!(cache.lookup(&key, &fingerprint).is_none());
        assert_eq!(cache.stats().invalidations, 1);
        assert_eq!(cache.purge_invalidated(), 0);
    }

    #[test]
    fn test_new_generation_gets_new_key() {
        let mut cache = GpuTextureCache::new();
        let bitmap = source(4, 4);
        let fingerprint = ParameterFingerprint::new(None, &desc_of(&bitmap));
        let stale = key_of(&bitmap);
        insert(&mut cache, &bitmap, 1);

        bitmap.pixel_ref().notify_pixels_changed();
        let fresh = key_of(&bitmap);
        assert_ne!(stale, fresh);

        cache.purge_invalidated();
        assert!(cache.lookup(&stale, &fingerprint).is_none());
        assert!(cache.lookup(&fresh, &fingerprint).is_none());
    }

    #[test]
    fn test_stale_message_after_capacity_eviction() {
        let mut cache = GpuTextureCache::new();
        let bitmap = source(4, 4);
        let key = key_of(&bitmap);
        insert(&mut cache, &bitmap, 1);

        cache.evict(&key);
        bitmap.pixel_ref().notify_pixels_changed();

        assert_eq!(cache.bus().pending(), 1);
        assert_eq!(cache.purge_invalidated(), 0);
        assert_eq!(cache.bus().pending(), 0);
    }

    #[test]
    fn test_reinsert_after_capacity_eviction_keeps_one_listener() {
        let policy = BudgetPolicy::with_bytes(usize::MAX).with_max_textures(1);
        let mut cache = GpuTextureCache::with_policy(Box::new(policy));
        let a = source(4, 4);
        let b = source(4, 4);

        for i in 0..50 {
            drop(insert(&mut cache, &a, i));
            drop(insert(&mut cache, &b, i));
            assert_eq!(cache.purge_invalidated(), 0);
        }

        assert_eq!(cache.texture_count(), 1);
        assert_eq!(cache.stats().evictions, 99);
        assert_eq!(a.pixel_ref().listener_count(), 1);
        assert_eq!(b.pixel_ref().listener_count(), 1);

        // The surviving listener still invalidates the re-inserted entry
        drop(insert(&mut cache, &a, 100));
        a.pixel_ref().notify_pixels_changed();
        assert_eq!(cache.purge_invalidated(), 1);
        assert_eq!(a.pixel_ref().listener_count(), 0);

        // A fresh generation gets a fresh listener
        drop(insert(&mut cache, &a, 101));
        assert_eq!(a.pixel_ref().listener_count(), 1);
    }

    #[test]
    fn test_source_changed_before_insert() {
        let mut cache = GpuTextureCache::new();
        let bitmap = source(4, 4);
        let key = key_of(&bitmap);
        let fingerprint = ParameterFingerprint::new(None, &desc_of(&bitmap));

        bitmap.pixel_ref().notify_pixels_changed();
        let desc = desc_of(&bitmap);
        drop(cache.insert(key, fingerprint, texture(desc, 1), &bitmap));

        assert_eq!(cache.slot_state(&key, &fingerprint), SlotState::Invalidated);
        assert_eq!(bitmap.pixel_ref().listener_count(), 0);
        assert_eq!(cache.bus().pending(), 1);

        assert_eq!(cache.purge_invalidated(), 1);
        assert_eq!(cache.texture_count(), 0);
    }

    #[test]
    fn test_lru_eviction() {
        // 16x16 RGBA textures are 1KB each
        let policy = BudgetPolicy::with_bytes(2048);
        let mut cache = GpuTextureCache::with_policy(Box::new(policy));
        let sources: Vec<Bitmap> = (0..3).map(|_| source(16, 16)).collect();

        for (i, bitmap) in sources.iter().enumerate() {
            insert(&mut cache, bitmap, i as u32);
        }

        let fingerprint = ParameterFingerprint::new(None, &desc_of(&sources[0]));
        assert!(!cache.contains(&key_of(&sources[0]), &fingerprint));
        assert!(cache.contains(&key_of(&sources[2]), &fingerprint));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_lru_ordering() {
        let policy = BudgetPolicy::with_bytes(usize::MAX).with_max_textures(2);
        let mut cache = GpuTextureCache::with_policy(Box::new(policy));
        let a = source(16, 16);
        let b = source(16, 16);
        let c = source(16, 16);
        let fingerprint = ParameterFingerprint::new(None, &desc_of(&a));

        drop(insert(&mut cache, &a, 1));
        drop(insert(&mut cache, &b, 2));

        // Access a to make it more recently used
        drop(cache.lookup(&key_of(&a), &fingerprint));

        drop(insert(&mut cache, &c, 3));

        assert!(cache.contains(&key_of(&a), &fingerprint)); // Still present
        assert!(!cache.contains(&key_of(&b), &fingerprint)); // Evicted
        assert!(cache.contains(&key_of(&c), &fingerprint));
    }

    #[test]
    fn test_textures_in_use_survive_capacity_eviction() {
        let policy = BudgetPolicy::with_bytes(1024).with_max_textures(1);
        let mut cache = GpuTextureCache::with_policy(Box::new(policy));
        let a = source(16, 16);
        let b = source(16, 16);
        let fingerprint = ParameterFingerprint::new(None, &desc_of(&a));

        let _held = insert(&mut cache, &a, 1);
        drop(insert(&mut cache, &b, 2));

        assert!(cache.contains(&key_of(&a), &fingerprint));
        assert!(cache.contains(&key_of(&b), &fingerprint));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_clear() {
        let mut cache = GpuTextureCache::new();
        let bitmap = source(4, 4);
        let handle = insert(&mut cache, &bitmap, 1);

        cache.clear();

        assert_eq!(cache.texture_count(), 0);
        assert_eq!(cache.vram_used(), 0);
        assert_eq!(cache.stats().texture_count, 0);
        assert_eq!(handle.ref_count(), 1);
    }

    #[test]
    fn test_hit_rate() {
        let mut cache = GpuTextureCache::new();
        let bitmap = source(4, 4);
        let key = key_of(&bitmap);
        let fingerprint = ParameterFingerprint::new(None, &desc_of(&bitmap));
        insert(&mut cache, &bitmap, 1);

        cache.lookup(&key, &fingerprint);
        cache.lookup(&key, &fingerprint);
        cache.lookup(&key, &fingerprint);
        cache.evict(&key);
        cache.lookup(&key, &fingerprint);

        let stats = cache.stats();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.75);
    }
}
