//! Per-rendering-context ownership of textures
//!
//! A [`GpuContext`] bundles a backend with the texture cache, scratch pool and
//! invalidation bus that serve it. Contexts share nothing; a texture cached in
//! one is invisible to every other.

use texcache_cache::{
    AllocationError, CacheConfig, CacheKey, GpuBackend, GpuCacheStats, GpuTexture,
    GpuTextureCache, ParameterFingerprint, PixelRect, ScratchPool, ScratchStats, TextureDesc,
    TextureHandle, TextureParams,
};
use texcache_render::{PixelConfig, PixelSource};

use crate::error::TextureResult;

/// Combined statistics of a context's cache and scratch pool
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextStats {
    pub cache: GpuCacheStats,
    pub scratch: ScratchStats,
}

/// Owner of the textures created through one backend
#[derive(Debug)]
pub struct GpuContext<B: GpuBackend> {
    backend: B,
    cache: GpuTextureCache,
    scratch: ScratchPool,
}

impl<B: GpuBackend> GpuContext<B> {
    /// Context with an unbounded cache and a default scratch pool
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: GpuTextureCache::new(),
            scratch: ScratchPool::new(),
        }
    }

    /// Context whose cache and pool enforce `config`
    pub fn with_config(backend: B, config: &CacheConfig) -> Self {
        Self {
            backend,
            cache: GpuTextureCache::with_policy(Box::new(config.budget_policy())),
            scratch: ScratchPool::with_config(config.scratch_config()),
        }
    }

    /// Allocate a texture for `desc`, fill it from `data` and cache it
    ///
    /// The entry is invalidated when `source` changes. On failure nothing is
    /// cached and the half-built texture is destroyed.
    pub fn create_texture(
        &mut self,
        desc: &TextureDesc,
        params: Option<&TextureParams>,
        key: CacheKey,
        data: &[u8],
        row_bytes: usize,
        source: &dyn PixelSource,
    ) -> TextureResult<TextureHandle> {
        let handle = self
            .backend
            .allocate(desc)
            .ok_or(AllocationError { desc: *desc })?;
        let texture = GpuTexture::new(*desc, handle);
        self.backend
            .write_pixels(&texture, PixelRect::full(desc), desc.config, data, row_bytes)?;

        let fingerprint = ParameterFingerprint::new(params, desc);
        Ok(self.cache.insert(key, fingerprint, texture, source))
    }

    /// Look up a cached texture and take a reference to it
    pub fn find_and_ref(
        &mut self,
        desc: &TextureDesc,
        key: &CacheKey,
        params: Option<&TextureParams>,
    ) -> Option<TextureHandle> {
        self.cache
            .lookup(key, &ParameterFingerprint::new(params, desc))
    }

    pub fn is_in_cache(
        &self,
        desc: &TextureDesc,
        key: &CacheKey,
        params: Option<&TextureParams>,
    ) -> bool {
        self.cache
            .contains(key, &ParameterFingerprint::new(params, desc))
    }

    /// Take an uncached texture matching `desc` from the scratch pool
    ///
    /// Its contents are stale; callers overwrite them fully.
    pub fn acquire_scratch(&mut self, desc: &TextureDesc) -> TextureResult<TextureHandle> {
        Ok(self.scratch.acquire(desc, &mut self.backend)?)
    }

    /// Copy `data` into `rect` of `texture`
    pub fn write_pixels(
        &mut self,
        texture: &TextureHandle,
        rect: PixelRect,
        config: PixelConfig,
        data: &[u8],
        row_bytes: usize,
    ) -> TextureResult<()> {
        self.backend
            .write_pixels(texture, rect, config, data, row_bytes)?;
        Ok(())
    }

    /// Return a scratch texture to the pool
    ///
    /// Returns false if the handle was dropped instead (it was cached, still
    /// shared, or the pool is full).
    pub fn unlock_scratch(&mut self, handle: TextureHandle) -> bool {
        self.scratch.release(handle)
    }

    /// Give up a reference obtained from this context
    pub fn release(&mut self, handle: TextureHandle) {
        if handle.is_scratch() {
            self.scratch.release(handle);
        }
    }

    /// Apply queued invalidations and trim the scratch pool
    ///
    /// Returns the number of cache entries evicted.
    pub fn flush(&mut self) -> usize {
        let evicted = self.cache.purge_invalidated();
        self.scratch.trim();
        evicted
    }

    pub fn stats(&self) -> ContextStats {
        ContextStats {
            cache: self.cache.stats(),
            scratch: self.scratch.stats(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn cache(&self) -> &GpuTextureCache {
        &self.cache
    }

    pub fn scratch_pool(&self) -> &ScratchPool {
        &self.scratch
    }
}
