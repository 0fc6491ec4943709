//! Scratch texture pool for volatile pixel sources
//!
//! Scratch textures carry no identity. They are matched on shape and format
//! alone, handed out with whatever contents they had last, and returned to the
//! pool when the caller is done with them.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::backend::{AllocationError, GpuBackend, TextureDesc};
use crate::gpu::{GpuTexture, TextureHandle};

/// Limits on the textures a [`ScratchPool`] keeps around
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchPoolConfig {
    /// Maximum textures to keep per shape and format
    pub max_per_shape: usize,
    /// Maximum textures to keep in total
    pub max_total: usize,
}

impl Default for ScratchPoolConfig {
    fn default() -> Self {
        Self {
            max_per_shape: 10,
            max_total: 100,
        }
    }
}

/// Statistics about scratch pool usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScratchStats {
    pub acquisitions: u64,
    /// Acquisitions served from the pool
    pub reuses: u64,
    /// Acquisitions that had to allocate
    pub allocations: u64,
    /// Textures returned to the pool
    pub releases: u64,
    /// Returned textures dropped because the pool was full
    pub discarded: u64,
    /// Textures currently waiting in the pool
    pub pooled: usize,
}

/// A pool of reusable textures grouped by [`TextureDesc`]
#[derive(Debug, Default)]
pub struct ScratchPool {
    pools: HashMap<TextureDesc, VecDeque<Arc<GpuTexture>>>,
    config: ScratchPoolConfig,
    total_count: usize,
    stats: ScratchStats,
}

impl ScratchPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScratchPoolConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Reuse a pooled texture matching `desc` exactly, or allocate one
    ///
    /// # Errors
    /// Returns [`AllocationError`] if nothing matches and `backend` refuses
    /// the allocation. Nothing is retried.
    pub fn acquire(
        &mut self,
        desc: &TextureDesc,
        backend: &mut dyn GpuBackend,
    ) -> Result<TextureHandle, AllocationError> {
        self.stats.acquisitions += 1;

        if let Some(texture) = self.pools.get_mut(desc).and_then(VecDeque::pop_front) {
            self.total_count -= 1;
            self.stats.reuses += 1;
            self.stats.pooled = self.total_count;
            log::trace!("reusing scratch texture {} for {:?}", texture.id(), desc);
            return Ok(TextureHandle::scratch(texture));
        }

        let handle = backend
            .allocate(desc)
            .ok_or(AllocationError { desc: *desc })?;
        let texture = GpuTexture::new(*desc, handle);
        self.stats.allocations += 1;
        log::trace!("allocated scratch texture {} for {:?}", texture.id(), desc);
        Ok(TextureHandle::scratch(Arc::new(texture)))
    }

    /// Return a scratch texture to the pool for reuse
    ///
    /// Returns true if the texture was pooled. Handles to cached textures,
    /// handles whose texture is still shared, and textures arriving while the
    /// pool is at capacity are dropped instead.
    pub fn release(&mut self, handle: TextureHandle) -> bool {
        if !handle.is_scratch() {
            log::trace!("not pooling cached texture {}", handle.id());
            return false;
        }
        if handle.ref_count() > 1 {
            return false;
        }

        let texture = handle.into_texture();
        let desc = *texture.desc();

        // Don't pool if we're at capacity
        if self.total_count >= self.config.max_total {
            log::trace!("scratch pool at capacity, discarding texture {}", texture.id());
            self.stats.discarded += 1;
            return false;
        }

        let pool = self.pools.entry(desc).or_default();

        // Don't keep too many of the same shape
        if pool.len() >= self.config.max_per_shape {
            log::trace!("scratch pool for {:?} at capacity", desc);
            self.stats.discarded += 1;
            return false;
        }

        pool.push_back(texture);
        self.total_count += 1;
        self.stats.releases += 1;
        self.stats.pooled = self.total_count;
        log::trace!("returned scratch texture for {:?} (total: {})", desc, self.total_count);
        true
    }

    /// Drop every pooled texture
    pub fn clear(&mut self) {
        self.pools.clear();
        self.total_count = 0;
        self.stats.pooled = 0;
    }

    /// Remove empty pools and, above 75% capacity, halve the larger ones
    pub fn trim(&mut self) {
        self.pools.retain(|_, pool| !pool.is_empty());

        if self.total_count > self.config.max_total * 3 / 4 {
            let keep = self.config.max_per_shape / 2;
            for pool in self.pools.values_mut() {
                while pool.len() > keep {
                    pool.pop_back();
                    self.total_count -= 1;
                }
            }
            self.pools.retain(|_, pool| !pool.is_empty());
        }
        self.stats.pooled = self.total_count;
    }

    pub fn pooled(&self) -> usize {
        self.total_count
    }

    pub fn config(&self) -> &ScratchPoolConfig {
        &self.config
    }

    pub fn stats(&self) -> ScratchStats {
        self.stats
    }
}
