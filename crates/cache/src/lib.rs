//! Texture Cache Library
//!
//! Identity-keyed GPU texture cache, scratch texture pool and the invalidation
//! bus that keeps cached textures in step with their pixel sources.

pub mod backend;
pub mod config;
pub mod gpu;
pub mod invalidation;
pub mod key;
pub mod memory_budget;
pub mod params;
pub mod scratch;

#[cfg(test)]
mod testing;

pub use backend::{AllocationError, BackendTexture, GpuBackend, PixelRect, TextureDesc, WriteError};
pub use config::{CacheConfig, ConfigError};
pub use gpu::{GpuCacheStats, GpuTexture, GpuTextureCache, SlotState, TextureHandle};
pub use invalidation::{BusPoster, InvalidationBus, InvalidationMessage};
pub use key::{CacheDomain, CacheKey, KeyError, KEY_SIZE};
pub use memory_budget::{
    BudgetPolicy, CacheFootprint, CapacityPolicy, EvictionCandidate, MemoryBudget,
    MemoryBudgetConfig, MemoryPressure, Unbounded,
};
pub use params::{FilterMode, ParameterFingerprint, ResourceKey, TextureParams, TileMode};
pub use scratch::{ScratchPool, ScratchPoolConfig, ScratchStats};
