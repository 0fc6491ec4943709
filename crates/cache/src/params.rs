//! Sampling parameters and the fingerprint they contribute to lookups

use texcache_render::PixelConfig;

use crate::backend::TextureDesc;
use crate::key::CacheKey;

/// How texture coordinates outside `[0, 1]` are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileMode {
    #[default]
    Clamp,
    Repeat,
    Mirror,
}

/// Texel filtering used when sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    #[default]
    Nearest,
    Bilinear,
}

/// How a texture is going to be sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureParams {
    pub tile_x: TileMode,
    pub tile_y: TileMode,
    pub filter: FilterMode,
}

impl TextureParams {
    pub fn new(tile_x: TileMode, tile_y: TileMode, filter: FilterMode) -> Self {
        Self {
            tile_x,
            tile_y,
            filter,
        }
    }

    /// Same tile mode on both axes
    pub fn tiled(mode: TileMode, filter: FilterMode) -> Self {
        Self::new(mode, mode, filter)
    }

    /// Returns true if either axis wraps
    pub fn is_tiled(&self) -> bool {
        self.tile_x != TileMode::Clamp || self.tile_y != TileMode::Clamp
    }
}

/// The parts of a request that decide whether a cached texture is usable
///
/// Textures built for one fingerprint are never handed out for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterFingerprint {
    pub tile_x: TileMode,
    pub tile_y: TileMode,
    pub filter: FilterMode,
    pub config: PixelConfig,
}

impl ParameterFingerprint {
    /// Fingerprint of sampling `desc` with `params`; `None` means defaults
    pub fn new(params: Option<&TextureParams>, desc: &TextureDesc) -> Self {
        let params = params.copied().unwrap_or_default();
        Self {
            tile_x: params.tile_x,
            tile_y: params.tile_y,
            filter: params.filter,
            config: desc.config,
        }
    }
}

/// Effective lookup key of the texture cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub key: CacheKey,
    pub fingerprint: ParameterFingerprint,
}

impl ResourceKey {
    pub fn new(key: CacheKey, fingerprint: ParameterFingerprint) -> Self {
        Self { key, fingerprint }
    }
}
