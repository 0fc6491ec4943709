//! The seam between the caches and the GPU API that owns the memory

use std::any::Any;

use texcache_render::PixelConfig;

use crate::gpu::GpuTexture;
use crate::params::TextureParams;

/// Platform texture object stored inside a [`GpuTexture`]
pub type BackendTexture = Box<dyn Any + Send + Sync>;

/// Shape and format of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub config: PixelConfig,
    /// Multisample count, 0 for none
    pub sample_count: u32,
}

impl TextureDesc {
    pub fn new(width: u32, height: u32, config: PixelConfig) -> Self {
        Self {
            width,
            height,
            config,
            sample_count: 0,
        }
    }

    /// Bytes of GPU memory a texture with this description occupies
    pub fn vram_size(&self) -> usize {
        self.config.storage_size(self.width, self.height)
    }
}

/// Rectangle of texels targeted by a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole of a texture
    pub fn full(desc: &TextureDesc) -> Self {
        Self::new(0, 0, desc.width, desc.height)
    }
}

/// GPU texture creation failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to allocate texture {desc:?}")]
pub struct AllocationError {
    pub desc: TextureDesc,
}

/// A pixel write was rejected by the backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    #[error("write of {data:?} pixels into a {texture:?} texture")]
    ConfigMismatch {
        texture: PixelConfig,
        data: PixelConfig,
    },

    #[error("write rectangle {rect:?} exceeds the {width}x{height} texture")]
    RectOutOfBounds {
        rect: PixelRect,
        width: u32,
        height: u32,
    },

    #[error("write needs {needed} bytes of data, got {provided}")]
    ShortBuffer { needed: usize, provided: usize },

    /// Indexed textures can only be written as a whole
    #[error("indexed textures cannot be partially updated")]
    PartialIndexedWrite,

    #[error("texture was not created by this backend")]
    ForeignTexture,
}

/// Allocation and upload primitives of a GPU API
///
/// Implementations own no cache policy; they create textures on request and
/// copy pixels into them.
pub trait GpuBackend {
    /// Create an uninitialized texture, or `None` if the GPU refuses
    fn allocate(&mut self, desc: &TextureDesc) -> Option<BackendTexture>;

    /// Copy `data` into `rect` of `texture`
    ///
    /// `row_bytes` is the stride of `data`. For indexed configs `data` starts
    /// with the palette region and `rect` must cover the whole texture.
    fn write_pixels(
        &mut self,
        texture: &GpuTexture,
        rect: PixelRect,
        config: PixelConfig,
        data: &[u8],
        row_bytes: usize,
    ) -> Result<(), WriteError>;

    /// Whether textures of config `Index8` can be sampled with `params`
    fn supports_index8(&self, params: Option<&TextureParams>, width: u32, height: u32) -> bool;
}
