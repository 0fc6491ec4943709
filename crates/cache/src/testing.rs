//! In-crate backend double for unit tests

use texcache_render::PixelConfig;

use crate::backend::{BackendTexture, GpuBackend, PixelRect, TextureDesc, WriteError};
use crate::gpu::GpuTexture;
use crate::params::TextureParams;

#[derive(Debug)]
pub struct MockTexture;

#[derive(Debug, Default)]
pub struct MockBackend {
    allocations: usize,
    fail: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_allocations(&mut self, fail: bool) {
        self.fail = fail;
    }

    pub fn allocations(&self) -> usize {
        self.allocations
    }
}

impl GpuBackend for MockBackend {
    fn allocate(&mut self, _desc: &TextureDesc) -> Option<BackendTexture> {
        if self.fail {
            return None;
        }
        self.allocations += 1;
        Some(Box::new(MockTexture))
    }

    fn write_pixels(
        &mut self,
        texture: &GpuTexture,
        _rect: PixelRect,
        config: PixelConfig,
        _data: &[u8],
        _row_bytes: usize,
    ) -> Result<(), WriteError> {
        if texture.config() != config {
            return Err(WriteError::ConfigMismatch {
                texture: texture.config(),
                data: config,
            });
        }
        Ok(())
    }

    fn supports_index8(&self, _params: Option<&TextureParams>, _width: u32, _height: u32) -> bool {
        true
    }
}
