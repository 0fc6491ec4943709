//! In-memory GPU backend
//!
//! Textures are plain byte buffers. Used by tests and by callers that need the
//! caching behavior without a GPU.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use texcache_cache::{
    BackendTexture, GpuBackend, GpuTexture, PixelRect, TextureDesc, TextureParams, WriteError,
};
use texcache_render::{PixelConfig, PALETTE_SIZE};

/// Texture storage owned by a [`HeadlessBackend`]
#[derive(Debug)]
pub struct HeadlessTexture {
    desc: TextureDesc,
    pixels: Mutex<Vec<u8>>,
    live: Arc<AtomicUsize>,
}

impl HeadlessTexture {
    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    /// Copy of the stored bytes: palette first for indexed configs
    pub fn contents(&self) -> Vec<u8> {
        self.pixels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for HeadlessTexture {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

/// A [`GpuBackend`] keeping textures in system memory
#[derive(Debug)]
pub struct HeadlessBackend {
    index8: bool,
    fail_allocations: bool,
    live: Arc<AtomicUsize>,
    allocations: usize,
    writes: usize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self {
            index8: true,
            fail_allocations: false,
            live: Arc::new(AtomicUsize::new(0)),
            allocations: 0,
            writes: 0,
        }
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend for a device that cannot sample indexed textures
    pub fn without_index8() -> Self {
        Self {
            index8: false,
            ..Self::default()
        }
    }

    /// Make every following allocation fail (or succeed again)
    pub fn set_fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    /// Textures created by this backend that have not been destroyed
    pub fn live_textures(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Successful allocations so far
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Successful pixel writes so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Read back what was written to `texture`
    ///
    /// Returns `None` for textures created by another backend.
    pub fn read_pixels(&self, texture: &GpuTexture) -> Option<Vec<u8>> {
        texture
            .backend_handle::<HeadlessTexture>()
            .map(HeadlessTexture::contents)
    }
}

impl GpuBackend for HeadlessBackend {
    fn allocate(&mut self, desc: &TextureDesc) -> Option<BackendTexture> {
        if self.fail_allocations {
            return None;
        }

        self.allocations += 1;
        self.live.fetch_add(1, Ordering::Relaxed);
        Some(Box::new(HeadlessTexture {
            desc: *desc,
            pixels: Mutex::new(vec![0; desc.vram_size()]),
            live: Arc::clone(&self.live),
        }))
    }

    fn write_pixels(
        &mut self,
        texture: &GpuTexture,
        rect: PixelRect,
        config: PixelConfig,
        data: &[u8],
        row_bytes: usize,
    ) -> Result<(), WriteError> {
        let storage = texture
            .backend_handle::<HeadlessTexture>()
            .ok_or(WriteError::ForeignTexture)?;
        let desc = storage.desc;

        if config != desc.config {
            return Err(WriteError::ConfigMismatch {
                texture: desc.config,
                data: config,
            });
        }

        let fits = |start: u32, len: u32, limit: u32| {
            start.checked_add(len).is_some_and(|end| end <= limit)
        };
        if !fits(rect.x, rect.width, desc.width) || !fits(rect.y, rect.height, desc.height) {
            return Err(WriteError::RectOutOfBounds {
                rect,
                width: desc.width,
                height: desc.height,
            });
        }

        let indexed = config.is_indexed();
        if indexed && rect != PixelRect::full(&desc) {
            return Err(WriteError::PartialIndexedWrite);
        }

        let bpp = config.bytes_per_pixel();
        let row_len = rect.width as usize * bpp;
        let header = if indexed { PALETTE_SIZE } else { 0 };
        let needed = match rect.height as usize {
            0 => header,
            rows => header + (rows - 1) * row_bytes.max(row_len) + row_len,
        };
        if row_bytes < row_len || data.len() < needed {
            return Err(WriteError::ShortBuffer {
                needed,
                provided: data.len(),
            });
        }

        let mut pixels = storage
            .pixels
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pixels[..header].copy_from_slice(&data[..header]);

        let texture_row = desc.width as usize * bpp;
        for y in 0..rect.height as usize {
            let src = header + y * row_bytes;
            let dst = header + (rect.y as usize + y) * texture_row + rect.x as usize * bpp;
            pixels[dst..dst + row_len].copy_from_slice(&data[src..src + row_len]);
        }

        self.writes += 1;
        Ok(())
    }

    fn supports_index8(&self, params: Option<&TextureParams>, width: u32, height: u32) -> bool {
        if !self.index8 {
            return false;
        }
        // Wrapping modes need power-of-two sizes for indexed textures.
        let tiled = params.is_some_and(TextureParams::is_tiled);
        !tiled || (width.is_power_of_two() && height.is_power_of_two())
    }
}
