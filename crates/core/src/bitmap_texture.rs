//! Textures for pixel sources
//!
//! Non-volatile sources are cached under a key derived from their identity
//! and reused until they change. Volatile sources bypass the cache and are
//! uploaded into a scratch texture on every request.

use texcache_cache::{
    CacheKey, GpuBackend, KeyError, PixelRect, TextureDesc, TextureHandle, TextureParams,
};
use texcache_render::{prepare, PixelConfig, PixelSource};

use crate::context::GpuContext;
use crate::error::{TextureError, TextureResult};

impl<B: GpuBackend> GpuContext<B> {
    /// Get a texture holding the pixels of `source`, taking a reference to it
    ///
    /// Logs one warning and returns the error if no texture can be produced;
    /// the cache is left as it was.
    pub fn lock_and_ref_texture(
        &mut self,
        source: &dyn PixelSource,
        params: Option<&TextureParams>,
    ) -> TextureResult<TextureHandle> {
        let result = self.texture_for(source, params);
        if let Err(err) = &result {
            log::warn!("no texture for {:?}: {}", source.identity(), err);
        }
        result
    }

    /// Returns true if a request for `source` would be served from the cache
    pub fn is_source_in_cache(
        &self,
        source: &dyn PixelSource,
        params: Option<&TextureParams>,
    ) -> bool {
        if source.is_volatile() {
            return false;
        }
        let (Ok(key), Ok(desc)) = (
            CacheKey::derive(&source.identity()),
            self.texture_desc(source, params),
        ) else {
            return false;
        };
        self.is_in_cache(&desc, &key, params)
    }

    /// Drop a reference taken by [`lock_and_ref_texture`](Self::lock_and_ref_texture)
    pub fn unlock_and_unref(&mut self, handle: TextureHandle) {
        self.release(handle);
    }

    /// Shape and config of the texture `source` is uploaded into
    ///
    /// Indexed sources fall back to RGBA when the backend cannot sample
    /// indexed textures with `params`.
    pub fn texture_desc(
        &self,
        source: &dyn PixelSource,
        params: Option<&TextureParams>,
    ) -> TextureResult<TextureDesc> {
        let color_type = source.color_type();
        let mut config = PixelConfig::from_color_type(color_type);
        if config == PixelConfig::Unknown {
            return Err(TextureError::UnsupportedFormat(color_type));
        }

        let width = dimension("width", source.width())?;
        let height = dimension("height", source.height())?;

        if config.is_indexed() && !self.backend().supports_index8(params, width, height) {
            log::debug!("expanding {}x{} indexed source to RGBA", width, height);
            config = PixelConfig::Rgba8888;
        }
        Ok(TextureDesc::new(width, height, config))
    }

    fn texture_for(
        &mut self,
        source: &dyn PixelSource,
        params: Option<&TextureParams>,
    ) -> TextureResult<TextureHandle> {
        let desc = self.texture_desc(source, params)?;

        if source.is_volatile() {
            return self.scratch_texture_for(source, &desc);
        }

        let key = CacheKey::derive(&source.identity())?;
        if let Some(handle) = self.find_and_ref(&desc, &key, params) {
            return Ok(handle);
        }

        let upload = prepare(source, desc.config)?;
        self.create_texture(&desc, params, key, upload.data(), upload.row_bytes(), source)
    }

    fn scratch_texture_for(
        &mut self,
        source: &dyn PixelSource,
        desc: &TextureDesc,
    ) -> TextureResult<TextureHandle> {
        let upload = prepare(source, desc.config)?;
        let handle = self.acquire_scratch(desc)?;

        let written = self.write_pixels(
            &handle,
            PixelRect::full(desc),
            upload.config(),
            upload.data(),
            upload.row_bytes(),
        );
        match written {
            Ok(()) => Ok(handle),
            Err(err) => {
                self.unlock_scratch(handle);
                Err(err)
            }
        }
    }
}

fn dimension(name: &'static str, value: i32) -> TextureResult<u32> {
    u32::try_from(value).map_err(|_| {
        TextureError::Key(KeyError::Range {
            dimension: name,
            value,
        })
    })
}
