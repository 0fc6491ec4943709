//! Texture Cache Core Library
//!
//! Rendering contexts that turn pixel sources into GPU textures, caching the
//! ones whose content is stable.

pub mod bitmap_texture;
pub mod context;
pub mod error;
pub mod headless;

pub use context::{ContextStats, GpuContext};
pub use error::{ErrorKind, TextureError, TextureResult};
pub use headless::{HeadlessBackend, HeadlessTexture};

pub use texcache_cache as cache;
pub use texcache_render as render;
