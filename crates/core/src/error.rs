//! Error type of texture requests

use texcache_cache::{AllocationError, KeyError, WriteError};
use texcache_render::{ColorType, PixelError};

/// Why a texture could not be produced
///
/// Every variant leaves the cache unchanged; the caller may fall back to
/// drawing from system memory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextureError {
    #[error("invalid cache key: {0}")]
    Key(#[from] KeyError),

    #[error("pixel conversion failed: {0}")]
    Pixels(#[from] PixelError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("pixel upload failed: {0}")]
    Write(#[from] WriteError),

    #[error("color type {0:?} has no texture representation")]
    UnsupportedFormat(ColorType),
}

/// Coarse classification of a [`TextureError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source geometry does not fit a cache key
    Range,
    /// Source pixels could not be locked
    NotReady,
    /// No texture format or conversion exists for the source
    UnsupportedFormat,
    /// The GPU refused to create a texture
    Allocation,
    /// Source pixels or the upload itself were malformed
    Upload,
}

impl TextureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TextureError::Key(KeyError::Range { .. }) => ErrorKind::Range,
            TextureError::Pixels(PixelError::NotReady) => ErrorKind::NotReady,
            TextureError::Pixels(PixelError::UnsupportedFormat { .. })
            | TextureError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            TextureError::Pixels(_) | TextureError::Write(_) => ErrorKind::Upload,
            TextureError::Allocation(_) => ErrorKind::Allocation,
        }
    }
}

pub type TextureResult<T> = Result<T, TextureError>;
