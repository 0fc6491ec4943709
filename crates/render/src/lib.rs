//! Texture Cache Render Library
//!
//! Pixel sources and their conversion into GPU upload buffers.

pub mod bitmap;
pub mod color_table;
pub mod error;
pub mod format;
pub mod pixel_ref;
pub mod source;
pub mod upload;

pub use bitmap::{Bitmap, IRect};
pub use color_table::{ColorTable, PmColor};
pub use error::PixelError;
pub use format::{ColorType, ImageInfo, PixelConfig, PALETTE_ENTRIES, PALETTE_SIZE};
pub use pixel_ref::{next_generation_id, PixelRef};
pub use source::{ChangeListener, LockedPixels, PixelSource, PixelSourceIdentity, SubscriptionId};
pub use upload::{prepare, UploadBuffer};
