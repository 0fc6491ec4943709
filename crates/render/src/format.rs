//! Pixel layouts on the CPU side and their GPU counterparts
//!
//! A pixel source stores its pixels in a [`ColorType`]. The GPU backend only
//! understands [`PixelConfig`]s, so every upload goes through the mapping
//! defined here.

/// Number of entries a palette-indexed texture always reserves.
pub const PALETTE_ENTRIES: usize = 256;

/// Bytes per palette entry in the GPU's packed RGBA representation.
pub const PALETTE_ENTRY_BYTES: usize = 4;

/// Size in bytes of the palette region that prefixes indexed uploads.
pub const PALETTE_SIZE: usize = PALETTE_ENTRIES * PALETTE_ENTRY_BYTES;

/// Layout of pixels in a source's backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorType {
    /// No pixels, or a layout with no known representation
    Unknown,
    /// 8-bit coverage only
    Alpha8,
    /// 16-bit packed 5-6-5, opaque
    Rgb565,
    /// 16-bit packed 4-4-4-4, premultiplied
    Argb4444,
    /// 32-bit premultiplied, bytes in R, G, B, A order
    Rgba8888,
    /// 32-bit premultiplied, bytes in B, G, R, A order
    Bgra8888,
    /// 8-bit index into a color table
    Index8,
}

impl ColorType {
    /// Bytes used by one pixel of this layout
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorType::Unknown => 0,
            ColorType::Alpha8 | ColorType::Index8 => 1,
            ColorType::Rgb565 | ColorType::Argb4444 => 2,
            ColorType::Rgba8888 | ColorType::Bgra8888 => 4,
        }
    }

    /// Returns true for palette-indexed layouts
    pub fn is_indexed(self) -> bool {
        matches!(self, ColorType::Index8)
    }
}

/// Pixel configuration of a GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelConfig {
    /// No GPU representation
    Unknown,
    Alpha8,
    /// 1024-byte palette followed by one index byte per pixel
    Index8,
    Rgb565,
    Rgba4444,
    Rgba8888,
    Bgra8888,
}

impl PixelConfig {
    /// Map a source color type to the config a texture of it is created with
    pub fn from_color_type(color_type: ColorType) -> Self {
        match color_type {
            ColorType::Unknown => PixelConfig::Unknown,
            ColorType::Alpha8 => PixelConfig::Alpha8,
            ColorType::Rgb565 => PixelConfig::Rgb565,
            ColorType::Argb4444 => PixelConfig::Rgba4444,
            ColorType::Rgba8888 => PixelConfig::Rgba8888,
            ColorType::Bgra8888 => PixelConfig::Bgra8888,
            ColorType::Index8 => PixelConfig::Index8,
        }
    }

    /// Map a texture config back to the color type that reads it, if any
    pub fn to_color_type(self) -> Option<ColorType> {
        match self {
            PixelConfig::Unknown => None,
            PixelConfig::Alpha8 => Some(ColorType::Alpha8),
            PixelConfig::Index8 => Some(ColorType::Index8),
            PixelConfig::Rgb565 => Some(ColorType::Rgb565),
            PixelConfig::Rgba4444 => Some(ColorType::Argb4444),
            PixelConfig::Rgba8888 => Some(ColorType::Rgba8888),
            PixelConfig::Bgra8888 => Some(ColorType::Bgra8888),
        }
    }

    /// Bytes per pixel of the texel data, not counting any palette
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelConfig::Unknown => 0,
            PixelConfig::Alpha8 | PixelConfig::Index8 => 1,
            PixelConfig::Rgb565 | PixelConfig::Rgba4444 => 2,
            PixelConfig::Rgba8888 | PixelConfig::Bgra8888 => 4,
        }
    }

    /// Returns true if the config carries a palette prefix
    pub fn is_indexed(self) -> bool {
        matches!(self, PixelConfig::Index8)
    }

    /// Bytes needed to hold a `width` x `height` texture of this config
    pub fn storage_size(self, width: u32, height: u32) -> usize {
        let texels = width as usize * height as usize * self.bytes_per_pixel();
        if self.is_indexed() {
            PALETTE_SIZE + texels
        } else {
            texels
        }
    }
}

/// Dimensions and layout of a block of pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageInfo {
    pub width: i32,
    pub height: i32,
    pub color_type: ColorType,
}

impl ImageInfo {
    pub fn new(width: i32, height: i32, color_type: ColorType) -> Self {
        Self {
            width,
            height,
            color_type,
        }
    }

    /// Smallest row stride that holds one row of this image
    pub fn min_row_bytes(&self) -> usize {
        self.width.max(0) as usize * self.color_type.bytes_per_pixel()
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}
