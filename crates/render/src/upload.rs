//! Conversion of source pixels into GPU upload buffers
//!
//! Upload buffers are always tightly packed: any stride padding in the source
//! is dropped row by row. Indexed uploads carry a full 256-entry palette in
//! front of the index bytes, whatever the size of the source's color table.

use crate::color_table::{ColorTable, PmColor};
use crate::error::PixelError;
use crate::format::{ColorType, PixelConfig, PALETTE_ENTRY_BYTES, PALETTE_SIZE};
use crate::source::{LockedPixels, PixelSource};

/// Tightly packed pixels ready to be written to a texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    config: PixelConfig,
}

impl UploadBuffer {
    /// The whole buffer, palette included for indexed configs
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn config(&self) -> PixelConfig {
        self.config
    }

    /// Stride of the texel rows; rows are packed, so this is
    /// `width * bytes_per_pixel`.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.config.bytes_per_pixel()
    }

    /// The palette region of an indexed buffer
    pub fn palette(&self) -> Option<&[u8]> {
        self.config
            .is_indexed()
            .then(|| &self.data[..PALETTE_SIZE])
    }

    /// The texel rows, without any palette
    pub fn pixels(&self) -> &[u8] {
        if self.config.is_indexed() {
            &self.data[PALETTE_SIZE..]
        } else {
            &self.data
        }
    }
}

/// Convert `source` into a buffer for a texture of config `target`
///
/// Supported conversions are a source to its own config, `Index8` to a
/// 32-bit config (palette expansion, for devices without indexed textures)
/// and between the two 32-bit byte orders.
///
/// # Errors
/// - [`PixelError::UnsupportedFormat`] if no conversion exists
/// - [`PixelError::NotReady`] if the source cannot be locked
/// - [`PixelError::OutOfBounds`] if the declared geometry exceeds the store
pub fn prepare(source: &dyn PixelSource, target: PixelConfig) -> Result<UploadBuffer, PixelError> {
    let color_type = source.color_type();
    let conversion = Conversion::select(color_type, target)?;

    let locked = source.lock_pixels().ok_or(PixelError::NotReady)?;
    let width = locked.width();
    let height = locked.height();

    let data = match conversion {
        Conversion::Copy => trimmed_rows(&locked, target.bytes_per_pixel(), |row, out| {
            out.extend_from_slice(row)
        })?,
        Conversion::Swizzle => trimmed_rows(&locked, 4, |row, out| {
            for px in row.chunks_exact(4) {
                out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
            }
        })?,
        Conversion::Palette => {
            let table = locked.color_table().ok_or(PixelError::MissingColorTable)?;
            let mut data = Vec::with_capacity(PALETTE_SIZE + width * height);
            data.extend_from_slice(&palette_region(table));
            append_rows(&locked, &mut data, |row, out| out.extend_from_slice(row))?;
            data
        }
        Conversion::Expand => {
            let table = locked.color_table().ok_or(PixelError::MissingColorTable)?;
            let bgra = target == PixelConfig::Bgra8888;
            trimmed_rows(&locked, 4, |row, out| {
                for &index in row {
                    let color = table.get(index).unwrap_or_default();
                    if bgra {
                        out.extend_from_slice(&color.to_bgra_bytes());
                    } else {
                        out.extend_from_slice(&color.to_rgba_bytes());
                    }
                }
            })?
        }
    };

    Ok(UploadBuffer {
        data,
        width: width as u32,
        height: height as u32,
        config: target,
    })
}

/// Encode a color table as a full-size GPU palette
///
/// Entries past the live colors are zero (transparent black).
pub fn palette_region(table: &ColorTable) -> [u8; PALETTE_SIZE] {
    let mut palette = [0u8; PALETTE_SIZE];
    for (slot, color) in palette
        .chunks_exact_mut(PALETTE_ENTRY_BYTES)
        .zip(table.colors())
    {
        slot.copy_from_slice(&PmColor::to_rgba_bytes(*color));
    }
    palette
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Copy,
    Swizzle,
    Palette,
    Expand,
}

impl Conversion {
    fn select(color_type: ColorType, target: PixelConfig) -> Result<Self, PixelError> {
        let native = PixelConfig::from_color_type(color_type);
        match (color_type, target) {
            (ColorType::Index8, PixelConfig::Index8) => Ok(Conversion::Palette),
            (ColorType::Index8, PixelConfig::Rgba8888 | PixelConfig::Bgra8888) => {
                Ok(Conversion::Expand)
            }
            (ColorType::Rgba8888, PixelConfig::Bgra8888)
            | (ColorType::Bgra8888, PixelConfig::Rgba8888) => Ok(Conversion::Swizzle),
            _ if native == target && native != PixelConfig::Unknown => Ok(Conversion::Copy),
            _ => Err(PixelError::UnsupportedFormat {
                color_type,
                config: target,
            }),
        }
    }
}

fn trimmed_rows<F>(
    locked: &LockedPixels<'_>,
    out_bytes_per_pixel: usize,
    convert_row: F,
) -> Result<Vec<u8>, PixelError>
where
    F: FnMut(&[u8], &mut Vec<u8>),
{
    let mut data = Vec::with_capacity(locked.width() * locked.height() * out_bytes_per_pixel);
    append_rows(locked, &mut data, convert_row)?;
    Ok(data)
}

fn append_rows<F>(
    locked: &LockedPixels<'_>,
    out: &mut Vec<u8>,
    mut convert_row: F,
) -> Result<(), PixelError>
where
    F: FnMut(&[u8], &mut Vec<u8>),
{
    for y in 0..locked.height() {
        convert_row(locked.row(y)?, out);
    }
    Ok(())
}
