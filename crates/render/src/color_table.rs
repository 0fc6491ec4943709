//! Palettes for indexed pixel sources

use crate::error::PixelError;
use crate::format::PALETTE_ENTRIES;

/// A premultiplied color packed as `a << 24 | r << 16 | g << 8 | b`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PmColor(pub u32);

impl PmColor {
    /// Pack already-premultiplied components
    pub const fn pack(a: u8, r: u8, g: u8, b: u8) -> Self {
        PmColor((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Premultiply unpremultiplied components and pack them
    pub fn premultiply(a: u8, r: u8, g: u8, b: u8) -> Self {
        if a == 255 {
            return Self::pack(a, r, g, b);
        }
        Self::pack(
            a,
            mul_div_255_round(r, a),
            mul_div_255_round(g, a),
            mul_div_255_round(b, a),
        )
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Bytes in the order an `Rgba8888` texture expects
    pub fn to_rgba_bytes(self) -> [u8; 4] {
        [self.red(), self.green(), self.blue(), self.alpha()]
    }

    /// Bytes in the order a `Bgra8888` texture expects
    pub fn to_bgra_bytes(self) -> [u8; 4] {
        [self.blue(), self.green(), self.red(), self.alpha()]
    }
}

fn mul_div_255_round(value: u8, alpha: u8) -> u8 {
    let prod = value as u32 * alpha as u32 + 128;
    ((prod + (prod >> 8)) >> 8) as u8
}

/// Color table referenced by `Index8` pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: Vec<PmColor>,
}

impl ColorTable {
    /// Create a table from premultiplied colors
    ///
    /// # Errors
    /// Returns [`PixelError::PaletteTooLarge`] for more than 256 entries.
    pub fn new(colors: Vec<PmColor>) -> Result<Self, PixelError> {
        if colors.len() > PALETTE_ENTRIES {
            return Err(PixelError::PaletteTooLarge(colors.len()));
        }
        Ok(Self { colors })
    }

    /// Number of live entries
    pub fn count(&self) -> usize {
        self.colors.len()
    }

    pub fn colors(&self) -> &[PmColor] {
        &self.colors
    }

    /// Color for an index, or `None` past the live entries
    pub fn get(&self, index: u8) -> Option<PmColor> {
        self.colors.get(index as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_and_unpack() {
        let c = PmColor::pack(0x80, 0x10, 0x20, 0x30);
        assert_eq!(c.0, 0x8010_2030);
        assert_eq!(c.alpha(), 0x80);
        assert_eq!(c.red(), 0x10);
        assert_eq!(c.green(), 0x20);
        assert_eq!(c.blue(), 0x30);
    }

    #[test]
    fn test_byte_orders() {
        let c = PmColor::pack(4, 1, 2, 3);
        assert_eq!(c.to_rgba_bytes(), [1, 2, 3, 4]);
        assert_eq!(c.to_bgra_bytes(), [3, 2, 1, 4]);
    }

    #[test]
    fn test_premultiply() {
        assert_eq!(PmColor::premultiply(255, 200, 100, 50), PmColor::pack(255, 200, 100, 50));
        assert_eq!(PmColor::premultiply(0, 200, 100, 50), PmColor::pack(0, 0, 0, 0));
        let half = PmColor::premultiply(128, 255, 0, 0);
        assert_eq!(half.red(), 128);
        assert_eq!(half.alpha(), 128);
    }

    #[test]
    fn test_table_limits() {
        assert!(ColorTable::new(vec![PmColor::default(); 256]).is_ok());
        assert_eq!(
            ColorTable::new(vec![PmColor::default(); 257]),
            Err(PixelError::PaletteTooLarge(257))
        );

        let table = ColorTable::new(vec![PmColor::pack(255, 1, 1, 1)]).unwrap();
        assert_eq!(table.count(), 1);
        assert!(table.get(0).is_some());
        assert!(table.get(1).is_none());
    }
}
