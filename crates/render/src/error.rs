use crate::format::{ColorType, PixelConfig};

/// Errors raised while building or reading pixel sources
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PixelError {
    /// The source could not be locked for reading right now
    #[error("pixels are not ready to be read")]
    NotReady,

    /// There is no conversion from the source layout to the requested config
    #[error("cannot convert {color_type:?} pixels to {config:?}")]
    UnsupportedFormat {
        color_type: ColorType,
        config: PixelConfig,
    },

    /// The declared geometry reaches past the backing store
    #[error("pixel access out of bounds: need {needed} bytes, have {available}")]
    OutOfBounds { needed: usize, available: usize },

    /// Row stride is smaller than one row of pixels
    #[error("row stride {row_bytes} is smaller than the minimum {min_row_bytes}")]
    RowBytesTooSmall { row_bytes: usize, min_row_bytes: usize },

    /// Indexed pixels were provided without a color table
    #[error("indexed pixels require a color table")]
    MissingColorTable,

    /// A color table may hold at most 256 entries
    #[error("color table holds {0} entries, the maximum is 256")]
    PaletteTooLarge(usize),
}
