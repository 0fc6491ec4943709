//! Cache identities for pixel sources
//!
//! A [`CacheKey`] is a fixed 32-byte value plus a [`CacheDomain`] tag. Keys in
//! different domains never compare equal, even when their bytes do, so
//! unrelated resource categories can share one cache without aliasing.

use std::fmt;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::OnceLock;

use texcache_render::PixelSourceIdentity;

/// Size in bytes of a key's data
pub const KEY_SIZE: usize = 32;

/// Bytes of the key filled from a pixel source identity; the rest are zero
const IDENTITY_BYTES: usize = 16;

static NEXT_DOMAIN: AtomicU16 = AtomicU16::new(1);
static BITMAP_TEXTURE_DOMAIN: OnceLock<CacheDomain> = OnceLock::new();

/// Namespace tag separating unrelated kinds of cache keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheDomain(u16);

impl CacheDomain {
    /// Allocate a domain no other caller has been given
    pub fn generate() -> Self {
        CacheDomain(NEXT_DOMAIN.fetch_add(1, Ordering::Relaxed))
    }

    /// The domain of keys derived from pixel source identities
    pub fn bitmap_texture() -> Self {
        *BITMAP_TEXTURE_DOMAIN.get_or_init(Self::generate)
    }

    pub fn id(self) -> u16 {
        self.0
    }
}

/// Errors from key derivation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// A dimension does not fit the 16-bit range stored in the key
    #[error("{dimension} {value} is outside the representable range 0..=32767")]
    Range { dimension: &'static str, value: i32 },
}

/// Fixed-width identity of a cached resource
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    domain: CacheDomain,
    data: [u8; KEY_SIZE],
}

impl CacheKey {
    /// Build a key from raw bytes in `domain`
    pub fn new(domain: CacheDomain, data: [u8; KEY_SIZE]) -> Self {
        Self { domain, data }
    }

    /// Derive the texture key of a pixel source identity
    ///
    /// Layout (little-endian): generation id, origin x, origin y as 32-bit
    /// values, then width and height as 16-bit values. Offset and size are
    /// part of the key so subsets of one pixel store get distinct keys.
    ///
    /// # Errors
    /// Returns [`KeyError::Range`] if width or height is negative or does not
    /// fit in 16 bits.
    pub fn derive(identity: &PixelSourceIdentity) -> Result<Self, KeyError> {
        let width = to_dimension("width", identity.width)?;
        let height = to_dimension("height", identity.height)?;

        let mut data = [0u8; KEY_SIZE];
        data[0..4].copy_from_slice(&identity.generation_id.to_le_bytes());
        data[4..8].copy_from_slice(&identity.origin_x.to_le_bytes());
        data[8..12].copy_from_slice(&identity.origin_y.to_le_bytes());
        data[12..14].copy_from_slice(&width.to_le_bytes());
        data[14..IDENTITY_BYTES].copy_from_slice(&height.to_le_bytes());

        Ok(Self::new(CacheDomain::bitmap_texture(), data))
    }

    pub fn domain(&self) -> CacheDomain {
        self.domain
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.data
    }

    /// Generation id a key built by [`CacheKey::derive`] was taken from
    ///
    /// `None` for keys in any other domain.
    pub fn generation_id(&self) -> Option<u32> {
        if self.domain != CacheDomain::bitmap_texture() {
            return None;
        }
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[0..4]);
        Some(u32::from_le_bytes(bytes))
    }
}

fn to_dimension(dimension: &'static str, value: i32) -> Result<i16, KeyError> {
    i16::try_from(value)
        .ok()
        .filter(|v| *v >= 0)
        .ok_or(KeyError::Range { dimension, value })
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({}:", self.domain.0)?;
        for byte in &self.data[..IDENTITY_BYTES] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}
