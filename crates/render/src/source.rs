//! The capability interface every pixel source variant implements

use std::sync::MutexGuard;

use crate::color_table::ColorTable;
use crate::error::PixelError;
use crate::format::ColorType;
use crate::pixel_ref::PixelStore;

/// Snapshot of everything that identifies a source's current content
///
/// Taken at request time. Two sources with equal identities show the same
/// pixels, so the snapshot is what texture cache keys are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelSourceIdentity {
    /// Content version of the backing pixel store
    pub generation_id: u32,
    /// Offset of the source inside its backing pixel store
    pub origin_x: i32,
    pub origin_y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelSourceIdentity {
    pub fn new(generation_id: u32, origin_x: i32, origin_y: i32, width: i32, height: i32) -> Self {
        Self {
            generation_id,
            origin_x,
            origin_y,
            width,
            height,
        }
    }
}

/// Handle returned by [`PixelSource::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Callback run once when a source's content or lifetime changes
pub type ChangeListener = Box<dyn FnOnce() + Send>;

/// A source of pixels that can be uploaded to the GPU
pub trait PixelSource {
    /// Current content version; changes on every mutation
    fn generation_id(&self) -> u32;

    /// Offset of this source inside its backing store, as `(x, y)`
    fn origin(&self) -> (i32, i32);

    fn width(&self) -> i32;

    fn height(&self) -> i32;

    fn color_type(&self) -> ColorType;

    /// Volatile sources change often and are never identity-cached
    fn is_volatile(&self) -> bool;

    /// Lock the pixels for reading
    ///
    /// Returns `None` if the pixels cannot be read right now. The lock is
    /// released when the returned guard is dropped.
    fn lock_pixels(&self) -> Option<LockedPixels<'_>>;

    /// Register a listener fired exactly once on the next generation change
    /// or when the backing store is destroyed, then dropped.
    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId;

    /// Remove a listener that has not fired yet
    ///
    /// Returns false if the listener already fired or was never registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Snapshot the identity of the current content
    fn identity(&self) -> PixelSourceIdentity {
        let (origin_x, origin_y) = self.origin();
        PixelSourceIdentity {
            generation_id: self.generation_id(),
            origin_x,
            origin_y,
            width: self.width(),
            height: self.height(),
        }
    }
}

/// Read access to a source's pixels, held for the duration of a read
pub struct LockedPixels<'a> {
    store: MutexGuard<'a, PixelStore>,
    offset: usize,
    width: usize,
    height: usize,
    row_bytes: usize,
    color_type: ColorType,
}

impl<'a> LockedPixels<'a> {
    pub(crate) fn new(
        store: MutexGuard<'a, PixelStore>,
        offset: usize,
        width: usize,
        height: usize,
        color_type: ColorType,
    ) -> Self {
        let row_bytes = store.row_bytes;
        Self {
            store,
            offset,
            width,
            height,
            row_bytes,
            color_type,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Stride between rows in the backing store, including padding
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    pub fn color_type(&self) -> ColorType {
        self.color_type
    }

    pub fn color_table(&self) -> Option<&ColorTable> {
        self.store.color_table.as_ref()
    }

    /// Pixels of row `y`, without the stride padding
    ///
    /// # Errors
    /// Returns [`PixelError::OutOfBounds`] if the row does not lie inside
    /// the backing store.
    pub fn row(&self, y: usize) -> Result<&[u8], PixelError> {
        let pixels = self.store.pixels.as_deref().unwrap_or(&[]);
        let start = self.offset + y * self.row_bytes;
        let end = start + self.width * self.color_type.bytes_per_pixel();
        if y >= self.height || end > pixels.len() {
            return Err(PixelError::OutOfBounds {
                needed: end,
                available: pixels.len(),
            });
        }
        Ok(&pixels[start..end])
    }
}

impl std::fmt::Debug for LockedPixels<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockedPixels")
            .field("offset", &self.offset)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("row_bytes", &self.row_bytes)
            .field("color_type", &self.color_type)
            .finish()
    }
}
