//! Shared pixel storage with a content generation counter
//!
//! A [`PixelRef`] owns the actual pixel bytes. Bitmaps are views onto a
//! pixel ref, so several bitmaps (subsets) can share one store. Every mutation
//! assigns a fresh, process-unique generation id and fires the one-shot change
//! listeners registered since the previous mutation.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::color_table::ColorTable;
use crate::error::PixelError;
use crate::format::ImageInfo;
use crate::source::{ChangeListener, SubscriptionId};

static NEXT_GENERATION_ID: AtomicU32 = AtomicU32::new(1);
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Hand out a generation id no other pixel store has used
///
/// Zero is never returned.
pub fn next_generation_id() -> u32 {
    loop {
        let id = NEXT_GENERATION_ID.fetch_add(1, Ordering::Relaxed);
        if id != 0 {
            return id;
        }
    }
}

pub(crate) struct PixelStore {
    /// `None` until the pixels have been decoded
    pub(crate) pixels: Option<Vec<u8>>,
    pub(crate) row_bytes: usize,
    pub(crate) color_table: Option<ColorTable>,
}

/// Generation-counted pixel storage shared by bitmaps
pub struct PixelRef {
    info: ImageInfo,
    store: Mutex<PixelStore>,
    generation_id: AtomicU32,
    listeners: Mutex<Vec<(SubscriptionId, ChangeListener)>>,
}

impl PixelRef {
    /// Wrap decoded pixels
    ///
    /// # Errors
    /// Fails if `pixels` is too small for `info` and `row_bytes`, if the
    /// stride is smaller than a row, or if indexed pixels come without a
    /// color table.
    pub fn new(
        info: ImageInfo,
        row_bytes: usize,
        pixels: Vec<u8>,
        color_table: Option<ColorTable>,
    ) -> Result<Arc<Self>, PixelError> {
        validate_layout(&info, row_bytes, color_table.as_ref())?;
        validate_len(&info, row_bytes, pixels.len())?;
        Ok(Arc::new(Self::from_store(
            info,
            PixelStore {
                pixels: Some(pixels),
                row_bytes,
                color_table,
            },
        )))
    }

    /// Wrap pixels whose rows are packed without padding
    pub fn tight(
        info: ImageInfo,
        pixels: Vec<u8>,
        color_table: Option<ColorTable>,
    ) -> Result<Arc<Self>, PixelError> {
        Self::new(info, info.min_row_bytes(), pixels, color_table)
    }

    /// Storage whose pixels are not decoded yet; locking fails until
    /// [`PixelRef::fulfill`] is called.
    pub fn pending(
        info: ImageInfo,
        row_bytes: usize,
        color_table: Option<ColorTable>,
    ) -> Result<Arc<Self>, PixelError> {
        validate_layout(&info, row_bytes, color_table.as_ref())?;
        Ok(Arc::new(Self::from_store(
            info,
            PixelStore {
                pixels: None,
                row_bytes,
                color_table,
            },
        )))
    }

    fn from_store(info: ImageInfo, store: PixelStore) -> Self {
        Self {
            info,
            store: Mutex::new(store),
            generation_id: AtomicU32::new(next_generation_id()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Provide the decoded pixels of a pending store
    ///
    /// Decoding does not change the content a caller could have observed, so
    /// the generation id is kept.
    pub fn fulfill(&self, pixels: Vec<u8>) -> Result<(), PixelError> {
        let mut store = self.lock_store();
        validate_len(&self.info, store.row_bytes, pixels.len())?;
        store.pixels = Some(pixels);
        Ok(())
    }

    pub fn info(&self) -> ImageInfo {
        self.info
    }

    pub fn row_bytes(&self) -> usize {
        self.lock_store().row_bytes
    }

    pub fn generation_id(&self) -> u32 {
        self.generation_id.load(Ordering::Acquire)
    }

    /// Returns true once the pixels are available for reading
    pub fn is_ready(&self) -> bool {
        self.lock_store().pixels.is_some()
    }

    /// Try to lock the pixels without waiting
    pub(crate) fn try_lock(&self) -> Option<MutexGuard<'_, PixelStore>> {
        let store = self.store.try_lock().ok()?;
        store.pixels.as_ref()?;
        Some(store)
    }

    /// Mutate the pixels in place, then publish a new generation
    ///
    /// # Errors
    /// Returns [`PixelError::NotReady`] if the pixels are not decoded yet.
    pub fn edit_pixels<F: FnOnce(&mut [u8])>(&self, edit: F) -> Result<(), PixelError> {
        {
            let mut store = self.lock_store();
            let pixels = store.pixels.as_mut().ok_or(PixelError::NotReady)?;
            edit(pixels);
        }
        self.notify_pixels_changed();
        Ok(())
    }

    /// Replace the palette of an indexed store, then publish a new generation
    pub fn set_color_table(&self, color_table: ColorTable) {
        self.lock_store().color_table = Some(color_table);
        self.notify_pixels_changed();
    }

    /// Assign a fresh generation id and fire all pending change listeners
    pub fn notify_pixels_changed(&self) {
        let previous = self
            .generation_id
            .swap(next_generation_id(), Ordering::AcqRel);
        log::trace!(
            "pixel ref generation {} -> {}",
            previous,
            self.generation_id()
        );
        self.fire_listeners();
    }

    pub fn subscribe(&self, listener: ChangeListener) -> SubscriptionId {
        let id = SubscriptionId(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Number of listeners waiting for the next change
    pub fn listener_count(&self) -> usize {
        self.lock_listeners().len()
    }

    fn fire_listeners(&self) {
        // Take the listeners out first so a listener may subscribe again.
        let listeners = std::mem::take(&mut *self.lock_listeners());
        for (_, listener) in listeners {
            listener();
        }
    }

    fn lock_store(&self) -> MutexGuard<'_, PixelStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(SubscriptionId, ChangeListener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PixelRef {
    fn drop(&mut self) {
        self.fire_listeners();
    }
}

impl std::fmt::Debug for PixelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelRef")
            .field("info", &self.info)
            .field("generation_id", &self.generation_id())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

fn validate_layout(
    info: &ImageInfo,
    row_bytes: usize,
    color_table: Option<&ColorTable>,
) -> Result<(), PixelError> {
    let min_row_bytes = info.min_row_bytes();
    if row_bytes < min_row_bytes {
        return Err(PixelError::RowBytesTooSmall {
            row_bytes,
            min_row_bytes,
        });
    }
    if info.color_type.is_indexed() && color_table.is_none() {
        return Err(PixelError::MissingColorTable);
    }
    Ok(())
}

fn validate_len(info: &ImageInfo, row_bytes: usize, len: usize) -> Result<(), PixelError> {
    let needed = if info.is_empty() {
        0
    } else {
        row_bytes * (info.height as usize - 1) + info.min_row_bytes()
    };
    if len < needed {
        return Err(PixelError::OutOfBounds {
            needed,
            available: len,
        });
    }
    Ok(())
}
