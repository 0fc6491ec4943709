//! Bitmaps: rectangular views onto shared pixel storage

use std::sync::Arc;

use crate::format::ColorType;
use crate::pixel_ref::PixelRef;
use crate::source::{ChangeListener, LockedPixels, PixelSource, SubscriptionId};

/// Integer rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl IRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A view of a [`PixelRef`], possibly a subset of it
///
/// Cloning a bitmap is cheap and shares the pixels.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pixel_ref: Arc<PixelRef>,
    origin_x: i32,
    origin_y: i32,
    width: i32,
    height: i32,
    volatile: bool,
}

impl Bitmap {
    /// View the whole of `pixel_ref`
    pub fn new(pixel_ref: Arc<PixelRef>) -> Self {
        let info = pixel_ref.info();
        Self {
            pixel_ref,
            origin_x: 0,
            origin_y: 0,
            width: info.width,
            height: info.height,
            volatile: false,
        }
    }

    /// View a sub-rectangle of this bitmap
    ///
    /// Returns `None` if `subset` is empty or not fully inside this bitmap.
    /// The subset shares pixels and volatility with `self`.
    pub fn extract_subset(&self, subset: IRect) -> Option<Bitmap> {
        let inside = subset.x >= 0
            && subset.y >= 0
            && subset.width > 0
            && subset.height > 0
            && subset.x.checked_add(subset.width)? <= self.width
            && subset.y.checked_add(subset.height)? <= self.height;
        if !inside {
            return None;
        }
        Some(Self {
            pixel_ref: Arc::clone(&self.pixel_ref),
            origin_x: self.origin_x + subset.x,
            origin_y: self.origin_y + subset.y,
            width: subset.width,
            height: subset.height,
            volatile: self.volatile,
        })
    }

    /// Mark the bitmap as expected to change often
    pub fn set_volatile(&mut self, volatile: bool) {
        self.volatile = volatile;
    }

    pub fn pixel_ref(&self) -> &Arc<PixelRef> {
        &self.pixel_ref
    }

    /// Bytes between rows of the backing store
    pub fn row_bytes(&self) -> usize {
        self.pixel_ref.row_bytes()
    }
}

impl PixelSource for Bitmap {
    fn generation_id(&self) -> u32 {
        self.pixel_ref.generation_id()
    }

    fn origin(&self) -> (i32, i32) {
        (self.origin_x, self.origin_y)
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn color_type(&self) -> ColorType {
        self.pixel_ref.info().color_type
    }

    fn is_volatile(&self) -> bool {
        self.volatile
    }

    fn lock_pixels(&self) -> Option<LockedPixels<'_>> {
        let store = self.pixel_ref.try_lock()?;
        let color_type = self.color_type();
        let offset = self.origin_y as usize * store.row_bytes
            + self.origin_x as usize * color_type.bytes_per_pixel();
        Some(LockedPixels::new(
            store,
            offset,
            self.width.max(0) as usize,
            self.height.max(0) as usize,
            color_type,
        ))
    }

    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId {
        self.pixel_ref.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.pixel_ref.unsubscribe(id)
    }
}
