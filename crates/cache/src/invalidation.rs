//! Asynchronous invalidation of cached textures
//!
//! When a texture is cached, a one-shot listener is attached to its pixel
//! source. On the source's next content change (or when its storage is
//! destroyed) the listener posts an [`InvalidationMessage`] to the owning
//! context's [`InvalidationBus`]. Nothing is evicted at that point; the cache
//! owner drains the bus at a point of its choosing and evicts the keys it
//! finds there.
//!
//! The listener holds the key by value and the bus only weakly, so neither
//! the source nor the cache keeps the other alive.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use texcache_render::{PixelSource, SubscriptionId};

use crate::key::CacheKey;

/// Notice that the resources cached under `key` are stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidationMessage {
    pub key: CacheKey,
}

type Queue = Mutex<Vec<InvalidationMessage>>;

/// Per-context queue of invalidation messages
#[derive(Debug, Default)]
pub struct InvalidationBus {
    queue: Arc<Queue>,
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A posting handle that does not keep the bus alive
    pub fn poster(&self) -> BusPoster {
        BusPoster {
            queue: Arc::downgrade(&self.queue),
        }
    }

    /// Take every queued message, leaving the bus empty
    pub fn drain(&self) -> Vec<InvalidationMessage> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of messages waiting to be drained
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if a message for `key` is waiting to be drained
    pub fn is_pending(&self, key: &CacheKey) -> bool {
        self.lock().iter().any(|message| message.key == *key)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<InvalidationMessage>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Weak handle for posting to an [`InvalidationBus`]
#[derive(Debug, Clone)]
pub struct BusPoster {
    queue: Weak<Queue>,
}

impl BusPoster {
    /// Queue `message`; returns false if the bus no longer exists
    pub fn post(&self, message: InvalidationMessage) -> bool {
        match self.queue.upgrade() {
            Some(queue) => {
                queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(message);
                true
            }
            None => false,
        }
    }
}

/// Post an invalidation for `key` to `bus` the next time `source` changes
///
/// The listener fires at most once and deregisters itself afterwards.
pub fn attach(source: &dyn PixelSource, key: CacheKey, bus: &InvalidationBus) -> SubscriptionId {
    let poster = bus.poster();
    source.subscribe(Box::new(move || {
        if !poster.post(InvalidationMessage { key }) {
            log::trace!("invalidation for {:?} dropped, bus is gone", key);
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use texcache_render::{Bitmap, ColorType, ImageInfo, PixelRef, PixelSourceIdentity};

    fn bitmap() -> Bitmap {
        let info = ImageInfo::new(2, 2, ColorType::Alpha8);
        Bitmap::new(PixelRef::tight(info, vec![0; 4], None).unwrap())
    }

    fn key_of(source: &dyn PixelSource) -> CacheKey {
        CacheKey::derive(&source.identity()).unwrap()
    }

    #[test]
    fn test_message_posted_on_change() {
        let bus = InvalidationBus::new();
        let source = bitmap();
        let key = key_of(&source);
        attach(&source, key, &bus);

        assert_eq!(bus.pending(), 0);
        source.pixel_ref().notify_pixels_changed();

        assert!(bus.is_pending(&key));
        assert_eq!(bus.drain(), vec![InvalidationMessage { key }]);
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn test_at_most_one_message_per_attachment() {
        let bus = InvalidationBus::new();
        let source = bitmap();
        attach(&source, key_of(&source), &bus);

        source.pixel_ref().notify_pixels_changed();
        source.pixel_ref().notify_pixels_changed();

        assert_eq!(bus.drain().len(), 1);
        assert_eq!(source.pixel_ref().listener_count(), 0);
    }

    #[test]
    fn test_message_posted_when_source_destroyed() {
        let bus = InvalidationBus::new();
        let source = bitmap();
        let key = key_of(&source);
        attach(&source, key, &bus);

        drop(source);

        assert_eq!(bus.drain(), vec![InvalidationMessage { key }]);
    }

    #[test]
    fn test_listener_does_not_keep_bus_alive() {
        let bus = InvalidationBus::new();
        let poster = bus.poster();
        let source = bitmap();
        attach(&source, key_of(&source), &bus);

        drop(bus);
        source.pixel_ref().notify_pixels_changed();

        let key = CacheKey::derive(&PixelSourceIdentity::new(1, 0, 0, 1, 1)).unwrap();
        assert!(!poster.post(InvalidationMessage { key }));
    }

    #[test]
    fn test_buses_are_independent() {
        let first = InvalidationBus::new();
        let second = InvalidationBus::new();
        let source = bitmap();
        attach(&source, key_of(&source), &first);

        source.pixel_ref().notify_pixels_changed();

        assert_eq!(first.pending(), 1);
        assert_eq!(second.pending(), 0);
    }
}
