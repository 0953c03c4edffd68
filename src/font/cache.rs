//! Per-document font cache.

use super::Font;
use crate::parser::object::ObjectId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// Identity of a font within a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FontKey {
    /// A font dictionary that is an indirect object.
    Object(ObjectId),
    /// A font dictionary written inline in a resource dictionary, keyed by
    /// the object owning that dictionary or, failing that, by page number.
    Inline {
        owner: Option<ObjectId>,
        page: Option<u32>,
        name: String,
    },
}

type Slot = Arc<OnceLock<Arc<Font>>>;

/// Fonts decoded so far, keyed by [`FontKey`].
///
/// The first caller for a key runs the decode; concurrent callers for the same
/// key wait on that key's slot only. Later lookups take a shared read lock.
#[derive(Debug, Default)]
pub struct FontCache {
    slots: RwLock<HashMap<FontKey, Slot>>,
    decoded: AtomicUsize,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached font for `key`, decoding it with `load` on first use.
    pub fn get_or_load(&self, key: FontKey, load: impl FnOnce() -> Font) -> Arc<Font> {
        let slot = self.slot(key);
        let font = slot.get_or_init(|| {
            self.decoded.fetch_add(1, Ordering::Relaxed);
            Arc::new(load())
        });
        Arc::clone(font)
    }

    fn slot(&self, key: FontKey) -> Slot {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key).or_default())
    }

    /// Number of decodes performed.
    pub fn decoded_count(&self) -> usize {
        self.decoded.load(Ordering::Relaxed)
    }

    /// Number of distinct keys seen.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
