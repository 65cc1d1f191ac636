//! Fixed-capacity tile buffer.
//!
//! A flat ring of slots with round-robin eviction: the slot under the write
//! pointer is recycled regardless of how recently its tile was used, so
//! memory stays bounded without any usage bookkeeping. A URL map gives O(log
//! n) residency checks. Completions for evicted URLs are simply dropped.

use std::collections::BTreeMap;

use crate::tile::{TileImage, TileState};

/// Default number of tile slots.
pub const NB_MAX_TILES: usize = 800;

#[derive(Debug)]
pub struct TileBuffer {
    slots: Vec<Option<TileImage>>,
    by_url: BTreeMap<String, usize>,
    pointer: usize,
}

impl Default for TileBuffer {
    fn default() -> Self {
        Self::new(NB_MAX_TILES)
    }
}

impl TileBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "tile buffer needs at least one slot");
        Self {
            slots: vec![None; capacity],
            by_url: BTreeMap::new(),
            pointer: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.by_url.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<&TileImage> {
        self.by_url.get(url).and_then(|&i| self.slots[i].as_ref())
    }

    pub fn state(&self, url: &str) -> Option<TileState> {
        self.get(url).map(|t| t.state)
    }

    pub fn is_ready(&self, url: &str) -> bool {
        self.state(url).is_some_and(|s| s.is_ready())
    }

    /// Claims a slot for `url` in `Pending` state, evicting whatever the
    /// write pointer lands on. Returns `None` if the URL is already
    /// resident; the existing slot (whatever its state) is kept untouched.
    pub fn add_tile(&mut self, url: &str) -> Option<usize> {
        if self.by_url.contains_key(url) {
            return None;
        }

        let slot = self.pointer;
        if let Some(old) = self.slots[slot].take() {
            self.by_url.remove(&old.url);
        }
        self.slots[slot] = Some(TileImage::pending(url));
        self.by_url.insert(url.to_owned(), slot);
        self.pointer = (self.pointer + 1) % self.slots.len();
        Some(slot)
    }

    /// Marks a pending tile as decoded. Returns `false` when the URL is no
    /// longer resident (evicted while in flight) and the result was dropped.
    pub fn mark_ready(&mut self, url: &str, width: u32, height: u32) -> bool {
        self.set_state(url, TileState::Ready { width, height })
    }

    /// Marks a pending tile as failed. Same eviction semantics as
    /// [`mark_ready`](Self::mark_ready).
    pub fn mark_errored(&mut self, url: &str) -> bool {
        self.set_state(url, TileState::Errored)
    }

    fn set_state(&mut self, url: &str, state: TileState) -> bool {
        let Some(&slot) = self.by_url.get(url) else {
            return false;
        };
        if let Some(tile) = self.slots[slot].as_mut() {
            tile.state = state;
            return true;
        }
        false
    }

    /// Resident URLs in slot order, for diagnostics.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter_map(|s| s.as_ref().map(|t| t.url.as_str()))
    }
}
