//! Cell corner cache.
//!
//! Two levels: the full order-3 table (768 cells) is built once and kept for
//! the lifetime of the viewer, because order 3 backs the allsky pass and the
//! traversal roots on every frame. On top of that a single dynamic table
//! serves whatever order the view currently needs; switching orders drops
//! it, so alternating between two non-base orders rebuilds each time. The
//! rebuild counter makes that cost observable.

use std::collections::BTreeMap;

use foundation::math::Vec3;

use crate::index::{cell_vertices, npix};

/// Order of the always-resident corner table.
pub const BASE_ORDER: u8 = 3;

#[derive(Debug)]
pub struct CornerCache {
    base: Vec<[Vec3; 4]>,
    current_order: Option<u8>,
    current: BTreeMap<u64, [Vec3; 4]>,
    rebuilds: u64,
}

impl Default for CornerCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CornerCache {
    pub fn new() -> Self {
        let base = (0..npix(BASE_ORDER))
            .map(|ipix| cell_vertices(BASE_ORDER, ipix))
            .collect();
        Self {
            base,
            current_order: None,
            current: BTreeMap::new(),
            rebuilds: 0,
        }
    }

    /// Corners of `(order, ipix)`, from cache when resident.
    pub fn corners(&mut self, order: u8, ipix: u64) -> [Vec3; 4] {
        if order == BASE_ORDER {
            return self.base[ipix as usize];
        }

        if self.current_order != Some(order) {
            self.current.clear();
            self.current_order = Some(order);
            self.rebuilds += 1;
        }

        *self
            .current
            .entry(ipix)
            .or_insert_with(|| cell_vertices(order, ipix))
    }

    /// Number of times the dynamic table was dropped for a new order.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn cached_len(&self) -> usize {
        self.current.len()
    }
}
