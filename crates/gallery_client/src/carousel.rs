use std::collections::HashMap;

use shared::domain::ItemId;

/// Per-item position within the item's image sequence. Items without an
/// entry sit at index 0.
#[derive(Debug, Clone, Default)]
pub struct CarouselState {
    indices: HashMap<ItemId, usize>,
}

impl CarouselState {
    pub fn index(&self, item_id: ItemId) -> usize {
        self.indices.get(&item_id).copied().unwrap_or(0)
    }

    pub fn next(&mut self, item_id: ItemId, len: usize) -> usize {
        if len == 0 {
            return self.index(item_id);
        }
        let index = (self.index(item_id) + 1) % len;
        self.indices.insert(item_id, index);
        index
    }

    pub fn previous(&mut self, item_id: ItemId, len: usize) -> usize {
        if len == 0 {
            return self.index(item_id);
        }
        let index = (self.index(item_id) % len + len - 1) % len;
        self.indices.insert(item_id, index);
        index
    }

    pub fn reset(&mut self) {
        self.indices.clear();
    }
}

#[cfg(test)]
#[path = "tests/carousel_tests.rs"]
mod tests;
