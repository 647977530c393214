use crate::layout::types::{ItemId, Point, Rect};

use super::{IndexedItem, LookupTable};

/// Linear scan over every child
#[derive(Debug, Clone, Default)]
pub struct DumbLookupTable {
    items: Vec<IndexedItem>,
}

impl DumbLookupTable {
    pub fn new(items: Vec<IndexedItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl LookupTable for DumbLookupTable {
    fn get(&self, area: Rect) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|item| item.overlaps(&area))
            .map(|item| item.id)
            .collect()
    }

    fn items_at_point(&self, point: Point) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|item| item.covers(point))
            .map(|item| item.id)
            .collect()
    }

    fn has_item_at_point(&self, point: Point) -> bool {
        self.items
            .iter()
            .any(|item| item.visible && item.covers(point))
    }
}
