//! Spatial lookup over the children of a container
//!
//! Both tables are built from a snapshot of the children's bounding boxes,
//! taken in z-order (back to front), and are never updated in place: a change
//! to any child throws the table away and the next query rebuilds it.
//!
//! - [`DumbLookupTable`]: linear scan, used for small child counts.
//! - [`OptimizingLookupTable`]: uniform square grid over the owner's bounding box.

mod dumb;
mod optimizing;

pub use dumb::DumbLookupTable;
pub use optimizing::OptimizingLookupTable;

use crate::layout::types::{ItemId, Point, Rect};

/// One child as seen by a lookup table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedItem {
    pub id: ItemId,
    /// Bounding box in the owner's coordinates
    pub bbox: Option<Rect>,
    pub visible: bool,
}

impl IndexedItem {
    pub fn new(id: ItemId, bbox: Option<Rect>, visible: bool) -> Self {
        Self { id, bbox, visible }
    }

    fn covers(&self, point: Point) -> bool {
        self.bbox.is_some_and(|b| b.contains(point))
    }

    fn overlaps(&self, area: &Rect) -> bool {
        self.bbox.is_some_and(|b| b.intersects(area))
    }
}

/// Queries answered by every spatial index.
///
/// Results are in z-order (back to front) and contain each item once.
pub trait LookupTable {
    /// Items whose bounding box intersects `area`
    fn get(&self, area: Rect) -> Vec<ItemId>;

    /// Items whose bounding box contains `point`
    fn items_at_point(&self, point: Point) -> Vec<ItemId>;

    /// True as soon as one visible item covers `point`
    fn has_item_at_point(&self, point: Point) -> bool;
}

/// The index a container keeps for its children
#[derive(Debug, Clone)]
pub enum SpatialIndex {
    Dumb(DumbLookupTable),
    Optimizing(OptimizingLookupTable),
}

impl SpatialIndex {
    /// Choose a table for `items`: a linear scan below `dumb_threshold` children,
    /// a grid with `items_per_cell` items per cell otherwise.
    pub fn build(
        items: Vec<IndexedItem>,
        owner_bbox: Option<Rect>,
        dumb_threshold: usize,
        items_per_cell: usize,
    ) -> Self {
        if items.len() < dumb_threshold {
            SpatialIndex::Dumb(DumbLookupTable::new(items))
        } else {
            SpatialIndex::Optimizing(OptimizingLookupTable::new(
                items,
                owner_bbox,
                items_per_cell,
            ))
        }
    }
}

impl LookupTable for SpatialIndex {
    fn get(&self, area: Rect) -> Vec<ItemId> {
        match self {
            SpatialIndex::Dumb(table) => table.get(area),
            SpatialIndex::Optimizing(table) => table.get(area),
        }
    }

    fn items_at_point(&self, point: Point) -> Vec<ItemId> {
        match self {
            SpatialIndex::Dumb(table) => table.items_at_point(point),
            SpatialIndex::Optimizing(table) => table.items_at_point(point),
        }
    }

    fn has_item_at_point(&self, point: Point) -> bool {
        match self {
            SpatialIndex::Dumb(table) => table.has_item_at_point(point),
            SpatialIndex::Optimizing(table) => table.has_item_at_point(point),
        }
    }
}
