use smallvec::SmallVec;

use crate::layout::types::{ItemId, Point, Rect};

use super::{IndexedItem, LookupTable};

/// Uniform square grid over the owner's bounding box.
///
/// Cells hold positions into the z-ordered item list, so results can be put
/// back into z-order by sorting those positions. The grid only narrows the
/// candidates; every candidate is re-tested against its real bounding box.
#[derive(Debug, Clone)]
pub struct OptimizingLookupTable {
    items: Vec<IndexedItem>,
    dimension: usize,
    origin: Point,
    cell_width: f64,
    cell_height: f64,
    // Row-major, `dimension * dimension` entries; empty when the owner has no extent.
    cells: Vec<SmallVec<[usize; 8]>>,
}

impl OptimizingLookupTable {
    #[tracing::instrument(level = "debug", skip_all, fields(items = items.len(), items_per_cell = items_per_cell))]
    pub fn new(items: Vec<IndexedItem>, owner_bbox: Option<Rect>, items_per_cell: usize) -> Self {
        let dimension = Self::dimension_for(items.len(), items_per_cell);

        let Some(bbox) = owner_bbox else {
            tracing::debug!("owner has no bounding box, index stays empty");
            return Self {
                items,
                dimension,
                origin: Point::default(),
                cell_width: 1.0,
                cell_height: 1.0,
                cells: Vec::new(),
            };
        };

        let mut table = Self {
            dimension,
            origin: bbox.origin(),
            cell_width: cell_extent(bbox.width, dimension),
            cell_height: cell_extent(bbox.height, dimension),
            cells: vec![SmallVec::new(); dimension * dimension],
            items: Vec::new(),
        };

        for (z, item) in items.iter().enumerate() {
            let Some(b) = item.bbox else {
                continue;
            };
            let (x0, x1) = table.x_span(b.x, b.right());
            let (y0, y1) = table.y_span(b.y, b.bottom());
            for y in y0..y1 {
                for x in x0..x1 {
                    table.cells[y * dimension + x].push(z);
                }
            }
        }
        table.items = items;

        tracing::debug!(
            dimension,
            cell_width = table.cell_width,
            cell_height = table.cell_height,
            "built lookup grid"
        );
        table
    }

    /// Side length of the square grid used for `count` items
    pub fn dimension_for(count: usize, items_per_cell: usize) -> usize {
        let cells = (count / items_per_cell.max(1)).max(1);
        #[allow(clippy::cast_possible_truncation)]
        let dimension = (cells as f64).sqrt().round() as usize;
        dimension.max(1)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn cell_size(&self) -> (f64, f64) {
        (self.cell_width, self.cell_height)
    }

    /// Number of items listed in the cell at (`x`, `y`)
    pub fn cell_population(&self, x: usize, y: usize) -> usize {
        if x >= self.dimension || y >= self.dimension {
            return 0;
        }
        self.cells
            .get(y * self.dimension + x)
            .map_or(0, |cell| cell.len())
    }

    fn x_span(&self, lo: f64, hi: f64) -> (usize, usize) {
        span(lo, hi, self.origin.x, self.cell_width, self.dimension)
    }

    fn y_span(&self, lo: f64, hi: f64) -> (usize, usize) {
        span(lo, hi, self.origin.y, self.cell_height, self.dimension)
    }

    /// Cells to scan for a point: its own cell, plus the previous one when the
    /// point sits exactly on a grid line (edges are inclusive).
    fn point_cells(&self, point: Point) -> SmallVec<[usize; 4]> {
        let xs = point_span(point.x, self.origin.x, self.cell_width, self.dimension);
        let ys = point_span(point.y, self.origin.y, self.cell_height, self.dimension);
        let mut cells = SmallVec::new();
        for y in ys.0..=ys.1 {
            for x in xs.0..=xs.1 {
                cells.push(y * self.dimension + x);
            }
        }
        cells
    }

    fn collect(&self, cells: impl Iterator<Item = usize>) -> Vec<usize> {
        let mut found: Vec<usize> = cells
            .flat_map(|c| self.cells[c].iter().copied())
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}

impl LookupTable for OptimizingLookupTable {
    fn get(&self, area: Rect) -> Vec<ItemId> {
        if self.cells.is_empty() {
            return Vec::new();
        }
        let (x0, x1) = widen(self.x_span(area.x, area.right()), self.dimension);
        let (y0, y1) = widen(self.y_span(area.y, area.bottom()), self.dimension);
        let dimension = self.dimension;
        let cells = (y0..y1).flat_map(move |y| (x0..x1).map(move |x| y * dimension + x));

        self.collect(cells)
            .into_iter()
            .map(|z| &self.items[z])
            .filter(|item| item.overlaps(&area))
            .map(|item| item.id)
            .collect()
    }

    fn items_at_point(&self, point: Point) -> Vec<ItemId> {
        if self.cells.is_empty() {
            return Vec::new();
        }
        self.collect(self.point_cells(point).into_iter())
            .into_iter()
            .map(|z| &self.items[z])
            .filter(|item| item.covers(point))
            .map(|item| item.id)
            .collect()
    }

    fn has_item_at_point(&self, point: Point) -> bool {
        if self.cells.is_empty() {
            return false;
        }
        self.point_cells(point).into_iter().any(|c| {
            self.cells[c]
                .iter()
                .any(|&z| self.items[z].visible && self.items[z].covers(point))
        })
    }
}

fn cell_extent(extent: f64, dimension: usize) -> f64 {
    if extent > 0.0 {
        extent / dimension as f64
    } else {
        // Flat owner: everything lands in the first row/column.
        1.0
    }
}

/// Clamp a cell coordinate into `[0, dimension - 1]`
#[allow(clippy::cast_possible_truncation)]
fn clamp_cell(t: f64, dimension: usize) -> i64 {
    (t as i64).clamp(0, dimension as i64 - 1)
}

/// Half-open cell range `[start, end)` covering `[lo, hi]` along one axis.
///
/// Out-of-range coordinates are clamped, so every item lands in at least one cell.
#[allow(clippy::cast_possible_truncation)]
fn span(lo: f64, hi: f64, origin: f64, cell: f64, dimension: usize) -> (usize, usize) {
    let start = clamp_cell(((lo - origin) / cell).floor(), dimension);
    let end = ((((hi - origin) / cell).ceil()) as i64).clamp(start + 1, dimension as i64);
    (start as usize, end as usize)
}

/// Grow a query range by one cell on each side.
///
/// Division can round an edge just below a cell boundary onto it, so a query
/// starting there would miss the item ending at that boundary.
fn widen((start, end): (usize, usize), dimension: usize) -> (usize, usize) {
    (start.saturating_sub(1), (end + 1).min(dimension))
}

/// Inclusive cell range to scan for a coordinate
fn point_span(value: f64, origin: f64, cell: f64, dimension: usize) -> (usize, usize) {
    let t = (value - origin) / cell;
    let base = t.floor();
    let first = if t == base { base - 1.0 } else { base };
    let first = clamp_cell(first, dimension);
    let last = clamp_cell(base, dimension);
    (first as usize, last as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::DumbLookupTable;

    fn grid_of_unit_squares(side: u64) -> Vec<IndexedItem> {
        let mut items = Vec::new();
        for y in 0..side {
            for x in 0..side {
                items.push(IndexedItem::new(
                    ItemId(y * side + x),
                    Some(Rect::new(x as f64, y as f64, 1.0, 1.0)),
                    true,
                ));
            }
        }
        items
    }

    #[test]
    fn test_dimension_is_square_root_of_cell_count() {
        assert_eq!(OptimizingLookupTable::dimension_for(10_000, 16), 25);
        assert_eq!(OptimizingLookupTable::dimension_for(0, 16), 1);
        assert_eq!(OptimizingLookupTable::dimension_for(15, 16), 1);
        assert_eq!(OptimizingLookupTable::dimension_for(10, 0), 3);
    }

    #[test]
    fn test_ten_thousand_items() {
        let table = OptimizingLookupTable::new(
            grid_of_unit_squares(100),
            Some(Rect::new(0.0, 0.0, 100.0, 100.0)),
            16,
        );
        assert_eq!(table.dimension(), 25);
        assert_eq!(table.cell_size(), (4.0, 4.0));
        // 4x4 unit squares per cell, none straddling a cell boundary
        assert_eq!(table.cell_population(0, 0), 16);

        let hits = table.items_at_point(Point::new(50.5, 20.5));
        assert_eq!(hits, vec![ItemId(20 * 100 + 50)]);
    }

    #[test]
    fn test_spanning_item_is_reported_once() {
        let items = vec![
            IndexedItem::new(ItemId(0), Some(Rect::new(0.0, 0.0, 100.0, 100.0)), true),
            IndexedItem::new(ItemId(1), Some(Rect::new(10.0, 10.0, 5.0, 5.0)), true),
            IndexedItem::new(ItemId(2), Some(Rect::new(60.0, 60.0, 5.0, 5.0)), true),
            IndexedItem::new(ItemId(3), Some(Rect::new(90.0, 10.0, 5.0, 5.0)), true),
        ];
        let table = OptimizingLookupTable::new(items, Some(Rect::new(0.0, 0.0, 100.0, 100.0)), 1);
        assert_eq!(table.dimension(), 2);

        let hits = table.get(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(hits, vec![ItemId(0), ItemId(1), ItemId(2), ItemId(3)]);
    }

    #[test]
    fn test_point_on_grid_line_matches_linear_scan() {
        let items = grid_of_unit_squares(8);
        let table = OptimizingLookupTable::new(items.clone(), Some(Rect::new(0.0, 0.0, 8.0, 8.0)), 4);
        let dumb = DumbLookupTable::new(items);
        assert_eq!(table.dimension(), 4);

        for point in [Point::new(2.0, 2.0), Point::new(4.0, 3.5), Point::new(8.0, 8.0)] {
            assert_eq!(table.items_at_point(point), dumb.items_at_point(point));
        }
    }

    #[test]
    fn test_area_starting_just_below_a_cell_boundary() {
        // 81 slots for a 9x9 grid over a 3x3 owner; only two carry a box
        let mut items = vec![
            IndexedItem::new(ItemId(0), Some(Rect::new(0.0, 0.0, 1.0, 1.0)), true),
            IndexedItem::new(ItemId(1), Some(Rect::new(1.0, 0.0, 1.0, 1.0)), true),
        ];
        items.extend((2..81).map(|i| IndexedItem::new(ItemId(i), None, true)));
        let table = OptimizingLookupTable::new(items.clone(), Some(Rect::new(0.0, 0.0, 3.0, 3.0)), 1);
        let dumb = DumbLookupTable::new(items);
        assert_eq!(table.dimension(), 9);

        let area = Rect::new(1.0 - f64::EPSILON / 2.0, 0.0, 1.0 / 3.0, 1.0);
        assert_eq!(dumb.get(area), vec![ItemId(0), ItemId(1)]);
        assert_eq!(table.get(area), dumb.get(area));
    }

    #[test]
    fn test_flat_owner_still_answers() {
        let items = vec![
            IndexedItem::new(ItemId(0), Some(Rect::new(5.0, 5.0, 0.0, 0.0)), true),
            IndexedItem::new(ItemId(1), Some(Rect::new(5.0, 5.0, 0.0, 0.0)), true),
            IndexedItem::new(ItemId(2), Some(Rect::new(5.0, 5.0, 0.0, 0.0)), true),
            IndexedItem::new(ItemId(3), Some(Rect::new(5.0, 5.0, 0.0, 0.0)), true),
        ];
        let table = OptimizingLookupTable::new(items.clone(), Some(Rect::new(5.0, 5.0, 0.0, 0.0)), 1);
        let dumb = DumbLookupTable::new(items);
        assert_eq!(table.dimension(), 2);
        assert_eq!(table.cell_size(), (1.0, 1.0));

        let point = Point::new(5.0, 5.0);
        assert_eq!(table.items_at_point(point), dumb.items_at_point(point));
        assert_eq!(table.items_at_point(point).len(), 4);
        assert!(table.has_item_at_point(point));
        assert!(table.items_at_point(Point::new(5.5, 5.0)).is_empty());
    }

    #[test]
    fn test_outside_queries_miss() {
        let table = OptimizingLookupTable::new(
            grid_of_unit_squares(4),
            Some(Rect::new(0.0, 0.0, 4.0, 4.0)),
            1,
        );
        assert!(table.items_at_point(Point::new(-10.0, 2.0)).is_empty());
        assert!(table.get(Rect::new(20.0, 20.0, 5.0, 5.0)).is_empty());
        assert!(!table.has_item_at_point(Point::new(2.5, 40.0)));
    }

    #[test]
    fn test_child_outside_owner_is_still_indexed() {
        let items = vec![
            IndexedItem::new(ItemId(0), Some(Rect::new(0.0, 0.0, 10.0, 10.0)), true),
            IndexedItem::new(ItemId(1), Some(Rect::new(30.0, 30.0, 10.0, 10.0)), true),
        ];
        // Owner extent that under-reports the second child
        let table = OptimizingLookupTable::new(items, Some(Rect::new(0.0, 0.0, 20.0, 20.0)), 1);
        assert_eq!(table.items_at_point(Point::new(35.0, 35.0)), vec![ItemId(1)]);
    }

    #[test]
    fn test_missing_owner_bbox_is_always_empty() {
        let items = grid_of_unit_squares(2);
        let table = OptimizingLookupTable::new(items, None, 1);
        assert!(table.get(Rect::new(0.0, 0.0, 2.0, 2.0)).is_empty());
        assert!(!table.has_item_at_point(Point::new(0.5, 0.5)));
    }
}
