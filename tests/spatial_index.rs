//! The grid index must answer exactly like a linear scan

use canvas_layout::layout::{ItemId, Point, Rect};
use canvas_layout::lookup::{DumbLookupTable, IndexedItem, LookupTable, OptimizingLookupTable};
use proptest::prelude::*;

fn item_strategy() -> impl Strategy<Value = (Option<(u8, u8, u8, u8)>, bool)> {
    (
        prop::option::weighted(0.9, (0u8..100, 0u8..100, 0u8..30, 0u8..30)),
        prop::bool::weighted(0.8),
    )
}

fn build(raw: &[(Option<(u8, u8, u8, u8)>, bool)]) -> Vec<IndexedItem> {
    raw.iter()
        .enumerate()
        .map(|(i, (bbox, visible))| {
            let bbox = bbox.map(|(x, y, w, h)| {
                Rect::new(f64::from(x), f64::from(y), f64::from(w), f64::from(h))
            });
            IndexedItem::new(ItemId::new(i as u64), bbox, *visible)
        })
        .collect()
}

fn owner_bbox(items: &[IndexedItem]) -> Option<Rect> {
    items
        .iter()
        .filter_map(|item| item.bbox)
        .reduce(|a, b| a.union(&b))
}

fn is_back_to_front(ids: &[ItemId]) -> bool {
    ids.windows(2).all(|pair| pair[0].raw() < pair[1].raw())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_grid_matches_linear_scan(
        raw in prop::collection::vec(item_strategy(), 0..80),
        items_per_cell in 1usize..20,
        points in prop::collection::vec((0u8..130, 0u8..130), 1..10),
        areas in prop::collection::vec((0u8..130, 0u8..130, 0u8..40, 0u8..40), 1..10),
    ) {
        let items = build(&raw);
        let owner = owner_bbox(&items);
        let dumb = DumbLookupTable::new(items.clone());
        let grid = OptimizingLookupTable::new(items, owner, items_per_cell);

        // Integer coordinates put many queries exactly on cell boundaries
        for (x, y) in points {
            let point = Point::new(f64::from(x), f64::from(y));
            let expected = dumb.items_at_point(point);
            prop_assert_eq!(grid.items_at_point(point), expected.clone());
            prop_assert!(is_back_to_front(&expected));
            prop_assert_eq!(grid.has_item_at_point(point), dumb.has_item_at_point(point));
        }
        for (x, y, w, h) in areas {
            let area = Rect::new(f64::from(x), f64::from(y), f64::from(w), f64::from(h));
            let found = grid.get(area);
            prop_assert!(is_back_to_front(&found));
            prop_assert_eq!(found, dumb.get(area));
        }
    }

    #[test]
    fn prop_fractional_points_match(
        raw in prop::collection::vec(item_strategy(), 1..60),
        items_per_cell in 1usize..8,
        x in 0.0f64..130.0,
        y in 0.0f64..130.0,
    ) {
        let items = build(&raw);
        let owner = owner_bbox(&items);
        let dumb = DumbLookupTable::new(items.clone());
        let grid = OptimizingLookupTable::new(items, owner, items_per_cell);

        let point = Point::new(x, y);
        prop_assert_eq!(grid.items_at_point(point), dumb.items_at_point(point));
    }

    #[test]
    fn prop_fractional_areas_match(
        boxes in prop::collection::vec((0.0f64..3.0, 0.0f64..3.0, 0.0f64..1.5, 0.0f64..1.5), 1..60),
        items_per_cell in 1usize..4,
        area in (0.0f64..3.0, 0.0f64..3.0, 0.0f64..1.0, 0.0f64..1.0),
    ) {
        let items: Vec<IndexedItem> = boxes
            .iter()
            .enumerate()
            .map(|(i, &(x, y, w, h))| IndexedItem::new(ItemId::new(i as u64), Some(Rect::new(x, y, w, h)), true))
            .collect();
        let owner = owner_bbox(&items);
        let dumb = DumbLookupTable::new(items.clone());
        let grid = OptimizingLookupTable::new(items, owner, items_per_cell);

        let area = Rect::new(area.0, area.1, area.2, area.3);
        prop_assert_eq!(grid.get(area), dumb.get(area));
    }
}

#[test]
fn test_hidden_items_are_found_but_do_not_hit() {
    let items = vec![IndexedItem::new(
        ItemId::new(0),
        Some(Rect::new(0.0, 0.0, 10.0, 10.0)),
        false,
    )];
    let grid = OptimizingLookupTable::new(items, Some(Rect::new(0.0, 0.0, 10.0, 10.0)), 1);

    assert_eq!(grid.items_at_point(Point::new(5.0, 5.0)), vec![ItemId::new(0)]);
    assert!(!grid.has_item_at_point(Point::new(5.0, 5.0)));
}
