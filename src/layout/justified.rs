use std::sync::Arc;

use tracing::debug;

use crate::models::{Grid, Item, PackedItem, Row};

/// Constraints for the justified packing algorithm.
///
/// Every row but the last is scaled so its items plus the gaps between them
/// span exactly the usable width (`container_width - 2 * offset_left`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackConstraints {
    /// Width of the scroll container
    pub container_width: f64,
    /// Smallest width any item may be scaled down to
    pub min_width: f64,
    /// Margin applied on both sides of every row
    pub offset_left: f64,
    /// Gap between items in a row
    pub horizontal_padding: f64,
    /// Gap between rows
    pub vertical_padding: f64,
    /// Extra space reserved below the last row
    pub additional_height: f64,
}

impl Default for PackConstraints {
    fn default() -> Self {
        Self {
            container_width: 0.0,
            min_width: 0.0,
            offset_left: 0.0,
            horizontal_padding: 0.0,
            vertical_padding: 0.0,
            additional_height: 0.0,
        }
    }
}

impl PackConstraints {
    pub fn usable_width(&self) -> f64 {
        self.container_width - 2.0 * self.offset_left
    }

    fn can_pack(&self) -> bool {
        let usable = self.usable_width();
        usable.is_finite() && usable > 0.0
    }

    /// Width left for items once the gaps of an `n`-item row are taken out.
    fn item_space(&self, n: usize) -> f64 {
        self.usable_width() - n.saturating_sub(1) as f64 * self.horizontal_padding
    }

    /// Height at which `n` items with the given ratio sum fill the usable width.
    fn solved_height(&self, n: usize, ratio_sum: f64) -> f64 {
        self.item_space(n) / ratio_sum
    }

    /// Whether `n` items can share a justified row without any of them
    /// dropping below `min_width`.
    fn fits(&self, n: usize, ratio_sum: f64, min_ratio: f64) -> bool {
        self.item_space(n) > 0.0 && min_ratio * self.solved_height(n, ratio_sum) >= self.min_width
    }

    /// Height of the grid's trailing row.
    ///
    /// The trailing row is not stretched. It sits at the height where its
    /// narrowest item is exactly `min_width`, never lower than a square item
    /// at `min_width`, and capped at the justified height.
    fn trailing_height(&self, n: usize, ratio_sum: f64, min_ratio: f64) -> f64 {
        let solved = self.solved_height(n, ratio_sum);
        if self.min_width > 0.0 {
            (self.min_width / min_ratio).max(self.min_width).min(solved)
        } else {
            solved
        }
    }
}

/// A row break records one packing decision.
/// Contains only the indices and height, not the actual items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBreak {
    /// Start index in the items array (inclusive)
    pub start_index: usize,
    /// End index in the items array (exclusive)
    pub end_index: usize,
    /// The computed height for this row
    pub row_height: f64,
    /// Whether the row spans the full usable width
    pub justified: bool,
}

impl RowBreak {
    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }
}

/// Packs `items` left-to-right into justified rows.
///
/// # Algorithm
/// 1. Grow the current row while the narrowest item, at the height that makes
///    the row fill the usable width exactly, is still at least `min_width` wide.
/// 2. When the next item would break that, close the row at its solved height
///    and start a new one. A row always keeps at least one item.
/// 3. The trailing row keeps its natural height and may be under-full.
///
/// Returns the empty grid for empty input or when no usable width is left.
pub fn calc_grid<T: Item + Clone>(items: &[T], constraints: &PackConstraints) -> Grid<T> {
    if items.is_empty() {
        return Grid::empty();
    }
    if !constraints.can_pack() {
        debug!(
            items = items.len(),
            container_width = constraints.container_width,
            offset_left = constraints.offset_left,
            "No usable width, skipping layout"
        );
        return Grid::empty();
    }

    let breaks = pack_breaks(items.iter().map(Item::aspect_ratio), constraints);
    let rows = place_rows(items, &breaks, 0.0, constraints);
    finish_grid(rows, constraints)
}

/// Drops the trailing row, shrinking `height` to the new last row's bottom
/// edge. Reserved `additional_height` is not kept.
pub fn calc_grid_exclude_last_row<T>(grid: &Grid<T>) -> Grid<T> {
    let Some((_, kept)) = grid.rows.split_last() else {
        return Grid::empty();
    };
    let mut trimmed = Grid::new(kept.to_vec(), 0.0);
    trimmed.height = trimmed.content_bottom();
    trimmed
}

/// Selects the rows overlapping `[offset, offset + container_height]`.
///
/// Rows are returned unchanged and in order. The visible grid keeps the full
/// grid's `height` so the caller can size its scroll content. The second value
/// is the index of the last returned row in `grid`, or `None` when no row is
/// visible.
pub fn calc_visible_grid<T>(
    grid: &Grid<T>,
    container_height: f64,
    offset: f64,
) -> (Grid<T>, Option<usize>) {
    let hidden = || (Grid::new(Vec::new(), grid.height), None);

    if grid.is_empty() || !(container_height > 0.0) || !offset.is_finite() {
        return hidden();
    }

    let view_top = offset;
    let view_bottom = offset + container_height;

    // Tops and bottoms both increase monotonically, so both ends binary search.
    let start = grid.rows.partition_point(|row| row.bottom() < view_top);
    let end = grid.rows.partition_point(|row| row.top <= view_bottom);
    if start >= end {
        return hidden();
    }

    let visible = Grid::new(grid.rows[start..end].to_vec(), grid.height);
    (visible, Some(end - 1))
}

/// Appends `new_items` to a packed grid.
///
/// Only the trailing row is reopened; every earlier row is shared with `grid`.
/// The result is identical to packing the full item sequence from scratch with
/// the same constraints.
pub fn insert_items<T: Item + Clone>(
    grid: &Grid<T>,
    new_items: &[T],
    constraints: &PackConstraints,
) -> Grid<T> {
    let Some((last, prefix)) = grid.rows.split_last() else {
        return calc_grid(new_items, constraints);
    };
    if new_items.is_empty() {
        return grid.clone();
    }
    if !constraints.can_pack() {
        return Grid::empty();
    }

    let tail: Vec<T> = last
        .items
        .iter()
        .map(|packed| packed.item.clone())
        .chain(new_items.iter().cloned())
        .collect();
    let breaks = pack_breaks(tail.iter().map(Item::aspect_ratio), constraints);

    let mut rows = Vec::with_capacity(prefix.len() + breaks.len());
    rows.extend_from_slice(prefix);
    rows.extend(place_rows(&tail, &breaks, last.top, constraints));
    finish_grid(rows, constraints)
}

/// Extracts the row breaks of a packed grid.
pub fn compute_breaks<T>(grid: &Grid<T>) -> Vec<RowBreak> {
    let last = grid.rows.len().saturating_sub(1);
    let mut start = 0usize;
    let mut out = Vec::with_capacity(grid.rows.len());
    for (index, row) in grid.rows.iter().enumerate() {
        let end = start + row.items.len();
        out.push(RowBreak {
            start_index: start,
            end_index: end,
            row_height: row.height,
            justified: index < last,
        });
        start = end;
    }
    out
}

/// Reconstructs a grid from cached breaks without re-running the packing
/// decisions.
///
/// Returns `None` unless the breaks tile `items` exactly.
pub fn rows_from_breaks<T: Item + Clone>(
    items: &[T],
    breaks: &[RowBreak],
    constraints: &PackConstraints,
) -> Option<Grid<T>> {
    let mut expected = 0usize;
    for brk in breaks {
        if brk.start_index != expected || brk.is_empty() {
            return None;
        }
        expected = brk.end_index;
    }
    if expected != items.len() {
        return None;
    }
    if breaks.is_empty() {
        return Some(Grid::empty());
    }
    if !constraints.can_pack() {
        return None;
    }

    let rows = place_rows(items, breaks, 0.0, constraints);
    Some(finish_grid(rows, constraints))
}

/// Decides where rows break for a sequence of aspect ratios.
fn pack_breaks(ratios: impl Iterator<Item = f64>, constraints: &PackConstraints) -> Vec<RowBreak> {
    let mut breaks = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;
    let mut ratio_sum = 0.0f64;
    let mut min_ratio = f64::INFINITY;

    for (index, ratio) in ratios.enumerate() {
        if count > 0 && !constraints.fits(count + 1, ratio_sum + ratio, min_ratio.min(ratio)) {
            breaks.push(RowBreak {
                start_index: start,
                end_index: index,
                row_height: constraints.solved_height(count, ratio_sum),
                justified: true,
            });
            start = index;
            count = 0;
            ratio_sum = 0.0;
            min_ratio = f64::INFINITY;
        }
        count += 1;
        ratio_sum += ratio;
        min_ratio = min_ratio.min(ratio);
    }

    if count > 0 {
        breaks.push(RowBreak {
            start_index: start,
            end_index: start + count,
            row_height: constraints.trailing_height(count, ratio_sum, min_ratio),
            justified: false,
        });
    }

    breaks
}

fn place_rows<T: Item + Clone>(
    items: &[T],
    breaks: &[RowBreak],
    first_top: f64,
    constraints: &PackConstraints,
) -> Vec<Arc<Row<T>>> {
    let mut top = first_top;
    breaks
        .iter()
        .map(|brk| {
            let row = place_row(&items[brk.start_index..brk.end_index], brk, top, constraints);
            top = row.bottom() + constraints.vertical_padding;
            Arc::new(row)
        })
        .collect()
}

fn place_row<T: Item + Clone>(
    items: &[T],
    brk: &RowBreak,
    top: f64,
    constraints: &PackConstraints,
) -> Row<T> {
    let height = brk.row_height;
    let space = constraints.item_space(items.len());
    let last = items.len().saturating_sub(1);

    let mut left = constraints.offset_left;
    let mut placed_width = 0.0f64;
    let packed = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            // The last item of a justified row absorbs rounding so the row is exact.
            let width = if brk.justified && index == last {
                space - placed_width
            } else {
                item.aspect_ratio() * height
            };
            let packed = PackedItem {
                item: item.clone(),
                left,
                top,
                width,
                height,
            };
            placed_width += width;
            left += width + constraints.horizontal_padding;
            packed
        })
        .collect();

    Row::new(top, height, packed)
}

fn finish_grid<T>(rows: Vec<Arc<Row<T>>>, constraints: &PackConstraints) -> Grid<T> {
    let height = match rows.last() {
        Some(row) => row.bottom() + constraints.additional_height,
        None => 0.0,
    };
    Grid::new(rows, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tile;

    const EPS: f64 = 1e-9;

    fn squares(n: usize) -> Vec<Tile> {
        (0..n).map(|_| Tile::square()).collect()
    }

    fn mixed(n: usize) -> Vec<Tile> {
        let shapes = [
            (1920.0, 1080.0), // 16:9
            (1000.0, 1000.0), // 1:1
            (1080.0, 1920.0), // 9:16
            (2560.0, 1080.0), // 21:9
            (4000.0, 3000.0), // 4:3
            (3000.0, 4000.0), // 3:4
            (12000.0, 1000.0), // panorama
            (600.0, 1200.0),  // 1:2
        ];
        (0..n)
            .map(|i| {
                let (w, h) = shapes[i % shapes.len()];
                Tile::new(w, h)
            })
            .collect()
    }

    fn constraints(container_width: f64, min_width: f64, padding: f64) -> PackConstraints {
        PackConstraints {
            container_width,
            min_width,
            horizontal_padding: padding,
            vertical_padding: padding,
            ..PackConstraints::default()
        }
    }

    fn constraint_sets() -> Vec<PackConstraints> {
        vec![
            constraints(300.0, 90.0, 10.0),
            constraints(1920.0, 220.0, 4.0),
            constraints(1280.0, 160.0, 0.0),
            PackConstraints {
                container_width: 1024.0,
                min_width: 120.0,
                offset_left: 16.0,
                horizontal_padding: 6.0,
                vertical_padding: 12.0,
                additional_height: 48.0,
            },
            constraints(200.0, 500.0, 8.0),
        ]
    }

    fn row_span(row: &Row<Tile>, padding: f64) -> f64 {
        let widths: f64 = row.items.iter().map(|p| p.width).sum();
        widths + row.items.len().saturating_sub(1) as f64 * padding
    }

    #[test]
    fn test_empty_items() {
        let grid = calc_grid::<Tile>(&[], &constraints(1920.0, 200.0, 4.0));
        assert!(grid.is_empty());
        assert_eq!(grid.height, 0.0);
    }

    #[test]
    fn test_no_usable_width() {
        let items = mixed(10);
        for width in [0.0, -100.0, f64::NAN] {
            let grid = calc_grid(&items, &constraints(width, 100.0, 4.0));
            assert!(grid.is_empty(), "expected no rows for width {width}");
            assert_eq!(grid.height, 0.0);
        }

        let squeezed = PackConstraints {
            container_width: 100.0,
            offset_left: 50.0,
            ..PackConstraints::default()
        };
        assert!(calc_grid(&items, &squeezed).is_empty());
    }

    #[test]
    fn test_square_exact_fit() {
        let c = constraints(300.0, 90.0, 10.0);
        let grid = calc_grid(&squares(7), &c);

        assert_eq!(grid.len(), 3);
        let first = &grid.rows[0];
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.top, 0.0);
        for packed in &first.items {
            assert!((packed.width - 280.0 / 3.0).abs() < EPS);
            assert_eq!(packed.height, first.height);
        }
        assert!((row_span(first, 10.0) - 300.0).abs() < EPS);
        assert!((first.items[1].left - (280.0 / 3.0 + 10.0)).abs() < EPS);

        assert_eq!(grid.rows[1].items.len(), 3);

        // Trailing row holds one square at the minimum width.
        let last = &grid.rows[2];
        assert_eq!(last.items.len(), 1);
        assert!((last.height - 90.0).abs() < EPS);
        assert!((last.items[0].width - 90.0).abs() < EPS);
        assert!((grid.height - last.bottom()).abs() < EPS);
    }

    #[test]
    fn test_all_items_accounted_for() {
        for c in constraint_sets() {
            let items = mixed(57);
            let grid = calc_grid(&items, &c);
            assert_eq!(grid.item_count(), items.len());
            let packed: Vec<Tile> = grid
                .rows
                .iter()
                .flat_map(|row| row.items.iter().map(|p| p.item))
                .collect();
            assert_eq!(packed, items);
        }
    }

    #[test]
    fn test_row_completeness() {
        for c in constraint_sets() {
            let grid = calc_grid(&mixed(64), &c);
            let usable = c.container_width - 2.0 * c.offset_left;
            let (last, full) = grid.rows.split_last().unwrap();
            for row in full {
                let span = row_span(row, c.horizontal_padding);
                assert!(
                    (span - usable).abs() < 1e-6,
                    "row spans {span}, expected {usable}"
                );
                let right = row.items.last().map(|p| p.left + p.width).unwrap();
                assert!((right - (c.offset_left + usable)).abs() < 1e-6);
            }
            assert!(row_span(last, c.horizontal_padding) <= usable + 1e-6);
            assert!((last.items[0].left - c.offset_left).abs() < EPS);
        }
    }

    #[test]
    fn test_vertical_contiguity() {
        for c in constraint_sets() {
            let grid = calc_grid(&mixed(40), &c);
            assert_eq!(grid.rows[0].top, 0.0);
            for pair in grid.rows.windows(2) {
                assert_eq!(pair[1].top, pair[0].top + pair[0].height + c.vertical_padding);
            }
            for row in &grid.rows {
                for packed in &row.items {
                    assert_eq!(packed.top, row.top);
                    assert_eq!(packed.height, row.height);
                }
            }
            let bottom = grid.rows.last().unwrap().bottom();
            assert_eq!(grid.height, bottom + c.additional_height);
        }
    }

    #[test]
    fn test_min_width_respected() {
        for c in constraint_sets() {
            if c.min_width > c.usable_width() {
                continue;
            }
            let grid = calc_grid(&mixed(64), &c);
            for row in &grid.rows {
                for packed in &row.items {
                    assert!(
                        packed.width >= c.min_width - 1e-6,
                        "item width {} below min {}",
                        packed.width,
                        c.min_width
                    );
                }
            }
        }
    }

    #[test]
    fn test_min_width_wider_than_container() {
        let c = constraints(200.0, 500.0, 8.0);
        let items = mixed(5);
        let grid = calc_grid(&items, &c);

        assert_eq!(grid.len(), items.len());
        for row in &grid.rows {
            assert_eq!(row.items.len(), 1);
            assert!((row.items[0].width - 200.0).abs() < EPS);
        }
    }

    #[test]
    fn test_panorama_gets_own_row() {
        let c = constraints(300.0, 120.0, 0.0);
        let grid = calc_grid(&[Tile::new(12000.0, 1000.0)], &c);

        assert_eq!(grid.len(), 1);
        let packed = &grid.rows[0].items[0];
        assert!((packed.width - 300.0).abs() < EPS);
        assert!((packed.height - 25.0).abs() < EPS);
    }

    #[test]
    fn test_padding_wider_than_container() {
        let c = constraints(300.0, 0.0, 400.0);
        let grid = calc_grid(&squares(3), &c);

        assert_eq!(grid.len(), 3);
        for row in &grid.rows {
            assert_eq!(row.items.len(), 1);
        }
    }

    #[test]
    fn test_zero_min_width_packs_single_row() {
        let c = constraints(600.0, 0.0, 0.0);
        let grid = calc_grid(&squares(6), &c);

        assert_eq!(grid.len(), 1);
        assert!((grid.rows[0].height - 100.0).abs() < EPS);
    }

    #[test]
    fn test_exclude_last_row() {
        let c = PackConstraints {
            additional_height: 50.0,
            ..constraints(300.0, 90.0, 10.0)
        };
        let grid = calc_grid(&squares(7), &c);
        let trimmed = calc_grid_exclude_last_row(&grid);

        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed.height, grid.rows[1].bottom());
        assert!(Arc::ptr_eq(&trimmed.rows[0], &grid.rows[0]));

        let single = calc_grid(&squares(2), &c);
        let trimmed = calc_grid_exclude_last_row(&single);
        assert!(trimmed.is_empty());
        assert_eq!(trimmed.height, 0.0);

        assert!(calc_grid_exclude_last_row(&Grid::<Tile>::empty()).is_empty());
    }

    #[test]
    fn test_visible_grid_containment() {
        let c = constraints(1280.0, 160.0, 8.0);
        let grid = calc_grid(&mixed(300), &c);
        let container_height = 720.0;

        let mut offset = 0.0;
        while offset < grid.height + 200.0 {
            let (visible, last) = calc_visible_grid(&grid, container_height, offset);
            let view_bottom = offset + container_height;

            let expected: Vec<usize> = grid
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| row.bottom() >= offset && row.top <= view_bottom)
                .map(|(index, _)| index)
                .collect();

            assert_eq!(visible.len(), expected.len(), "offset {offset}");
            assert_eq!(last, expected.last().copied());
            for (row, index) in visible.rows.iter().zip(&expected) {
                assert!(Arc::ptr_eq(row, &grid.rows[*index]));
            }
            for pair in expected.windows(2) {
                assert_eq!(pair[1], pair[0] + 1);
            }
            assert_eq!(visible.height, grid.height);

            offset += 97.0;
        }
    }

    #[test]
    fn test_visible_grid_touching_edges() {
        let c = constraints(300.0, 90.0, 0.0);
        let grid = calc_grid(&squares(9), &c);
        let first_bottom = grid.rows[0].bottom();

        // A viewport starting exactly at the first row's bottom still touches it.
        let (visible, last) = calc_visible_grid(&grid, 10.0, first_bottom);
        assert!(Arc::ptr_eq(&visible.rows[0], &grid.rows[0]));
        assert_eq!(last, Some(1));

        // A viewport ending exactly at the second row's top touches it too.
        let second_top = grid.rows[1].top;
        let (visible, last) = calc_visible_grid(&grid, second_top, 0.0);
        assert_eq!(visible.len(), 2);
        assert_eq!(last, Some(1));
    }

    #[test]
    fn test_visible_grid_nothing_visible() {
        let grid = calc_grid(&squares(9), &constraints(300.0, 90.0, 10.0));

        let (visible, last) = calc_visible_grid(&grid, 0.0, 0.0);
        assert!(visible.is_empty());
        assert_eq!(last, None);

        let (visible, last) = calc_visible_grid(&grid, -5.0, 0.0);
        assert!(visible.is_empty());
        assert_eq!(last, None);

        let (visible, last) = calc_visible_grid(&grid, 100.0, grid.height + 1.0);
        assert!(visible.is_empty());
        assert_eq!(last, None);

        let (visible, last) = calc_visible_grid(&Grid::<Tile>::empty(), 100.0, 0.0);
        assert!(visible.is_empty());
        assert_eq!(visible.height, 0.0);
        assert_eq!(last, None);
    }

    #[test]
    fn test_visible_grid_in_row_gap() {
        let c = constraints(300.0, 90.0, 40.0);
        let grid = calc_grid(&squares(6), &c);
        let gap_start = grid.rows[0].bottom() + 5.0;

        let (visible, last) = calc_visible_grid(&grid, 10.0, gap_start);
        assert!(visible.is_empty());
        assert_eq!(last, None);
        assert_eq!(visible.height, grid.height);
    }

    #[test]
    fn test_insert_items_matches_full_pack() {
        let items = mixed(48);
        for c in constraint_sets() {
            for split in [0, 1, 5, 13, 24, 47, 48] {
                let (head, tail) = items.split_at(split);
                let incremental = insert_items(&calc_grid(head, &c), tail, &c);
                let full = calc_grid(&items, &c);
                assert_eq!(incremental, full, "split at {split} with {c:?}");
            }
        }
    }

    #[test]
    fn test_insert_items_in_pages() {
        let c = constraints(1920.0, 220.0, 4.0);
        let items = mixed(200);

        let mut grid = Grid::empty();
        for page in items.chunks(17) {
            grid = insert_items(&grid, page, &c);
        }
        assert_eq!(grid, calc_grid(&items, &c));
    }

    #[test]
    fn test_insert_items_shares_prefix() {
        let c = constraints(1280.0, 160.0, 8.0);
        let grid = calc_grid(&mixed(60), &c);
        let extended = insert_items(&grid, &mixed(20), &c);

        let kept = grid.len() - 1;
        assert!(extended.len() >= grid.len());
        for (before, after) in grid.rows[..kept].iter().zip(&extended.rows) {
            assert!(Arc::ptr_eq(before, after));
        }
    }

    #[test]
    fn test_insert_nothing_is_noop() {
        let c = constraints(1280.0, 160.0, 8.0);
        let grid = calc_grid(&mixed(10), &c);
        assert_eq!(insert_items(&grid, &[], &c), grid);
    }

    #[test]
    fn test_breaks_rebuild_grid() {
        for c in constraint_sets() {
            let items = mixed(35);
            let grid = calc_grid(&items, &c);
            let breaks = compute_breaks(&grid);

            assert_eq!(breaks.len(), grid.len());
            assert_eq!(breaks.last().map(|b| b.end_index), Some(items.len()));
            assert!(breaks[..breaks.len() - 1].iter().all(|b| b.justified));
            assert!(!breaks[breaks.len() - 1].justified);

            let rebuilt = rows_from_breaks(&items, &breaks, &c);
            assert_eq!(rebuilt.as_ref(), Some(&grid));
        }
    }

    #[test]
    fn test_breaks_must_cover_items() {
        let c = constraints(300.0, 90.0, 10.0);
        let items = squares(7);
        let breaks = compute_breaks(&calc_grid(&items, &c));

        assert!(rows_from_breaks(&items[..6], &breaks, &c).is_none());
        assert!(rows_from_breaks(&squares(8), &breaks, &c).is_none());
        assert!(rows_from_breaks(&items, &breaks[1..], &c).is_none());
        assert_eq!(rows_from_breaks::<Tile>(&[], &[], &c), Some(Grid::empty()));
    }
}
