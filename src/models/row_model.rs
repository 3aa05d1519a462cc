use std::sync::Arc;

/// An item placed in the grid, in container-relative units.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedItem<T> {
    pub item: T,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A horizontal band of items sharing one height.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<T> {
    pub top: f64,
    pub height: f64,
    pub items: Vec<PackedItem<T>>,
}

impl<T> Row<T> {
    pub fn new(top: f64, height: f64, items: Vec<PackedItem<T>>) -> Self {
        Self { top, height, items }
    }

    /// Bottom edge of the band, excluding any row padding.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Width covered by the items plus the gaps between them.
    #[cfg(test)]
    pub fn content_width(&self) -> f64 {
        match (self.items.first(), self.items.last()) {
            (Some(first), Some(last)) => last.left + last.width - first.left,
            _ => 0.0,
        }
    }
}

/// Packed rows plus the total vertical extent.
///
/// Rows are reference counted so a grid can be extended or sliced without
/// copying the rows it keeps.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    pub rows: Vec<Arc<Row<T>>>,
    pub height: f64,
}

impl<T> Grid<T> {
    pub fn new(rows: Vec<Arc<Row<T>>>, height: f64) -> Self {
        Self { rows, height }
    }

    /// No rows and zero height.
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            height: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bottom edge of the last row, or 0 for an empty grid.
    pub fn content_bottom(&self) -> f64 {
        self.rows.last().map_or(0.0, |row| row.bottom())
    }

    /// Number of packed items across all rows.
    pub fn item_count(&self) -> usize {
        self.rows.iter().map(|row| row.items.len()).sum()
    }
}

impl<T> Default for Grid<T> {
    fn default() -> Self {
        Self::empty()
    }
}
