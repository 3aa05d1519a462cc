//! Per-session grid state: layout constraints, scroll position and the packed
//! grid, plus derivation of the snapshot handed to the renderer.
//!
//! The shell owns a [`GridState`] and feeds it events:
//!
//! - scroll: [`GridState::update_offset`], then [`GridState::get_state`];
//! - mount and resize: [`GridState::update_grid`] with the full item list;
//! - a new page from the data source: [`GridState::insert_items`].
//!
//! Only `update_grid` repacks everything. Scrolling never repacks.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{check_length, Result};
use crate::layout::justified::{self, PackConstraints};
use crate::layout::layout_cache::{CachedLayoutComputer, MAX_CACHE_ENTRIES};
use crate::models::{Grid, Item, Row};

/// Layout settings fixed for the life of a [`GridState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    /// Extra space reserved below the last row (default: 0)
    pub additional_height: f64,
    /// Minimum item width before a row is allowed to run short (default: 0)
    pub min_width: f64,
    /// Margin on both sides of every row (default: 0)
    pub offset_left: f64,
    /// Gap between items and between rows (default: 0)
    pub padding: f64,
    /// Rows from the end that still allow loading more (default: 0)
    pub buffer: usize,
    /// Cached layouts kept for resizes, 0 disables the cache (default: 8)
    pub layout_cache_entries: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            additional_height: 0.0,
            min_width: 0.0,
            offset_left: 0.0,
            padding: 0.0,
            buffer: 0,
            layout_cache_entries: MAX_CACHE_ENTRIES,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        check_length("additional_height", self.additional_height)?;
        check_length("min_width", self.min_width)?;
        check_length("offset_left", self.offset_left)?;
        check_length("padding", self.padding)?;
        Ok(())
    }
}

/// Snapshot consumed by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState<T> {
    /// The viewport is close enough to the end to request the next page.
    pub load_more_allowed: bool,
    pub offset: f64,
    /// Rows intersecting the viewport, at their packed positions.
    pub rows: Vec<Arc<Row<T>>>,
    /// Total content height.
    pub height: f64,
    pub padding: f64,
}

/// Builder for [`GridState`] with configuration and initial runtime values.
#[derive(Debug)]
pub struct GridStateBuilder<T> {
    config: GridConfig,
    container_width: f64,
    container_height: f64,
    offset: f64,
    more: bool,
    grid: Grid<T>,
}

impl<T> GridStateBuilder<T> {
    pub fn new() -> Self {
        Self {
            config: GridConfig::default(),
            container_width: 0.0,
            container_height: 0.0,
            offset: 0.0,
            more: false,
            grid: Grid::empty(),
        }
    }

    pub fn config(mut self, config: GridConfig) -> Self {
        self.config = config;
        self
    }

    pub fn additional_height(mut self, height: f64) -> Self {
        self.config.additional_height = height;
        self
    }

    pub fn min_width(mut self, width: f64) -> Self {
        self.config.min_width = width;
        self
    }

    pub fn offset_left(mut self, offset: f64) -> Self {
        self.config.offset_left = offset;
        self
    }

    pub fn padding(mut self, padding: f64) -> Self {
        self.config.padding = padding;
        self
    }

    pub fn buffer(mut self, rows: usize) -> Self {
        self.config.buffer = rows;
        self
    }

    pub fn layout_cache_entries(mut self, entries: usize) -> Self {
        self.config.layout_cache_entries = entries;
        self
    }

    pub fn container_size(mut self, width: f64, height: f64) -> Self {
        self.container_width = width;
        self.container_height = height;
        self
    }

    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn more(mut self, more: bool) -> Self {
        self.more = more;
        self
    }

    /// Starts from an already packed grid.
    pub fn grid(mut self, grid: Grid<T>) -> Self {
        self.grid = grid;
        self
    }

    pub fn build(self) -> Result<GridState<T>> {
        self.config.validate()?;

        Ok(GridState {
            layout: CachedLayoutComputer::new(self.config.layout_cache_entries),
            config: self.config,
            container_width: self.container_width,
            container_height: self.container_height,
            offset: self.offset,
            more: self.more,
            grid: self.grid,
        })
    }
}

impl<T> Default for GridStateBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Grid session: packed layout plus the viewport it is shown through.
#[derive(Debug)]
pub struct GridState<T> {
    config: GridConfig,
    container_width: f64,
    container_height: f64,
    offset: f64,
    /// Upstream holds items that have not been delivered yet.
    more: bool,
    grid: Grid<T>,
    layout: CachedLayoutComputer,
}

impl<T> GridState<T> {
    pub fn builder() -> GridStateBuilder<T> {
        GridStateBuilder::new()
    }

    pub fn new(config: GridConfig) -> Result<Self> {
        GridStateBuilder::new().config(config).build()
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn container_width(&self) -> f64 {
        self.container_width
    }

    pub fn container_height(&self) -> f64 {
        self.container_height
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn more(&self) -> bool {
        self.more
    }

    /// The full packed grid, including any pending trailing row.
    pub fn grid(&self) -> &Grid<T> {
        &self.grid
    }

    /// Packing constraints for the current container width.
    pub fn constraints(&self) -> PackConstraints {
        PackConstraints {
            container_width: self.container_width,
            min_width: self.config.min_width,
            offset_left: self.config.offset_left,
            horizontal_padding: self.config.padding,
            vertical_padding: self.config.padding,
            additional_height: self.config.additional_height,
        }
    }

    /// Records a new scroll position. Visibility is derived lazily by
    /// [`GridState::get_state`].
    pub fn update_offset(&mut self, offset: f64) {
        trace!(offset, "Scroll offset updated");
        self.offset = offset;
    }

    /// Derives the render snapshot.
    ///
    /// While `more` is set the trailing row is still provisional, so it is
    /// stripped before visibility and the load-more threshold are computed.
    pub fn get_state(&self) -> RenderState<T> {
        let trimmed;
        let grid = if self.more {
            trimmed = justified::calc_grid_exclude_last_row(&self.grid);
            &trimmed
        } else {
            &self.grid
        };

        let (visible, last_visible) =
            justified::calc_visible_grid(grid, self.container_height, self.offset);
        let load_more_allowed = load_more_allowed(last_visible, grid.len(), self.config.buffer);

        trace!(
            offset = self.offset,
            visible_rows = visible.len(),
            ?last_visible,
            total_rows = grid.len(),
            load_more_allowed,
            "Derived grid state"
        );

        RenderState {
            load_more_allowed,
            offset: self.offset,
            rows: visible.rows,
            height: visible.height,
            padding: self.config.padding,
        }
    }
}

impl<T: Item + Clone> GridState<T> {
    /// Takes new viewport geometry and repacks the full item list.
    pub fn update_grid(
        &mut self,
        items: &[T],
        container_width: f64,
        container_height: f64,
        offset: f64,
        more: bool,
    ) {
        self.container_width = container_width;
        self.container_height = container_height;
        self.offset = offset;
        self.more = more;

        let constraints = self.constraints();
        self.grid = self.layout.compute(items, &constraints);

        debug!(
            items = items.len(),
            rows = self.grid.len(),
            container_width,
            container_height,
            more,
            "Grid repacked"
        );
    }

    /// Appends a page of items, repacking only the trailing row.
    pub fn insert_items(&mut self, new_items: &[T], more: bool) {
        self.more = more;

        let constraints = self.constraints();
        self.grid = justified::insert_items(&self.grid, new_items, &constraints);

        debug!(
            inserted = new_items.len(),
            rows = self.grid.len(),
            more,
            "Items inserted"
        );
    }
}

impl<T> Default for GridState<T> {
    fn default() -> Self {
        Self {
            config: GridConfig::default(),
            container_width: 0.0,
            container_height: 0.0,
            offset: 0.0,
            more: false,
            grid: Grid::empty(),
            layout: CachedLayoutComputer::new(MAX_CACHE_ENTRIES),
        }
    }
}

/// True when the last visible row is within `buffer` rows of the end.
///
/// With nothing visible the index counts as -1, so an empty grid always
/// allows loading.
fn load_more_allowed(last_visible: Option<usize>, total_rows: usize, buffer: usize) -> bool {
    match last_visible {
        Some(index) => index.saturating_add(buffer).saturating_add(1) >= total_rows,
        None => total_rows <= buffer,
    }
}
