//! Justified grid layout with viewport virtualization and infinite-scroll
//! admission control.
//!
//! Items of any aspect ratio are packed into rows that exactly fill the
//! container width. A [`GridState`] tracks the scroll position and hands the
//! renderer only the rows intersecting the viewport, together with a signal
//! telling the data layer when to fetch the next page.
//!
//! ```
//! use adaptive_grid::{GridState, Tile};
//!
//! let mut state = GridState::builder()
//!     .min_width(90.0)
//!     .padding(10.0)
//!     .build()
//!     .unwrap();
//!
//! let items: Vec<Tile> = (0..30).map(|_| Tile::square()).collect();
//! state.update_grid(&items, 300.0, 400.0, 0.0, true);
//!
//! state.update_offset(150.0);
//! let snapshot = state.get_state();
//! assert!(!snapshot.rows.is_empty());
//! assert!(!snapshot.load_more_allowed);
//! ```

pub mod error;
pub mod layout;
pub mod models;
pub mod state;

pub use error::ConfigError;
pub use layout::{
    calc_grid, calc_grid_exclude_last_row, calc_visible_grid, insert_items, CachedLayoutComputer,
    LayoutCache, PackConstraints, RowBreak,
};
pub use models::{Grid, Item, PackedItem, Row, Tile};
pub use state::{GridConfig, GridState, GridStateBuilder, RenderState};
