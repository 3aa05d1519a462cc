pub mod justified;
pub mod layout_cache;

pub use justified::{
    calc_grid, calc_grid_exclude_last_row, calc_visible_grid, compute_breaks, insert_items,
    rows_from_breaks, PackConstraints, RowBreak,
};
pub use layout_cache::{CachedLayoutComputer, LayoutCache};
