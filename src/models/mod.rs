pub mod item;
pub mod row_model;

pub use item::*;
pub use row_model::*;
