//! The fixed column schema every per-accountant table is written in.

mod column;
mod table;

pub use column::{Column, HeaderPreset};
pub use table::{AccountantSource, RequiredSchema, Row, RowSource};
