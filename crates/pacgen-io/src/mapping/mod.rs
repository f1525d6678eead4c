//! Register reconciliation and Structured Text value mapping

mod allocator;
mod literals;
mod names;

pub use allocator::{map_path_for, Conflict, MappingTable, RegisterAllocator, Resolution};
pub use literals::{parse_int, st_literal, DataType, WordLiteral};
pub use names::{esc_comment, project_stem, register_symbol, st_safe, IoDirection};
