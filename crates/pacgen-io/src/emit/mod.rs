//! Writers for the generated PAC artifacts

mod import_csv;
mod structured_text;

pub use import_csv::{write_import_csv, IMPORT_HEADER};
pub use structured_text::{assignment_lines, emit_init_st, emit_map_st};
