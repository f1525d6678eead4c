//! Parsers for spreadsheet exports

mod delimited;
mod sheet;

pub use delimited::{delimited_reader, normalize_header, read_source, sniff_delimiter, HeaderIndex};
pub use sheet::{IoRow, IoSheet, DEFAULT_PROJECT};
