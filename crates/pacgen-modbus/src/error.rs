//! Structural failures of the register table

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    /// No row mentions "register" anywhere
    #[error("no header row found (expected a row containing 'Register PLC')")]
    NoHeaderRow,

    /// The header row lacks one of the required columns
    #[error("couldn't find column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}
