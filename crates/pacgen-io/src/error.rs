//! Structural failures that abort a generator run

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a run before any output is written
#[derive(Debug, Error)]
pub enum SheetError {
    /// Required columns were not found by loose header matching
    #[error("CSV missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Another run holds the advisory lock on a project's master map
    #[error("master map {} is locked by another run", .0.display())]
    TableLocked(PathBuf),
}
