//! PLC I/O sheet generator
//!
//! Turns an I/O mapping sheet into, per project:
//! - `<project>_map.st`: Structured Text mirroring I/O points to %R registers
//! - `<project>_Rvars.csv`: PME import file declaring the %R variables
//! - `<project>_init.st`: register presets to run once on power-up
//!
//! Destination registers are reconciled against a per-project master map
//! (`<map dir>/<project>_global_io_map.csv`) that is authoritative over the
//! sheet and grows as new tags are seen.

pub mod emit;
mod error;
pub mod mapping;
pub mod parser;
mod session;

use anyhow::Result;
use log::debug;
use std::path::PathBuf;

pub use error::SheetError;
pub use mapping::{Conflict, DataType, MappingTable, RegisterAllocator, Resolution, WordLiteral};
pub use parser::{IoRow, IoSheet};
pub use session::{
    Assignment, IoSession, ProjectOutput, ProjectSummary, RegisterVar, RowOutcome, RunSummary,
};

/// Settings for one generator run
#[derive(Debug, Clone)]
pub struct IoConfig {
    /// I/O sheet exported from the spreadsheet
    pub source: PathBuf,
    /// Directory receiving the generated artifacts
    pub out_dir: PathBuf,
    /// Directory holding the per-project master maps
    pub map_dir: PathBuf,
    /// How WORD presets are written
    pub word_literal: WordLiteral,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("IO-Mapping-Modbus-Curr.csv"),
            out_dir: PathBuf::from("."),
            map_dir: PathBuf::from("global_maps"),
            word_literal: WordLiteral::default(),
        }
    }
}

/// Run the generator: parse the sheet, reconcile every row, write all outputs
///
/// Nothing is written when the sheet cannot be read or lacks required columns.
pub fn generate(config: &IoConfig) -> Result<RunSummary> {
    let sheet = IoSheet::parse(&config.source)?;
    debug!(
        "Read {} rows from {}",
        sheet.rows.len(),
        config.source.display()
    );

    let mut session = IoSession::new(&config.map_dir, config.word_literal);
    for row in &sheet.rows {
        session.process_row(row)?;
    }

    session.finish(&config.out_dir)
}
