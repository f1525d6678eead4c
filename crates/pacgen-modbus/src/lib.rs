//! Modbus poll configuration generator
//!
//! Reads a table of PLC %R registers and the Modbus addresses they are
//! published on, merges contiguous runs into link blocks, and writes the JSON
//! poll configuration used by the SRTP/Modbus bridge.

pub mod config;
mod error;
pub mod ranges;
pub mod table;

use anyhow::Result;
use log::debug;
use std::path::Path;

pub use config::{Link, PlcEntry, PollConfig, PollSettings};
pub use error::TableError;
pub use ranges::{merge_ranges, LinkBlock};
pub use table::{parse_modbus_address, parse_register, RegisterTable};

/// What a finished run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSummary {
    /// Register/address pairs read from the table
    pub pairs: usize,
    /// Rows dropped as malformed or duplicate
    pub dropped: usize,
    /// Link blocks written
    pub links: usize,
}

/// Read the register table at `source` and write the poll configuration to `output`
pub fn generate(source: &Path, output: &Path, settings: &PollSettings) -> Result<PollSummary> {
    let table = RegisterTable::parse(source)?;
    let blocks = merge_ranges(&table.pairs);
    debug!(
        "Merged {} pairs from {} into {} link blocks",
        table.pairs.len(),
        source.display(),
        blocks.len()
    );

    PollConfig::new(settings, &blocks).write(output)?;

    Ok(PollSummary {
        pairs: table.pairs.len(),
        dropped: table.dropped,
        links: blocks.len(),
    })
}
