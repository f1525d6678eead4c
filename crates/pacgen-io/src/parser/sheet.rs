//! Parser for the I/O mapping sheet (one row per PLC I/O point)

use anyhow::{Context, Result};
use std::path::Path;

use super::delimited::{delimited_reader, read_source, HeaderIndex};
use crate::SheetError;

/// Project used for rows that leave the project column blank
pub const DEFAULT_PROJECT: &str = "DEFAULT";

/// Loose header keys, in `IoRow` field order
const REQUIRED_COLUMNS: [&str; 7] = [
    "projectname",
    "plctag",
    "registerplc",
    "name",
    "datatype",
    "description",
    "initialvalue",
];

/// One I/O point from the sheet, with cells trimmed and defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoRow {
    /// 1-based record number in the source file (header is record 1)
    pub record: u64,
    /// Project name (`DEFAULT` when blank)
    pub project: String,
    /// PLC tag as written in the sheet (e.g. "%I00017")
    pub tag: String,
    /// Destination register as written in the sheet (e.g. "%R01019"), may be empty
    pub register: String,
    /// Symbolic name; falls back to the raw tag when blank
    pub name: String,
    /// Upper-cased data type cell
    pub data_type: String,
    /// Free-text description
    pub description: String,
    /// Initial value (`0` when blank)
    pub initial_value: String,
}

/// A parsed I/O sheet
#[derive(Debug, Default)]
pub struct IoSheet {
    pub rows: Vec<IoRow>,
}

impl IoSheet {
    /// Parse an I/O sheet export
    pub fn parse(path: &Path) -> Result<Self> {
        let content = read_source(path)?;
        Self::parse_str(&content)
            .with_context(|| format!("Failed to parse I/O sheet: {}", path.display()))
    }

    /// Parse an I/O sheet from string content
    ///
    /// Fails with [`SheetError::MissingColumns`] when any required column is absent.
    pub fn parse_str(content: &str) -> Result<Self> {
        let mut reader = delimited_reader(content);
        let mut records = reader.records();

        let header = match records.next() {
            Some(header) => header.context("Failed to read header row")?,
            None => csv::StringRecord::new(),
        };

        let columns = HeaderIndex::new(&header)
            .require(&REQUIRED_COLUMNS)
            .map_err(SheetError::MissingColumns)?;

        let mut sheet = IoSheet::default();

        for (idx, record) in records.enumerate() {
            let record = record.context("Failed to read sheet row")?;
            let cell = |column: usize| record.get(columns[column]).unwrap_or("").trim();

            let project = match cell(0) {
                "" => DEFAULT_PROJECT,
                project => project,
            };
            let tag = cell(1);
            let name = match cell(3) {
                "" => tag,
                name => name,
            };
            let initial_value = match cell(6) {
                "" => "0",
                value => value,
            };

            sheet.rows.push(IoRow {
                record: idx as u64 + 2,
                project: project.to_string(),
                tag: tag.to_string(),
                register: cell(2).to_string(),
                name: name.to_string(),
                data_type: cell(4).to_uppercase(),
                description: record.get(columns[5]).unwrap_or("").to_string(),
                initial_value: initial_value.to_string(),
            });
        }

        Ok(sheet)
    }
}
