//! Parser for the PLC register → Modbus address table

use anyhow::{Context, Result};
use log::{debug, warn};
use pacgen_io::parser::{delimited_reader, read_source, HeaderIndex};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use crate::TableError;

/// `%R01017` → 1017 (the `%` is optional, leading zeros are dropped)
static REGISTER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*%?R0*(\d+)\s*$").unwrap());

/// Column holding the PLC register
const REGISTER_COLUMN: &str = "Register PLC";
/// Column holding the Modbus address
const MODBUS_COLUMN: &str = "Modbus Address";

/// Parse a %R register token into its offset
pub fn parse_register(token: &str) -> Option<u32> {
    let caps = REGISTER_TOKEN.captures(token)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Parse a Modbus address token
///
/// Tokens of five or more digits that start with `4` use the holding-register
/// reference notation and have the leading `4` dropped (`400001` → 1,
/// `40010` → 10). Shorter tokens, or ones not starting with `4`, are raw
/// addresses (`17` → 17, `000001` → 1).
pub fn parse_modbus_address(token: &str) -> Option<u32> {
    let token = token.trim();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = match token.strip_prefix('4') {
        Some(rest) if token.len() >= 5 => rest,
        _ => token,
    };
    digits.parse().ok()
}

/// Register/address pairs read from the table, in file order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegisterTable {
    pub pairs: Vec<(u32, u32)>,
    /// Rows dropped as malformed or duplicate
    pub dropped: usize,
}

impl RegisterTable {
    /// Parse a register table export
    pub fn parse(path: &Path) -> Result<Self> {
        let content = read_source(path)?;
        Self::parse_str(&content)
            .with_context(|| format!("Failed to parse register table: {}", path.display()))
    }

    /// Parse a register table from string content
    ///
    /// Rows before the header (the first row with a cell mentioning
    /// "register") are ignored. A pair whose register or Modbus address was
    /// already seen is dropped, keeping the first.
    pub fn parse_str(content: &str) -> Result<Self> {
        let mut reader = delimited_reader(content);
        let mut records = reader.records();

        let header = loop {
            match records.next() {
                Some(record) => {
                    let record = record.context("Failed to read table row")?;
                    if record.iter().any(|cell| cell.to_lowercase().contains("register")) {
                        break record;
                    }
                }
                None => return Err(TableError::NoHeaderRow.into()),
            }
        };

        let index = HeaderIndex::new(&header);
        let (Some(reg_col), Some(mb_col)) = (index.find(REGISTER_COLUMN), index.find(MODBUS_COLUMN))
        else {
            let missing = [REGISTER_COLUMN, MODBUS_COLUMN]
                .into_iter()
                .filter(|name| index.find(name).is_none())
                .map(str::to_string)
                .collect();
            return Err(TableError::MissingColumns(missing).into());
        };

        let mut table = RegisterTable::default();
        let mut seen_registers = HashSet::new();
        let mut seen_addresses = HashSet::new();

        for record in records {
            let record = record.context("Failed to read table row")?;
            let (Some(reg_token), Some(mb_token)) = (record.get(reg_col), record.get(mb_col))
            else {
                debug!("Skipping incomplete row: {:?}", record);
                continue;
            };

            let (Some(register), Some(address)) =
                (parse_register(reg_token), parse_modbus_address(mb_token))
            else {
                warn!(
                    "Skipping row with bad register {:?} or Modbus address {:?}",
                    reg_token, mb_token
                );
                table.dropped += 1;
                continue;
            };

            if seen_registers.contains(&register) || seen_addresses.contains(&address) {
                warn!(
                    "Skipping duplicate pair R{:05} → {} ({:?}, {:?})",
                    register, address, reg_token, mb_token
                );
                table.dropped += 1;
                continue;
            }

            seen_registers.insert(register);
            seen_addresses.insert(address);
            table.pairs.push((register, address));
        }

        Ok(table)
    }
}
