//! Poll configuration document consumed by the SRTP/Modbus bridge

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::ranges::LinkBlock;

/// Connection and polling settings for the generated document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// PLC IP address
    pub ip: String,
    /// SRTP port of the PLC
    pub port: u16,
    /// Poll interval in milliseconds
    pub poll_ms: u64,
    /// Swap bytes of every register by default
    pub swap_bytes: bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            ip: "192.168.30.244".to_string(),
            port: 18245,
            poll_ms: 100,
            swap_bytes: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PollConfig {
    pub poll_ms: u64,
    pub default_swap_bytes: bool,
    pub plcs: Vec<PlcEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlcEntry {
    pub ip: String,
    pub srtp_port: u16,
    pub links: Vec<Link>,
}

/// One link block as written to the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Link {
    /// Start register label (e.g. "R01017")
    pub plc: String,
    /// Start Modbus address in decimal
    pub modbus: String,
    pub count: u32,
}

impl From<&LinkBlock> for Link {
    fn from(block: &LinkBlock) -> Self {
        Link {
            plc: format!("R{:05}", block.register),
            modbus: block.address.to_string(),
            count: block.count,
        }
    }
}

impl PollConfig {
    /// Document with a single PLC polling `blocks`
    pub fn new(settings: &PollSettings, blocks: &[LinkBlock]) -> Self {
        PollConfig {
            poll_ms: settings.poll_ms,
            default_swap_bytes: settings.swap_bytes,
            plcs: vec![PlcEntry {
                ip: settings.ip.clone(),
                srtp_port: settings.port,
                links: blocks.iter().map(Link::from).collect(),
            }],
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize poll configuration")
    }

    /// Write the document to `path`, replacing it atomically
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;

        tmp.persist(path)
            .with_context(|| format!("Failed to write poll configuration: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn blocks() -> Vec<LinkBlock> {
        vec![
            LinkBlock {
                register: 1017,
                address: 1,
                count: 3,
            },
            LinkBlock {
                register: 25,
                address: 9,
                count: 1,
            },
        ]
    }

    #[test]
    fn test_document_shape() {
        let config = PollConfig::new(&PollSettings::default(), &blocks());
        let value: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "PollMs": 100,
                "DefaultSwapBytes": true,
                "Plcs": [{
                    "Ip": "192.168.30.244",
                    "SrtpPort": 18245,
                    "Links": [
                        { "Plc": "R01017", "Modbus": "1", "Count": 3 },
                        { "Plc": "R00025", "Modbus": "9", "Count": 1 }
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let settings = PollSettings {
            ip: "10.0.0.5".to_string(),
            port: 18246,
            poll_ms: 250,
            swap_bytes: false,
        };
        let config = PollConfig::new(&settings, &[]);
        config.write(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("  \"PollMs\": 250"));
        let read_back: PollConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(read_back, config);
        assert!(read_back.plcs[0].links.is_empty());
    }
}
