//! `modbus` command: register table → poll configuration JSON

use anyhow::{Context, Result};
use clap::Args;
use pacgen_modbus::PollSettings;
use std::path::PathBuf;

/// Arguments for the `modbus` command
#[derive(Args, Debug)]
pub struct ModbusArgs {
    /// Table with "Register PLC" and "Modbus Address" columns
    #[arg(value_name = "SOURCE", default_value = "RLF.csv", value_hint = clap::ValueHint::FilePath)]
    pub source: PathBuf,

    /// Output file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.generated.json",
        value_hint = clap::ValueHint::FilePath
    )]
    pub output: PathBuf,

    /// PLC IP address
    #[arg(long, default_value = "192.168.30.244")]
    pub ip: String,

    /// PLC SRTP port
    #[arg(long, default_value_t = 18245)]
    pub port: u16,

    /// Poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    pub poll_ms: u64,

    /// Swap register bytes by default
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub swap_bytes: bool,
}

/// Execute the `modbus` command
pub fn execute(args: ModbusArgs) -> Result<()> {
    let settings = PollSettings {
        ip: args.ip,
        port: args.port,
        poll_ms: args.poll_ms,
        swap_bytes: args.swap_bytes,
    };

    eprintln!("Reading register table: {}", args.source.display());
    let summary = pacgen_modbus::generate(&args.source, &args.output, &settings)
        .with_context(|| format!("Failed to generate from {}", args.source.display()))?;

    eprintln!(
        "Wrote {} with {} link blocks covering {} PLC/Modbus pairs",
        args.output.display(),
        summary.links,
        summary.pairs
    );
    if summary.dropped > 0 {
        eprintln!("  {} rows skipped (bad or duplicate addresses)", summary.dropped);
    }

    Ok(())
}
