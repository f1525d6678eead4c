//! `io` command: I/O sheet → Structured Text, PME import files and master maps

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pacgen_io::{IoConfig, WordLiteral};
use std::path::PathBuf;

/// Arguments for the `io` command
#[derive(Args, Debug)]
pub struct IoArgs {
    /// I/O sheet exported from the spreadsheet (comma, semicolon or tab separated)
    #[arg(
        value_name = "SOURCE",
        default_value = "IO-Mapping-Modbus-Curr.csv",
        value_hint = clap::ValueHint::FilePath
    )]
    pub source: PathBuf,

    /// Directory for the generated `<project>_map.st`, `_Rvars.csv` and `_init.st` files
    #[arg(long, value_name = "DIR", default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub out_dir: PathBuf,

    /// Directory holding the per-project master maps
    #[arg(long, value_name = "DIR", default_value = "global_maps", value_hint = clap::ValueHint::DirPath)]
    pub map_dir: PathBuf,

    /// How WORD presets are written in `<project>_init.st`
    #[arg(long, value_enum, default_value_t = WordLiteralArg::Decimal)]
    pub word_literal: WordLiteralArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordLiteralArg {
    /// Plain decimal (`42`)
    Decimal,
    /// Type-qualified (`WORD#42`)
    Typed,
}

impl From<WordLiteralArg> for WordLiteral {
    fn from(arg: WordLiteralArg) -> Self {
        match arg {
            WordLiteralArg::Decimal => WordLiteral::Decimal,
            WordLiteralArg::Typed => WordLiteral::Typed,
        }
    }
}

/// Execute the `io` command
pub fn execute(args: IoArgs) -> Result<()> {
    let config = IoConfig {
        source: args.source,
        out_dir: args.out_dir,
        map_dir: args.map_dir,
        word_literal: args.word_literal.into(),
    };

    eprintln!("Reading I/O sheet: {}", config.source.display());
    let summary = pacgen_io::generate(&config)
        .with_context(|| format!("Failed to generate from {}", config.source.display()))?;

    for path in &summary.outputs {
        eprintln!("Wrote {}", path.display());
    }
    for path in &summary.maps {
        eprintln!("Master map updated: {}", path.display());
    }

    eprintln!();
    for project in &summary.projects {
        eprintln!(
            "  {}: {} assignments, {} registers",
            project.name, project.assignments, project.registers
        );
    }
    eprintln!(
        "{} rows: {} generated, {} skipped, {} without register, {} conflicts, {} new map entries",
        summary.rows,
        summary.emitted,
        summary.skipped,
        summary.unresolved,
        summary.conflicts,
        summary.learned
    );

    if !summary.outputs.is_empty() {
        eprintln!();
        eprintln!("Import each *_Rvars.csv via PME 'Variables > Import...'.");
        eprintln!("Paste the corresponding *_map.st into your Structured Text routine.");
    }

    Ok(())
}
