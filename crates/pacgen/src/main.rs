use anyhow::Result;
use clap::{Parser, Subcommand};

mod io_map;
mod modbus;

#[derive(Parser, Debug)]
#[command(name = "pacgen")]
#[command(author, version)]
#[command(about = "Generators for PAC I/O mapping and Modbus polling artifacts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate mirror code, PME import files and presets from an I/O sheet
    #[command(name = "io")]
    Io(io_map::IoArgs),

    /// Generate the SRTP/Modbus poll configuration from a register table
    Modbus(modbus::ModbusArgs),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Io(args) => io_map::execute(args),
        Commands::Modbus(args) => modbus::execute(args),
    }
}
