//! TxTable CLI
//!
//! Command-line tools for TxTable.
//!
//! # Commands
//!
//! - `encode` - Encode a transaction descriptor as hex
//! - `decode` - Decode a hex transaction descriptor
//! - `demo` - Run sample transactions against an in-memory table

mod commands;
mod hex;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// TxTable command-line tools.
#[derive(Parser)]
#[command(name = "txtable")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text
    Text,
    /// JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a transaction descriptor as hex
    Encode {
        /// Highest version visible to reads
        #[arg(short, long)]
        read_pointer: u64,

        /// Version stamped on writes
        #[arg(short, long)]
        write_pointer: u64,

        /// Versions hidden from reads (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Vec<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Decode a hex transaction descriptor
    Decode {
        /// Descriptor bytes as hex
        descriptor: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Run sample transactions against an in-memory table
    Demo {
        /// Which scenario to run
        #[arg(short, long, value_enum, default_value = "all")]
        scenario: commands::demo::Scenario,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Encode {
            read_pointer,
            write_pointer,
            exclude,
            format,
        } => {
            commands::encode::run(read_pointer, write_pointer, &exclude, format)?;
        }
        Commands::Decode { descriptor, format } => {
            commands::decode::run(&descriptor, format)?;
        }
        Commands::Demo { scenario, format } => {
            commands::demo::run(scenario, format)?;
        }
        Commands::Version => {
            println!("TxTable CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("TxTable Core v{}", txtable_core::VERSION);
        }
    }

    Ok(())
}
