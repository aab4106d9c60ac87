use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rangemap-cmd")]
#[command(about = "Command-line utility for range map operations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a map through a reproducible random workload
    Simulate {
        /// Number of units in the managed range
        #[arg(long, default_value_t = 65535)]
        length: u64,

        /// Number of distinct owners competing for ranges
        #[arg(long, default_value_t = 8)]
        owners: usize,

        /// Number of operations to run
        #[arg(long, default_value_t = 10_000)]
        ops: u64,

        /// Seed for the workload generator
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Recycle segment nodes through the pool
        #[arg(long)]
        use_pool: bool,

        /// Coalesce free neighbors after every clear
        #[arg(long)]
        defrag: bool,

        /// Print the final structural snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect a structural snapshot and display summary information
    Inspect {
        /// Increase verbosity (-v lists every segment)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Path of the snapshot JSON file
        snapshot_path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            length,
            owners,
            ops,
            seed,
            use_pool,
            defrag,
            json,
        } => commands::simulate::run(length, owners, ops, seed, use_pool, defrag, json),
        Commands::Inspect {
            verbose,
            snapshot_path,
        } => commands::inspect::run(verbose, snapshot_path),
    }
}
