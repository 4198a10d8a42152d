//! HOM command-line interface.
//!
//! Run delay sweeps from TOML configuration files:
//! ```sh
//! hom-cli run job.toml
//! hom-cli validate job.toml
//! hom-cli materials
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hom-cli")]
#[command(about = "Hong-Ou-Mandel coincidence curves from spectral photon models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a delay sweep from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without running the sweep.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Display the built-in crystal presets.
    Materials,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            println!("HOM Coincidence Sweep");
            println!("=====================");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let curve = runner::run_job(&job)?;

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));

            if job.output.save_csv {
                runner::write_curve_csv(&curve, &out_dir.join("coincidence.csv"))?;
            }
            if job.output.save_json {
                runner::write_curve_json(&curve, &out_dir.join("coincidence.json"))?;
            }

            println!("Sweep complete.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let prepared = runner::prepare_job(&job)?;
            println!("Configuration is valid: {}", config.display());
            println!("  {} delays", prepared.sweep.len());
            Ok(())
        }
        Commands::Materials => {
            println!("Crystal presets (use in a [crystal] table):");
            println!();
            println!("  BBO_o   β-barium borate, ordinary ray,      220-3000 nm");
            println!("  BBO_e   β-barium borate, extraordinary ray, 220-3000 nm");
            println!("  custom  material = \"custom\" with sellmeier = {{ a1, a2, a3, a4 }}");
            Ok(())
        }
    }
}
