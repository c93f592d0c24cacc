//! Command line front end for the post-processing pipeline.

use clap::{Parser, Subcommand};
use log::error;
use pof_fronts::config::Config;
use pof_fronts::error::Result;
use pof_fronts::{FrontPipeline, LoadRequest};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "pof-fronts",
    version,
    about = "Pareto fronts, coverage and hypervolume summaries for optimizer runs"
)]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Prefix for the relative paths of the configuration
    #[arg(long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve an instance from the cache, processing raw results if needed
    Load {
        instance: String,
        /// Recompute even if cached results exist
        #[arg(long)]
        recompute: bool,
        /// Return an empty result instead of recomputing a missing cache
        #[arg(long)]
        strict: bool,
    },
    /// Recompute every generation of an instance
    Process { instance: String },
    /// Run the optimizer on an instance, then process its results
    Run {
        instance: String,
        #[arg(long)]
        seed: u64,
        #[arg(long)]
        num_vars: u32,
    },
    /// Coverage statistics of a set of installed facility IDs
    Stats {
        instance: String,
        #[arg(long, num_args = 0..)]
        ids: Vec<u32>,
        /// Print the JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// List the available instance files
    List,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn execute(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::new(),
    };
    if let Some(root) = &cli.root {
        config = config.with_root(root);
    }

    let mut pipeline = FrontPipeline::new(config);

    match cli.command {
        Commands::Load {
            instance,
            recompute,
            strict,
        } => print_json(&pipeline.load(&instance, LoadRequest { recompute, strict })?),
        Commands::Process { instance } => print_json(&pipeline.process(&instance)?),
        Commands::Run {
            instance,
            seed,
            num_vars,
        } => print_json(&pipeline.run(&instance, seed, num_vars)?),
        Commands::Stats {
            instance,
            ids,
            json,
        } => {
            let stats = pipeline.stats(&instance, &ids)?;
            if json {
                print_json(&stats)
            } else {
                println!("{}", stats.format());
                Ok(())
            }
        }
        Commands::List => print_json(&pipeline.catalog.list()?),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match execute(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            if e.is_not_found() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
