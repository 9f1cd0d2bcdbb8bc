// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Dotpipe CLI Tool
//!
//! Main entry point for the dotpipe command-line interface.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotpipe_tools::{RunArgs, ToolConfig, list_stages, run_pipe};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dotpipe")]
#[command(about = "Dotpipe - Lazy iteration pipelines over JSON")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a pipe over JSON input
    Run(RunArgs),
    /// List the named steps and sinks
    Stages,
}

fn init_tracing(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let config = ToolConfig::resolve(args.config.as_deref())?.with_overrides(args.rng, args.max_materialize, args.pretty)?;
            init_tracing(&config.log_level);
            run_pipe(&args, &config)?;
        }
        Commands::Stages => {
            print!("{}", list_stages());
        }
    }

    Ok(())
}
