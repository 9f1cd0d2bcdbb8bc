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

//! Run command for evaluating a pipe over JSON input

use super::registry::{REGISTRY, StageCall, StageKind};
use crate::config::ToolConfig;
use anyhow::{Context, Result};
use clap::Args;
use dotpipe_core::{Pipe, RngMode, Value};
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info};

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// JSON file to use as the source, or `-` for stdin
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub input: String,

    /// Step to append, as `name [json-arg...]`; may be repeated
    #[arg(short, long = "step", value_name = "STEP")]
    pub steps: Vec<String>,

    /// Sink to finish with, as `name [json-arg...]`; without one the items
    /// are printed as a JSON array
    #[arg(long, value_name = "SINK")]
    pub sink: Option<String>,

    /// Random generator: shared, pseudo, crypto or seeded:<n>
    #[arg(long, value_name = "MODE")]
    pub rng: Option<RngMode>,

    /// Refuse to materialize more than this many items
    #[arg(long, value_name = "N")]
    pub max_materialize: Option<usize>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pub pretty: bool,
}

fn read_input(input: &str) -> Result<serde_json::Value> {
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading input {input}"))?
    };
    serde_json::from_str(&text).with_context(|| format!("parsing JSON from {input}"))
}

/// Build the pipe described by `args` over `source` and evaluate it
pub fn evaluate(args: &RunArgs, config: &ToolConfig, source: serde_json::Value) -> Result<serde_json::Value> {
    let mut pipe = Pipe::of(Value::from(source)).with_config(&config.pipe)?;
    for text in &args.steps {
        let call: StageCall = text.parse()?;
        debug!(step = %call, "appending step");
        pipe = call.apply_step(&pipe).with_context(|| format!("step '{text}'"))?;
    }
    info!(pipe = %pipe, "evaluating");

    let result = match &args.sink {
        Some(text) => {
            let call: StageCall = text.parse()?;
            call.apply_sink(&pipe).with_context(|| format!("sink '{text}'"))?
        }
        None => Value::List(pipe.list()?),
    };
    Ok(result.to_json())
}

/// Execute the run command
pub fn run_pipe(args: &RunArgs, config: &ToolConfig) -> Result<()> {
    let source = read_input(&args.input)?;
    let output = evaluate(args, config, source)?;
    let text = if config.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");
    Ok(())
}

/// Render the stage registry as a table
pub fn list_stages() -> String {
    let mut out = String::new();
    for (title, kind) in [("Steps", StageKind::Step), ("Sinks", StageKind::Sink)] {
        out.push_str(title);
        out.push_str(":\n");
        for info in REGISTRY.iter().filter(|info| info.kind == kind) {
            out.push_str(&format!("  {:<20} {}\n", info.name, info.usage));
        }
    }
    out
}
