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

//! Tool configuration
//!
//! Read from a TOML file named by `--config` or `DOTPIPE_CONFIG`; values given
//! on the command line override the file.

use anyhow::{Context, Result};
use dotpipe_core::{PipeConfig, RngMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Pretty-print JSON output
    pub pretty: bool,
    /// Settings applied to every evaluated pipe
    pub pipe: PipeConfig,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            pretty: false,
            pipe: PipeConfig::default(),
        }
    }
}

impl ToolConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
        config.pipe.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The file named on the command line, else `DOTPIPE_CONFIG`, else
    /// defaults
    pub fn resolve(cli_config: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_config {
            return Self::load_from_file(path);
        }
        match std::env::var("DOTPIPE_CONFIG") {
            Ok(path) => Self::load_from_file(PathBuf::from(path)),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, rng: Option<RngMode>, max_materialize: Option<usize>, pretty: bool) -> Result<Self> {
        if let Some(rng) = rng {
            self.pipe.rng = rng;
        }
        if max_materialize.is_some() {
            self.pipe.max_materialize = max_materialize;
        }
        self.pretty |= pretty;
        self.pipe.validate()?;
        Ok(self)
    }
}
