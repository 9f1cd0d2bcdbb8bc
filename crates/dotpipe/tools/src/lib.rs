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

//! Dotpipe Tools Library
//!
//! This crate provides the `dotpipe` command-line tool, which evaluates pipes
//! over JSON input using stages looked up by name.

pub mod cli;
pub mod config;

// Re-export main CLI functions for easy access
pub use cli::registry::{REGISTRY, StageCall, StageInfo, StageKind};
pub use cli::run::{RunArgs, evaluate, list_stages, run_pipe};
pub use config::ToolConfig;
