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

//! Dotpipe Core Library
//!
//! Immutable, lazily evaluated iteration pipelines. A [`Pipe`] is an ordered
//! list of stages with an optional source. Builders return new pipes; nothing
//! runs until a sink pulls items through.
//!
//! ```
//! use dotpipe_core::{Pipe, Value};
//!
//! let evens = Pipe::range(1, Some(10), 1)
//!     .unwrap()
//!     .filter(|v| v.as_i64().is_some_and(|i| i % 2 == 0));
//! assert_eq!(evens.sum().unwrap(), Value::Int(30));
//! ```

pub mod args;
pub mod config;
pub mod engine;
pub mod pipe;
pub mod resolver;
pub mod rng;
pub mod sinks;
pub mod sources;
pub mod stage;
pub mod steps;

pub use args::{Bound, ChunkTail, KSpec, SliceSpec, ZipMode};
pub use config::{PipeConfig, RngMode};
pub use engine::{Outcome, Partial};
pub use pipe::{Pipe, Selected, Selector};
pub use resolver::{Args, Fault, Guarded, PipeClass, Sequence};
pub use rng::{RngHandle, RngKind};
pub use sinks::MergeMode;
pub use sources::{Dice, WalkOptions, WalkStrategy};
pub use stage::{Flow, Param, Sink, Stage};
pub use steps::{MapFn, PredFn, RemapArg, RemapRule, SplitOn, func, pred};

pub use dotpipe_common::{DROP, END, ErrorKind, KEEP, MISSING, POOL, PipeError, PipeResult, Sentinel, Value, ValueIter};
