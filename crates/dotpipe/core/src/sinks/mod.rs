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

//! Pipe Sinks
//!
//! Each sink is a free function returning a [`Sink`](crate::Sink), usable
//! with [`Pipe::run`](crate::Pipe::run), [`Pipe::finish`](crate::Pipe::finish)
//! or [`Sink::apply`](crate::Stage::apply), plus a method of the same name
//! on [`Pipe`](crate::Pipe) that runs it on the pipe's own source.

mod collect;
mod merge;
mod predicates;
mod reduce;
mod stats;

pub use collect::{bytes, count, dict, exhaust, first, frequencies, groupby, list, nth, partition, partition_by, set, shuffle, str, tuple};
pub use merge::{MergeMode, merge};
pub use predicates::{all, all_by, any, any_by, contains, equal, find, identical, none, none_by};
pub use reduce::{
    fold, max, max_by_key, min, min_by_key, minmax, minmax_by_key, product, sum, width, width_by_key,
};
pub use stats::{mean, median, mode, stdev, variance};

use crate::stage::{Param, Sink};
use dotpipe_common::{PipeResult, ValueIter};

/// A sink reading the running items as an iterator
pub(crate) fn over_items<T, F>(name: &str, f: F) -> Sink<T>
where
    T: 'static,
    F: Fn(ValueIter) -> PipeResult<T> + Send + Sync + 'static,
{
    Sink::new(name, vec![Param::Ix], move |mut args| f(args.ix()?))
}
