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

//! Steps and sources over several iterables
//!
//! The step forms read their iterables from the running items; the `_of`
//! forms are sources taking them directly. Zip-shaped stages materialize
//! every iterable before yielding.

use super::spread;
use crate::args::ZipMode;
use crate::pipe::Pipe;
use crate::resolver::{Args, PipeClass};
use crate::stage::{Flow, Param, Stage};
use dotpipe_common::{PipeError, PipeResult, Value, ValueIter};

/// Every iterable and its items, each bounded by the materialization limit
fn columns(args: &Args, iterables: impl Iterator<Item = Value>) -> PipeResult<Vec<Vec<Value>>> {
    args.collect(iterables)?
        .into_iter()
        .map(|v| {
            let found = format!("non-iterable {} {}", v.type_name(), v);
            let items = v
                .into_items()
                .ok_or_else(|| PipeError::type_mismatch(args.stage(), "an iterable", found))?;
            args.collect(items)
        })
        .collect()
}

/// Tuples across `cols`, sized by `mode`
fn zip_rows(cols: Vec<Vec<Value>>, mode: &ZipMode) -> PipeResult<Vec<Value>> {
    let shortest = cols.iter().map(Vec::len).min().unwrap_or(0);
    let longest = cols.iter().map(Vec::len).max().unwrap_or(0);
    let (rows, fill) = match mode {
        ZipMode::Shortest => (shortest, None),
        ZipMode::Longest(fill) => (longest, Some(fill)),
        ZipMode::Strict if shortest != longest => {
            return Err(PipeError::argument(
                "zip",
                format!("iterables have unequal lengths ({shortest} and {longest})"),
            ));
        }
        ZipMode::Strict => (shortest, None),
    };
    Ok((0..rows)
        .map(|i| {
            Value::Tuple(
                cols.iter()
                    .map(|col| col.get(i).or(fill).cloned().unwrap_or(Value::None))
                    .collect(),
            )
        })
        .collect())
}

/// Items taken cross-wise from `cols`
fn interleave_cols(cols: Vec<Vec<Value>>, fair: bool) -> Vec<Value> {
    let shortest = cols.iter().map(Vec::len).min().unwrap_or(0);
    let longest = cols.iter().map(Vec::len).max().unwrap_or(0);
    let rows = if fair { shortest } else { longest };
    let mut iters: Vec<_> = cols.into_iter().map(Vec::into_iter).collect();
    let mut out = Vec::new();
    for _ in 0..rows {
        out.extend(iters.iter_mut().filter_map(Iterator::next));
    }
    out
}

fn chained(iterables: ValueIter) -> impl Iterator<Item = Value> + Send {
    iterables.flat_map(spread)
}

impl Pipe {
    /// Items from each of this pipe's items in turn; items that are not
    /// iterable pass through as themselves
    pub fn chain(&self) -> Pipe {
        self.with_iter_step("chain", chained)
    }

    /// Source of the items of each of `iterables` in turn
    pub fn chain_of(iterables: Vec<Value>) -> Pipe {
        Self::with_source(Stage::new("chain", Vec::new(), move |_| {
            let items: ValueIter = Box::new(iterables.clone().into_iter());
            Ok(Flow::iter(chained(items)))
        }))
    }

    /// Tuples zipping this pipe's items together
    pub fn zip(&self, mode: ZipMode) -> Pipe {
        self.with_step(Stage::new("zip", vec![Param::Ix], move |mut args| {
            let iterables = args.ix()?;
            let cols = columns(&args, iterables)?;
            Ok(Flow::Value(Value::List(zip_rows(cols, &mode)?)))
        }))
    }

    /// Source of tuples zipping `iterables` together
    pub fn zip_of(iterables: Vec<Value>, mode: ZipMode) -> Pipe {
        Self::with_source(Stage::new("zip", Vec::new(), move |args| {
            let cols = columns(&args, iterables.clone().into_iter())?;
            Ok(Flow::Value(Value::List(zip_rows(cols, &mode)?)))
        }))
    }

    /// Items taken cross-wise from this pipe's items; `fair` stops at the
    /// shortest
    pub fn interleave(&self, fair: bool) -> Pipe {
        self.with_step(Stage::new("interleave", vec![Param::Ix], move |mut args| {
            let iterables = args.ix()?;
            let cols = columns(&args, iterables)?;
            Ok(Flow::Value(Value::List(interleave_cols(cols, fair))))
        }))
    }

    /// Source of items taken cross-wise from `iterables`
    pub fn interleave_of(iterables: Vec<Value>, fair: bool) -> Pipe {
        Self::with_source(Stage::new("interleave", Vec::new(), move |args| {
            let cols = columns(&args, iterables.clone().into_iter())?;
            Ok(Flow::Value(Value::List(interleave_cols(cols, fair))))
        }))
    }
}

impl PipeClass {
    pub fn chain_of(&self, iterables: Vec<Value>) -> Pipe {
        Pipe::chain_of(iterables)
    }

    pub fn zip_of(&self, iterables: Vec<Value>, mode: ZipMode) -> Pipe {
        Pipe::zip_of(iterables, mode)
    }

    pub fn interleave_of(&self, iterables: Vec<Value>, fair: bool) -> Pipe {
        Pipe::interleave_of(iterables, fair)
    }
}
