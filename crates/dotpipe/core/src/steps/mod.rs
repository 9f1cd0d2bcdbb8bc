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

//! Pipe Steps
//!
//! Builder methods on [`Pipe`](crate::Pipe) that append one stage. Nothing
//! runs until the pipe is evaluated; builders only check their own
//! arguments.

mod basic;
mod combinatorics;
mod mapping;
mod multi;
mod order;
mod random;
mod window;

pub use mapping::{RemapArg, RemapRule};
pub use window::SplitOn;

use dotpipe_common::Value;
use std::sync::Arc;

/// A shareable item transform
pub type MapFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// A shareable item predicate
pub type PredFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Box a closure for the steps that take several transforms
pub fn func<F>(f: F) -> MapFn
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Box a closure for the steps that take predicates by value
pub fn pred<F>(f: F) -> PredFn
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Items of a non-iterable value are the value itself
pub(crate) fn spread(value: Value) -> dotpipe_common::ValueIter {
    if !value.is_iterable() {
        return Box::new(std::iter::once(value));
    }
    value
        .into_items()
        .unwrap_or_else(|| Box::new(std::iter::empty()))
}
