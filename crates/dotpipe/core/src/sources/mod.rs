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

//! Pipe Sources
//!
//! Alternate constructors on [`Pipe`]. Each one builds a pipe whose source
//! stage produces a fresh iterator on every evaluation.

mod dice;
mod fs;
mod walk;

pub use dice::Dice;
pub use walk::{WalkOptions, WalkStrategy};

use crate::args::check_positive_or_none;
use crate::pipe::Pipe;
use crate::stage::{Flow, Param, Stage};
use dotpipe_common::{PipeError, PipeResult, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// `start, start + step, ...` until the next value would overflow
fn counter(start: i64, step: i64) -> impl Iterator<Item = i64> + Send + 'static {
    std::iter::successors(Some(start), move |x| x.checked_add(step))
}

fn check_step(op: &str, step: i64) -> PipeResult<i64> {
    if step == 0 {
        Err(PipeError::argument(op, "'step' must not be zero"))
    } else {
        Ok(step)
    }
}

impl Pipe {
    /// Integers from `start` to `stop` inclusive, or forever when `stop` is
    /// `None`
    pub fn range(start: i64, stop: Option<i64>, step: i64) -> PipeResult<Pipe> {
        let step = check_step("range", step)?;
        Ok(Self::with_source(Stage::new("range", Vec::new(), move |_| {
            Ok(match stop {
                None => Flow::iter(counter(start, step).map(Value::Int)),
                Some(stop) => Flow::iter(
                    counter(start, step)
                        .take_while(move |x| if step > 0 { *x <= stop } else { *x >= stop })
                        .map(Value::Int),
                ),
            })
        })))
    }

    /// Integers from `start` up to but excluding `stop`, or forever when
    /// `stop` is `None`
    pub fn rangetil(start: i64, stop: Option<i64>, step: i64) -> PipeResult<Pipe> {
        let step = check_step("rangetil", step)?;
        Ok(Self::with_source(Stage::new("rangetil", Vec::new(), move |_| {
            Ok(match stop {
                None => Flow::iter(counter(start, step).map(Value::Int)),
                Some(stop) => Flow::iter(
                    counter(start, step)
                        .take_while(move |x| if step > 0 { *x < stop } else { *x > stop })
                        .map(Value::Int),
                ),
            })
        })))
    }

    /// `value` forever, or `n` times
    pub fn repeat(value: impl Into<Value>, n: Option<usize>) -> PipeResult<Pipe> {
        let n = check_positive_or_none("repeat", "n", n)?;
        let value = value.into();
        Ok(Self::with_source(Stage::new("repeat", Vec::new(), move |_| {
            let items = std::iter::repeat(value.clone());
            Ok(match n {
                None => Flow::iter(items),
                Some(n) => Flow::iter(items.take(n)),
            })
        })))
    }

    /// The results of calling `func` forever
    pub fn repeatfunc<F>(func: F) -> Pipe
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        let func = Arc::new(func);
        Self::with_source(Stage::new("repeatfunc", Vec::new(), move |_| {
            let func = Arc::clone(&func);
            Ok(Flow::iter(std::iter::repeat_with(move || func())))
        }))
    }

    /// `initial`, then `func` applied to each previous item
    pub fn iterfunc<F>(initial: impl Into<Value>, func: F) -> Pipe
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        let initial = initial.into();
        let func = Arc::new(func);
        Self::with_source(Stage::new("iterfunc", Vec::new(), move |_| {
            let func = Arc::clone(&func);
            Ok(Flow::iter(std::iter::successors(Some(initial.clone()), move |prev| {
                Some(func(prev.clone()))
            })))
        }))
    }

    /// Items built from `seed`: `func` returns `(item, feedback)` and is
    /// called again with the feedback until it returns `None`
    pub fn unfold<F>(seed: impl Into<Value>, func: F) -> Pipe
    where
        F: Fn(Value) -> Option<(Value, Value)> + Send + Sync + 'static,
    {
        let seed = seed.into();
        let func = Arc::new(func);
        Self::with_source(Stage::new("unfold", Vec::new(), move |_| {
            let func = Arc::clone(&func);
            let mut feedback = Some(seed.clone());
            Ok(Flow::iter(std::iter::from_fn(move || {
                let (item, next) = func(feedback.take()?)?;
                feedback = Some(next);
                Some(item)
            })))
        }))
    }

    /// `(key, value)` pairs of `mapping`
    pub fn items(mapping: BTreeMap<Value, Value>) -> Pipe {
        Self::with_source(Stage::new("items", Vec::new(), move |_| {
            let pairs: Vec<Value> = mapping.iter().map(|(k, v)| Value::pair(k.clone(), v.clone())).collect();
            Ok(Flow::iter(pairs.into_iter()))
        }))
    }

    pub fn keys(mapping: BTreeMap<Value, Value>) -> Pipe {
        Self::with_source(Stage::new("keys", Vec::new(), move |_| {
            Ok(Flow::iter(mapping.keys().cloned().collect::<Vec<_>>().into_iter()))
        }))
    }

    pub fn values(mapping: BTreeMap<Value, Value>) -> Pipe {
        Self::with_source(Stage::new("values", Vec::new(), move |_| {
            Ok(Flow::iter(mapping.values().cloned().collect::<Vec<_>>().into_iter()))
        }))
    }

    /// Uniform random floats in `[a, b)`
    pub fn randfloat(a: f64, b: f64) -> Pipe {
        Self::with_source(Stage::new("randfloat", vec![Param::Rng], move |mut args| {
            let rng = args.rng()?;
            if a == 0.0 && b == 1.0 {
                Ok(Flow::iter(std::iter::repeat_with(move || Value::Float(rng.random()))))
            } else {
                Ok(Flow::iter(std::iter::repeat_with(move || Value::Float(rng.uniform(a, b)))))
            }
        }))
    }

    /// Random integers drawn from the inclusive range `start..=stop` by
    /// `step`
    pub fn randrange(start: i64, stop: i64, step: i64) -> PipeResult<Pipe> {
        let step = check_step("randrange", step)?;
        let empty = if step > 0 { start > stop } else { start < stop };
        if empty {
            return Err(PipeError::argument(
                "randrange",
                format!("empty range for randrange({start}, {stop}, {step})"),
            ));
        }
        Ok(Self::with_source(Stage::new("randrange", vec![Param::Rng], move |mut args| {
            let rng = args.rng()?;
            Ok(Flow::iter(std::iter::from_fn(move || {
                rng.randrange_inclusive(start, stop, step).map(Value::Int)
            })))
        })))
    }

    /// Results of rolling dice written as `NdS`, `NdS+M` or `NdS-M`
    pub fn roll(notation: &str) -> PipeResult<Pipe> {
        Ok(Self::roll_dice(notation.parse()?))
    }

    /// Results of rolling `dice`
    pub fn roll_dice(dice: Dice) -> Pipe {
        Self::with_source(Stage::new("roll", vec![Param::Rng], move |mut args| {
            let rng = args.rng()?;
            Ok(Flow::iter(std::iter::repeat_with(move || Value::Int(dice.roll(&rng)))))
        }))
    }
}
