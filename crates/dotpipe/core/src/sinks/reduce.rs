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

//! Reducing sinks

use super::over_items;
use crate::pipe::Pipe;
use crate::stage::Sink;
use dotpipe_common::{PipeError, PipeResult, Value, ValueIter};
use std::cmp::Ordering;
use std::sync::Arc;

type KeyFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Items combined left to right with `func`, starting from `initial` or
/// the first item
pub fn fold<F>(func: F, initial: Option<Value>) -> Sink<Value>
where
    F: Fn(Value, Value) -> Value + Send + Sync + 'static,
{
    over_items("fold", move |mut items| {
        let start = match initial.clone() {
            Some(v) => v,
            None => items.next().ok_or_else(|| PipeError::empty("fold"))?,
        };
        Ok(items.fold(start, |acc, v| func(acc, v)))
    })
}

fn accumulate(name: &'static str, start: Value, op: fn(&Value, &Value) -> PipeResult<Value>) -> Sink<Value> {
    over_items(name, move |mut items| items.try_fold(start.clone(), |acc, v| op(&acc, &v)))
}

/// Arithmetic sum of the items, `0` when empty
pub fn sum() -> Sink<Value> {
    accumulate("sum", Value::Int(0), Value::add)
}

/// Arithmetic product of the items, `1` when empty
pub fn product() -> Sink<Value> {
    accumulate("product", Value::Int(1), Value::mul)
}

/// The first item whose key is extreme in the `wanted` direction
fn extreme(items: ValueIter, key: Option<&KeyFn>, wanted: Ordering) -> Option<Value> {
    let keyed = |v: &Value| match key {
        Some(key) => key(v),
        None => v.clone(),
    };
    let mut best: Option<(Value, Value)> = None;
    for item in items {
        let k = keyed(&item);
        let better = match &best {
            Some((best_key, _)) => k.cmp(best_key) == wanted,
            None => true,
        };
        if better {
            best = Some((k, item));
        }
    }
    best.map(|(_, v)| v)
}

fn extreme_sink(name: &'static str, wanted: Ordering, key: Option<KeyFn>, default: Option<Value>) -> Sink<Value> {
    over_items(name, move |items| {
        extreme(items, key.as_ref(), wanted)
            .or_else(|| default.clone())
            .ok_or_else(|| PipeError::empty(name))
    })
}

pub fn max(default: Option<Value>) -> Sink<Value> {
    extreme_sink("max", Ordering::Greater, None, default)
}

pub fn min(default: Option<Value>) -> Sink<Value> {
    extreme_sink("min", Ordering::Less, None, default)
}

/// The first item with the greatest `key`
pub fn max_by_key<F>(key: F, default: Option<Value>) -> Sink<Value>
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    extreme_sink("max", Ordering::Greater, Some(Arc::new(key)), default)
}

/// The first item with the least `key`
pub fn min_by_key<F>(key: F, default: Option<Value>) -> Sink<Value>
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    extreme_sink("min", Ordering::Less, Some(Arc::new(key)), default)
}

fn bounds(mut items: ValueIter, key: Option<&KeyFn>) -> Option<(Value, Value)> {
    let keyed = |v: &Value| match key {
        Some(key) => key(v),
        None => v.clone(),
    };
    let first = items.next()?;
    let first_key = keyed(&first);
    let mut lo = (first_key.clone(), first.clone());
    let mut hi = (first_key, first);
    for item in items {
        let k = keyed(&item);
        if k < lo.0 {
            lo = (k, item);
        } else if k > hi.0 {
            hi = (k, item);
        }
    }
    Some((lo.1, hi.1))
}

fn bounds_or(name: &str, items: ValueIter, key: Option<&KeyFn>, default: &Option<Value>) -> PipeResult<(Value, Value)> {
    bounds(items, key)
        .or_else(|| default.clone().map(|d| (d.clone(), d)))
        .ok_or_else(|| PipeError::empty(name))
}

fn minmax_sink(key: Option<KeyFn>, default: Option<Value>) -> Sink<(Value, Value)> {
    over_items("minmax", move |items| bounds_or("minmax", items, key.as_ref(), &default))
}

/// `(min, max)` of the items
pub fn minmax(default: Option<Value>) -> Sink<(Value, Value)> {
    minmax_sink(None, default)
}

pub fn minmax_by_key<F>(key: F, default: Option<Value>) -> Sink<(Value, Value)>
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    minmax_sink(Some(Arc::new(key)), default)
}

fn width_sink(key: Option<KeyFn>, default: Option<Value>) -> Sink<Value> {
    over_items("width", move |items| {
        let (lo, hi) = bounds_or("width", items, key.as_ref(), &default)?;
        hi.sub(&lo)
    })
}

/// `max - min` of the items; with `default` and no items this is
/// `default - default`
pub fn width(default: Option<Value>) -> Sink<Value> {
    width_sink(None, default)
}

pub fn width_by_key<F>(key: F, default: Option<Value>) -> Sink<Value>
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    width_sink(Some(Arc::new(key)), default)
}

impl Pipe {
    pub fn fold<F>(&self, func: F, initial: Option<Value>) -> PipeResult<Value>
    where
        F: Fn(Value, Value) -> Value + Send + Sync + 'static,
    {
        self.run(&fold(func, initial))
    }

    pub fn sum(&self) -> PipeResult<Value> {
        self.run(&sum())
    }

    pub fn product(&self) -> PipeResult<Value> {
        self.run(&product())
    }

    pub fn max(&self, default: Option<Value>) -> PipeResult<Value> {
        self.run(&max(default))
    }

    pub fn min(&self, default: Option<Value>) -> PipeResult<Value> {
        self.run(&min(default))
    }

    pub fn max_by_key<F>(&self, key: F, default: Option<Value>) -> PipeResult<Value>
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.run(&max_by_key(key, default))
    }

    pub fn min_by_key<F>(&self, key: F, default: Option<Value>) -> PipeResult<Value>
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.run(&min_by_key(key, default))
    }

    pub fn minmax(&self, default: Option<Value>) -> PipeResult<(Value, Value)> {
        self.run(&minmax(default))
    }

    pub fn minmax_by_key<F>(&self, key: F, default: Option<Value>) -> PipeResult<(Value, Value)>
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.run(&minmax_by_key(key, default))
    }

    pub fn width(&self, default: Option<Value>) -> PipeResult<Value> {
        self.run(&width(default))
    }

    pub fn width_by_key<F>(&self, key: F, default: Option<Value>) -> PipeResult<Value>
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.run(&width_by_key(key, default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotpipe_common::ErrorKind;

    fn neg(v: &Value) -> Value {
        Value::Int(-v.as_i64().unwrap())
    }

    #[test]
    fn test_fold() {
        let add = |a: Value, b: Value| a.add(&b).unwrap();
        assert_eq!(Pipe::of([1, 2, 3]).fold(add, None).unwrap(), Value::Int(6));
        assert_eq!(Pipe::of([1, 2, 3]).fold(add, Some(Value::Int(10))).unwrap(), Value::Int(16));
        assert_eq!(Pipe::of("").fold(add, None).unwrap_err().kind(), ErrorKind::EmptyInput);
        assert_eq!(Pipe::of("").fold(add, Some(Value::Int(0))).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_sum_and_product() {
        let p = Pipe::range(1, Some(5), 1).unwrap();
        assert_eq!(p.sum().unwrap(), Value::Int(15));
        assert_eq!(p.product().unwrap(), Value::Int(120));
        assert_eq!(Pipe::of("").sum().unwrap(), Value::Int(0));
        assert_eq!(Pipe::of(Value::list([1.5, 2.0])).sum().unwrap(), Value::Float(3.5));
        assert_eq!(Pipe::of("ab").sum().unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_integer_overflow_widens_to_float() {
        assert_eq!(Pipe::of([i64::MAX, 0]).sum().unwrap(), Value::Int(i64::MAX));
        assert!(matches!(Pipe::of([i64::MAX, 1]).sum().unwrap(), Value::Float(f) if f >= 9.2e18));
        assert!(matches!(Pipe::of([i64::MIN, -1]).sum().unwrap(), Value::Float(f) if f <= -9.2e18));
        assert!(matches!(Pipe::of([i64::MAX, 2]).product().unwrap(), Value::Float(_)));
        assert!(matches!(Pipe::of([i64::MIN, i64::MAX]).width(None).unwrap(), Value::Float(_)));
        assert_eq!(
            Pipe::of([i64::MIN, i64::MAX]).minmax(None).unwrap(),
            (Value::Int(i64::MIN), Value::Int(i64::MAX))
        );
    }

    #[test]
    fn test_max_and_min() {
        let p = Pipe::of([3, 2, 5, 1, 4]);
        assert_eq!(p.max(None).unwrap(), Value::Int(5));
        assert_eq!(p.min(None).unwrap(), Value::Int(1));
        assert_eq!(p.max_by_key(neg, None).unwrap(), Value::Int(1));
        assert_eq!(p.min_by_key(neg, None).unwrap(), Value::Int(5));
        assert_eq!(Pipe::of("").max(Some(Value::str("meow"))).unwrap(), Value::str("meow"));
        assert_eq!(Pipe::of("").min(None).unwrap_err().kind(), ErrorKind::EmptyInput);
    }

    #[test]
    fn test_extremes_keep_first_of_ties() {
        let words = Pipe::of(Value::list(["bb", "aa", "c"]));
        let len = |v: &Value| Value::from(v.len().unwrap_or(0));
        assert_eq!(words.max_by_key(len, None).unwrap(), Value::str("bb"));
        assert_eq!(words.minmax_by_key(len, None).unwrap(), (Value::str("c"), Value::str("bb")));
    }

    #[test]
    fn test_minmax_and_width() {
        let p = Pipe::of([3, 2, 5, 1, 4]);
        assert_eq!(p.minmax(None).unwrap(), (Value::Int(1), Value::Int(5)));
        assert_eq!(p.width(None).unwrap(), Value::Int(4));
        assert_eq!(
            Pipe::of("").minmax(Some(Value::Int(0))).unwrap(),
            (Value::Int(0), Value::Int(0))
        );
        assert_eq!(Pipe::of("").width(Some(Value::Int(7))).unwrap(), Value::Int(0));
        assert_eq!(Pipe::of("").width(None).unwrap_err().kind(), ErrorKind::EmptyInput);
    }
}
