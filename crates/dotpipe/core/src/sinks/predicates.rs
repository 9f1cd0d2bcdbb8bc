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

//! Boolean and search sinks

use super::over_items;
use crate::pipe::Pipe;
use crate::stage::{Flow, Param, Sink};
use dotpipe_common::{PipeError, PipeResult, Value};
use std::mem::discriminant;

pub fn all() -> Sink<bool> {
    all_by(Value::is_truthy)
}

/// Whether `pred` holds for every item
pub fn all_by<F>(pred: F) -> Sink<bool>
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    over_items("all", move |mut items| Ok(items.all(|v| pred(&v))))
}

pub fn any() -> Sink<bool> {
    any_by(Value::is_truthy)
}

/// Whether `pred` holds for some item
pub fn any_by<F>(pred: F) -> Sink<bool>
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    over_items("any", move |mut items| Ok(items.any(|v| pred(&v))))
}

pub fn none() -> Sink<bool> {
    none_by(Value::is_truthy)
}

/// Whether `pred` holds for no item
pub fn none_by<F>(pred: F) -> Sink<bool>
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    over_items("none", move |mut items| Ok(!items.any(|v| pred(&v))))
}

/// Membership of `value`: substrings for strings, keys for mappings,
/// equal items otherwise
pub fn contains(value: impl Into<Value>) -> Sink<bool> {
    let needle = value.into();
    Sink::new("contains", vec![Param::Res], move |mut args| match args.res()? {
        Flow::Value(Value::Str(haystack)) => match &needle {
            Value::Str(sub) => Ok(haystack.contains(sub.as_str())),
            other => Err(PipeError::type_mismatch(
                "contains",
                "a string to search a string for",
                format!("{} {}", other.type_name(), other),
            )),
        },
        Flow::Value(Value::Map(map)) => Ok(map.contains_key(&needle)),
        Flow::Value(Value::Set(set)) => Ok(set.contains(&needle)),
        other => Ok(other.into_values()?.any(|item| item == needle)),
    })
}

/// Whether all items equal the first; `default` answers for empty input
pub fn equal(default: Option<bool>) -> Sink<bool> {
    all_same("equal", default, |a, b| a == b)
}

/// Whether all items are structurally identical to the first, matching
/// variant as well as value
pub fn identical(default: Option<bool>) -> Sink<bool> {
    all_same("identical", default, is_identical)
}

fn all_same(name: &'static str, default: Option<bool>, same: fn(&Value, &Value) -> bool) -> Sink<bool> {
    over_items(name, move |mut items| match items.next() {
        None => default.ok_or_else(|| PipeError::empty(name)),
        Some(first) => Ok(items.all(|item| same(&first, &item))),
    })
}

fn is_identical(a: &Value, b: &Value) -> bool {
    if discriminant(a) != discriminant(b) {
        return false;
    }
    match (a, b) {
        (Value::List(x), Value::List(y)) | (Value::Tuple(x), Value::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| is_identical(p, q))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y)
                    .all(|((ka, va), (kb, vb))| is_identical(ka, kb) && is_identical(va, vb))
        }
        _ => a == b,
    }
}

/// The first item for which `pred` holds, or `default`
pub fn find<F>(pred: F, default: Option<Value>) -> Sink<Value>
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    over_items("find", move |mut items| {
        items
            .find(|v| pred(v))
            .or_else(|| default.clone())
            .ok_or_else(|| PipeError::NotFound("No matching item found".to_string()))
    })
}

impl Pipe {
    pub fn all(&self) -> PipeResult<bool> {
        self.run(&all())
    }

    pub fn all_by<F>(&self, pred: F) -> PipeResult<bool>
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.run(&all_by(pred))
    }

    pub fn any(&self) -> PipeResult<bool> {
        self.run(&any())
    }

    pub fn any_by<F>(&self, pred: F) -> PipeResult<bool>
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.run(&any_by(pred))
    }

    pub fn none(&self) -> PipeResult<bool> {
        self.run(&none())
    }

    pub fn none_by<F>(&self, pred: F) -> PipeResult<bool>
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.run(&none_by(pred))
    }

    pub fn contains(&self, value: impl Into<Value>) -> PipeResult<bool> {
        self.run(&contains(value))
    }

    pub fn equal(&self, default: Option<bool>) -> PipeResult<bool> {
        self.run(&equal(default))
    }

    pub fn identical(&self, default: Option<bool>) -> PipeResult<bool> {
        self.run(&identical(default))
    }

    pub fn find<F>(&self, pred: F, default: Option<Value>) -> PipeResult<Value>
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.run(&find(pred, default))
    }
}
