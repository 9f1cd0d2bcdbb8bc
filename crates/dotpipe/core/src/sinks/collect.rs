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

//! Container sinks

use super::over_items;
use crate::pipe::Pipe;
use crate::stage::{Flow, Param, Sink};
use dotpipe_common::{PipeError, PipeResult, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub fn list() -> Sink<Vec<Value>> {
    over_items("list", |items| Ok(items.collect()))
}

pub fn tuple() -> Sink<Value> {
    over_items("tuple", |items| Ok(Value::Tuple(items.collect())))
}

pub fn set() -> Sink<BTreeSet<Value>> {
    over_items("set", |items| Ok(items.collect()))
}

/// A mapping built from `(key, value)` pairs, or the mapping itself
pub fn dict() -> Sink<BTreeMap<Value, Value>> {
    Sink::new("dict", vec![Param::Res], |mut args| match args.res()? {
        Flow::Value(Value::Map(map)) => Ok(map),
        other => other
            .into_values()?
            .map(|item| match item {
                Value::Tuple(mut kv) | Value::List(mut kv) if kv.len() == 2 => {
                    let v = kv.pop().unwrap_or(Value::None);
                    let k = kv.pop().unwrap_or(Value::None);
                    Ok((k, v))
                }
                other => Err(PipeError::type_mismatch(
                    "dict",
                    "a (key, value) pair",
                    format!("{} {}", other.type_name(), other),
                )),
            })
            .collect(),
    })
}

/// String items joined with `sep`
pub fn str(sep: &str) -> Sink<String> {
    let sep = sep.to_string();
    over_items("str", move |items| {
        let parts = items
            .map(|item| match item {
                Value::Str(s) => Ok(s),
                other => Err(PipeError::type_mismatch(
                    "str",
                    "a string item",
                    format!("{} {}", other.type_name(), other),
                )),
            })
            .collect::<PipeResult<Vec<_>>>()?;
        Ok(parts.join(&sep))
    })
}

/// Byte-string items joined with `sep`
pub fn bytes(sep: &[u8]) -> Sink<Vec<u8>> {
    let sep = sep.to_vec();
    over_items("bytes", move |items| {
        let parts = items
            .map(|item| match item {
                Value::Bytes(b) => Ok(b),
                other => Err(PipeError::type_mismatch(
                    "bytes",
                    "a bytes item",
                    format!("{} {}", other.type_name(), other),
                )),
            })
            .collect::<PipeResult<Vec<_>>>()?;
        Ok(parts.join(sep.as_slice()))
    })
}

/// Number of items; sized values report their length without iterating
pub fn count() -> Sink<usize> {
    Sink::new("count", vec![Param::Res], |mut args| match args.res()? {
        Flow::Value(v) if v.len().is_some() => Ok(v.len().unwrap_or(0)),
        other => Ok(other.into_values()?.count()),
    })
}

/// Pull every item, discarding them
pub fn exhaust() -> Sink<()> {
    over_items("exhaust", |items| {
        items.for_each(drop);
        Ok(())
    })
}

pub fn first() -> Sink<Option<Value>> {
    over_items("first", |mut items| Ok(items.next()))
}

/// The item at position `n`, or `default`
pub fn nth(n: usize, default: Option<Value>) -> Sink<Value> {
    Sink::new("nth", vec![Param::Res], move |mut args| {
        let found = match args.res()? {
            Flow::Value(v) if v.is_sequence() => v.get(n),
            other => other.into_values()?.nth(n),
        };
        found
            .or_else(|| default.clone())
            .ok_or_else(|| PipeError::NotFound(format!("Pipe has no item at position {n}")))
    })
}

/// How often each item occurs
pub fn frequencies() -> Sink<BTreeMap<Value, usize>> {
    over_items("frequencies", |items| {
        let mut counts = BTreeMap::new();
        for item in items {
            *counts.entry(item).or_insert(0) += 1;
        }
        Ok(counts)
    })
}

/// Items grouped under their `key`, in encounter order within each group
pub fn groupby<F>(key: F) -> Sink<BTreeMap<Value, Vec<Value>>>
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    over_items("groupby", move |items| {
        let mut groups: BTreeMap<Value, Vec<Value>> = BTreeMap::new();
        for item in items {
            groups.entry(key(&item)).or_default().push(item);
        }
        Ok(groups)
    })
}

/// `(truthy_items, falsy_items)`
pub fn partition() -> Sink<(Vec<Value>, Vec<Value>)> {
    partition_by(Value::is_truthy)
}

/// `(items where pred holds, the rest)`
pub fn partition_by<F>(pred: F) -> Sink<(Vec<Value>, Vec<Value>)>
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    let pred = Arc::new(pred);
    over_items("partition", move |items| Ok(items.partition(|v| pred(v))))
}

/// The items in a new random order
pub fn shuffle() -> Sink<Vec<Value>> {
    Sink::new("shuffle", vec![Param::MutSeq, Param::Rng], |mut args| {
        let mut items = args.mutseq()?;
        args.rng()?.shuffle(&mut items);
        Ok(items)
    })
}

impl Pipe {
    pub fn list(&self) -> PipeResult<Vec<Value>> {
        self.run(&list())
    }

    pub fn tuple(&self) -> PipeResult<Value> {
        self.run(&tuple())
    }

    pub fn set(&self) -> PipeResult<BTreeSet<Value>> {
        self.run(&set())
    }

    pub fn dict(&self) -> PipeResult<BTreeMap<Value, Value>> {
        self.run(&dict())
    }

    pub fn str(&self, sep: &str) -> PipeResult<String> {
        self.run(&str(sep))
    }

    pub fn bytes(&self, sep: &[u8]) -> PipeResult<Vec<u8>> {
        self.run(&bytes(sep))
    }

    pub fn count(&self) -> PipeResult<usize> {
        self.run(&count())
    }

    pub fn exhaust(&self) -> PipeResult<()> {
        self.run(&exhaust())
    }

    pub fn first(&self) -> PipeResult<Option<Value>> {
        self.run(&first())
    }

    pub fn nth(&self, n: usize, default: Option<Value>) -> PipeResult<Value> {
        self.run(&nth(n, default))
    }

    pub fn frequencies(&self) -> PipeResult<BTreeMap<Value, usize>> {
        self.run(&frequencies())
    }

    pub fn groupby<F>(&self, key: F) -> PipeResult<BTreeMap<Value, Vec<Value>>>
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.run(&groupby(key))
    }

    pub fn partition(&self) -> PipeResult<(Vec<Value>, Vec<Value>)> {
        self.run(&partition())
    }

    pub fn partition_by<F>(&self, pred: F) -> PipeResult<(Vec<Value>, Vec<Value>)>
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.run(&partition_by(pred))
    }

    pub fn shuffle(&self) -> PipeResult<Vec<Value>> {
        self.run(&shuffle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotpipe_common::ErrorKind;

    #[test]
    fn test_containers() {
        let p = Pipe::of([2, 1, 2]);
        assert_eq!(p.tuple().unwrap(), Value::tuple([2, 1, 2]));
        assert_eq!(p.set().unwrap(), BTreeSet::from([Value::Int(1), Value::Int(2)]));
        assert_eq!(p.first().unwrap(), Some(Value::Int(2)));
        assert_eq!(Pipe::of("").first().unwrap(), None);
    }

    #[test]
    fn test_dict() {
        let p = Pipe::of(Value::list([Value::pair("a", 1), Value::pair("b", 2)]));
        let map = p.dict().unwrap();
        assert_eq!(map.get(&Value::str("b")), Some(&Value::Int(2)));
        assert_eq!(Pipe::of([1, 2]).dict().unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_str_and_bytes() {
        assert_eq!(Pipe::of("abc").str("-").unwrap(), "a-b-c");
        assert_eq!(Pipe::of([1]).str("").unwrap_err().kind(), ErrorKind::TypeMismatch);
        let chunks = Pipe::of(Value::list([Value::Bytes(b"ab".to_vec()), Value::Bytes(b"c".to_vec())]));
        assert_eq!(chunks.bytes(b", ").unwrap(), b"ab, c".to_vec());
    }

    #[test]
    fn test_count() {
        assert_eq!(Pipe::of("hello").count().unwrap(), 5);
        assert_eq!(Pipe::rangetil(0, Some(4), 1).unwrap().count().unwrap(), 4);
        assert_eq!(Pipe::of([1, 2, 3]).filter(|v| v.as_i64() != Some(2)).count().unwrap(), 2);
    }

    #[test]
    fn test_nth() {
        let p = Pipe::of([5, 6, 7]);
        assert_eq!(p.nth(1, None).unwrap(), Value::Int(6));
        assert_eq!(p.map(|v| v).nth(2, None).unwrap(), Value::Int(7));
        assert_eq!(p.nth(9, Some(Value::Int(0))).unwrap(), Value::Int(0));
        assert_eq!(p.nth(9, None).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_frequencies_and_groupby() {
        let freq = Pipe::of("abca").frequencies().unwrap();
        assert_eq!(freq.get(&Value::str("a")), Some(&2));
        let groups = Pipe::range(1, Some(6), 1)
            .unwrap()
            .groupby(|v| Value::Bool(v.as_i64().unwrap() % 2 == 0))
            .unwrap();
        assert_eq!(groups[&Value::Bool(true)], vec![Value::Int(2), Value::Int(4), Value::Int(6)]);
    }

    #[test]
    fn test_partition() {
        let (yes, no) = Pipe::of([0, 1, 0, 2]).partition().unwrap();
        assert_eq!(yes, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(no.len(), 2);
        let (even, odd) = Pipe::range(1, Some(5), 1)
            .unwrap()
            .partition_by(|v| v.as_i64().unwrap() % 2 == 0)
            .unwrap();
        assert_eq!(even, vec![Value::Int(2), Value::Int(4)]);
        assert_eq!(odd.len(), 3);
    }

    #[test]
    fn test_shuffle_keeps_items() {
        let mut shuffled = Pipe::of("abcdef").seed_rng(Some(9)).shuffle().unwrap();
        shuffled.sort();
        assert_eq!(shuffled, Pipe::of("abcdef").list().unwrap());
    }

    #[test]
    fn test_exhaust_runs_side_effects() {
        let seen = Arc::new(parking_lot::Mutex::new(0));
        let counter = Arc::clone(&seen);
        Pipe::of([1, 2, 3]).tap(move |_| *counter.lock() += 1).exhaust().unwrap();
        assert_eq!(*seen.lock(), 3);
    }
}
