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

//! Recursive mapping merge

use super::over_items;
use crate::pipe::Pipe;
use crate::stage::Sink;
use dotpipe_common::{PipeError, PipeResult, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// How a sequence meets an existing sequence at the same path
#[derive(Clone, Default)]
pub enum MergeMode {
    /// The new sequence wins
    #[default]
    Replace,
    /// The old sequence stays
    Keep,
    ExtendOldNew,
    ExtendNewOld,
    /// The new sequence, followed by whatever of the old one extends past it
    OverlayOldNew,
    /// The old sequence, followed by whatever of the new one extends past it
    OverlayNewOld,
    /// `f(old, new)`
    Custom(Arc<dyn Fn(Value, Value) -> Value + Send + Sync>),
}

impl fmt::Debug for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::Replace => write!(f, "Replace"),
            MergeMode::Keep => write!(f, "Keep"),
            MergeMode::ExtendOldNew => write!(f, "ExtendOldNew"),
            MergeMode::ExtendNewOld => write!(f, "ExtendNewOld"),
            MergeMode::OverlayOldNew => write!(f, "OverlayOldNew"),
            MergeMode::OverlayNewOld => write!(f, "OverlayNewOld"),
            MergeMode::Custom(_) => write!(f, "Custom(<fn>)"),
        }
    }
}

fn sequence_items(v: Value) -> (bool, Vec<Value>) {
    match v {
        Value::Tuple(items) => (true, items),
        Value::List(items) => (false, items),
        other => (false, vec![other]),
    }
}

/// Joins `head` with the part of `tail` past `head`'s length, keeping the
/// container kind of `head`
fn overlay(head: Value, tail: Value) -> Value {
    let (is_tuple, mut items) = sequence_items(head);
    let (_, rest) = sequence_items(tail);
    items.extend(rest.into_iter().skip(items.len()));
    if is_tuple { Value::Tuple(items) } else { Value::List(items) }
}

fn concat(head: Value, tail: Value) -> Value {
    let (is_tuple, mut items) = sequence_items(head);
    items.extend(sequence_items(tail).1);
    if is_tuple { Value::Tuple(items) } else { Value::List(items) }
}

fn merge_sequences(old: Value, new: Value, mode: &MergeMode) -> Value {
    match mode {
        MergeMode::Replace => new,
        MergeMode::Keep => old,
        MergeMode::ExtendOldNew => concat(old, new),
        MergeMode::ExtendNewOld => concat(new, old),
        MergeMode::OverlayOldNew => overlay(new, old),
        MergeMode::OverlayNewOld => overlay(old, new),
        MergeMode::Custom(f) => f(old, new),
    }
}

fn merge_into(target: &mut BTreeMap<Value, Value>, incoming: BTreeMap<Value, Value>, mode: &MergeMode) {
    for (key, new) in incoming {
        let merged = match (target.remove(&key), new) {
            (Some(Value::Map(mut old)), Value::Map(new)) => {
                merge_into(&mut old, new, mode);
                Value::Map(old)
            }
            (Some(old @ (Value::List(_) | Value::Tuple(_))), new @ (Value::List(_) | Value::Tuple(_))) => {
                merge_sequences(old, new, mode)
            }
            (_, new) => new,
        };
        target.insert(key, merged);
    }
}

/// One mapping merged from every mapping item, later items winning
pub fn merge(mode: MergeMode) -> Sink<BTreeMap<Value, Value>> {
    over_items("merge", move |items| {
        let mut out = BTreeMap::new();
        for item in items {
            match item {
                Value::Map(map) => merge_into(&mut out, map, &mode),
                other => {
                    return Err(PipeError::type_mismatch(
                        "merge",
                        "a mapping",
                        format!("{} {}", other.type_name(), other),
                    ));
                }
            }
        }
        Ok(out)
    })
}

impl Pipe {
    pub fn merge(&self, mode: MergeMode) -> PipeResult<BTreeMap<Value, Value>> {
        self.run(&merge(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotpipe_common::ErrorKind;

    fn map<const N: usize>(entries: [(&str, Value); N]) -> Value {
        Value::Map(entries.into_iter().map(|(k, v)| (Value::str(k), v)).collect())
    }

    fn merged_seq(mode: MergeMode) -> Value {
        let a = map([("s", Value::list([1, 2, 3]))]);
        let b = map([("s", Value::list([7, 8]))]);
        let out = Pipe::of(Value::list([a, b])).merge(mode).unwrap();
        out[&Value::str("s")].clone()
    }

    #[test]
    fn test_merge_overwrites_keys() {
        let a = map([("a", Value::Int(1)), ("b", Value::Int(2))]);
        let b = map([("b", Value::Int(3)), ("c", Value::Int(4))]);
        let out = Pipe::of(Value::list([a, b])).merge(MergeMode::default()).unwrap();
        assert_eq!(Value::Map(out), map([("a", Value::Int(1)), ("b", Value::Int(3)), ("c", Value::Int(4))]));
    }

    #[test]
    fn test_merge_is_recursive() {
        let a = map([("n", map([("x", Value::Int(1)), ("y", Value::Int(2))]))]);
        let b = map([("n", map([("y", Value::Int(5))]))]);
        let out = Pipe::of(Value::list([a, b])).merge(MergeMode::Replace).unwrap();
        assert_eq!(out[&Value::str("n")], map([("x", Value::Int(1)), ("y", Value::Int(5))]));
    }

    #[test]
    fn test_non_mapping_replaces_mapping() {
        let a = map([("n", map([("x", Value::Int(1))]))]);
        let b = map([("n", Value::Int(0))]);
        let c = map([("n", map([("z", Value::Int(2))]))]);
        let out = Pipe::of(Value::list([a.clone(), b])).merge(MergeMode::Replace).unwrap();
        assert_eq!(out[&Value::str("n")], Value::Int(0));
        let out = Pipe::of(Value::list([a, map([("n", Value::Int(0))]), c.clone()]))
            .merge(MergeMode::Replace)
            .unwrap();
        assert_eq!(Value::Map(out), c);
    }

    #[test]
    fn test_sequence_modes() {
        assert_eq!(merged_seq(MergeMode::Replace), Value::list([7, 8]));
        assert_eq!(merged_seq(MergeMode::Keep), Value::list([1, 2, 3]));
        assert_eq!(merged_seq(MergeMode::ExtendOldNew), Value::list([1, 2, 3, 7, 8]));
        assert_eq!(merged_seq(MergeMode::ExtendNewOld), Value::list([7, 8, 1, 2, 3]));
        assert_eq!(merged_seq(MergeMode::OverlayOldNew), Value::list([7, 8, 3]));
        assert_eq!(merged_seq(MergeMode::OverlayNewOld), Value::list([1, 2, 3]));
        let longest = MergeMode::Custom(Arc::new(|old, new| {
            if old.len() >= new.len() { old } else { new }
        }));
        assert_eq!(merged_seq(longest), Value::list([1, 2, 3]));
    }

    #[test]
    fn test_merge_rejects_non_mappings() {
        let err = Pipe::of([1, 2]).merge(MergeMode::Keep).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }
}
