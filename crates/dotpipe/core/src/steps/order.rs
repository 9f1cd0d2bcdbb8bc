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

//! Reordering and reshaping steps

use crate::args::check_positive_or_none;
use crate::pipe::Pipe;
use crate::stage::{Flow, Param, Stage};
use dotpipe_common::{PipeError, PipeResult, Value, ValueIter};

impl Pipe {
    /// The items sorted; equal items keep their relative order
    pub fn sort(&self, reverse: bool) -> Pipe {
        self.with_step(Stage::new("sort", vec![Param::MutSeq], move |mut args| {
            let mut items = args.mutseq()?;
            if reverse {
                items.sort_by(|a, b| b.cmp(a));
            } else {
                items.sort();
            }
            Ok(Flow::Value(Value::List(items)))
        }))
    }

    /// The items sorted by `key`
    pub fn sort_by_key<F>(&self, key: F, reverse: bool) -> Pipe
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.with_step(Stage::new("sort", vec![Param::MutSeq], move |mut args| {
            let items = args.mutseq()?;
            let mut keyed: Vec<(Value, Value)> = items.into_iter().map(|v| (key(&v), v)).collect();
            if reverse {
                keyed.sort_by(|a, b| b.0.cmp(&a.0));
            } else {
                keyed.sort_by(|a, b| a.0.cmp(&b.0));
            }
            Ok(Flow::Value(Value::List(keyed.into_iter().map(|(_, v)| v).collect())))
        }))
    }

    /// The items in reverse order
    pub fn reverse(&self) -> Pipe {
        self.with_step(Stage::new("reverse", vec![Param::Seq], |mut args| {
            let items = args.seq()?.into_vec();
            Ok(Flow::iter(items.into_iter().rev()))
        }))
    }

    /// Items from within nested lists and tuples, `levels` deep or all the
    /// way down
    pub fn flatten(&self, levels: Option<usize>) -> PipeResult<Pipe> {
        let levels = check_positive_or_none("flatten", "levels", levels)?;
        Ok(self.with_iter_step("flatten", move |items| Flatten {
            stack: vec![items],
            levels,
        }))
    }

    /// Items clamped between `min` and `max`
    pub fn clamp(&self, min: Option<Value>, max: Option<Value>) -> PipeResult<Pipe> {
        if min.is_none() && max.is_none() {
            return Err(PipeError::argument("clamp", "at least one of 'min' or 'max' must be specified"));
        }
        Ok(self.with_iter_step("clamp", move |items| {
            let (min, max) = (min.clone(), max.clone());
            items.map(move |v| {
                let v = match &min {
                    Some(lo) if v < *lo => lo.clone(),
                    _ => v,
                };
                match &max {
                    Some(hi) if v > *hi => hi.clone(),
                    _ => v,
                }
            })
        }))
    }
}

struct Flatten {
    stack: Vec<ValueIter>,
    levels: Option<usize>,
}

impl Iterator for Flatten {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        loop {
            let depth = self.stack.len();
            let item = match self.stack.last_mut()?.next() {
                Some(item) => item,
                None => {
                    self.stack.pop();
                    continue;
                }
            };
            let can_descend = self.levels.is_none_or(|max| depth <= max);
            match item {
                Value::List(inner) | Value::Tuple(inner) if can_descend => {
                    self.stack.push(Box::new(inner.into_iter()));
                }
                other => return Some(other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(xs: &[i64]) -> Vec<Value> {
        xs.iter().copied().map(Value::Int).collect()
    }

    fn nested() -> Value {
        Value::list([
            Value::str("a"),
            Value::list([
                Value::str("b"),
                Value::list([Value::str("c"), Value::list([Value::str("d"), Value::list(["e"])])]),
            ]),
        ])
    }

    #[test]
    fn test_sort() {
        let p = Pipe::of([3, 1, 2]);
        assert_eq!(p.sort(false).list().unwrap(), ints(&[1, 2, 3]));
        assert_eq!(p.sort(true).list().unwrap(), ints(&[3, 2, 1]));
    }

    #[test]
    fn test_sort_by_key_is_stable() {
        let words = Pipe::of(Value::list(["bb", "a", "cc", "d"]));
        let by_len = words.sort_by_key(|v| Value::from(v.len().unwrap_or(0)), false);
        assert_eq!(by_len.list().unwrap(), Value::list(["a", "d", "bb", "cc"]).to_items().unwrap());
        let by_len_desc = words.sort_by_key(|v| Value::from(v.len().unwrap_or(0)), true);
        assert_eq!(by_len_desc.list().unwrap(), Value::list(["bb", "cc", "a", "d"]).to_items().unwrap());
    }

    #[test]
    fn test_reverse() {
        assert_eq!(Pipe::of([1, 2, 3]).reverse().list().unwrap(), ints(&[3, 2, 1]));
        assert_eq!(
            Pipe::of([1, 2, 3]).map(|v| v).reverse().list().unwrap(),
            ints(&[3, 2, 1])
        );
    }

    #[test]
    fn test_flatten_all_levels() {
        let flat = Pipe::of(nested()).flatten(None).unwrap().list().unwrap();
        assert_eq!(flat, Value::list(["a", "b", "c", "d", "e"]).to_items().unwrap());
    }

    #[test]
    fn test_flatten_levels() {
        let one = Pipe::of(nested()).flatten(Some(1)).unwrap().list().unwrap();
        assert_eq!(one.len(), 3);
        assert_eq!(one[1], Value::str("b"));
        assert!(matches!(one[2], Value::List(_)));

        let two = Pipe::of(nested()).flatten(Some(2)).unwrap().list().unwrap();
        assert_eq!(two[..3], Value::list(["a", "b", "c"]).to_items().unwrap()[..]);
        assert_eq!(two.len(), 4);
    }

    #[test]
    fn test_flatten_keeps_strings_whole() {
        let flat = Pipe::of(Value::list([Value::str("ab"), Value::list(["cd"])]))
            .flatten(None)
            .unwrap()
            .list()
            .unwrap();
        assert_eq!(flat, vec![Value::str("ab"), Value::str("cd")]);
        assert!(Pipe::new().flatten(Some(0)).is_err());
    }

    #[test]
    fn test_clamp() {
        let p = Pipe::range(1, Some(10), 1).unwrap();
        let both = p.clamp(Some(Value::Int(3)), Some(Value::Int(7))).unwrap();
        assert_eq!(both.list().unwrap(), ints(&[3, 3, 3, 4, 5, 6, 7, 7, 7, 7]));
        let lower = p.clamp(Some(Value::Int(3)), None).unwrap();
        assert_eq!(lower.list().unwrap(), ints(&[3, 3, 3, 4, 5, 6, 7, 8, 9, 10]));
        let upper = p.clamp(None, Some(Value::Int(7))).unwrap();
        assert_eq!(upper.list().unwrap(), ints(&[1, 2, 3, 4, 5, 6, 7, 7, 7, 7]));
        assert!(p.clamp(None, None).is_err());
    }
}
