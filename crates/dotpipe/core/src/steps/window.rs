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

//! Windowing and grouping steps

use super::PredFn;
use crate::args::{ChunkTail, check_positive, check_positive_or_none};
use crate::pipe::Pipe;
use crate::stage::{Flow, Param, Stage};
use dotpipe_common::{END, PipeResult, Value, ValueIter};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

/// A rule that starts a new group in [`Pipe::split`]
#[derive(Clone)]
pub enum SplitOn {
    /// Before the items at these positions
    Index(BTreeSet<usize>),
    /// Before each item whose position satisfies the predicate
    IndexWhere(Arc<dyn Fn(usize) -> bool + Send + Sync>),
    /// Before each item equal to one of these values
    Value(BTreeSet<Value>),
    /// Before each item satisfying the predicate
    ValueWhere(PredFn),
}

impl SplitOn {
    pub fn index(i: usize) -> Self {
        SplitOn::Index(BTreeSet::from([i]))
    }

    pub fn value(v: impl Into<Value>) -> Self {
        SplitOn::Value(BTreeSet::from([v.into()]))
    }

    fn matches(&self, i: usize, v: &Value) -> bool {
        match self {
            SplitOn::Index(set) => set.contains(&i),
            SplitOn::IndexWhere(pred) => pred(i),
            SplitOn::Value(set) => set.contains(v),
            SplitOn::ValueWhere(pred) => pred(v),
        }
    }
}

impl std::fmt::Debug for SplitOn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitOn::Index(set) => f.debug_tuple("Index").field(set).finish(),
            SplitOn::IndexWhere(_) => f.write_str("IndexWhere(..)"),
            SplitOn::Value(set) => f.debug_tuple("Value").field(set).finish(),
            SplitOn::ValueWhere(_) => f.write_str("ValueWhere(..)"),
        }
    }
}

/// Size-`n` tuples taken every `step` items
struct Chunks {
    items: ValueIter,
    window: VecDeque<Value>,
    n: usize,
    step: usize,
    tail: ChunkTail,
    finished: bool,
}

impl Chunks {
    fn tail(&mut self) -> Option<Value> {
        self.finished = true;
        let len = self.window.len();
        if len == 0 || len >= self.n {
            return None;
        }
        match &self.tail {
            ChunkTail::Drop => None,
            ChunkTail::Keep => Some(Value::Tuple(self.window.drain(..).collect())),
            ChunkTail::Fill(fill) => {
                let mut chunk: Vec<Value> = self.window.drain(..).collect();
                chunk.resize(self.n, fill.clone());
                Some(Value::Tuple(chunk))
            }
        }
    }
}

impl Iterator for Chunks {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if self.finished {
            return None;
        }
        loop {
            let Some(item) = self.items.next() else {
                return self.tail();
            };
            if self.window.len() == self.n {
                self.window.pop_front();
            }
            self.window.push_back(item);
            if self.window.len() < self.n {
                continue;
            }
            let chunk = Value::Tuple(self.window.iter().cloned().collect());
            if self.step > 1 {
                for _ in 0..self.step {
                    if self.window.pop_front().is_none() && self.items.next().is_none() {
                        self.finished = true;
                        break;
                    }
                }
            }
            return Some(chunk);
        }
    }
}

impl Pipe {
    /// Tuples of `n` items, each starting `step` items (default `n`) after
    /// the previous one
    pub fn chunk(&self, n: usize, step: Option<usize>, tail: ChunkTail) -> PipeResult<Pipe> {
        let n = check_positive("chunk", "n", n)?;
        let step = check_positive("chunk", "step", step.unwrap_or(n))?;
        Ok(self.with_iter_step("chunk", move |items| Chunks {
            items,
            window: VecDeque::with_capacity(n),
            n,
            step,
            tail: tail.clone(),
            finished: false,
        }))
    }

    /// Tuples of adjacent items sharing the same `key`
    pub fn chunkby<F>(&self, key: F) -> Pipe
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let key = Arc::new(key);
        self.with_iter_step("chunkby", move |items| {
            let key = Arc::clone(&key);
            let mut items = items.peekable();
            std::iter::from_fn(move || {
                let first = items.next()?;
                let k = key(&first);
                let mut group = vec![first];
                while let Some(item) = items.next_if(|v| key(v) == k) {
                    group.push(item);
                }
                Some(Value::Tuple(group))
            })
        })
    }

    /// Spans of `n` items with `sep` between them; a short final span is
    /// padded with `fill` when given
    pub fn intersperse(&self, sep: impl Into<Value>, n: usize, fill: Option<Value>) -> PipeResult<Pipe> {
        let n = check_positive("intersperse", "n", n)?;
        let sep = sep.into();
        Ok(self.with_iter_step("intersperse", move |mut items| {
            let sep = sep.clone();
            let fill = fill.clone();
            let mut out: VecDeque<Value> = items.by_ref().take(n).collect();
            let mut done = false;
            std::iter::from_fn(move || loop {
                if let Some(v) = out.pop_front() {
                    return Some(v);
                }
                if done {
                    return None;
                }
                let span: Vec<Value> = items.by_ref().take(n).collect();
                if span.is_empty() {
                    done = true;
                    continue;
                }
                let short = span.len() < n;
                out.push_back(sep.clone());
                out.extend(span);
                if short {
                    done = true;
                    if let Some(fill) = &fill {
                        while out.len() < n + 1 {
                            out.push_back(fill.clone());
                        }
                    }
                }
            })
        }))
    }

    /// `(item, next_item)` pairs; the last item is paired with `END`
    pub fn peek(&self) -> Pipe {
        self.with_step(Stage::new("peek", vec![Param::Ix], |mut args| {
            let mut items = args.ix()?.peekable();
            Ok(Flow::iter(std::iter::from_fn(move || {
                let item = items.next()?;
                let next = items.peek().cloned().unwrap_or(Value::Sentinel(END));
                Some(Value::pair(item, next))
            })))
        }))
    }

    /// `(info, item)` pairs where `info` maps `index`, `is_first` and
    /// `is_last`
    pub fn enumerate_info(&self, start: i64) -> Pipe {
        self.with_step(Stage::new("enumerate_info", vec![Param::Pipe], move |mut args| {
            let fault = args.fault();
            let pairs = args.pipe()?.peek().iter_in(&fault)?;
            Ok(Flow::iter(pairs.enumerate().map(move |(i, pair)| {
                let (item, next) = split_pair(pair);
                let info: BTreeMap<Value, Value> = [
                    ("index", Value::Int(start.saturating_add(i as i64))),
                    ("is_first", Value::Bool(i == 0)),
                    ("is_last", Value::Bool(next.is_sentinel(END))),
                ]
                .into_iter()
                .map(|(k, v)| (Value::str(k), v))
                .collect();
                Value::pair(Value::Map(info), item)
            })))
        }))
    }

    /// Lists of items, a new list starting before each item matching any
    /// of `rules`
    pub fn split<I>(&self, rules: I) -> Pipe
    where
        I: IntoIterator<Item = SplitOn>,
    {
        let rules: Arc<[SplitOn]> = rules.into_iter().collect();
        self.with_iter_step("split", move |items| {
            let rules = Arc::clone(&rules);
            let mut items = items.enumerate().peekable();
            std::iter::from_fn(move || {
                let (_, first) = items.next()?;
                let mut group = vec![first];
                while let Some((_, item)) = items.next_if(|(i, v)| !rules.iter().any(|r| r.matches(*i, v))) {
                    group.push(item);
                }
                Some(Value::List(group))
            })
        })
    }

    /// Items, skipping consecutive duplicates
    pub fn depeat(&self) -> Pipe {
        self.depeat_by(Value::clone)
    }

    /// Items, skipping consecutive items with the same `key`
    pub fn depeat_by<F>(&self, key: F) -> Pipe
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let key = Arc::new(key);
        self.with_iter_step("depeat", move |items| {
            let key = Arc::clone(&key);
            let mut last: Option<Value> = None;
            items.filter(move |v| {
                let k = key(v);
                if last.as_ref() == Some(&k) {
                    false
                } else {
                    last = Some(k);
                    true
                }
            })
        })
    }

    /// Items not seen before
    pub fn unique(&self) -> Pipe {
        self.unique_by(Value::clone)
    }

    /// Items whose `key` has not been seen before
    pub fn unique_by<F>(&self, key: F) -> Pipe
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let key = Arc::new(key);
        self.with_iter_step("unique", move |items| {
            let key = Arc::clone(&key);
            let mut seen = BTreeSet::new();
            items.filter(move |v| seen.insert(key(v)))
        })
    }

    /// The items in a loop, forever or `n` times
    pub fn cycle(&self, n: Option<usize>) -> PipeResult<Pipe> {
        let n = check_positive_or_none("cycle", "n", n)?;
        Ok(self.with_iter_step("cycle", move |items| Cycle {
            items: Some(items),
            cache: Vec::new(),
            pos: 0,
            passes: n.map(|n| n - 1),
        }))
    }
}

fn split_pair(pair: Value) -> (Value, Value) {
    match pair {
        Value::Tuple(mut items) if items.len() == 2 => {
            let next = items.pop().unwrap_or(Value::None);
            let item = items.pop().unwrap_or(Value::None);
            (item, next)
        }
        other => (other, Value::Sentinel(END)),
    }
}

struct Cycle {
    items: Option<ValueIter>,
    cache: Vec<Value>,
    pos: usize,
    /// Replays left after the first pass; `None` for forever
    passes: Option<usize>,
}

impl Iterator for Cycle {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if let Some(items) = &mut self.items {
            if let Some(item) = items.next() {
                self.cache.push(item.clone());
                return Some(item);
            }
            self.items = None;
            self.pos = self.cache.len();
        }
        if self.cache.is_empty() {
            return None;
        }
        if self.pos == self.cache.len() {
            match &mut self.passes {
                Some(0) => return None,
                Some(left) => *left -= 1,
                None => {}
            }
            self.pos = 0;
        }
        let item = self.cache[self.pos].clone();
        self.pos += 1;
        Some(item)
    }
}
