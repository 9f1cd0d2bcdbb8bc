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

//! Mapping-shaped steps

use crate::args::ZipMode;
use crate::pipe::Pipe;
use crate::stage::{Flow, Param, Sink, Stage};
use dotpipe_common::{DROP, KEEP, PipeError, PipeResult, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

type ItemFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// One argument to [`Pipe::remap`]
#[derive(Clone)]
pub enum RemapArg {
    /// Keep every key not otherwise selected or dropped
    KeepRest,
    /// `output[key] = input[key]`
    Key(Value),
    /// `output[key] = input.get(key, default)`
    KeyOr(Value, Value),
    /// Merge the mapping returned for the whole input
    Func(ItemFn),
    /// Per-key rules
    Rules(Vec<(Value, RemapRule)>),
}

/// What [`RemapArg::Rules`] does for one output key
#[derive(Clone)]
pub enum RemapRule {
    /// Leave the key out, even with [`RemapArg::KeepRest`]
    Drop,
    /// Copy the input value under the same key
    Keep,
    /// Copy the input value found under another key
    From(Value),
    /// Like `From`, with a default when the other key is absent
    FromOr(Value, Value),
    /// Transform the input value under this key, or build one from the
    /// whole input when the key is absent; returning `DROP` or `KEEP` acts
    /// like the matching rule
    Func(ItemFn),
}

impl RemapArg {
    pub fn key(key: impl Into<Value>) -> Self {
        RemapArg::Key(key.into())
    }

    pub fn key_or(key: impl Into<Value>, default: impl Into<Value>) -> Self {
        RemapArg::KeyOr(key.into(), default.into())
    }

    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        RemapArg::Func(Arc::new(f))
    }

    pub fn rules<I, K>(rules: I) -> Self
    where
        I: IntoIterator<Item = (K, RemapRule)>,
        K: Into<Value>,
    {
        RemapArg::Rules(rules.into_iter().map(|(k, r)| (k.into(), r)).collect())
    }
}

impl RemapRule {
    pub fn from_key(key: impl Into<Value>) -> Self {
        RemapRule::From(key.into())
    }

    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        RemapRule::Func(Arc::new(f))
    }
}

impl fmt::Debug for RemapArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemapArg::KeepRest => f.write_str("KeepRest"),
            RemapArg::Key(k) => f.debug_tuple("Key").field(k).finish(),
            RemapArg::KeyOr(k, d) => f.debug_tuple("KeyOr").field(k).field(d).finish(),
            RemapArg::Func(_) => f.write_str("Func(..)"),
            RemapArg::Rules(rules) => f.debug_tuple("Rules").field(rules).finish(),
        }
    }
}

impl fmt::Debug for RemapRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemapRule::Drop => f.write_str("Drop"),
            RemapRule::Keep => f.write_str("Keep"),
            RemapRule::From(k) => f.debug_tuple("From").field(k).finish(),
            RemapRule::FromOr(k, d) => f.debug_tuple("FromOr").field(k).field(d).finish(),
            RemapRule::Func(_) => f.write_str("Func(..)"),
        }
    }
}

fn require<'a>(item: &'a BTreeMap<Value, Value>, key: &Value) -> PipeResult<&'a Value> {
    item.get(key)
        .ok_or_else(|| PipeError::NotFound(format!("remap: key {key} not present in input mapping")))
}

struct Remapped<'a> {
    item: &'a BTreeMap<Value, Value>,
    out: BTreeMap<Value, Value>,
    dropped: BTreeSet<Value>,
}

impl Remapped<'_> {
    fn rule(&mut self, key: &Value, rule: &RemapRule) -> PipeResult<()> {
        match rule {
            RemapRule::Drop => {
                self.dropped.insert(key.clone());
            }
            RemapRule::Keep => {
                let v = require(self.item, key)?.clone();
                self.out.insert(key.clone(), v);
            }
            RemapRule::From(src) => {
                let v = require(self.item, src)?.clone();
                self.out.insert(key.clone(), v);
            }
            RemapRule::FromOr(src, default) => {
                let v = self.item.get(src).unwrap_or(default).clone();
                self.out.insert(key.clone(), v);
            }
            RemapRule::Func(f) => match self.item.get(key) {
                Some(current) => match f(current) {
                    v if v.is_sentinel(DROP) => {
                        self.dropped.insert(key.clone());
                    }
                    v if v.is_sentinel(KEEP) => {
                        self.out.insert(key.clone(), current.clone());
                    }
                    v => {
                        self.out.insert(key.clone(), v);
                    }
                },
                None => match f(&Value::Map(self.item.clone())) {
                    v if v.is_sentinel(KEEP) => {
                        return Err(PipeError::type_mismatch(
                            "remap",
                            format!("a value for absent key {key}"),
                            "KEEP",
                        ));
                    }
                    v if v.is_sentinel(DROP) => {}
                    v => {
                        self.out.insert(key.clone(), v);
                    }
                },
            },
        }
        Ok(())
    }
}

fn remap_one(item: Value, args: &[RemapArg]) -> PipeResult<Value> {
    let item = match item {
        Value::Map(item) => item,
        other => {
            return Err(PipeError::type_mismatch(
                "remap",
                "a mapping",
                format!("{} {}", other.type_name(), other),
            ));
        }
    };
    let mut state = Remapped {
        item: &item,
        out: BTreeMap::new(),
        dropped: BTreeSet::new(),
    };
    let mut keep_rest = false;
    for arg in args {
        match arg {
            RemapArg::KeepRest => keep_rest = true,
            RemapArg::Key(key) => {
                let v = require(&item, key)?.clone();
                state.out.insert(key.clone(), v);
            }
            RemapArg::KeyOr(key, default) => {
                let v = item.get(key).unwrap_or(default).clone();
                state.out.insert(key.clone(), v);
            }
            RemapArg::Func(f) => match f(&Value::Map(item.clone())) {
                Value::Map(extra) => state.out.extend(extra),
                other => {
                    return Err(PipeError::type_mismatch(
                        "remap",
                        "a mapping from a remap function",
                        format!("{} {}", other.type_name(), other),
                    ));
                }
            },
            RemapArg::Rules(rules) => {
                for (key, rule) in rules {
                    state.rule(key, rule)?;
                }
            }
        }
    }
    let Remapped { mut out, dropped, .. } = state;
    if keep_rest {
        for (k, v) in &item {
            if !out.contains_key(k) && !dropped.contains(k) {
                out.insert(k.clone(), v.clone());
            }
        }
    }
    Ok(Value::Map(out))
}

impl Pipe {
    /// Mappings rebuilt from each input mapping by `args`
    ///
    /// Keys are dropped unless selected, or unless [`RemapArg::KeepRest`]
    /// is among the arguments. A bad item ends the stream and fails the
    /// sink.
    pub fn remap(&self, args: Vec<RemapArg>) -> Pipe {
        let args: Arc<[RemapArg]> = args.into();
        self.with_checked_step("remap", move |items| {
            let args = Arc::clone(&args);
            items.map(move |item| remap_one(item, &args))
        })
    }

    /// Mappings of `keys` zipped with each item
    pub fn label<I, K>(&self, keys: I, mode: ZipMode) -> Pipe
    where
        I: IntoIterator<Item = K>,
        K: Into<Value>,
    {
        let keys = Value::tuple(keys);
        self.with_checked_step("label", move |items| {
            let keys = keys.clone();
            let mode = mode.clone();
            items.map(move |item| {
                Pipe::zip_of(vec![keys.clone(), item], mode.clone())
                    .dict()
                    .map(Value::Map)
            })
        })
    }

    /// The single result of running `sink` over the items so far
    pub fn sponge<T>(&self, sink: Sink<T>) -> Pipe
    where
        T: Into<Value> + 'static,
    {
        self.with_step(Stage::new("sponge", vec![Param::Pipe, Param::Rng], move |mut args| {
            let upstream = args.pipe()?.set_rng(args.rng()?);
            let result = upstream.run(&sink)?;
            Ok(Flow::Value(Value::List(vec![result.into()])))
        }))
    }
}
