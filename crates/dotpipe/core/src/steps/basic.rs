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

//! Per-item steps

use super::{MapFn, spread};
use crate::args::SliceSpec;
use crate::pipe::Pipe;
use crate::stage::{Flow, Param, Stage};
use dotpipe_common::{PipeError, PipeResult, Value, ValueIter};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

impl Pipe {
    /// Append a stage that rewrites the running items lazily
    pub(crate) fn with_iter_step<F, I>(&self, name: &str, f: F) -> Pipe
    where
        F: Fn(ValueIter) -> I + Send + Sync + 'static,
        I: Iterator<Item = Value> + Send + 'static,
    {
        self.with_step(Stage::new(name, vec![Param::Res], move |mut args| {
            let items = args.res()?.into_values()?;
            Ok(Flow::iter(f(items)))
        }))
    }

    /// Append a stage that rewrites the running items lazily with a
    /// per-item step that can fail; the first failure ends the stream and
    /// is reported by the sink
    pub(crate) fn with_checked_step<F, I>(&self, name: &str, f: F) -> Pipe
    where
        F: Fn(ValueIter) -> I + Send + Sync + 'static,
        I: Iterator<Item = PipeResult<Value>> + Send + 'static,
    {
        self.with_step(Stage::new(name, vec![Param::Res], move |mut args| {
            let fault = args.fault();
            let items = args.res()?.into_values()?;
            Ok(Flow::iter(fault.guard(f(items))))
        }))
    }

    /// Each item mapped through `func`
    pub fn map<F>(&self, func: F) -> Pipe
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        let func = Arc::new(func);
        self.with_iter_step("map", move |items| {
            let func = Arc::clone(&func);
            items.map(move |v| func(v))
        })
    }

    /// `func(*item)` for each item
    pub fn starmap<F>(&self, func: F) -> Pipe
    where
        F: Fn(Vec<Value>) -> Value + Send + Sync + 'static,
    {
        let func = Arc::new(func);
        self.with_iter_step("starmap", move |items| {
            let func = Arc::clone(&func);
            items.map(move |v| func(spread(v).collect()))
        })
    }

    /// Items for which `pred` holds
    pub fn filter<F>(&self, pred: F) -> Pipe
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let pred = Arc::new(pred);
        self.with_iter_step("filter", move |items| {
            let pred = Arc::clone(&pred);
            items.filter(move |v| pred(v))
        })
    }

    /// Items for which `pred` does not hold
    pub fn reject<F>(&self, pred: F) -> Pipe
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let pred = Arc::new(pred);
        self.with_iter_step("reject", move |items| {
            let pred = Arc::clone(&pred);
            items.filter(move |v| !pred(v))
        })
    }

    pub fn take(&self, n: usize) -> Pipe {
        self.with_iter_step("take", move |items| items.take(n))
    }

    pub fn drop(&self, n: usize) -> Pipe {
        self.with_iter_step("drop", move |items| items.skip(n))
    }

    /// Items `start..stop` by `step`
    pub fn slice(&self, spec: SliceSpec) -> Pipe {
        let SliceSpec { start, stop, step } = spec;
        self.with_iter_step("slice", move |items| {
            items
                .take(stop.unwrap_or(usize::MAX))
                .skip(start)
                .step_by(step.max(1))
        })
    }

    /// Items up to the first one failing `pred`
    pub fn takewhile<F>(&self, pred: F) -> Pipe
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let pred = Arc::new(pred);
        self.with_iter_step("takewhile", move |items| {
            let pred = Arc::clone(&pred);
            items.take_while(move |v| pred(v))
        })
    }

    /// Items from the first one failing `pred` onwards
    pub fn dropwhile<F>(&self, pred: F) -> Pipe
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let pred = Arc::new(pred);
        self.with_iter_step("dropwhile", move |items| {
            let pred = Arc::clone(&pred);
            items.skip_while(move |v| pred(v))
        })
    }

    /// Call `func` on each item as it passes
    pub fn tap<F>(&self, func: F) -> Pipe
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let func = Arc::new(func);
        self.with_iter_step("tap", move |items| {
            let func = Arc::clone(&func);
            items.inspect(move |v| func(v))
        })
    }

    /// Log each item under the `dotpipe::debug` target
    pub fn debug(&self) -> Pipe {
        self.debug_with(|v| v.to_string())
    }

    /// Log `fmt(item)` for each item under the `dotpipe::debug` target
    pub fn debug_with<F>(&self, fmt: F) -> Pipe
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        let fmt = Arc::new(fmt);
        self.with_iter_step("debug", move |items| {
            let fmt = Arc::clone(&fmt);
            items.inspect(move |v| info!(target: "dotpipe::debug", "{}", fmt(v)))
        })
    }

    /// `(index, item)` pairs, counting from `start`
    pub fn enumerate(&self, start: i64) -> Pipe {
        self.with_iter_step("enumerate", move |items| {
            items
                .enumerate()
                .map(move |(i, v)| Value::pair(start.saturating_add(i as i64), v))
        })
    }

    /// Running results of `func(acc, item)`, starting with `initial` when
    /// given
    pub fn scan<F>(&self, func: F, initial: Option<Value>) -> Pipe
    where
        F: Fn(Value, Value) -> Value + Send + Sync + 'static,
    {
        let func = Arc::new(func);
        self.with_iter_step("scan", move |mut items| {
            let func = Arc::clone(&func);
            let mut head = initial.clone();
            let mut acc: Option<Value> = None;
            std::iter::from_fn(move || {
                if let Some(first) = head.take() {
                    acc = Some(first.clone());
                    return Some(first);
                }
                let item = items.next()?;
                let next = match acc.take() {
                    Some(prev) => func(prev, item),
                    None => item,
                };
                acc = Some(next.clone());
                Some(next)
            })
        })
    }

    /// The items, then `extra`
    pub fn append<I, T>(&self, extra: I) -> Pipe
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let extra: Vec<Value> = extra.into_iter().map(Into::into).collect();
        self.with_iter_step("append", move |items| items.chain(extra.clone()))
    }

    /// `extra`, then the items
    pub fn prepend<I, T>(&self, extra: I) -> Pipe
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let extra: Vec<Value> = extra.into_iter().map(Into::into).collect();
        self.with_iter_step("prepend", move |items| extra.clone().into_iter().chain(items))
    }

    /// The items, then the items of each of `iterables`
    pub fn concat<I, T>(&self, iterables: I) -> PipeResult<Pipe>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let extra = flatten_iterables("concat", iterables)?;
        Ok(self.with_iter_step("concat", move |items| items.chain(extra.clone())))
    }

    /// The items of each of `iterables`, then the items
    pub fn precat<I, T>(&self, iterables: I) -> PipeResult<Pipe>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let extra = flatten_iterables("precat", iterables)?;
        Ok(self.with_iter_step("precat", move |items| extra.clone().into_iter().chain(items)))
    }

    /// Each item repeated `n` times in a tuple
    pub fn broadcast(&self, n: usize) -> Pipe {
        self.with_iter_step("broadcast", move |items| items.map(move |v| Value::Tuple(vec![v; n])))
    }

    /// A tuple of each of `funcs` applied to each item
    pub fn broadmap(&self, funcs: Vec<MapFn>) -> Pipe {
        let funcs: Arc<[MapFn]> = funcs.into();
        self.with_iter_step("broadmap", move |items| {
            let funcs = Arc::clone(&funcs);
            items.map(move |v| Value::Tuple(funcs.iter().map(|f| f(v.clone())).collect()))
        })
    }

    /// A map of each template key to its function applied to the item
    pub fn dictmap<I, K>(&self, template: I) -> Pipe
    where
        I: IntoIterator<Item = (K, MapFn)>,
        K: Into<Value>,
    {
        let template: Arc<[(Value, MapFn)]> = template.into_iter().map(|(k, f)| (k.into(), f)).collect();
        self.with_iter_step("dictmap", move |items| {
            let template = Arc::clone(&template);
            items.map(move |v| {
                let entries: BTreeMap<Value, Value> =
                    template.iter().map(|(k, f)| (k.clone(), f(v.clone()))).collect();
                Value::Map(entries)
            })
        })
    }
}

fn flatten_iterables<I, T>(op: &str, iterables: I) -> PipeResult<Vec<Value>>
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    let mut out = Vec::new();
    for iterable in iterables {
        let iterable = iterable.into();
        let found = format!("non-iterable {} {}", iterable.type_name(), iterable);
        out.extend(
            iterable
                .into_items()
                .ok_or_else(|| PipeError::type_mismatch(op, "an iterable", found))?,
        );
    }
    Ok(out)
}
