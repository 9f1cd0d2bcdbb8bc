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

//! Argument Resolver
//!
//! Builds the argument list for a stage from its declared [`Param`] tags and
//! the running result. Source stages run with no prior result and may only
//! ask for `cls` and `rng`.

use crate::pipe::Pipe;
use crate::rng::RngHandle;
use crate::stage::{Flow, Param, Stage};
use dotpipe_common::{PipeError, PipeResult, Value, ValueIter};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{trace, warn};

/// Handle to the pipe type, injected for stages that build sub-pipes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipeClass;

impl PipeClass {
    /// A fresh pipe with no source
    pub fn new(&self) -> Pipe {
        Pipe::new()
    }

    /// A fresh pipe bound to `source`
    pub fn of(&self, source: impl Into<Value>) -> Pipe {
        Pipe::of(source)
    }
}

/// An indexable, sized view of the running result
#[derive(Debug, Clone)]
pub enum Sequence {
    /// The result was already a sequence and is passed unchanged
    Value(Value),
    /// The result was materialized into a list
    Items(Vec<Value>),
}

impl Sequence {
    pub fn len(&self) -> usize {
        match self {
            Sequence::Value(v) => v.len().unwrap_or(0),
            Sequence::Items(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            Sequence::Value(v) => v.get(index),
            Sequence::Items(items) => items.get(index).cloned(),
        }
    }

    /// Clone the items into a vector
    pub fn to_vec(&self) -> Vec<Value> {
        match self {
            Sequence::Value(v) => v.to_items().unwrap_or_default(),
            Sequence::Items(items) => items.clone(),
        }
    }

    pub fn into_vec(self) -> Vec<Value> {
        match self {
            Sequence::Value(v) => v.into_items().map(Iterator::collect).unwrap_or_default(),
            Sequence::Items(items) => items,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

/// The first per-item failure of one evaluation
///
/// Items are plain values, so lazy stages whose per-item work can fail end
/// their stream early and record the error here. Sinks report it once they
/// return.
#[derive(Debug, Clone, Default)]
pub struct Fault(Arc<Mutex<Option<PipeError>>>);

impl Fault {
    /// Keep `err` unless an earlier failure is already recorded
    pub fn record(&self, err: PipeError) {
        let mut slot = self.0.lock();
        match slot.as_ref() {
            Some(first) => warn!(first = %first, dropped = %err, "later item failure ignored"),
            None => *slot = Some(err),
        }
    }

    pub fn is_set(&self) -> bool {
        self.0.lock().is_some()
    }

    /// Take the recorded failure, if any
    pub fn check(&self) -> PipeResult<()> {
        match self.0.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// The successful items of `items`, ending at the first failure
    pub fn guard<I>(&self, items: I) -> Guarded<I>
    where
        I: Iterator<Item = PipeResult<Value>>,
    {
        Guarded {
            items,
            fault: self.clone(),
            done: false,
        }
    }
}

/// Iterator returned by [`Fault::guard`]
pub struct Guarded<I> {
    items: I,
    fault: Fault,
    done: bool,
}

impl<I> Iterator for Guarded<I>
where
    I: Iterator<Item = PipeResult<Value>>,
{
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if self.done {
            return None;
        }
        match self.items.next() {
            Some(Ok(item)) => Some(item),
            Some(Err(err)) => {
                self.done = true;
                self.fault.record(err);
                None
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// A single resolved argument
pub enum Injected {
    Res(Flow),
    Ix(ValueIter),
    Seq(Sequence),
    MutSeq(Vec<Value>),
    Pipe(Pipe),
    Cls(PipeClass),
    Rng(RngHandle),
}

impl Injected {
    fn param(&self) -> Param {
        match self {
            Injected::Res(_) => Param::Res,
            Injected::Ix(_) => Param::Ix,
            Injected::Seq(_) => Param::Seq,
            Injected::MutSeq(_) => Param::MutSeq,
            Injected::Pipe(_) => Param::Pipe,
            Injected::Cls(_) => Param::Cls,
            Injected::Rng(_) => Param::Rng,
        }
    }
}

/// Resolved arguments, consumed positionally by the stage
pub struct Args {
    stage: String,
    position: usize,
    values: VecDeque<Injected>,
    fault: Fault,
    max_materialize: Option<usize>,
}

macro_rules! accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&mut self) -> PipeResult<$ty> {
            match self.next_arg(Param::$variant)? {
                Injected::$variant(v) => Ok(v),
                other => Err(self.mismatch(other.param(), Param::$variant)),
            }
        }
    };
}

impl Args {
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// The failure slot of the running evaluation
    pub fn fault(&self) -> Fault {
        self.fault.clone()
    }

    /// Collect `items`, honoring the owning pipe's materialization limit
    pub fn collect(&self, items: impl Iterator<Item = Value>) -> PipeResult<Vec<Value>> {
        collect_bounded(self.max_materialize, &self.stage, items)
    }

    fn next_arg(&mut self, requested: Param) -> PipeResult<Injected> {
        let arg = self.values.pop_front().ok_or_else(|| PipeError::ParameterMismatch {
            stage: self.stage.clone(),
            position: self.position,
            declared: "nothing".to_string(),
            requested: requested.name().to_string(),
        })?;
        self.position += 1;
        Ok(arg)
    }

    fn mismatch(&self, declared: Param, requested: Param) -> PipeError {
        PipeError::ParameterMismatch {
            stage: self.stage.clone(),
            position: self.position - 1,
            declared: declared.name().to_string(),
            requested: requested.name().to_string(),
        }
    }

    accessor!(
        /// The raw running result
        res, Res, Flow
    );
    accessor!(
        /// The running result as an iterator
        ix, Ix, ValueIter
    );
    accessor!(seq, Seq, Sequence);
    accessor!(mutseq, MutSeq, Vec<Value>);
    accessor!(pipe, Pipe, Pipe);
    accessor!(cls, Cls, PipeClass);
    accessor!(rng, Rng, RngHandle);
}

/// Resolve `stage` against `prior` (None for a source) and call it
pub(crate) fn resolve<O: 'static>(
    owner: &Pipe,
    stage: &Stage<O>,
    prior: Option<Flow>,
    fault: &Fault,
) -> PipeResult<O> {
    trace!(stage = stage.name(), params = ?stage.params(), source = prior.is_none(), "resolving stage");
    let args = inject(owner, stage, prior, fault)?;
    stage.call(args)
}

fn inject<O: 'static>(owner: &Pipe, stage: &Stage<O>, prior: Option<Flow>, fault: &Fault) -> PipeResult<Args> {
    let data_params = stage.params().iter().filter(|p| p.needs_prior()).count();
    let mut prior = match prior {
        // Several views of one result must observe the same items
        Some(flow) if data_params > 1 => {
            check_iterable(stage.name(), &flow, "an iterable")?;
            let items = flow.into_values_in(fault)?;
            Some(Flow::Value(Value::List(materialize(owner, stage.name(), items)?)))
        }
        other => other,
    };
    let mut values = VecDeque::with_capacity(stage.params().len());
    for param in stage.params() {
        let injected = match param {
            Param::Cls => Injected::Cls(PipeClass),
            Param::Rng => Injected::Rng(owner.rng()),
            data => {
                let flow = match prior.take() {
                    Some(flow) => {
                        if let (true, Flow::Value(v)) = (data_params > 1, &flow) {
                            prior = Some(Flow::Value(v.clone()));
                        }
                        flow
                    }
                    None if *data == Param::MutSeq => {
                        return Err(PipeError::type_mismatch(
                            stage.name(),
                            "a mutable sequence",
                            "<MISSING>",
                        ));
                    }
                    None => {
                        return Err(PipeError::PriorRequested {
                            stage: stage.name().to_string(),
                            param: data.name().to_string(),
                        });
                    }
                };
                adapt(owner, stage.name(), *data, flow, fault)?
            }
        };
        values.push_back(injected);
    }
    Ok(Args {
        stage: stage.name().to_string(),
        position: 0,
        values,
        fault: fault.clone(),
        max_materialize: owner.max_materialize(),
    })
}

fn adapt(owner: &Pipe, stage: &str, param: Param, flow: Flow, fault: &Fault) -> PipeResult<Injected> {
    // Nested pipes feeding a data view run under this evaluation's fault
    let flow = match flow {
        Flow::Pipe(p) if param != Param::Pipe => Flow::Iter(p.iter_in(fault)?),
        other => other,
    };
    match param {
        Param::Res => {
            check_iterable(stage, &flow, "an iterable")?;
            Ok(Injected::Res(flow))
        }
        Param::Ix => {
            check_iterable(stage, &flow, "an iterator")?;
            Ok(Injected::Ix(flow.into_values()?))
        }
        Param::Seq => {
            check_iterable(stage, &flow, "a sequence")?;
            match flow {
                Flow::Value(v) if v.is_sequence() => Ok(Injected::Seq(Sequence::Value(v))),
                other => Ok(Injected::Seq(Sequence::Items(materialize(owner, stage, other.into_values()?)?))),
            }
        }
        Param::MutSeq => {
            check_iterable(stage, &flow, "a mutable sequence")?;
            match flow {
                Flow::Value(Value::List(items)) => Ok(Injected::MutSeq(items)),
                other => Ok(Injected::MutSeq(materialize(owner, stage, other.into_values()?)?)),
            }
        }
        Param::Pipe => {
            check_iterable(stage, &flow, "a pipe")?;
            match flow {
                Flow::Pipe(p) => Ok(Injected::Pipe(p)),
                Flow::Value(v) => Ok(Injected::Pipe(Pipe::of(v))),
                Flow::Iter(it) => Ok(Injected::Pipe(Pipe::from_iterator(it))),
            }
        }
        Param::Cls => Ok(Injected::Cls(PipeClass)),
        Param::Rng => Ok(Injected::Rng(owner.rng())),
    }
}

fn check_iterable(stage: &str, flow: &Flow, expected: &str) -> PipeResult<()> {
    if flow.is_iterable() {
        Ok(())
    } else {
        Err(PipeError::type_mismatch(
            stage,
            expected,
            format!("non-iterable {}", flow.describe()),
        ))
    }
}

/// Collect `items`, honoring the owner's materialization limit
pub(crate) fn materialize(owner: &Pipe, stage: &str, items: ValueIter) -> PipeResult<Vec<Value>> {
    collect_bounded(owner.max_materialize(), stage, items)
}

fn collect_bounded(limit: Option<usize>, stage: &str, items: impl Iterator<Item = Value>) -> PipeResult<Vec<Value>> {
    match limit {
        None => Ok(items.collect()),
        Some(limit) => {
            let collected: Vec<Value> = items.take(limit.saturating_add(1)).collect();
            if collected.len() > limit {
                Err(PipeError::argument(
                    stage,
                    format!("materializing more than {limit} items"),
                ))
            } else {
                Ok(collected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotpipe_common::ErrorKind;

    fn recorder(params: Vec<Param>) -> Stage<Vec<&'static str>> {
        Stage::new("recorder", params, |mut args: Args| {
            let mut seen = Vec::new();
            loop {
                let kind = match args.values.front() {
                    None => break,
                    Some(injected) => injected.param(),
                };
                seen.push(kind.name());
                match kind {
                    Param::Res => drop(args.res()?),
                    Param::Ix => drop(args.ix()?),
                    Param::Seq => drop(args.seq()?),
                    Param::MutSeq => drop(args.mutseq()?),
                    Param::Pipe => drop(args.pipe()?),
                    Param::Cls => drop(args.cls()?),
                    Param::Rng => drop(args.rng()?),
                }
            }
            Ok(seen)
        })
    }

    #[test]
    fn test_source_may_request_rng_and_cls() {
        let pipe = Pipe::new();
        let seen = resolve(&pipe, &recorder(vec![Param::Rng, Param::Cls]), None, &Fault::default()).unwrap();
        assert_eq!(seen, vec!["rng", "cls"]);
    }

    #[test]
    fn test_source_requesting_prior_is_contract_violation() {
        let pipe = Pipe::new();
        for param in [Param::Res, Param::Ix, Param::Seq, Param::Pipe] {
            let err = resolve(&pipe, &recorder(vec![param]), None, &Fault::default()).unwrap_err();
            assert!(matches!(err, PipeError::PriorRequested { .. }), "{param}: {err}");
            assert_eq!(err.kind(), ErrorKind::ContractViolation);
        }
    }

    #[test]
    fn test_non_iterable_is_type_mismatch() {
        let pipe = Pipe::new();
        for param in [Param::Res, Param::Ix, Param::Seq, Param::MutSeq, Param::Pipe] {
            let err = resolve(&pipe, &recorder(vec![param]), Some(Flow::Value(Value::Int(4))), &Fault::default()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::TypeMismatch, "{param}");
        }
    }

    #[test]
    fn test_seq_materializes_iterators() {
        let pipe = Pipe::new();
        let stage = Stage::new("len", vec![Param::Seq], |mut args: Args| {
            let seq = args.seq()?;
            Ok((seq.len(), seq.get(2)))
        });
        let flow = Flow::iter((1..=5).map(Value::Int));
        let (len, third) = resolve(&pipe, &stage, Some(flow), &Fault::default()).unwrap();
        assert_eq!(len, 5);
        assert_eq!(third, Some(Value::Int(3)));
    }

    #[test]
    fn test_seq_passes_sequences_unchanged() {
        let pipe = Pipe::new();
        let stage = Stage::new("kind", vec![Param::Seq], |mut args: Args| {
            Ok(matches!(args.seq()?, Sequence::Value(Value::Str(_))))
        });
        assert!(resolve(&pipe, &stage, Some(Flow::Value(Value::str("abc"))), &Fault::default()).unwrap());
    }

    #[test]
    fn test_multiple_data_params_share_items() {
        let pipe = Pipe::new();
        let stage = Stage::new("both", vec![Param::Seq, Param::Ix], |mut args: Args| {
            let seq = args.seq()?;
            let ix: Vec<Value> = args.ix()?.collect();
            Ok(seq.to_vec() == ix)
        });
        let flow = Flow::iter((0..3).map(Value::Int));
        assert!(resolve(&pipe, &stage, Some(flow), &Fault::default()).unwrap());
    }

    #[test]
    fn test_reading_wrong_kind_is_contract_violation() {
        let pipe = Pipe::new();
        let stage = Stage::new("confused", vec![Param::Rng], |mut args: Args| args.seq().map(|_| ()));
        let err = resolve(&pipe, &stage, None, &Fault::default()).unwrap_err();
        assert!(matches!(err, PipeError::ParameterMismatch { .. }));
    }

    #[test]
    fn test_materialize_limit() {
        let pipe = Pipe::new().with_max_materialize(Some(3));
        let err = materialize(&pipe, "sort", Box::new((0..10).map(Value::Int))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentShape);
        assert_eq!(materialize(&pipe, "sort", Box::new((0..3).map(Value::Int))).unwrap().len(), 3);
    }

    #[test]
    fn test_guard_stops_at_first_failure() {
        let fault = Fault::default();
        let items = vec![
            Ok(Value::Int(1)),
            Err(PipeError::empty("first")),
            Ok(Value::Int(2)),
            Err(PipeError::argument("second", "unused")),
        ];
        let seen: Vec<Value> = fault.guard(items.into_iter()).collect();
        assert_eq!(seen, vec![Value::Int(1)]);
        assert!(fault.is_set());
        assert_eq!(fault.check().unwrap_err().kind(), ErrorKind::EmptyInput);
        assert!(fault.check().is_ok());
    }

    #[test]
    fn test_args_collect_honors_limit() {
        let pipe = Pipe::new().with_max_materialize(Some(2));
        let stage = Stage::new("cols", vec![Param::Cls], |args: Args| {
            Ok(args.collect((0..5).map(Value::Int)).map(|v| v.len()))
        });
        let err = resolve(&pipe, &stage, None, &Fault::default()).unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentShape);
    }
}
