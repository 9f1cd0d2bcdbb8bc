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

//! Evaluation Engine
//!
//! Runs the source with no prior result, threads the running result through
//! each step in append order, and hands the final result to a sink.

use crate::pipe::Pipe;
use crate::resolver::{Fault, resolve};
use crate::stage::{Flow, Sink};
use dotpipe_common::{PipeError, PipeResult, Value, ValueIter};
use std::fmt;
use tracing::debug;

impl Pipe {
    /// Evaluate the source and every step, returning the running result
    pub(crate) fn evaluate(&self, fault: &Fault) -> PipeResult<Flow> {
        let source = self.source.as_ref().ok_or(PipeError::UnboundSource)?;
        debug!(pipe = %self, steps = self.steps.len(), "evaluating pipe");

        let mut result = resolve(self, source, None, fault)?;
        for step in &self.steps {
            result = resolve(self, step, Some(result), fault)?;
        }
        Ok(result)
    }

    /// Iterate over the items of this pipe
    ///
    /// A step that fails on an item ends the stream there; use
    /// [`Pipe::try_iter`] or a sink to observe the error.
    pub fn iter(&self) -> PipeResult<ValueIter> {
        self.iter_in(&Fault::default())
    }

    pub(crate) fn iter_in(&self, fault: &Fault) -> PipeResult<ValueIter> {
        self.evaluate(fault)?.into_values_in(fault)
    }

    /// Iterate over the items of this pipe, ending with the error of the
    /// first item that failed
    pub fn try_iter(&self) -> PipeResult<Box<dyn Iterator<Item = PipeResult<Value>> + Send>> {
        let fault = Fault::default();
        let items = self.iter_in(&fault)?;
        let mut pending = Some(fault);
        Ok(Box::new(
            items
                .map(Ok)
                .chain(std::iter::from_fn(move || pending.take()?.check().err().map(Err))),
        ))
    }

    /// Evaluate this pipe and reduce it with `sink`
    pub fn run<T: 'static>(&self, sink: &Sink<T>) -> PipeResult<T> {
        let fault = Fault::default();
        let result = self.evaluate(&fault)?;
        let reduced = resolve(self, sink, Some(result), &fault);
        fault.check()?;
        reduced
    }

    /// Run `sink` now when a source is bound, otherwise defer it
    pub fn finish<T: 'static>(&self, sink: Sink<T>) -> PipeResult<Outcome<T>> {
        if self.is_bound() {
            self.run(&sink).map(Outcome::Ready)
        } else {
            Ok(Outcome::Deferred(self.defer(sink)))
        }
    }

    /// Capture this pipe and `sink` to be evaluated once a source arrives
    pub fn defer<T: 'static>(&self, sink: Sink<T>) -> Partial<T> {
        debug!(pipe = %self, sink = sink.name(), "deferring sink");
        Partial {
            pipe: self.clone_with_rng(),
            sink,
        }
    }
}

/// Result of [`Pipe::finish`]
pub enum Outcome<T> {
    Ready(T),
    Deferred(Partial<T>),
}

impl<T: 'static> Outcome<T> {
    /// The value, failing with `UnboundSource` when evaluation was deferred
    pub fn ready(self) -> PipeResult<T> {
        match self {
            Outcome::Ready(value) => Ok(value),
            Outcome::Deferred(_) => Err(PipeError::UnboundSource),
        }
    }

    pub fn deferred(self) -> Option<Partial<T>> {
        match self {
            Outcome::Ready(_) => None,
            Outcome::Deferred(partial) => Some(partial),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Outcome::Deferred(partial) => f.debug_tuple("Deferred").field(partial).finish(),
        }
    }
}

/// A sink waiting for a source
pub struct Partial<T> {
    pipe: Pipe,
    sink: Sink<T>,
}

impl<T: 'static> Partial<T> {
    /// Bind `source` and evaluate
    pub fn call(&self, source: impl Into<Value>) -> PipeResult<T> {
        self.pipe.bind(source).run(&self.sink)
    }

    /// Bind another pipe's output and evaluate
    pub fn call_pipe(&self, source: &Pipe) -> PipeResult<T> {
        self.pipe.bind_pipe(source).run(&self.sink)
    }

    pub fn pipe(&self) -> &Pipe {
        &self.pipe
    }

    pub fn sink(&self) -> &Sink<T> {
        &self.sink
    }
}

impl<T> Clone for Partial<T> {
    fn clone(&self) -> Self {
        Self {
            pipe: self.pipe.clone_with_rng(),
            sink: self.sink.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Partial<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partial")
            .field("pipe", &self.pipe.to_string())
            .field("sink", &self.sink.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks;
    use crate::stage::{Param, Stage};
    use dotpipe_common::ErrorKind;

    fn ints(xs: &[i64]) -> Vec<Value> {
        xs.iter().copied().map(Value::Int).collect()
    }

    #[test]
    fn test_unbound_evaluation_fails() {
        let err = Pipe::new().map(|v| v).iter().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnboundSource);
        assert!(matches!(Pipe::new().run(&sinks::list()), Err(PipeError::UnboundSource)));
    }

    #[test]
    fn test_steps_run_in_append_order() {
        let p = Pipe::of([1, 2, 3])
            .map(|v| v.add(&Value::Int(1)).unwrap())
            .map(|v| v.mul(&Value::Int(10)).unwrap());
        assert_eq!(p.list().unwrap(), ints(&[20, 30, 40]));
    }

    #[test]
    fn test_finish_runs_when_bound() {
        let outcome = Pipe::of([1, 2]).finish(sinks::list()).unwrap();
        assert_eq!(outcome.ready().unwrap(), ints(&[1, 2]));
    }

    #[test]
    fn test_finish_defers_when_unbound() {
        let outcome = Pipe::new().map(|v| v).finish(sinks::count()).unwrap();
        let partial = outcome.deferred().unwrap();
        assert_eq!(partial.call([7, 8, 9]).unwrap(), 3);
        assert_eq!(partial.call("ab").unwrap(), 2);
    }

    #[test]
    fn test_deferred_outcome_is_not_ready() {
        let outcome = Pipe::new().finish(sinks::list()).unwrap();
        assert!(matches!(outcome.ready(), Err(PipeError::UnboundSource)));
    }

    #[test]
    fn test_outcomes_format_for_debugging() {
        let ready = Pipe::of([1, 2]).finish(sinks::count()).unwrap();
        assert_eq!(format!("{ready:?}"), "Ready(2)");

        let deferred = Pipe::new().finish(sinks::list()).unwrap();
        let shown = format!("{deferred:?}");
        assert!(shown.starts_with("Deferred(Partial"), "{shown}");
        assert!(shown.contains("sink: \"list\""), "{shown}");
    }

    #[test]
    fn test_partial_ignores_existing_source() {
        let partial = Pipe::of([1]).take(2).defer(sinks::list());
        assert_eq!(partial.call([5, 6, 7]).unwrap(), ints(&[5, 6]));
    }

    #[test]
    fn test_partial_accepts_pipe_source() {
        let partial = Pipe::new().map(|v| v.mul(&Value::Int(2)).unwrap()).defer(sinks::list());
        let upstream = Pipe::range(1, Some(3), 1).unwrap();
        assert_eq!(partial.call_pipe(&upstream).unwrap(), ints(&[2, 4, 6]));
    }

    #[test]
    fn test_source_is_reinvoked_per_evaluation() {
        let p = Pipe::rangetil(0, Some(3), 1).unwrap();
        assert_eq!(p.list().unwrap(), p.list().unwrap());
    }

    #[test]
    fn test_custom_stage() {
        let stage = Stage::new("second", vec![Param::Seq], |mut args| {
            let seq = args.seq()?;
            Ok(Flow::Value(Value::list(seq.get(1))))
        });
        let p = Pipe::of("xyz").with_step(stage);
        assert_eq!(p.list().unwrap(), vec![Value::str("y")]);
    }

    #[test]
    fn test_item_failure_reaches_the_sink() {
        let failing = Stage::new("halve", vec![Param::Ix], |mut args| {
            let fault = args.fault();
            let items = args.ix()?.map(|v| match v.as_i64() {
                Some(i) if i % 2 == 0 => Ok(Value::Int(i / 2)),
                _ => Err(PipeError::argument("halve", format!("{v} is odd"))),
            });
            Ok(Flow::iter(fault.guard(items)))
        });
        let p = Pipe::of([2, 4, 5, 6]).with_step(failing);
        assert_eq!(p.list().unwrap_err().kind(), ErrorKind::ArgumentShape);
        assert_eq!(p.take(2).list().unwrap(), ints(&[1, 2]));
        assert_eq!(p.iter().unwrap().collect::<Vec<_>>(), ints(&[1, 2]));

        let results: Vec<PipeResult<Value>> = p.try_iter().unwrap().collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(results[2], Err(PipeError::ArgumentShape { .. })));
    }

    #[test]
    fn test_non_iterable_source_fails_at_first_step() {
        let err = Pipe::of(5).map(|v| v).list().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }
}
