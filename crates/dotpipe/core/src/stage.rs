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

//! Stage Contract
//!
//! Every source, step and sink is a [`Stage`]: a named closure plus the
//! ordered list of [`Param`] tags it wants injected. The tags replace
//! signature introspection; the resolver matches on them to build the
//! argument list.

use crate::pipe::Pipe;
use crate::resolver::{Args, Fault};
use dotpipe_common::{PipeError, PipeResult, Value, ValueIter};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Injectable parameter kinds a stage may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    /// The running result as-is; must be iterable
    Res,
    /// The running result as an iterator
    Ix,
    /// The running result as an indexable, sized sequence
    Seq,
    /// The running result as an owned, mutable list
    MutSeq,
    /// The running result wrapped in a pipe
    Pipe,
    /// The pipe class, for building sub-pipes
    Cls,
    /// The owning pipe's random generator
    Rng,
}

impl Param {
    pub const ALL: [Param; 7] = [
        Param::Res,
        Param::Ix,
        Param::Seq,
        Param::MutSeq,
        Param::Pipe,
        Param::Cls,
        Param::Rng,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Param::Res => "res",
            Param::Ix => "ix",
            Param::Seq => "seq",
            Param::MutSeq => "mutseq",
            Param::Pipe => "pipe",
            Param::Cls => "cls",
            Param::Rng => "rng",
        }
    }

    /// Whether this parameter depends on a prior result
    pub fn needs_prior(&self) -> bool {
        matches!(self, Param::Res | Param::Ix | Param::Seq | Param::MutSeq | Param::Pipe)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Param {
    type Err = PipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Param::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| PipeError::UnknownParameter {
                stage: "<unnamed>".to_string(),
                param: s.to_string(),
            })
    }
}

type StageFn<O> = dyn Fn(Args) -> PipeResult<O> + Send + Sync;

/// A source, step or sink function with its declared parameters
pub struct Stage<O = Flow> {
    name: Arc<str>,
    params: Arc<[Param]>,
    func: Arc<StageFn<O>>,
}

/// A terminal stage producing a final value
pub type Sink<T> = Stage<T>;

impl<O> Clone for Stage<O> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            params: Arc::clone(&self.params),
            func: Arc::clone(&self.func),
        }
    }
}

impl<O: 'static> Stage<O> {
    pub fn new<F>(name: impl Into<Arc<str>>, params: impl Into<Vec<Param>>, func: F) -> Self
    where
        F: Fn(Args) -> PipeResult<O> + Send + Sync + 'static,
    {
        let params: Vec<Param> = params.into();
        Self {
            name: name.into(),
            params: params.into(),
            func: Arc::new(func),
        }
    }

    /// Build a stage from parameter names, failing on any name outside the
    /// stage contract
    pub fn from_names<F>(name: &str, names: &[&str], func: F) -> PipeResult<Self>
    where
        F: Fn(Args) -> PipeResult<O> + Send + Sync + 'static,
    {
        let params = names
            .iter()
            .map(|n| {
                n.parse::<Param>().map_err(|_| PipeError::UnknownParameter {
                    stage: name.to_string(),
                    param: n.to_string(),
                })
            })
            .collect::<PipeResult<Vec<_>>>()?;
        Ok(Self::new(name, params, func))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub(crate) fn call(&self, args: Args) -> PipeResult<O> {
        (self.func)(args)
    }

    /// Wrap this stage so its output is converted by `f`
    pub fn map_output<U: 'static>(self, f: impl Fn(O) -> U + Send + Sync + 'static) -> Stage<U> {
        let inner = self.func;
        Stage {
            name: self.name,
            params: self.params,
            func: Arc::new(move |args| inner(args).map(&f)),
        }
    }
}

impl<O: 'static> Sink<O> {
    /// Evaluate this sink against `source`, the "sink as factory" call shape
    pub fn apply(&self, source: impl Into<Value>) -> PipeResult<O> {
        Pipe::of(source).run(self)
    }
}

impl<O> fmt::Debug for Stage<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// The running result threaded between stages
pub enum Flow {
    /// A materialized value
    Value(Value),
    /// A lazy stream of items
    Iter(ValueIter),
    /// A nested pipe, evaluated when its items are requested
    Pipe(Pipe),
}

impl Flow {
    pub fn iter<I>(items: I) -> Self
    where
        I: Iterator<Item = Value> + Send + 'static,
    {
        Flow::Iter(Box::new(items))
    }

    /// Whether the result can be iterated over
    pub fn is_iterable(&self) -> bool {
        match self {
            Flow::Value(v) => v.is_iterable(),
            Flow::Iter(_) | Flow::Pipe(_) => true,
        }
    }

    /// Describe the result for error messages
    pub fn describe(&self) -> String {
        match self {
            Flow::Value(v) => format!("{} {}", v.type_name(), v),
            Flow::Iter(_) => "iterator".to_string(),
            Flow::Pipe(p) => p.to_string(),
        }
    }

    /// Consume the result and iterate over its items
    pub fn into_values(self) -> PipeResult<ValueIter> {
        self.into_values_in(&Fault::default())
    }

    /// Like [`Flow::into_values`], recording nested pipe failures in `fault`
    pub(crate) fn into_values_in(self, fault: &Fault) -> PipeResult<ValueIter> {
        match self {
            Flow::Iter(it) => Ok(it),
            Flow::Pipe(p) => p.iter_in(fault),
            Flow::Value(v) => {
                let found = format!("non-iterable {} {}", v.type_name(), v);
                v.into_items()
                    .ok_or_else(|| PipeError::type_mismatch("iterate", "an iterable", found))
            }
        }
    }

    /// Consume the result and collect it into a single value, lists for
    /// lazy results
    pub fn into_value(self) -> PipeResult<Value> {
        match self {
            Flow::Value(v) => Ok(v),
            other => Ok(Value::List(other.into_values()?.collect())),
        }
    }
}

impl From<Value> for Flow {
    fn from(v: Value) -> Self {
        Flow::Value(v)
    }
}

impl From<Pipe> for Flow {
    fn from(p: Pipe) -> Self {
        Flow::Pipe(p)
    }
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Flow::Iter(_) => f.write_str("Iter(..)"),
            Flow::Pipe(p) => f.debug_tuple("Pipe").field(&p.to_string()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_names_round_trip() {
        for param in Param::ALL {
            assert_eq!(param.name().parse::<Param>().unwrap(), param);
        }
    }

    #[test]
    fn test_unknown_param_name() {
        let err = Stage::<Flow>::from_names("custom", &["res", "widget"], |_| Ok(Flow::Value(Value::None)))
            .unwrap_err();
        match err {
            PipeError::UnknownParameter { stage, param } => {
                assert_eq!(stage, "custom");
                assert_eq!(param, "widget");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_prior_params() {
        assert!(Param::Seq.needs_prior());
        assert!(Param::MutSeq.needs_prior());
        assert!(!Param::Rng.needs_prior());
        assert!(!Param::Cls.needs_prior());
    }

    #[test]
    fn test_flow_into_values_rejects_scalars() {
        let err = Flow::Value(Value::Int(3)).into_values().err().unwrap();
        assert_eq!(err.kind(), dotpipe_common::ErrorKind::TypeMismatch);
    }
}
