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

//! Pipe Values
//!
//! A [`Pipe`] is an optional source stage, an ordered list of step stages
//! and an optional random generator. Builders never mutate the receiver;
//! each returns a new pipe.

use crate::config::{PipeConfig, RngMode};
use crate::rng::RngHandle;
use crate::stage::{Flow, Stage};
use dotpipe_common::{PipeError, PipeResult, Value, ValueIter};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A lazily evaluated chain of stages
pub struct Pipe {
    pub(crate) source: Option<Stage>,
    pub(crate) steps: Vec<Stage>,
    pub(crate) rng: Option<RngHandle>,
    pub(crate) max_materialize: Option<usize>,
}

impl Pipe {
    /// A pipe with no source
    pub fn new() -> Self {
        Self {
            source: None,
            steps: Vec::new(),
            rng: None,
            max_materialize: None,
        }
    }

    /// A pipe whose source is `value`, re-read on every evaluation
    pub fn of(value: impl Into<Value>) -> Self {
        Self::new().bind(value)
    }

    /// A pipe whose source is a one-shot iterator; evaluating it a second
    /// time yields nothing
    pub fn from_iterator<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        Self::with_source(one_shot(items.into_iter()))
    }

    /// A pipe whose source is `stage`
    pub fn with_source(stage: Stage) -> Self {
        Self {
            source: Some(stage),
            ..Self::new()
        }
    }

    /// Clone this pipe, keeping its random generator
    pub fn clone_with_rng(&self) -> Self {
        Self {
            rng: self.rng.clone(),
            ..self.clone()
        }
    }

    /// A new pipe with `stage` appended to the steps
    pub fn with_step(&self, stage: Stage) -> Self {
        let mut p = self.clone_with_rng();
        p.steps.push(stage);
        p
    }

    /// A new pipe with its source replaced by `value`
    pub fn bind(&self, value: impl Into<Value>) -> Self {
        let value = value.into();
        let mut p = self.clone_with_rng();
        p.source = Some(Stage::new(value.to_string(), Vec::new(), move |_| {
            Ok(Flow::Value(value.clone()))
        }));
        p
    }

    /// A new pipe with its source replaced by the one-shot `items`
    pub fn bind_iter<I>(&self, items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        let mut p = self.clone_with_rng();
        p.source = Some(one_shot(items.into_iter()));
        p
    }

    /// A new pipe with its source replaced by another pipe's output
    pub fn bind_pipe(&self, source: &Pipe) -> Self {
        let inner = source.clone_with_rng();
        let mut p = self.clone_with_rng();
        p.source = Some(Stage::new(inner.to_string(), Vec::new(), move |_| {
            Ok(Flow::Pipe(inner.clone_with_rng()))
        }));
        p
    }

    pub fn is_bound(&self) -> bool {
        self.source.is_some()
    }

    pub fn steps(&self) -> impl Iterator<Item = &Stage> {
        self.steps.iter()
    }

    /// The generator stages of this pipe receive
    pub fn rng(&self) -> RngHandle {
        self.rng.clone().unwrap_or_else(RngHandle::shared)
    }

    /// A new pipe using `rng`
    pub fn set_rng(&self, rng: RngHandle) -> Self {
        let mut p = self.clone_with_rng();
        p.rng = Some(rng);
        p
    }

    /// A new pipe using the generator selected by `mode`
    pub fn set_rng_mode(&self, mode: RngMode) -> Self {
        match mode {
            RngMode::Shared => {
                let mut p = self.clone_with_rng();
                p.rng = None;
                p
            }
            other => self.set_rng(RngHandle::from_mode(&other)),
        }
    }

    /// A new pipe whose generator is a fresh one of the same kind, seeded
    /// with `seed`
    pub fn seed_rng(&self, seed: Option<u64>) -> Self {
        self.set_rng(self.rng().reseeded(seed))
    }

    pub fn max_materialize(&self) -> Option<usize> {
        self.max_materialize
    }

    /// A new pipe that refuses to materialize more than `limit` items
    pub fn with_max_materialize(&self, limit: Option<usize>) -> Self {
        let mut p = self.clone_with_rng();
        p.max_materialize = limit;
        p
    }

    /// A new pipe configured by `config`
    pub fn with_config(&self, config: &PipeConfig) -> PipeResult<Self> {
        config.validate()?;
        Ok(self
            .set_rng_mode(config.rng)
            .with_max_materialize(config.max_materialize))
    }

    /// Force-evaluate this pipe into a new pipe bound to the collected items
    pub fn cache(&self) -> PipeResult<Self> {
        let items = self.list()?;
        Ok(Self::of(Value::List(items)))
    }

    /// Index or slice this pipe
    pub fn select(&self, key: impl Into<Selector>) -> PipeResult<Selected> {
        match key.into() {
            Selector::Nth(n) => self.nth(n, None).map(Selected::Item),
            Selector::Slice(spec) => Ok(Selected::Pipe(self.slice(spec))),
        }
    }
}

fn one_shot<I>(items: I) -> Stage
where
    I: Iterator<Item = Value> + Send + 'static,
{
    let cell: Arc<Mutex<Option<ValueIter>>> = Arc::new(Mutex::new(Some(Box::new(items))));
    Stage::new("iterator", Vec::new(), move |_| {
        let taken = cell.lock().take();
        Ok(match taken {
            Some(items) => Flow::Iter(items),
            None => Flow::iter(std::iter::empty()),
        })
    })
}

impl Clone for Pipe {
    /// Copies the source and steps; the clone uses the shared generator
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            steps: self.steps.clone(),
            rng: None,
            max_materialize: self.max_materialize,
        }
    }
}

impl Default for Pipe {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Into<Value>> FromIterator<T> for Pipe {
    fn from_iter<I: IntoIterator<Item = T>>(items: I) -> Self {
        Self::of(Value::List(items.into_iter().map(Into::into).collect()))
    }
}

impl fmt::Display for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Pipe ")?;
        match &self.source {
            Some(stage) => write!(f, "{}", stage.name())?,
            None => write!(f, "*")?,
        }
        for step in &self.steps {
            write!(f, " => {}", step.name())?;
        }
        write!(f, ">")
    }
}

impl fmt::Debug for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe")
            .field("source", &self.source.as_ref().map(Stage::name))
            .field("steps", &self.steps.iter().map(Stage::name).collect::<Vec<_>>())
            .field("rng", &self.rng)
            .field("max_materialize", &self.max_materialize)
            .finish()
    }
}

/// Index or slice key for [`Pipe::select`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Nth(usize),
    Slice(crate::args::SliceSpec),
}

impl From<usize> for Selector {
    fn from(n: usize) -> Self {
        Selector::Nth(n)
    }
}

impl From<crate::args::SliceSpec> for Selector {
    fn from(spec: crate::args::SliceSpec) -> Self {
        Selector::Slice(spec)
    }
}

impl From<std::ops::Range<usize>> for Selector {
    fn from(r: std::ops::Range<usize>) -> Self {
        Selector::Slice(crate::args::SliceSpec {
            start: r.start,
            stop: Some(r.end),
            step: 1,
        })
    }
}

impl From<std::ops::RangeFrom<usize>> for Selector {
    fn from(r: std::ops::RangeFrom<usize>) -> Self {
        Selector::Slice(crate::args::SliceSpec::starting_at(r.start))
    }
}

impl From<std::ops::RangeTo<usize>> for Selector {
    fn from(r: std::ops::RangeTo<usize>) -> Self {
        Selector::Slice(crate::args::SliceSpec::until(r.end))
    }
}

/// Result of [`Pipe::select`]
#[derive(Debug)]
pub enum Selected {
    Item(Value),
    Pipe(Pipe),
}

impl Selected {
    pub fn into_item(self) -> PipeResult<Value> {
        match self {
            Selected::Item(v) => Ok(v),
            Selected::Pipe(p) => Err(PipeError::type_mismatch("select", "an item", p)),
        }
    }
}
