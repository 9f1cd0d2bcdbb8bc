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

//! Random Number Generator Attachment
//!
//! Pipes share one process-wide generator unless given their own. A handle
//! is a cheap reference; clones of a handle draw from the same state.

use crate::config::RngMode;
use dotpipe_common::Value;
use parking_lot::Mutex;
use rand::rngs::{OsRng, StdRng};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Kind of generator behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RngKind {
    /// Seedable pseudo-random generator
    Pseudo,
    /// Operating system entropy; ignores seeds
    Crypto,
}

/// Shared, lockable random number generator
#[derive(Clone)]
pub struct RngHandle {
    kind: RngKind,
    inner: Arc<Mutex<Box<dyn RngCore + Send>>>,
}

static SHARED: OnceLock<RngHandle> = OnceLock::new();

impl RngHandle {
    fn wrap(kind: RngKind, rng: impl RngCore + Send + 'static) -> Self {
        Self {
            kind,
            inner: Arc::new(Mutex::new(Box::new(rng))),
        }
    }

    /// The process-wide generator, created on first use
    pub fn shared() -> Self {
        SHARED.get_or_init(Self::pseudo).clone()
    }

    /// A new entropy-seeded pseudo-random generator
    pub fn pseudo() -> Self {
        Self::wrap(RngKind::Pseudo, StdRng::from_entropy())
    }

    /// A generator backed by the operating system
    pub fn crypto() -> Self {
        Self::wrap(RngKind::Crypto, OsRng)
    }

    /// A deterministic generator
    pub fn seeded(seed: u64) -> Self {
        Self::wrap(RngKind::Pseudo, StdRng::seed_from_u64(seed))
    }

    /// Wrap any generator
    pub fn from_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self::wrap(RngKind::Pseudo, rng)
    }

    pub fn from_mode(mode: &RngMode) -> Self {
        match mode {
            RngMode::Shared => Self::shared(),
            RngMode::Pseudo => Self::pseudo(),
            RngMode::Crypto => Self::crypto(),
            RngMode::Seeded(seed) => Self::seeded(*seed),
        }
    }

    pub fn kind(&self) -> RngKind {
        self.kind
    }

    /// A new generator of the same kind, seeded with `seed` (or fresh
    /// entropy when `None`)
    pub fn reseeded(&self, seed: Option<u64>) -> Self {
        match (self.kind, seed) {
            (RngKind::Crypto, _) => Self::crypto(),
            (RngKind::Pseudo, Some(seed)) => Self::seeded(seed),
            (RngKind::Pseudo, None) => Self::pseudo(),
        }
    }

    /// Whether both handles draw from the same generator
    pub fn same_as(&self, other: &RngHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Uniform float in `[0, 1)`
    pub fn random(&self) -> f64 {
        self.inner.lock().r#gen::<f64>()
    }

    /// Uniform float between `a` and `b`
    pub fn uniform(&self, a: f64, b: f64) -> f64 {
        a + (b - a) * self.random()
    }

    /// Integer in the closed range `[a, b]`; `b < a` yields `a`
    pub fn randint(&self, a: i64, b: i64) -> i64 {
        if b <= a {
            return a;
        }
        self.inner.lock().gen_range(a..=b)
    }

    /// Integer from `start, start + step, ...` strictly before `stop`
    /// (after it, for negative steps); `None` when the range is empty
    pub fn randrange(&self, start: i64, stop: i64, step: i64) -> Option<i64> {
        let span = directed_span(start, stop, step)?;
        if span <= 0 {
            return None;
        }
        let width = i128::from(step).abs();
        self.pick_step(start, step, (span + width - 1) / width)
    }

    /// Integer from `start, start + step, ...` up to and including `last`
    /// (down to it, for negative steps); `None` when the range is empty
    pub fn randrange_inclusive(&self, start: i64, last: i64, step: i64) -> Option<i64> {
        let span = directed_span(start, last, step)?;
        if span < 0 {
            return None;
        }
        self.pick_step(start, step, span / i128::from(step).abs() + 1)
    }

    /// `start + k * step` for a uniform `k` in `0..count`
    fn pick_step(&self, start: i64, step: i64, count: i128) -> Option<i64> {
        let count = u128::try_from(count).ok()?;
        let k = self.inner.lock().gen_range(0..count);
        let offset = i128::try_from(k).ok()? * i128::from(step);
        i64::try_from(i128::from(start) + offset).ok()
    }

    /// A random item of `items`
    pub fn choice(&self, items: &[Value]) -> Option<Value> {
        items.choose(&mut *self.inner.lock()).cloned()
    }

    /// Shuffle `items` in place
    pub fn shuffle(&self, items: &mut [Value]) {
        items.shuffle(&mut *self.inner.lock());
    }

    /// `k` distinct positions of `items`, in random order
    pub fn sample(&self, items: &[Value], k: usize) -> Vec<Value> {
        let mut guard = self.inner.lock();
        rand::seq::index::sample(&mut *guard, items.len(), k.min(items.len()))
            .into_iter()
            .map(|i| items[i].clone())
            .collect()
    }

    /// `k` items of `items` chosen with replacement
    pub fn choices(&self, items: &[Value], k: usize) -> Vec<Value> {
        if items.is_empty() {
            return Vec::new();
        }
        let mut guard = self.inner.lock();
        (0..k)
            .map(|_| items[guard.gen_range(0..items.len())].clone())
            .collect()
    }
}

/// Distance from `start` to `end` in the direction of `step`, computed
/// without overflow; `None` for a zero step
fn directed_span(start: i64, end: i64, step: i64) -> Option<i128> {
    match step.signum() {
        0 => None,
        1 => Some(i128::from(end) - i128::from(start)),
        _ => Some(i128::from(start) - i128::from(end)),
    }
}

impl Default for RngHandle {
    fn default() -> Self {
        Self::shared()
    }
}

impl fmt::Debug for RngHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = SHARED.get().is_some_and(|s| s.same_as(self));
        f.debug_struct("RngHandle")
            .field("kind", &self.kind)
            .field("shared", &shared)
            .finish()
    }
}
