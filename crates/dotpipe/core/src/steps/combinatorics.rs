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

//! Combinatoric steps
//!
//! Every generator here works on positions into a materialized pool, so
//! repeated items are treated as distinct.

use crate::args::{KSpec, check_positive};
use crate::pipe::Pipe;
use crate::stage::{Flow, Param, Stage};
use dotpipe_common::{PipeError, PipeResult, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Combinations,
    CombinationsWithReplacement,
    Permutations,
}

/// Index tuples of one size, in lexicographic order
struct Indices {
    kind: Selection,
    n: usize,
    r: usize,
    indices: Vec<usize>,
    cycles: Vec<usize>,
    started: bool,
    done: bool,
}

impl Indices {
    fn new(kind: Selection, n: usize, r: usize) -> Self {
        let empty = match kind {
            Selection::Combinations | Selection::Permutations => r > n,
            Selection::CombinationsWithReplacement => n == 0 && r > 0,
        };
        let indices = match kind {
            Selection::CombinationsWithReplacement => vec![0; r],
            Selection::Combinations => (0..r).collect(),
            Selection::Permutations => (0..n).collect(),
        };
        let cycles = match kind {
            Selection::Permutations if !empty => (n - r + 1..=n).rev().collect(),
            _ => Vec::new(),
        };
        Self {
            kind,
            n,
            r,
            indices,
            cycles,
            started: false,
            done: empty,
        }
    }

    fn current(&self) -> Vec<usize> {
        self.indices[..self.r].to_vec()
    }

    fn advance(&mut self) -> bool {
        let (n, r) = (self.n, self.r);
        match self.kind {
            Selection::Combinations => {
                let Some(i) = (0..r).rev().find(|&i| self.indices[i] != i + n - r) else {
                    return false;
                };
                self.indices[i] += 1;
                for j in i + 1..r {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                true
            }
            Selection::CombinationsWithReplacement => {
                let Some(i) = (0..r).rev().find(|&i| self.indices[i] != n - 1) else {
                    return false;
                };
                let next = self.indices[i] + 1;
                self.indices[i..].fill(next);
                true
            }
            Selection::Permutations => {
                for i in (0..r).rev() {
                    self.cycles[i] -= 1;
                    if self.cycles[i] == 0 {
                        self.indices[i..].rotate_left(1);
                        self.cycles[i] = n - i;
                    } else {
                        let j = self.cycles[i];
                        self.indices.swap(i, n - j);
                        return true;
                    }
                }
                false
            }
        }
    }
}

impl Iterator for Indices {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        if self.started {
            if !self.advance() {
                self.done = true;
                return None;
            }
        } else {
            self.started = true;
        }
        Some(self.current())
    }
}

/// Odometer over the positions of several pools
struct Product {
    pools: Vec<Vec<Value>>,
    positions: Vec<usize>,
    done: bool,
}

impl Product {
    fn new(pools: Vec<Vec<Value>>) -> Self {
        let done = pools.iter().any(Vec::is_empty);
        Self {
            positions: vec![0; pools.len()],
            pools,
            done,
        }
    }
}

impl Iterator for Product {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if self.done {
            return None;
        }
        let row = self
            .positions
            .iter()
            .zip(&self.pools)
            .map(|(&i, pool)| pool[i].clone())
            .collect();
        self.done = true;
        for slot in (0..self.pools.len()).rev() {
            self.positions[slot] += 1;
            if self.positions[slot] < self.pools[slot].len() {
                self.done = false;
                break;
            }
            self.positions[slot] = 0;
        }
        Some(Value::Tuple(row))
    }
}

fn product_of(iterables: Vec<Value>, repeat: usize, stage: &str) -> PipeResult<Product> {
    let pools = iterables
        .into_iter()
        .map(|v| {
            let found = format!("{} {}", v.type_name(), v);
            v.into_items()
                .map(|items| items.collect::<Vec<_>>())
                .ok_or_else(|| PipeError::type_mismatch(stage, "an iterable", found))
        })
        .collect::<PipeResult<Vec<_>>>()?;
    let n = pools.len();
    Ok(Product::new(pools.into_iter().cycle().take(n * repeat).collect()))
}

impl Pipe {
    fn selections(&self, name: &str, kind: Selection, k: KSpec) -> Pipe {
        self.with_step(Stage::new(name, vec![Param::Seq], move |mut args| {
            let pool: Arc<Vec<Value>> = Arc::new(args.seq()?.into_vec());
            let (lo, hi) = k.resolve(pool.len());
            let n = pool.len();
            Ok(Flow::iter((lo..=hi).flat_map(move |r| {
                let pool = Arc::clone(&pool);
                Indices::new(kind, n, r).map(move |ix| Value::Tuple(ix.into_iter().map(|i| pool[i].clone()).collect()))
            })))
        }))
    }

    /// All size-`k` combinations of the items; `k` may be a
    /// `(k_min, k_max)` range
    pub fn combinations(&self, k: impl Into<KSpec>, replacement: bool) -> PipeResult<Pipe> {
        let k = k.into().validate("combinations")?;
        let kind = if replacement {
            Selection::CombinationsWithReplacement
        } else {
            Selection::Combinations
        };
        Ok(self.selections("combinations", kind, k))
    }

    /// All size-`k` permutations of the items; `k` defaults to all of them
    pub fn permutations(&self, k: Option<KSpec>) -> PipeResult<Pipe> {
        let k = k.unwrap_or_default().validate("permutations")?;
        Ok(self.selections("permutations", Selection::Permutations, k))
    }

    /// Ordered tuples drawn from each of this pipe's items, which must be
    /// iterable
    pub fn cartesian_product(&self, repeat: usize) -> PipeResult<Pipe> {
        let repeat = check_positive("cartesian_product", "repeat", repeat)?;
        Ok(self.with_step(Stage::new("cartesian_product", vec![Param::Ix], move |mut args| {
            let iterables: Vec<Value> = args.ix()?.collect();
            Ok(Flow::iter(product_of(iterables, repeat, "cartesian_product")?))
        })))
    }

    /// Source of ordered tuples drawn from each of `iterables`
    pub fn cartesian_product_of(iterables: Vec<Value>, repeat: usize) -> PipeResult<Pipe> {
        let repeat = check_positive("cartesian_product", "repeat", repeat)?;
        if let Some(bad) = iterables.iter().find(|v| !v.is_iterable()) {
            return Err(PipeError::type_mismatch(
                "cartesian_product",
                "an iterable",
                format!("{} {}", bad.type_name(), bad),
            ));
        }
        Ok(Self::with_source(Stage::new("cartesian_product", Vec::new(), move |_| {
            Ok(Flow::iter(product_of(iterables.clone(), repeat, "cartesian_product")?))
        })))
    }
}
