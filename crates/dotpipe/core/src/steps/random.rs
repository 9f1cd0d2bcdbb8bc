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

//! Random steps
//!
//! Both steps cache the whole input and then yield forever; bound them with
//! `take` or a similar step.

use crate::args::KSpec;
use crate::pipe::Pipe;
use crate::stage::{Flow, Param, Stage};
use dotpipe_common::{PipeError, PipeResult, Value};

impl Pipe {
    /// Randomly chosen items, without end
    pub fn randitem(&self) -> Pipe {
        self.with_step(Stage::new("randitem", vec![Param::Seq, Param::Rng], |mut args| {
            let pool = args.seq()?.into_vec();
            let rng = args.rng()?;
            if pool.is_empty() {
                return Err(PipeError::empty("randitem"));
            }
            Ok(Flow::iter(std::iter::from_fn(move || rng.choice(&pool))))
        }))
    }

    /// Random size-`k` tuples of the items, without end; `k` may be a
    /// `(k_min, k_max)` range and defaults to all of them
    pub fn sample(&self, k: Option<KSpec>, replacement: bool) -> PipeResult<Pipe> {
        let k = k.unwrap_or_default().validate("sample")?;
        Ok(self.with_step(Stage::new("sample", vec![Param::Seq, Param::Rng], move |mut args| {
            let pool = args.seq()?.into_vec();
            let rng = args.rng()?;
            let (lo, hi) = k.resolve(pool.len());
            if !replacement && hi > pool.len() {
                return Err(PipeError::argument(
                    "sample",
                    format!("sample larger than population ({hi} > {})", pool.len()),
                ));
            }
            if replacement && pool.is_empty() && hi > 0 {
                return Err(PipeError::empty("sample"));
            }
            Ok(Flow::iter(std::iter::from_fn(move || {
                let size = if lo == hi {
                    lo
                } else {
                    rng.randint(lo as i64, hi as i64) as usize
                };
                let picked = if replacement {
                    rng.choices(&pool, size)
                } else {
                    rng.sample(&pool, size)
                };
                Some(Value::Tuple(picked))
            })))
        })))
    }
}
