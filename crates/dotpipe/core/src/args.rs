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

//! Builder argument shapes
//!
//! Options that are mutually exclusive are expressed as enums; the remaining
//! shape checks run when the builder is called.

use dotpipe_common::{PipeError, PipeResult, Sentinel, Value};

/// One end of a k-selection range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Count(usize),
    /// The size of the whole collection
    Pool,
}

impl Bound {
    fn resolve(self, len: usize) -> usize {
        match self {
            Bound::Count(n) => n,
            Bound::Pool => len,
        }
    }
}

impl From<usize> for Bound {
    fn from(n: usize) -> Self {
        Bound::Count(n)
    }
}

impl TryFrom<Sentinel> for Bound {
    type Error = PipeError;

    fn try_from(sentinel: Sentinel) -> Result<Self, Self::Error> {
        match sentinel {
            Sentinel::Pool => Ok(Bound::Pool),
            other => Err(PipeError::argument("k", format!("{other} is not a valid bound"))),
        }
    }
}

/// Selection size: a single `k` or an inclusive `(k_min, k_max)` range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KSpec {
    pub min: Bound,
    pub max: Bound,
}

impl KSpec {
    /// The whole collection
    pub fn pool() -> Self {
        Self {
            min: Bound::Pool,
            max: Bound::Pool,
        }
    }

    pub fn validate(self, op: &str) -> PipeResult<Self> {
        if let (Bound::Count(min), Bound::Count(max)) = (self.min, self.max) {
            if min > max {
                return Err(PipeError::argument(
                    op,
                    format!("k_min ({min}) must not exceed k_max ({max})"),
                ));
            }
        }
        Ok(self)
    }

    /// Concrete `(min, max)` sizes for a collection of `len` items
    pub fn resolve(self, len: usize) -> (usize, usize) {
        (self.min.resolve(len), self.max.resolve(len))
    }
}

impl Default for KSpec {
    fn default() -> Self {
        Self::pool()
    }
}

impl From<usize> for KSpec {
    fn from(k: usize) -> Self {
        Bound::Count(k).into()
    }
}

impl From<Bound> for KSpec {
    fn from(k: Bound) -> Self {
        Self { min: k, max: k }
    }
}

impl From<(usize, usize)> for KSpec {
    fn from((min, max): (usize, usize)) -> Self {
        Self {
            min: Bound::Count(min),
            max: Bound::Count(max),
        }
    }
}

impl From<(Bound, Bound)> for KSpec {
    fn from((min, max): (Bound, Bound)) -> Self {
        Self { min, max }
    }
}

impl From<(usize, Bound)> for KSpec {
    fn from((min, max): (usize, Bound)) -> Self {
        Self {
            min: Bound::Count(min),
            max,
        }
    }
}

/// How zip-like stages treat inputs of unequal length
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ZipMode {
    /// Stop at the shortest input
    #[default]
    Shortest,
    /// Continue to the longest input, padding with the value
    Longest(Value),
    /// Require equal lengths
    Strict,
}

/// What `chunk` does with a final chunk shorter than `n`
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ChunkTail {
    /// Yield it as-is
    #[default]
    Keep,
    /// Pad it with the value
    Fill(Value),
    /// Drop it
    Drop,
}

/// `start`, `stop` and `step` of a slice over items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceSpec {
    pub start: usize,
    pub stop: Option<usize>,
    pub step: usize,
}

impl SliceSpec {
    pub fn new(start: usize, stop: Option<usize>, step: usize) -> PipeResult<Self> {
        let step = check_positive("slice", "step", step)?;
        Ok(Self { start, stop, step })
    }

    /// Everything up to `stop`
    pub fn until(stop: usize) -> Self {
        Self {
            start: 0,
            stop: Some(stop),
            step: 1,
        }
    }

    /// Everything from `start`
    pub fn starting_at(start: usize) -> Self {
        Self {
            start,
            stop: None,
            step: 1,
        }
    }
}

impl Default for SliceSpec {
    fn default() -> Self {
        Self::starting_at(0)
    }
}

/// Fail unless `n` is positive
pub fn check_positive(op: &str, name: &str, n: usize) -> PipeResult<usize> {
    if n == 0 {
        Err(PipeError::argument(op, format!("'{name}' must be a positive integer")))
    } else {
        Ok(n)
    }
}

/// Fail unless `n` is positive or absent
pub fn check_positive_or_none(op: &str, name: &str, n: Option<usize>) -> PipeResult<Option<usize>> {
    n.map(|n| check_positive(op, name, n)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotpipe_common::{END, POOL};

    #[test]
    fn test_kspec_conversions() {
        assert_eq!(KSpec::from(2).resolve(5), (2, 2));
        assert_eq!(KSpec::from((1, 3)).resolve(5), (1, 3));
        assert_eq!(KSpec::from((1, Bound::Pool)).resolve(5), (1, 5));
        assert_eq!(KSpec::pool().resolve(4), (4, 4));
    }

    #[test]
    fn test_kspec_rejects_inverted_range() {
        assert!(KSpec::from((3, 1)).validate("combinations").is_err());
        assert!(KSpec::from((1, 3)).validate("combinations").is_ok());
    }

    #[test]
    fn test_bound_from_sentinel() {
        assert_eq!(Bound::try_from(POOL).unwrap(), Bound::Pool);
        assert!(Bound::try_from(END).is_err());
    }

    #[test]
    fn test_positive_checks() {
        assert!(check_positive("chunk", "n", 0).is_err());
        assert_eq!(check_positive("chunk", "n", 3).unwrap(), 3);
        assert_eq!(check_positive_or_none("cycle", "n", None).unwrap(), None);
        assert!(SliceSpec::new(0, None, 0).is_err());
    }
}
