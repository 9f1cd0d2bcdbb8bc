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

//! Statistical sinks

use super::over_items;
use crate::pipe::Pipe;
use crate::stage::Sink;
use dotpipe_common::{PipeError, PipeResult, Value, ValueIter};

fn numbers(stage: &str, items: ValueIter) -> PipeResult<Vec<Value>> {
    items
        .map(|item| {
            if item.is_number() {
                Ok(item)
            } else {
                Err(PipeError::type_mismatch(
                    stage,
                    "a number",
                    format!("{} {}", item.type_name(), item),
                ))
            }
        })
        .collect()
}

fn floats(stage: &str, items: ValueIter) -> PipeResult<Vec<f64>> {
    Ok(numbers(stage, items)?
        .iter()
        .filter_map(Value::as_f64)
        .collect())
}

fn float_mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Average of the items; integral when every item is an integer and the
/// division is exact
pub fn mean(default: Option<Value>) -> Sink<Value> {
    over_items("mean", move |items| {
        let xs = numbers("mean", items)?;
        if xs.is_empty() {
            return default.clone().ok_or_else(|| PipeError::empty("mean"));
        }
        let ints: Option<Vec<i64>> = xs
            .iter()
            .map(|v| match v {
                Value::Int(i) => Some(*i),
                _ => None,
            })
            .collect();
        if let Some(ints) = ints {
            let total: i128 = ints.iter().copied().map(i128::from).sum();
            let n = ints.len() as i128;
            if total % n == 0 {
                if let Ok(exact) = i64::try_from(total / n) {
                    return Ok(Value::Int(exact));
                }
            }
            return Ok(Value::Float(total as f64 / n as f64));
        }
        let fs: Vec<f64> = xs.iter().filter_map(Value::as_f64).collect();
        Ok(Value::Float(float_mean(&fs)))
    })
}

/// Middle item of the sorted items, or the mean of the middle two
pub fn median(default: Option<Value>) -> Sink<Value> {
    over_items("median", move |items| {
        let mut xs = numbers("median", items)?;
        if xs.is_empty() {
            return default.clone().ok_or_else(|| PipeError::empty("median"));
        }
        xs.sort();
        let mid = xs.len() / 2;
        if xs.len() % 2 == 1 {
            return Ok(xs.swap_remove(mid));
        }
        let lo = xs[mid - 1].as_f64().unwrap_or(f64::NAN);
        let hi = xs[mid].as_f64().unwrap_or(f64::NAN);
        Ok(Value::Float((lo + hi) / 2.0))
    })
}

/// Tuple of the most common items in first-seen order; `()` when empty
/// unless `default` is given
pub fn mode(default: Option<Value>) -> Sink<Value> {
    over_items("mode", move |items| {
        let mut seen: Vec<(Value, usize)> = Vec::new();
        for item in items {
            match seen.iter_mut().find(|(v, _)| *v == item) {
                Some((_, n)) => *n += 1,
                None => seen.push((item, 1)),
            }
        }
        if seen.is_empty() {
            return Ok(default.clone().unwrap_or_else(|| Value::Tuple(Vec::new())));
        }
        let top = seen.iter().map(|(_, n)| *n).max().unwrap_or(0);
        Ok(Value::Tuple(
            seen.into_iter()
                .filter(|(_, n)| *n == top)
                .map(|(v, _)| v)
                .collect(),
        ))
    })
}

fn spread_of(stage: &str, items: ValueIter, sample: bool, mean: Option<f64>) -> PipeResult<f64> {
    let xs = floats(stage, items)?;
    if xs.is_empty() {
        return Err(PipeError::empty(stage));
    }
    if sample && xs.len() < 2 {
        return Err(PipeError::argument(stage, "a sample needs at least two items"));
    }
    let mu = mean.unwrap_or_else(|| float_mean(&xs));
    let squares: f64 = xs.iter().map(|x| (x - mu).powi(2)).sum();
    let n = if sample { xs.len() - 1 } else { xs.len() };
    Ok(squares / n as f64)
}

/// Population variance, or sample variance with `sample`; `mean` may be
/// supplied when already known
pub fn variance(sample: bool, mean: Option<f64>) -> Sink<f64> {
    over_items("variance", move |items| spread_of("variance", items, sample, mean))
}

/// Square root of [`variance`]
pub fn stdev(sample: bool, mean: Option<f64>) -> Sink<f64> {
    over_items("stdev", move |items| Ok(spread_of("stdev", items, sample, mean)?.sqrt()))
}

impl Pipe {
    pub fn mean(&self, default: Option<Value>) -> PipeResult<Value> {
        self.run(&mean(default))
    }

    pub fn median(&self, default: Option<Value>) -> PipeResult<Value> {
        self.run(&median(default))
    }

    pub fn mode(&self, default: Option<Value>) -> PipeResult<Value> {
        self.run(&mode(default))
    }

    pub fn variance(&self, sample: bool, mean: Option<f64>) -> PipeResult<f64> {
        self.run(&variance(sample, mean))
    }

    pub fn stdev(&self, sample: bool, mean: Option<f64>) -> PipeResult<f64> {
        self.run(&stdev(sample, mean))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotpipe_common::ErrorKind;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean() {
        assert_eq!(Pipe::of([1, 2, 3, 5, 8]).mean(None).unwrap(), Value::Float(3.8));
        assert!(matches!(Pipe::of([1, 2, 3]).mean(None).unwrap(), Value::Int(2)));
        assert_eq!(Pipe::of("").mean(Some(Value::str("meow"))).unwrap(), Value::str("meow"));
        assert_eq!(Pipe::of("").mean(None).unwrap_err().kind(), ErrorKind::EmptyInput);
        assert_eq!(Pipe::of("ab").mean(None).unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_mean_at_integer_bounds() {
        assert!(matches!(Pipe::of([i64::MAX, i64::MAX]).mean(None).unwrap(), Value::Int(i64::MAX)));
        assert!(matches!(Pipe::of([i64::MIN, i64::MIN]).mean(None).unwrap(), Value::Int(i64::MIN)));
        assert!(matches!(Pipe::of([i64::MIN, i64::MAX]).mean(None).unwrap(), Value::Float(f) if f == -0.5));
        assert!(matches!(Pipe::of([i64::MAX, i64::MAX - 1]).mean(None).unwrap(), Value::Float(_)));
        assert!(matches!(Pipe::of([i64::MAX, 1, -1]).mean(None).unwrap(), Value::Float(_)));
    }

    #[test]
    fn test_median() {
        assert!(matches!(Pipe::of([8, 1, 3, 2, 5]).median(None).unwrap(), Value::Int(3)));
        assert!(matches!(Pipe::of([1, 2, 3, 5, 8, 13]).median(None).unwrap(), Value::Float(f) if f == 4.0));
        assert_eq!(Pipe::of("").median(Some(Value::Int(0))).unwrap(), Value::Int(0));
        assert_eq!(Pipe::of("").median(None).unwrap_err().kind(), ErrorKind::EmptyInput);
    }

    #[test]
    fn test_mode() {
        let one = Pipe::of([6, 1, 1, 2, 2, 3, 3, 4, 5, 1, 1, 6]).mode(None).unwrap();
        assert_eq!(one, Value::tuple([1]));
        let two = Pipe::of([6, 1, 1, 2, 2, 3, 3, 4, 5, 1, 1, 6, 6, 6]).mode(None).unwrap();
        assert_eq!(two, Value::tuple([6, 1]));
        assert_eq!(Pipe::of("").mode(None).unwrap(), Value::Tuple(Vec::new()));
        assert_eq!(Pipe::of("").mode(Some(Value::str("meow"))).unwrap(), Value::str("meow"));
    }

    #[test]
    fn test_variance_and_stdev() {
        let p = Pipe::of([4, 6, 6, 6, 7, 7, 9, 11]);
        assert!(close(p.variance(false, None).unwrap(), 4.0));
        assert!(close(p.variance(true, None).unwrap(), 4.571428571428571));
        assert!(close(p.stdev(false, None).unwrap(), 2.0));
        assert!(close(p.stdev(true, None).unwrap(), 2.138089935299395));
        assert!(close(p.variance(false, Some(7.0)).unwrap(), 4.0));
    }

    #[test]
    fn test_spread_errors() {
        assert_eq!(Pipe::of("").stdev(false, None).unwrap_err().kind(), ErrorKind::EmptyInput);
        assert_eq!(Pipe::of([3]).variance(true, None).unwrap_err().kind(), ErrorKind::ArgumentShape);
        assert!(close(Pipe::of([3]).variance(false, None).unwrap(), 0.0));
    }
}
