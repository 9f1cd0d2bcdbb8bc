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

//! Dynamic Values
//!
//! The item type flowing through pipes. Values are totally ordered so they
//! can key maps and sets, integers and floats compare numerically, and the
//! sentinel variant sorts after every data variant.

use crate::errors::{PipeError, PipeResult};
use crate::sentinel::Sentinel;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Boxed iterator of values, the lazy form of a pipe result
pub type ValueIter = Box<dyn Iterator<Item = Value> + Send>;

/// A dynamically typed pipe item
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value; distinct from every sentinel
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// UTF-8 string; iterates as one-character strings
    Str(String),
    /// Byte string; iterates as integers
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Ordered mapping; iterates over its keys
    Map(BTreeMap<Value, Value>),
    Set(BTreeSet<Value>),
    /// Library marker, never produced from user data
    Sentinel(Sentinel),
}

impl Value {
    /// Build a string value
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Build a tuple from anything convertible into values
    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Build a list from anything convertible into values
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a two-element tuple
    pub fn pair(a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Value::Tuple(vec![a.into(), b.into()])
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Sentinel(_) => "sentinel",
        }
    }

    /// Check if this value is truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::List(v) | Value::Tuple(v) => !v.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Set(s) => !s.is_empty(),
            Value::Sentinel(_) => true,
        }
    }

    pub fn is_sentinel(&self, sentinel: Sentinel) -> bool {
        matches!(self, Value::Sentinel(s) if *s == sentinel)
    }

    /// Whether this value can be iterated over
    pub fn is_iterable(&self) -> bool {
        matches!(
            self,
            Value::Str(_) | Value::Bytes(_) | Value::List(_) | Value::Tuple(_) | Value::Map(_) | Value::Set(_)
        )
    }

    /// Whether this value is an ordered, indexable, sized sequence
    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Str(_) | Value::Bytes(_) | Value::List(_) | Value::Tuple(_))
    }

    /// Whether this value is a nested collection (sequences other than
    /// strings and byte strings, maps and sets)
    pub fn is_collection(&self) -> bool {
        matches!(self, Value::List(_) | Value::Tuple(_) | Value::Map(_) | Value::Set(_))
    }

    /// Number of items, for sized values
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            Value::List(v) | Value::Tuple(v) => Some(v.len()),
            Value::Map(m) => Some(m.len()),
            Value::Set(s) => Some(s.len()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Item at `index`, for sequences
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            Value::Str(s) => s.chars().nth(index).map(|c| Value::Str(c.to_string())),
            Value::Bytes(b) => b.get(index).map(|byte| Value::Int(i64::from(*byte))),
            Value::List(v) | Value::Tuple(v) => v.get(index).cloned(),
            _ => None,
        }
    }

    /// Consume the value and iterate over its items
    pub fn into_items(self) -> Option<ValueIter> {
        match self {
            Value::Str(s) => {
                let chars: Vec<Value> = s.chars().map(|c| Value::Str(c.to_string())).collect();
                Some(Box::new(chars.into_iter()))
            }
            Value::Bytes(b) => Some(Box::new(b.into_iter().map(|byte| Value::Int(i64::from(byte))))),
            Value::List(v) | Value::Tuple(v) => Some(Box::new(v.into_iter())),
            Value::Map(m) => Some(Box::new(m.into_keys())),
            Value::Set(s) => Some(Box::new(s.into_iter())),
            _ => None,
        }
    }

    /// Collect the items of an iterable value into a vector
    pub fn to_items(&self) -> Option<Vec<Value>> {
        self.clone().into_items().map(Iterator::collect)
    }

    /// Look up `key` in a mapping
    pub fn lookup(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::Bool(_))
    }

    /// Addition: numbers add, sequences of the same kind concatenate
    pub fn add(&self, other: &Value) -> PipeResult<Value> {
        match (self, other) {
            (Value::Float(_), _) | (_, Value::Float(_)) => self.float_op("add", other, |a, b| a + b),
            (a, b) if a.is_number() && b.is_number() => Ok(int_or_float(a, b, i64::checked_add, |x, y| x + y)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            (Value::Bytes(a), Value::Bytes(b)) => Ok(Value::Bytes([a.as_slice(), b.as_slice()].concat())),
            (Value::List(a), Value::List(b)) => Ok(Value::List([a.as_slice(), b.as_slice()].concat())),
            (Value::Tuple(a), Value::Tuple(b)) => Ok(Value::Tuple([a.as_slice(), b.as_slice()].concat())),
            _ => Err(self.mismatch("add", other)),
        }
    }

    /// Subtraction of numbers
    pub fn sub(&self, other: &Value) -> PipeResult<Value> {
        match (self, other) {
            (Value::Float(_), _) | (_, Value::Float(_)) => self.float_op("sub", other, |a, b| a - b),
            (a, b) if a.is_number() && b.is_number() => Ok(int_or_float(a, b, i64::checked_sub, |x, y| x - y)),
            _ => Err(self.mismatch("sub", other)),
        }
    }

    /// Multiplication: numbers multiply, a sequence times an integer repeats
    pub fn mul(&self, other: &Value) -> PipeResult<Value> {
        match (self, other) {
            (Value::Float(_), _) | (_, Value::Float(_)) => self.float_op("mul", other, |a, b| a * b),
            (a, b) if a.is_number() && b.is_number() => Ok(int_or_float(a, b, i64::checked_mul, |x, y| x * y)),
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
                Ok(Value::Str(s.repeat(usize::try_from(*n).unwrap_or(0))))
            }
            (Value::List(v), Value::Int(n)) | (Value::Int(n), Value::List(v)) => {
                Ok(Value::List(repeated(v, *n)))
            }
            (Value::Tuple(v), Value::Int(n)) | (Value::Int(n), Value::Tuple(v)) => {
                Ok(Value::Tuple(repeated(v, *n)))
            }
            _ => Err(self.mismatch("mul", other)),
        }
    }

    fn float_op(&self, op: &str, other: &Value, f: impl Fn(f64, f64) -> f64) -> PipeResult<Value> {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(f(a, b))),
            _ => Err(self.mismatch(op, other)),
        }
    }

    fn mismatch(&self, op: &str, other: &Value) -> PipeError {
        PipeError::type_mismatch(
            op,
            "compatible operands",
            format!("{} and {}", self.type_name(), other.type_name()),
        )
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::None => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::Array(b.iter().map(|byte| serde_json::Value::from(*byte)).collect()),
            Value::List(v) | Value::Tuple(v) => serde_json::Value::Array(v.iter().map(Value::to_json).collect()),
            Value::Set(s) => serde_json::Value::Array(s.iter().map(Value::to_json).collect()),
            Value::Map(m) => serde_json::Value::Object(
                m.iter()
                    .map(|(k, v)| {
                        let key = match k {
                            Value::Str(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (key, v.to_json())
                    })
                    .collect(),
            ),
            Value::Sentinel(s) => serde_json::Value::String(s.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::None => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::Bytes(_) => 4,
            Value::List(_) => 5,
            Value::Tuple(_) => 6,
            Value::Map(_) => 7,
            Value::Set(_) => 8,
            Value::Sentinel(_) => 9,
        }
    }
}

/// `items` repeated `n` times; nothing for `n <= 0`
fn repeated(items: &[Value], n: i64) -> Vec<Value> {
    let n = usize::try_from(n).unwrap_or(0);
    std::iter::repeat_n(items, n).flatten().cloned().collect()
}

/// Exact ordering of an integer against a float, without rounding the
/// integer through `f64`
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, the first float above every i64
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return if f.is_sign_negative() { Ordering::Greater } else { Ordering::Less };
    }
    if f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal),
        unequal => unequal,
    }
}

fn int_or_float(
    a: &Value,
    b: &Value,
    checked: impl Fn(i64, i64) -> Option<i64>,
    float: impl Fn(f64, f64) -> f64,
) -> Value {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => match checked(x, y) {
            Some(r) => Value::Int(r),
            None => Value::Float(float(x as f64, y as f64)),
        },
        _ => Value::Float(float(a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN))),
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::None, Value::None) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) if *a == 0.0 && *b == 0.0 => Ordering::Equal,
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Int(a), Value::Float(b)) => cmp_int_float(*a, *b),
            (Value::Float(a), Value::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Tuple(a), Value::Tuple(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::Set(a), Value::Set(b)) => a.cmp(b),
            (Value::Sentinel(a), Value::Sentinel(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) if x.is_infinite() => write!(f, "{}", if *x > 0.0 { "inf" } else { "-inf" }),
            Value::Float(x) if x.is_nan() => write!(f, "nan"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Value::Bytes(b) => {
                write!(f, "b'")?;
                for byte in b {
                    match byte {
                        b'\'' => write!(f, "\\'")?,
                        b'\\' => write!(f, "\\\\")?,
                        0x20..=0x7e => write!(f, "{}", *byte as char)?,
                        _ => write!(f, "\\x{byte:02x}")?,
                    }
                }
                write!(f, "'")
            }
            Value::List(v) => {
                write!(f, "[")?;
                write_joined(f, v.iter())?;
                write!(f, "]")
            }
            Value::Tuple(v) => {
                write!(f, "(")?;
                write_joined(f, v.iter())?;
                if v.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Set(s) if s.is_empty() => write!(f, "set()"),
            Value::Set(s) => {
                write!(f, "{{")?;
                write_joined(f, s.iter())?;
                write!(f, "}}")
            }
            Value::Sentinel(s) => write!(f, "{s}"),
        }
    }
}

fn write_joined<'a>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = &'a Value>) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        i64::try_from(v).map(Value::Int).unwrap_or(Value::Float(v as f64))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<V: Into<Value>> From<BTreeMap<Value, V>> for Value {
    fn from(v: BTreeMap<Value, V>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Value::pair(a, b)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

impl From<BTreeSet<Value>> for Value {
    fn from(v: BTreeSet<Value>) -> Self {
        Value::Set(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::None)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (Value::Str(k), Value::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentinel::{DROP, END, KEEP, MISSING, POOL};

    #[test]
    fn test_int_float_order_is_exact_past_float_precision() {
        let big = 1_i64 << 53;
        let near = Value::Float(big as f64);
        assert!(Value::Int(big + 1) > near);
        assert!(Value::Int(big) == near);
        assert!(Value::Int(big - 1) < near);

        assert!(Value::Int(i64::MAX) < Value::Float(9_223_372_036_854_775_808.0));
        assert!(Value::Int(i64::MIN) == Value::Float(-9_223_372_036_854_775_808.0));
        assert!(Value::Int(i64::MIN) > Value::Float(f64::NEG_INFINITY));
        assert!(Value::Int(-3) > Value::Float(-3.5));
        assert!(Value::Int(0) == Value::Float(-0.0));
        assert!(Value::Float(0.0) == Value::Float(-0.0));
        assert!(Value::Int(i64::MAX) < Value::Float(f64::NAN));

        let mut sorted = vec![Value::Int(big + 1), near.clone(), Value::Int(big)];
        sorted.sort();
        assert_eq!(sorted.last(), Some(&Value::Int(big + 1)));
        let set: BTreeSet<Value> = [Value::Int(big + 1), near, Value::Int(big)].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_sequence_repetition() {
        assert_eq!(Value::list([1, 2]).mul(&Value::Int(3)).unwrap(), Value::list([1, 2, 1, 2, 1, 2]));
        assert_eq!(Value::Int(2).mul(&Value::tuple(["a"])).unwrap(), Value::tuple(["a", "a"]));
        assert_eq!(Value::list([1]).mul(&Value::Int(-1)).unwrap(), Value::List(Vec::new()));
        assert_eq!(Value::str("ab").mul(&Value::Int(2)).unwrap(), Value::str("abab"));
    }

    #[test]
    fn test_numeric_equality_across_variants() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert!(Value::Int(1) < Value::Float(1.5));
        assert!(Value::Float(-0.5) < Value::Int(0));
    }

    #[test]
    fn test_sentinels_never_equal_data() {
        let data = [
            Value::None,
            Value::Bool(false),
            Value::Int(0),
            Value::str(""),
            Value::List(vec![]),
        ];
        for sentinel in [MISSING, DROP, KEEP, END, POOL] {
            for item in &data {
                assert_ne!(&Value::Sentinel(sentinel), item);
            }
        }
        assert_ne!(Value::Sentinel(MISSING), Value::None);
    }

    #[test]
    fn test_json_never_produces_sentinel() {
        let json = serde_json::json!([null, "<MISSING>", {"a": [1, 2.5]}]);
        let value = Value::from(json);
        let items = value.to_items().unwrap();
        assert_eq!(items[0], Value::None);
        assert_eq!(items[1], Value::str("<MISSING>"));
        assert!(!items.iter().any(|v| matches!(v, Value::Sentinel(_))));
    }

    #[test]
    fn test_string_iterates_as_chars() {
        let items: Vec<Value> = Value::str("abc").into_items().unwrap().collect();
        assert_eq!(items, vec![Value::str("a"), Value::str("b"), Value::str("c")]);
        assert_eq!(Value::str("héllo").len(), Some(5));
        assert_eq!(Value::str("abc").get(1), Some(Value::str("b")));
    }

    #[test]
    fn test_map_iterates_keys() {
        let mut map = BTreeMap::new();
        map.insert(Value::str("b"), Value::Int(2));
        map.insert(Value::str("a"), Value::Int(1));
        let keys: Vec<Value> = Value::Map(map).into_items().unwrap().collect();
        assert_eq!(keys, vec![Value::str("a"), Value::str("b")]);
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(Value::Int(2).add(&Value::Int(3)).unwrap(), Value::Int(5));
        assert_eq!(Value::Int(2).add(&Value::Float(0.5)).unwrap(), Value::Float(2.5));
        assert_eq!(Value::str("ab").add(&Value::str("c")).unwrap(), Value::str("abc"));
        assert_eq!(Value::Int(i64::MAX).add(&Value::Int(1)).unwrap(), Value::Float(i64::MAX as f64 + 1.0));
        assert_eq!(Value::str("ab").mul(&Value::Int(2)).unwrap(), Value::str("abab"));
        assert!(Value::str("a").sub(&Value::Int(1)).is_err());
    }

    #[test]
    fn test_display_renders_literals() {
        assert_eq!(Value::pair(0, "a").to_string(), "(0, 'a')");
        assert_eq!(Value::tuple([1]).to_string(), "(1,)");
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Set(BTreeSet::new()).to_string(), "set()");
        assert_eq!(Value::Sentinel(END).to_string(), "<END>");
    }

    #[test]
    fn test_serde_goes_through_json() {
        let value = Value::list([Value::Int(1), Value::str("a"), Value::None]);
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"[1,"a",null]"#);
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(Value::list([0]).is_truthy());
    }
}
