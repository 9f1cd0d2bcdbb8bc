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

//! Named, argument-only stages for the command line
//!
//! A stage call is written as a name followed by whitespace-separated JSON
//! literals, e.g. `take 3`, `chunk 2 null`, `label ["a", "b"]`.

use anyhow::{Context, Result, anyhow, bail};
use dotpipe_core::{ChunkTail, KSpec, MergeMode, Pipe, SliceSpec, Value, ZipMode};
use std::fmt;
use std::str::FromStr;

/// Whether a registry entry transforms a pipe or finishes it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Step,
    Sink,
}

/// One registry entry
#[derive(Debug, Clone, Copy)]
pub struct StageInfo {
    pub name: &'static str,
    pub kind: StageKind,
    pub usage: &'static str,
}

const fn step(name: &'static str, usage: &'static str) -> StageInfo {
    StageInfo {
        name,
        kind: StageKind::Step,
        usage,
    }
}

const fn sink(name: &'static str, usage: &'static str) -> StageInfo {
    StageInfo {
        name,
        kind: StageKind::Sink,
        usage,
    }
}

pub const REGISTRY: &[StageInfo] = &[
    step("append", "append <item>..."),
    step("broadcast", "broadcast <n>"),
    step("cartesian_product", "cartesian_product [repeat=1]"),
    step("chain", "chain"),
    step("chunk", "chunk <n> [step] [fill]"),
    step("clamp", "clamp <min|null> <max|null>"),
    step("combinations", "combinations <k> [replacement=false]"),
    step("cycle", "cycle [n]"),
    step("debug", "debug"),
    step("depeat", "depeat"),
    step("drop", "drop <n>"),
    step("enumerate", "enumerate [start=0]"),
    step("enumerate_info", "enumerate_info [start=0]"),
    step("flatten", "flatten [levels]"),
    step("interleave", "interleave [fair=false]"),
    step("intersperse", "intersperse <sep> [n=1]"),
    step("label", "label <keys>"),
    step("peek", "peek"),
    step("permutations", "permutations [k]"),
    step("prepend", "prepend <item>..."),
    step("randitem", "randitem"),
    step("reverse", "reverse"),
    step("sample", "sample [k] [replacement=false]"),
    step("slice", "slice <start> [stop] [step=1]"),
    step("sort", "sort [reverse=false]"),
    step("take", "take <n>"),
    step("unique", "unique"),
    step("zip", "zip [fill]"),
    sink("all", "all"),
    sink("any", "any"),
    sink("contains", "contains <value>"),
    sink("count", "count"),
    sink("dict", "dict"),
    sink("equal", "equal [default]"),
    sink("exhaust", "exhaust"),
    sink("first", "first"),
    sink("frequencies", "frequencies"),
    sink("identical", "identical [default]"),
    sink("list", "list"),
    sink("max", "max [default]"),
    sink("mean", "mean [default]"),
    sink("median", "median [default]"),
    sink("merge", "merge [replace|keep|extend-old-new|extend-new-old|overlay-old-new|overlay-new-old]"),
    sink("min", "min [default]"),
    sink("minmax", "minmax [default]"),
    sink("mode", "mode [default]"),
    sink("none", "none"),
    sink("nth", "nth <n> [default]"),
    sink("partition", "partition"),
    sink("product", "product"),
    sink("set", "set"),
    sink("shuffle", "shuffle"),
    sink("stdev", "stdev [sample=false]"),
    sink("str", "str [sep=\"\"]"),
    sink("sum", "sum"),
    sink("tuple", "tuple"),
    sink("variance", "variance [sample=false]"),
    sink("width", "width [default]"),
];

pub fn lookup(name: &str) -> Option<&'static StageInfo> {
    REGISTRY.iter().find(|info| info.name == name)
}

/// A parsed `name arg...` stage call
#[derive(Debug, Clone, PartialEq)]
pub struct StageCall {
    pub name: String,
    pub args: Vec<Value>,
}

impl FromStr for StageCall {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        if name.is_empty() {
            bail!("empty stage call");
        }
        let args = serde_json::Deserializer::from_str(rest)
            .into_iter::<serde_json::Value>()
            .map(|arg| arg.map(Value::from))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("malformed arguments for '{name}': {rest}"))?;
        Ok(Self {
            name: name.to_string(),
            args,
        })
    }
}

impl fmt::Display for StageCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_json())?;
        }
        Ok(())
    }
}

impl StageCall {
    fn info(&self, kind: StageKind) -> Result<&'static StageInfo> {
        match lookup(&self.name) {
            Some(info) if info.kind == kind => Ok(info),
            Some(info) => bail!("'{}' is a {:?}, not a {:?}", self.name, info.kind, kind),
            None => bail!("unknown stage '{}' (see `dotpipe stages`)", self.name),
        }
    }

    fn arg(&self, i: usize) -> Option<&Value> {
        self.args.get(i).filter(|v| !matches!(v, Value::None))
    }

    fn value(&self, i: usize) -> Result<Value> {
        self.arg(i)
            .cloned()
            .ok_or_else(|| anyhow!("'{}' needs argument {}", self.name, i + 1))
    }

    fn opt_usize(&self, i: usize) -> Result<Option<usize>> {
        self.arg(i)
            .map(|v| {
                v.as_i64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| anyhow!("'{}' argument {} must be a non-negative integer, got {v}", self.name, i + 1))
            })
            .transpose()
    }

    fn usize(&self, i: usize) -> Result<usize> {
        self.opt_usize(i)?
            .ok_or_else(|| anyhow!("'{}' needs argument {}", self.name, i + 1))
    }

    fn int_or(&self, i: usize, default: i64) -> Result<i64> {
        match self.arg(i) {
            None => Ok(default),
            Some(v) => v
                .as_i64()
                .ok_or_else(|| anyhow!("'{}' argument {} must be an integer, got {v}", self.name, i + 1)),
        }
    }

    fn bool_or(&self, i: usize, default: bool) -> Result<bool> {
        match self.arg(i) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(v) => bail!("'{}' argument {} must be a boolean, got {v}", self.name, i + 1),
        }
    }

    fn ksize(&self, i: usize) -> Result<Option<KSpec>> {
        match self.arg(i) {
            None => Ok(None),
            Some(Value::List(bounds)) | Some(Value::Tuple(bounds)) if bounds.len() == 2 => {
                let lo = bounds[0].as_i64().and_then(|n| usize::try_from(n).ok());
                let hi = bounds[1].as_i64().and_then(|n| usize::try_from(n).ok());
                match (lo, hi) {
                    (Some(lo), Some(hi)) => Ok(Some(KSpec::from((lo, hi)))),
                    _ => bail!("'{}' k range must be two non-negative integers", self.name),
                }
            }
            Some(_) => Ok(self.opt_usize(i)?.map(KSpec::from)),
        }
    }

    fn rest(&self) -> Vec<Value> {
        self.args.clone()
    }

    /// Append this step to `pipe`
    pub fn apply_step(&self, pipe: &Pipe) -> Result<Pipe> {
        self.info(StageKind::Step)?;
        let p = match self.name.as_str() {
            "append" => pipe.append(self.rest()),
            "prepend" => pipe.prepend(self.rest()),
            "broadcast" => pipe.broadcast(self.usize(0)?),
            "cartesian_product" => pipe.cartesian_product(self.opt_usize(0)?.unwrap_or(1))?,
            "chain" => pipe.chain(),
            "chunk" => {
                let tail = match self.arg(2) {
                    Some(fill) => ChunkTail::Fill(fill.clone()),
                    None => ChunkTail::Keep,
                };
                pipe.chunk(self.usize(0)?, self.opt_usize(1)?, tail)?
            }
            "clamp" => pipe.clamp(self.arg(0).cloned(), self.arg(1).cloned())?,
            "combinations" => pipe.combinations(self.ksize(0)?.unwrap_or_default(), self.bool_or(1, false)?)?,
            "cycle" => pipe.cycle(self.opt_usize(0)?)?,
            "debug" => pipe.debug(),
            "depeat" => pipe.depeat(),
            "drop" => pipe.drop(self.usize(0)?),
            "enumerate" => pipe.enumerate(self.int_or(0, 0)?),
            "enumerate_info" => pipe.enumerate_info(self.int_or(0, 0)?),
            "flatten" => pipe.flatten(self.opt_usize(0)?)?,
            "interleave" => pipe.interleave(self.bool_or(0, false)?),
            "intersperse" => pipe.intersperse(self.value(0)?, self.opt_usize(1)?.unwrap_or(1), None)?,
            "label" => {
                let keys = self.value(0)?;
                let keys = keys
                    .into_items()
                    .ok_or_else(|| anyhow!("'label' keys must be a list"))?;
                pipe.label(keys, ZipMode::Shortest)
            }
            "peek" => pipe.peek(),
            "permutations" => pipe.permutations(self.ksize(0)?)?,
            "randitem" => pipe.randitem(),
            "reverse" => pipe.reverse(),
            "sample" => pipe.sample(self.ksize(0)?, self.bool_or(1, false)?)?,
            "slice" => pipe.slice(SliceSpec::new(self.usize(0)?, self.opt_usize(1)?, self.opt_usize(2)?.unwrap_or(1))?),
            "sort" => pipe.sort(self.bool_or(0, false)?),
            "take" => pipe.take(self.usize(0)?),
            "unique" => pipe.unique(),
            "zip" => match self.args.first() {
                Some(fill) => pipe.zip(ZipMode::Longest(fill.clone())),
                None => pipe.zip(ZipMode::Shortest),
            },
            other => bail!("step '{other}' is registered but not wired"),
        };
        Ok(p)
    }

    /// Run this sink over `pipe`
    pub fn apply_sink(&self, pipe: &Pipe) -> Result<Value> {
        self.info(StageKind::Sink)?;
        let default = self.arg(0).cloned();
        let v = match self.name.as_str() {
            "all" => Value::from(pipe.all()?),
            "any" => Value::from(pipe.any()?),
            "none" => Value::from(pipe.none()?),
            "contains" => Value::from(pipe.contains(self.value(0)?)?),
            "count" => Value::from(pipe.count()?),
            "dict" => Value::from(pipe.dict()?),
            "equal" => Value::from(pipe.equal(self.opt_bool(0)?)?),
            "identical" => Value::from(pipe.identical(self.opt_bool(0)?)?),
            "exhaust" => Value::from(pipe.exhaust()?),
            "first" => Value::from(pipe.first()?),
            "frequencies" => Value::from(pipe.frequencies()?),
            "list" => Value::List(pipe.list()?),
            "tuple" => pipe.tuple()?,
            "set" => Value::from(pipe.set()?),
            "str" => {
                let sep = match self.arg(0) {
                    Some(v) => v
                        .as_str()
                        .ok_or_else(|| anyhow!("'str' separator must be a string"))?
                        .to_string(),
                    None => String::new(),
                };
                Value::from(pipe.str(&sep)?)
            }
            "max" => pipe.max(default)?,
            "min" => pipe.min(default)?,
            "minmax" => Value::from(pipe.minmax(default)?),
            "width" => pipe.width(default)?,
            "mean" => pipe.mean(default)?,
            "median" => pipe.median(default)?,
            "mode" => pipe.mode(default)?,
            "merge" => Value::from(pipe.merge(self.merge_mode()?)?),
            "nth" => pipe.nth(self.usize(0)?, self.arg(1).cloned())?,
            "partition" => Value::from(pipe.partition()?),
            "product" => pipe.product()?,
            "sum" => pipe.sum()?,
            "shuffle" => Value::List(pipe.shuffle()?),
            "stdev" => Value::from(pipe.stdev(self.bool_or(0, false)?, None)?),
            "variance" => Value::from(pipe.variance(self.bool_or(0, false)?, None)?),
            other => bail!("sink '{other}' is registered but not wired"),
        };
        Ok(v)
    }

    fn opt_bool(&self, i: usize) -> Result<Option<bool>> {
        self.arg(i).map(|_| self.bool_or(i, false)).transpose()
    }

    fn merge_mode(&self) -> Result<MergeMode> {
        let Some(mode) = self.arg(0) else {
            return Ok(MergeMode::default());
        };
        Ok(match mode.as_str() {
            Some("replace") => MergeMode::Replace,
            Some("keep") => MergeMode::Keep,
            Some("extend-old-new") => MergeMode::ExtendOldNew,
            Some("extend-new-old") => MergeMode::ExtendNewOld,
            Some("overlay-old-new") => MergeMode::OverlayOldNew,
            Some("overlay-new-old") => MergeMode::OverlayNewOld,
            _ => bail!("unknown merge mode {mode}"),
        })
    }
}
