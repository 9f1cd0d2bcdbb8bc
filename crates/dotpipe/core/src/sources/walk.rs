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

//! Nested collection walk

use crate::pipe::Pipe;
use crate::stage::{Flow, Stage};
use dotpipe_common::{PipeError, PipeResult, Value};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Order in which [`Pipe::walk`] visits nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkStrategy {
    /// Depth-first, each node before its children
    #[default]
    Dfs,
    /// Breadth-first, level by level
    Bfs,
}

type DescendFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Options for [`Pipe::walk`]
#[derive(Clone, Default)]
pub struct WalkOptions {
    /// Yield the whole chain of `(parent, key, node)` triples from the root
    pub full_path: bool,
    /// Only yield nodes that are not lists, tuples or maps
    pub leaves_only: bool,
    pub strategy: WalkStrategy,
    /// `Some(1)` yields only the root's direct children
    pub max_depth: Option<usize>,
    descend: Option<DescendFn>,
}

impl WalkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_path(mut self) -> Self {
        self.full_path = true;
        self
    }

    pub fn leaves_only(mut self) -> Self {
        self.leaves_only = true;
        self
    }

    pub fn breadth_first(mut self) -> Self {
        self.strategy = WalkStrategy::Bfs;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Only descend into nodes for which `pred` holds
    pub fn descend<F>(mut self, pred: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.descend = Some(Arc::new(pred));
        self
    }
}

impl fmt::Debug for WalkOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkOptions")
            .field("full_path", &self.full_path)
            .field("leaves_only", &self.leaves_only)
            .field("strategy", &self.strategy)
            .field("max_depth", &self.max_depth)
            .field("descend", &self.descend.is_some())
            .finish()
    }
}

/// `(key, child)` pairs of a list, tuple or map
fn children(node: &Value) -> Option<Vec<(Value, Value)>> {
    match node {
        Value::List(items) | Value::Tuple(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| (Value::from(i), item.clone()))
                .collect(),
        ),
        Value::Map(entries) => Some(entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        _ => None,
    }
}

struct Frame {
    parent: Value,
    children: std::vec::IntoIter<(Value, Value)>,
    /// Depth of this frame's children
    depth: usize,
    path: Vec<Value>,
}

struct Walker {
    options: WalkOptions,
    frames: VecDeque<Frame>,
}

impl Walker {
    fn new(root: Value, options: WalkOptions) -> Self {
        let mut frames = VecDeque::new();
        if let Some(kids) = children(&root) {
            frames.push_back(Frame {
                parent: root,
                children: kids.into_iter(),
                depth: 1,
                path: Vec::new(),
            });
        }
        Self { options, frames }
    }

    fn current(&mut self) -> Option<&mut Frame> {
        match self.options.strategy {
            WalkStrategy::Dfs => self.frames.back_mut(),
            WalkStrategy::Bfs => self.frames.front_mut(),
        }
    }

    fn retire(&mut self) {
        match self.options.strategy {
            WalkStrategy::Dfs => self.frames.pop_back(),
            WalkStrategy::Bfs => self.frames.pop_front(),
        };
    }

    fn should_descend(&self, node: &Value, depth: usize) -> bool {
        self.options.max_depth.is_none_or(|max| depth < max)
            && self.options.descend.as_ref().is_none_or(|pred| pred(node))
    }
}

impl Iterator for Walker {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        loop {
            let frame = self.current()?;
            let Some((key, node)) = frame.children.next() else {
                self.retire();
                continue;
            };
            let triple = Value::tuple([frame.parent.clone(), key, node.clone()]);
            let depth = frame.depth;
            let mut path = frame.path.clone();
            path.push(triple.clone());

            let kids = children(&node);
            let is_leaf = kids.is_none();
            if let Some(kids) = kids {
                if self.should_descend(&node, depth) {
                    self.frames.push_back(Frame {
                        parent: node,
                        children: kids.into_iter(),
                        depth: depth + 1,
                        path: if self.options.full_path { path.clone() } else { Vec::new() },
                    });
                }
            }

            if self.options.leaves_only && !is_leaf {
                continue;
            }
            return Some(if self.options.full_path { Value::Tuple(path) } else { triple });
        }
    }
}

impl Pipe {
    /// `(parent, key, node)` triples for every node below `collection`
    pub fn walk(collection: impl Into<Value>, options: WalkOptions) -> PipeResult<Pipe> {
        let root = collection.into();
        if children(&root).is_none() {
            return Err(PipeError::type_mismatch(
                "walk",
                "a list, tuple or map",
                format!("{} {}", root.type_name(), root),
            ));
        }
        Ok(Self::with_source(Stage::new("walk", Vec::new(), move |_| {
            Ok(Flow::iter(Walker::new(root.clone(), options.clone())))
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> Value {
        Value::list([
            Value::str("a"),
            Value::list([Value::str("b"), Value::list([Value::str("c")])]),
        ])
    }

    #[test]
    fn test_depth_first_preorder() {
        let root = nested();
        let inner = root.get(1).unwrap();
        let innermost = inner.get(1).unwrap();
        let rows = Pipe::walk(root.clone(), WalkOptions::new()).unwrap().list().unwrap();
        assert_eq!(
            rows,
            vec![
                Value::tuple([root.clone(), Value::Int(0), Value::str("a")]),
                Value::tuple([root.clone(), Value::Int(1), inner.clone()]),
                Value::tuple([inner.clone(), Value::Int(0), Value::str("b")]),
                Value::tuple([inner.clone(), Value::Int(1), innermost.clone()]),
                Value::tuple([innermost, Value::Int(0), Value::str("c")]),
            ]
        );
    }

    #[test]
    fn test_leaves_only() {
        let leaves: Vec<Value> = Pipe::walk(nested(), WalkOptions::new().leaves_only())
            .unwrap()
            .list()
            .unwrap()
            .into_iter()
            .map(|row| row.get(2).unwrap())
            .collect();
        assert_eq!(leaves, vec![Value::str("a"), Value::str("b"), Value::str("c")]);
    }

    #[test]
    fn test_breadth_first_and_max_depth() {
        let nodes = |options: WalkOptions| -> Vec<Value> {
            Pipe::walk(nested(), options)
                .unwrap()
                .list()
                .unwrap()
                .into_iter()
                .map(|row| row.get(2).unwrap())
                .filter(|node| !node.is_collection())
                .collect()
        };
        assert_eq!(
            nodes(WalkOptions::new().breadth_first()),
            vec![Value::str("a"), Value::str("b"), Value::str("c")]
        );
        assert_eq!(nodes(WalkOptions::new().max_depth(1)), vec![Value::str("a")]);
        assert_eq!(nodes(WalkOptions::new().max_depth(2)), vec![Value::str("a"), Value::str("b")]);
    }

    #[test]
    fn test_maps_and_descend() {
        let mut inner = std::collections::BTreeMap::new();
        inner.insert(Value::str("x"), Value::Int(1));
        let mut outer = std::collections::BTreeMap::new();
        outer.insert(Value::str("k"), Value::Map(inner));
        outer.insert(Value::str("skip"), Value::list([2]));

        let options = WalkOptions::new()
            .leaves_only()
            .descend(|node| !matches!(node, Value::List(_)));
        let keys: Vec<Value> = Pipe::walk(outer, options)
            .unwrap()
            .list()
            .unwrap()
            .into_iter()
            .map(|row| row.get(1).unwrap())
            .collect();
        assert_eq!(keys, vec![Value::str("x")]);
    }

    #[test]
    fn test_full_path() {
        let rows = Pipe::walk(nested(), WalkOptions::new().full_path().leaves_only())
            .unwrap()
            .list()
            .unwrap();
        assert_eq!(rows.last().unwrap().len(), Some(3));
    }

    #[test]
    fn test_scalar_root_is_rejected() {
        assert!(Pipe::walk(3, WalkOptions::new()).is_err());
    }
}
