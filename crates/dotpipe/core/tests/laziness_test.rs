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

//! Per-item steps over unbounded sources
//!
//! Every step here must yield its first items after pulling only a bounded
//! prefix of an endless source.

use dotpipe_core::{ChunkTail, Pipe, RemapArg, SliceSpec, SplitOn, Value, ZipMode, func};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

type Builder = fn(&Pipe) -> Pipe;

const PULL_LIMIT: usize = 64;

fn record(v: Value) -> Value {
    Value::Map(BTreeMap::from([(Value::str("n"), v.clone()), (Value::str("m"), v)]))
}

fn step(name: &'static str, build: Builder) -> (&'static str, Builder) {
    (name, build)
}

fn lazy_steps() -> Vec<(&'static str, Builder)> {
    vec![
        step("map", |p| p.map(|v| v.add(&Value::Int(1)).unwrap())),
        step("starmap", |p| p.broadcast(2).starmap(Value::List)),
        step("filter", |p| p.filter(|v| v.as_i64().is_some_and(|i| i % 2 == 0))),
        step("reject", |p| p.reject(|v| v.as_i64().is_some_and(|i| i % 2 == 0))),
        step("drop", |p| p.drop(5)),
        step("slice", |p| p.slice(SliceSpec::starting_at(2))),
        step("takewhile", |p| p.takewhile(|v| v.as_i64().is_some_and(|i| i >= 0))),
        step("dropwhile", |p| p.dropwhile(|v| v.as_i64().is_some_and(|i| i < 3))),
        step("tap", |p| p.tap(|_| {})),
        step("debug", |p| p.debug()),
        step("enumerate", |p| p.enumerate(0)),
        step("scan", |p| p.scan(|a, b| a.add(&b).unwrap(), None)),
        step("append", |p| p.append([1])),
        step("prepend", |p| p.prepend([1])),
        step("concat", |p| p.concat([Value::list([1])]).unwrap()),
        step("precat", |p| p.precat([Value::list([1])]).unwrap()),
        step("broadcast", |p| p.broadcast(3)),
        step("broadmap", |p| p.broadmap(vec![func(|v| v)])),
        step("dictmap", |p| p.dictmap([("x", func(|v| v))])),
        step("chunk", |p| p.chunk(2, None, ChunkTail::Keep).unwrap()),
        step("chunkby", |p| p.chunkby(|v| Value::Bool(v.as_i64().is_some_and(|i| i % 2 == 0)))),
        step("intersperse", |p| p.intersperse(0, 1, None).unwrap()),
        step("peek", |p| p.peek()),
        step("enumerate_info", |p| p.enumerate_info(0)),
        step("split", |p| p.split([SplitOn::IndexWhere(Arc::new(|i: usize| i % 3 == 0))])),
        step("depeat", |p| p.depeat()),
        step("unique", |p| p.unique()),
        step("cycle", |p| p.cycle(None).unwrap()),
        step("chain", |p| p.chain()),
        step("flatten", |p| p.broadcast(2).flatten(None).unwrap()),
        step("clamp", |p| p.clamp(Some(Value::Int(2)), None).unwrap()),
        step("remap", |p| p.map(record).remap(vec![RemapArg::key("n")])),
        step("label", |p| p.broadcast(2).label(["x", "y"], ZipMode::Strict)),
    ]
}

/// Take three items from `build` over an endless counter, returning how
/// many counter items were pulled
fn pulled_for(build: Builder) -> Option<usize> {
    let pulled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&pulled);
    let source = Pipe::range(0, None, 1)
        .unwrap()
        .tap(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    let pipe = build(&source).take(3);

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(pipe.list().map(|items| items.len()));
    });
    match rx.recv_timeout(Duration::from_secs(5)) {
        Ok(Ok(3)) => Some(pulled.load(Ordering::SeqCst)),
        _ => None,
    }
}

#[test]
fn test_per_item_steps_pull_a_bounded_prefix() {
    for (name, build) in lazy_steps() {
        match pulled_for(build) {
            Some(n) => assert!(n <= PULL_LIMIT, "{name} pulled {n} items for three"),
            None => panic!("{name} did not yield three items from an endless source"),
        }
    }
}

#[test]
fn test_materializing_step_respects_limit_on_endless_source() {
    let err = Pipe::range(0, None, 1)
        .unwrap()
        .with_max_materialize(Some(100))
        .sort(false)
        .take(3)
        .list()
        .unwrap_err();
    assert_eq!(err.kind(), dotpipe_core::ErrorKind::ArgumentShape);
}

#[test]
fn test_remap_failure_surfaces_through_take() {
    let p = Pipe::range(0, None, 1)
        .unwrap()
        .map(|v| if v.as_i64() == Some(2) { Value::Map(BTreeMap::new()) } else { record(v) })
        .remap(vec![RemapArg::key("n")]);
    assert_eq!(p.take(2).list().unwrap().len(), 2);
    assert_eq!(p.take(5).list().unwrap_err().kind(), dotpipe_core::ErrorKind::NotFound);
}
