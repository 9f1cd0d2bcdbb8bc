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

//! Pipe evaluation benchmarks
//!
//! Measures the per-item cost of long lazy step chains and of the
//! materializing stages.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use dotpipe_core::{Pipe, Value, sinks};

fn bench_lazy_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("lazy_chain");

    for len in [1_000_i64, 10_000, 100_000] {
        group.throughput(Throughput::Elements(len as u64));
        let pipe = Pipe::rangetil(0, Some(len), 1)
            .unwrap()
            .map(|v| v.mul(&Value::Int(3)).unwrap())
            .filter(|v| v.as_i64().is_some_and(|i| i % 2 == 0))
            .map(|v| v.add(&Value::Int(1)).unwrap())
            .depeat();

        group.bench_with_input(BenchmarkId::new("sum", len), &pipe, |b, pipe| b.iter(|| black_box(pipe.sum().unwrap())));
    }

    group.finish();
}

fn bench_take_from_unbounded(c: &mut Criterion) {
    let pipe = Pipe::range(0, None, 1).unwrap().map(|v| v).take(1_000);
    c.bench_function("take_1000_from_unbounded", |b| b.iter(|| black_box(pipe.count().unwrap())));
}

fn bench_materializing_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("materializing");
    let pipe = Pipe::rangetil(0, Some(10_000), 1).unwrap().reverse();
    group.throughput(Throughput::Elements(10_000));

    group.bench_function("sort", |b| b.iter(|| black_box(pipe.sort(false).count().unwrap())));
    group.bench_function("chunk", |b| {
        let chunked = pipe.chunk(16, None, Default::default()).unwrap();
        b.iter(|| black_box(chunked.count().unwrap()))
    });
    group.bench_function("deferred_list", |b| {
        let partial = Pipe::new().reverse().defer(sinks::list());
        let source = Value::List((0..10_000).map(Value::Int).collect());
        b.iter(|| black_box(partial.call(source.clone()).unwrap()))
    });

    group.finish();
}

criterion_group!(pipe_benches, bench_lazy_chain, bench_take_from_unbounded, bench_materializing_stages);

criterion_main!(pipe_benches);
