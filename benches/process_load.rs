//! Event loop benchmarks for Tickloop.
//!
//! These benchmarks measure the cost of driving a populated loop:
//! - Scheduling (slot insertion)
//! - `process` over an idle loop (no due events)
//! - `process` draining a burst of one-shots
//! - A steady recurring load advanced tick by tick

#![allow(missing_docs)]

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use std::cell::Cell;
use std::rc::Rc;
use tickloop::{EventLoop, Tick};

fn bench_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule");
    for count in [100u64, 1_000] {
        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let event_loop = EventLoop::new();
                for i in 0..count {
                    #[allow(clippy::cast_possible_truncation)]
                    let delay = (i % 64) as Tick;
                    event_loop.schedule(black_box(delay), || Ok(()));
                }
                event_loop
            });
        });
    }
    group.finish();
}

fn bench_process_idle(c: &mut Criterion) {
    c.bench_function("process_idle", |b| {
        let event_loop = EventLoop::new();
        event_loop.schedule(Tick::MAX, || Ok(()));
        let mut now: Tick = 0;
        b.iter(|| {
            now += 1;
            event_loop.process(black_box(now)).unwrap();
        });
    });
}

fn bench_process_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_burst");
    for count in [100u64, 1_000] {
        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter_batched(
                || {
                    let event_loop = EventLoop::new();
                    let fired = Rc::new(Cell::new(0u64));
                    for i in 0..count {
                        #[allow(clippy::cast_possible_truncation)]
                        let delay = (i % 64) as Tick;
                        let fired = Rc::clone(&fired);
                        event_loop.schedule(delay, move || {
                            fired.set(fired.get() + 1);
                            Ok(())
                        });
                    }
                    (event_loop, fired)
                },
                |(event_loop, fired)| {
                    event_loop.process(64).unwrap();
                    assert_eq!(fired.get(), count);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_recurring_steady_state(c: &mut Criterion) {
    c.bench_function("recurring_steady_state", |b| {
        let event_loop = EventLoop::new();
        for _ in 0..32 {
            event_loop.schedule_recurring(1, || Ok(()));
        }
        let mut now: Tick = 0;
        b.iter(|| {
            now += 1;
            event_loop.process(black_box(now)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_schedule,
    bench_process_idle,
    bench_process_burst,
    bench_recurring_steady_state
);
criterion_main!(benches);
