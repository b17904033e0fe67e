use balanced_pool::ThreadPool;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

// Benchmark 1: submit + get round-trip overhead
fn bench_spawn_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn_overhead");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("with_handle", size), &size, |b, &size| {
            let pool = ThreadPool::new(0);
            b.iter(|| {
                let handles: Vec<_> = (0..size)
                    .map(|i| pool.spawn(move || black_box(i)).unwrap())
                    .collect();
                for handle in handles {
                    black_box(handle.get().unwrap());
                }
            });
        });
    }

    group.finish();
}

// Benchmark 2: placement scan cost as the worker set grows
fn bench_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("placement");

    for workers in [1, 2, 4, 8, 16] {
        group.throughput(Throughput::Elements(1_000));

        group.bench_with_input(
            BenchmarkId::from_parameter(workers),
            &workers,
            |b, &workers| {
                let pool = ThreadPool::new(workers);
                b.iter(|| {
                    let handles: Vec<_> = (0..1_000)
                        .map(|i| pool.spawn(move || black_box(i)).unwrap())
                        .collect();
                    for handle in handles {
                        handle.wait();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_spawn_overhead, bench_placement);
criterion_main!(benches);
