//! Storage layer benchmarks for membroker
//!
//! Run with: cargo bench
//!
//! These benchmarks measure the performance of core storage operations
//! including appends, forward reads, and key routing.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use membroker::{Broker, BrokerConfig, TopicSettings};

/// Benchmark single record appends
fn bench_single_append(c: &mut Criterion) {
    let broker = Broker::in_memory();
    let value = Bytes::from(vec![b'x'; 100]); // 100 byte payload

    c.bench_function("single_append_100b", |b| {
        b.iter(|| {
            broker
                .append("bench-topic", None, black_box(value.clone()))
                .unwrap()
        })
    });
}

/// Benchmark appends with different payload sizes
fn bench_append_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("append_by_size");

    for size in [100, 1_000, 10_000, 100_000].iter() {
        let broker = Broker::in_memory();
        let value = Bytes::from(vec![b'x'; *size]);

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                broker
                    .append("bench-topic", None, black_box(value.clone()))
                    .unwrap()
            })
        });
    }

    group.finish();
}

/// Benchmark keyed appends, which hash the key to pick a partition
fn bench_keyed_append(c: &mut Criterion) {
    let broker = Broker::new(
        BrokerConfig::new().with_topic("bench-keyed", TopicSettings::default().with_partitions(6)),
    );
    let topic = broker.topic("bench-keyed").unwrap();
    let value = Bytes::from(vec![b'x'; 100]);
    let keys: Vec<Bytes> = (0..64).map(|i| Bytes::from(format!("key-{i}"))).collect();

    c.bench_function("keyed_append_6p", |b| {
        let mut next = 0usize;
        b.iter(|| {
            let key = keys[next % keys.len()].clone();
            next += 1;
            topic.append(Some(black_box(key)), value.clone())
        })
    });
}

/// Benchmark forward reads at different batch sizes
fn bench_records_after(c: &mut Criterion) {
    let mut group = c.benchmark_group("records_after");

    let broker = Broker::new(BrokerConfig::new().with_topic(
        "bench-read",
        TopicSettings::default().with_retention_capacity(100_000),
    ));
    let topic = broker.topic("bench-read").unwrap();
    let value = Bytes::from(vec![b'x'; 100]);
    for _ in 0..50_000 {
        topic.append(None, value.clone());
    }
    let partition = topic.partition(0).unwrap().clone();

    for batch_size in [10, 100, 1_000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &size| {
                b.iter(|| partition.records_after(black_box(25_000), size));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_append,
    bench_append_sizes,
    bench_keyed_append,
    bench_records_after
);
criterion_main!(benches);
