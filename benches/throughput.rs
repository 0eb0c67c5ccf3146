//! Throughput Benchmark for CinderKV
//!
//! Measures the storage engine, the frame parser, and transaction batches.

use cinderkv::commands::{CommandHandler, Session};
use cinderkv::protocol::{Command, Frame, FrameParser};
use cinderkv::storage::{KeyspaceOps, ListEnd, StorageEngine};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let engine = StorageEngine::new();
    let mut db = &engine;

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            db.set(&format!("key:{}", i), "small_value");
            i += 1;
        });
    });

    group.bench_function("set_medium", |b| {
        let mut i = 0u64;
        let value = "x".repeat(1024);
        b.iter(|| {
            db.set(&format!("key:{}", i), &value);
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations (shared-lock fast path)
fn bench_get(c: &mut Criterion) {
    let engine = StorageEngine::new();
    let mut db = &engine;

    for i in 0..100_000 {
        db.set(&format!("key:{}", i), &format!("value:{}", i));
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(db.get(&format!("key:{}", i % 100_000)));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(db.get(&format!("missing:{}", i)));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark a read-heavy mix
fn bench_mixed(c: &mut Criterion) {
    let engine = StorageEngine::new();
    let mut db = &engine;

    for i in 0..10_000 {
        db.set(&format!("key:{}", i), &format!("value:{}", i));
    }

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        b.iter(|| {
            if i % 5 == 0 {
                db.set(&format!("new:{}", i), "value");
            } else {
                black_box(db.get(&format!("key:{}", i % 10_000)));
            }
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark INCR operations
fn bench_incr(c: &mut Criterion) {
    let engine = StorageEngine::new();
    let mut db = &engine;

    let mut group = c.benchmark_group("incr");
    group.throughput(Throughput::Elements(1));

    group.bench_function("single_counter", |b| {
        b.iter(|| {
            black_box(db.incr_by("counter", 1).unwrap());
        });
    });

    group.bench_function("multiple_counters", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(db.incr_by(&format!("counter:{}", i % 1000), 1).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark list push/pop and range reads
fn bench_lists(c: &mut Criterion) {
    let engine = StorageEngine::new();
    let mut db = &engine;

    let values: Vec<String> = (0..1_000).map(|i| format!("item:{}", i)).collect();
    db.push("range", &values, ListEnd::Tail);

    let mut group = c.benchmark_group("lists");
    group.throughput(Throughput::Elements(1));

    group.bench_function("push_pop", |b| {
        let one = vec!["value".to_string()];
        b.iter(|| {
            db.push("queue", &one, ListEnd::Tail);
            black_box(db.pop("queue", ListEnd::Head).unwrap());
        });
    });

    group.bench_function("lrange_100", |b| {
        b.iter(|| {
            black_box(db.lrange("range", 100, 199).unwrap());
        });
    });

    group.finish();
}

/// Benchmark concurrent access
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let engine = Arc::new(StorageEngine::new());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let engine = Arc::clone(&engine);
                    thread::spawn(move || {
                        let mut db = engine.as_ref();
                        for i in 0..10_000 {
                            let key = format!("key:{}:{}", t, i);
                            db.set(&key, "value");
                            db.get(&key);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(engine.len());
        });
    });

    group.finish();
}

/// Benchmark EXPIRE and TTL
fn bench_expiry(c: &mut Criterion) {
    let engine = StorageEngine::new();
    let mut db = &engine;

    for i in 0..10_000 {
        db.set(&format!("expire:{}", i), "value");
    }

    let mut group = c.benchmark_group("expiry");
    group.throughput(Throughput::Elements(1));

    group.bench_function("expire_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            db.expire(&format!("expire:{}", i % 10_000), 3600);
            i += 1;
        });
    });

    group.bench_function("ttl", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(db.ttl(&format!("expire:{}", i % 10_000)));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark frame decoding
fn bench_parse(c: &mut Criterion) {
    let set = Frame::command(["SET", "key:12345", "some moderately sized value"]).serialize();
    let mut pipeline = Vec::new();
    for _ in 0..100 {
        pipeline.extend_from_slice(&set);
    }

    let mut group = c.benchmark_group("parse");

    group.throughput(Throughput::Bytes(set.len() as u64));
    group.bench_function("single_set", |b| {
        let mut parser = FrameParser::new();
        b.iter(|| {
            let (frame, _) = parser.parse(black_box(&set)).unwrap().unwrap();
            black_box(Command::from_frame(frame).unwrap());
        });
    });

    group.throughput(Throughput::Elements(100));
    group.bench_function("pipeline_100", |b| {
        let mut parser = FrameParser::new();
        b.iter(|| {
            let mut offset = 0;
            while let Some((frame, consumed)) = parser.parse(&pipeline[offset..]).unwrap() {
                black_box(frame);
                offset += consumed;
            }
        });
    });

    group.finish();
}

/// Benchmark MULTI/EXEC batches
fn bench_transaction(c: &mut Criterion) {
    let handler = CommandHandler::new(Arc::new(StorageEngine::new()), "bench.snap");

    let mut group = c.benchmark_group("transaction");
    group.throughput(Throughput::Elements(10));

    group.bench_function("exec_10", |b| {
        b.iter_batched(
            || {
                let mut queue = vec![Command::new("MULTI", vec![])];
                for i in 0..10 {
                    queue.push(Command::new("INCR", vec![format!("tx:{}", i)]));
                }
                queue.push(Command::new("EXEC", vec![]));
                queue
            },
            |queue| {
                let mut session = Session::new();
                for command in queue {
                    black_box(session.process(command, &handler));
                }
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_mixed,
    bench_incr,
    bench_lists,
    bench_concurrent,
    bench_expiry,
    bench_parse,
    bench_transaction,
);

criterion_main!(benches);
