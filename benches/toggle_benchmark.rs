use chan_sync::toggle;
use criterion::{criterion_group, criterion_main, Criterion};
use std::time::Duration;
use tokio::sync::watch;

/// Benchmark: Creation (toggle vs tokio watch)
/// 基准测试：创建对比（toggle vs tokio watch）
fn bench_creation_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("toggle_creation_comparison");

    group.bench_function("toggle", |b| {
        b.iter(|| {
            let (_writer, _reader) = toggle::first::<u32>();
        });
    });

    group.bench_function("tokio_watch", |b| {
        b.iter(|| {
            let (_tx, _rx) = watch::channel(0_u32);
        });
    });

    group.finish();
}

/// Benchmark: Write then read with the value already pending
/// 基准测试：值已就绪时的写后读
fn bench_write_read_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("toggle_write_read_comparison");

    group.bench_function("toggle_last", |b| {
        let runtime = tokio::runtime::Runtime::new().unwrap();

        b.to_async(&runtime).iter_custom(|iters| async move {
            let (writer, mut reader) = toggle::last::<u64>();
            let start = std::time::Instant::now();

            for i in 0..iters {
                writer.write(i).unwrap();
                let _ = reader.read().await;
            }

            start.elapsed()
        });
    });

    group.bench_function("tokio_watch", |b| {
        let runtime = tokio::runtime::Runtime::new().unwrap();

        b.to_async(&runtime).iter_custom(|iters| async move {
            let (tx, mut rx) = watch::channel(0_u64);
            let start = std::time::Instant::now();

            for i in 0..iters {
                tx.send(i).unwrap();
                rx.changed().await.unwrap();
                let _ = *rx.borrow_and_update();
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmark: Reader parked before the writer fires
/// 基准测试：读端先挂起、写端后触发
fn bench_wake_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("toggle_wake_reader");

    group.bench_function("toggle_first", |b| {
        let runtime = tokio::runtime::Runtime::new().unwrap();

        b.to_async(&runtime).iter_custom(|iters| async move {
            let mut total_duration = Duration::from_secs(0);

            for _ in 0..iters {
                let (writer, mut reader) = toggle::first::<()>();

                let start = std::time::Instant::now();

                tokio::spawn(async move {
                    writer.write(()).unwrap();
                });
                let _ = reader.read().await;

                total_duration += start.elapsed();
            }

            total_duration
        });
    });

    group.finish();
}

/// Benchmark: Burst of writes collapsed into one read
/// 基准测试：一串写入合并为一次读取
fn bench_write_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("toggle_write_burst");

    for policy in [toggle::Policy::First, toggle::Policy::Last] {
        group.bench_function(format!("{:?}", policy), |b| {
            b.iter(|| {
                let (writer, mut reader) = toggle::channel(policy);
                for i in 0..64_u32 {
                    writer.write(i).unwrap();
                }
                reader.try_read().unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_creation_comparison,
    bench_write_read_comparison,
    bench_wake_reader,
    bench_write_burst,
);

criterion_main!(benches);
