//! Benchmarks for barrier execution.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::sync::Arc;
use std::time::Duration;
use timebarrier::prelude::*;
use timebarrier::testing::ManualScheduler;

fn barrier_benchmark(c: &mut Criterion) {
    c.bench_function("execute_pass_through", |b| {
        let barrier = TimeBarrier::disabled();
        b.iter(|| barrier.execute::<_, DeadlineExceeded, _, _>(|| black_box(42), &NoOpStage))
    });

    c.bench_function("execute_armed", |b| {
        let scheduler: Arc<dyn Scheduler> = Arc::new(ManualScheduler::new());
        let barrier = TimeBarrier::new(Some(scheduler), Duration::from_secs(60));
        let _ = barrier.initialize();
        b.iter(|| {
            barrier.execute::<_, DeadlineExceeded, _, _>(|| black_box(42), &NoOpStage)
        })
    });

    c.bench_function("execute_rearm", |b| {
        b.iter_batched_ref(
            || {
                let scheduler: Arc<dyn Scheduler> = Arc::new(ManualScheduler::new());
                let barrier = TimeBarrier::new(Some(scheduler), Duration::from_secs(60))
                    .with_arming(ArmingPolicy::Rearm);
                let _ = barrier.initialize();
                barrier
            },
            |barrier| {
                barrier.execute::<_, DeadlineExceeded, _, _>(|| black_box(42), &NoOpStage)
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, barrier_benchmark);
criterion_main!(benches);
