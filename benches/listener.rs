//! 作业完成处理的性能基准测试

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use jobmetrics::job::JobRunId;
use jobmetrics::listener::{
    ExecutionContextMerger, MapExecutionContext, MetricSnapshotExtractor, MetricsListener,
};
use jobmetrics::registry::InMemoryRegistry;
use std::hint::black_box;
use std::sync::Arc;

/// 注册表中有 `runs` 个运行，每个运行 `keys` 个计数器和一个 gauge
fn populated_registry(runs: usize, keys: usize) -> InMemoryRegistry {
    let registry = InMemoryRegistry::new();
    for run in 0..runs {
        for key in 0..keys {
            registry.increment(&format!("counter.batch.job.{}.key_{}", run, key), 1);
        }
        registry.observe_gauge(&format!("gauge.batch.job.{}.lag", run), run as f64);
    }
    registry
}

/// 从混有其他运行的注册表中提取单个运行
fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");
    let extractor = MetricSnapshotExtractor::new();
    let run_id = JobRunId::new("job.1");

    for runs in [1usize, 10, 100] {
        let registry = populated_registry(runs, 50);
        group.throughput(Throughput::Elements((runs * 51) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(runs), &registry, |b, registry| {
            b.iter(|| black_box(extractor.extract(registry, &run_id)));
        });
    }
    group.finish();
}

/// 合并到已有累计值的上下文
fn bench_merge(c: &mut Criterion) {
    let registry = populated_registry(1, 200);
    let snapshot = MetricSnapshotExtractor::new().extract(&registry, &JobRunId::new("job.0"));
    let merger = ExecutionContextMerger::new();
    let mut ctx = MapExecutionContext::new();

    c.bench_function("merge/200_counters", |b| {
        b.iter(|| black_box(merger.merge(&snapshot, &mut ctx)));
    });
}

/// 完整的 after_job（内存上下文，保留注册表）
fn bench_after_job(c: &mut Criterion) {
    let registry = Arc::new(populated_registry(10, 50));
    let listener = MetricsListener::new(registry, false);
    let run_id = JobRunId::new("job.3");

    c.bench_function("after_job/keep", |b| {
        b.iter(|| {
            let mut ctx = MapExecutionContext::new();
            black_box(listener.after_job(&run_id, &mut ctx).unwrap());
        });
    });
}

criterion_group!(benches, bench_extract, bench_merge, bench_after_job);
criterion_main!(benches);
