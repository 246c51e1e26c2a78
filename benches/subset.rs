use std::hint::black_box;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use honeycomb_triggers::query::{
    CalculationOp, CalculationSpec, FilterOp, FilterSpec, OrderSpec, QuerySpec,
};
use honeycomb_triggers::transport::InMemoryTransport;
use honeycomb_triggers::{
    matches_trigger_subset, Reconciler, ThresholdOp, Trigger, TriggerClient, TriggerRecipient,
    TriggerThreshold,
};

fn valid_query() -> QuerySpec {
    let mut query = QuerySpec::single(CalculationSpec::of(CalculationOp::P99, "duration_ms"));
    // A realistic filter load; the rules never look at filters.
    for i in 0..16 {
        query = query.filter(FilterSpec::new(format!("column_{i}"), FilterOp::Equals, i));
    }
    query
}

fn bench_subset(c: &mut Criterion) {
    let mut group = c.benchmark_group("subset");
    group.throughput(Throughput::Elements(1));

    let valid = valid_query();
    group.bench_function("accept", |b| {
        b.iter(|| matches_trigger_subset(black_box(&valid)));
    });

    // Worst case for rejection: every earlier rule passes.
    let mut ordered = valid_query();
    ordered.orders.push(OrderSpec {
        column: Some("duration_ms".to_string()),
        ..OrderSpec::default()
    });
    group.bench_function("reject_last_rule", |b| {
        b.iter(|| matches_trigger_subset(black_box(&ordered)));
    });

    group.finish();
}

fn bench_noop_plan(c: &mut Criterion) {
    c.bench_function("reconcile/noop_apply", |b| {
        b.iter_custom(|iters| {
            // Fresh server per sample so recorded requests do not accumulate.
            let reconciler = Reconciler::new(TriggerClient::new(
                InMemoryTransport::new().with_dataset("bench"),
            ));
            let desired = Trigger::new(
                "bench",
                valid_query(),
                TriggerThreshold::new(ThresholdOp::GreaterThan, 1.0),
            )
            .with_recipient(TriggerRecipient::email("bench@example.com"))
            .with_recipient(TriggerRecipient::slack("#bench"));
            let state = reconciler.apply("bench", &desired, None).unwrap().state;

            let start = Instant::now();
            for _ in 0..iters {
                let outcome = reconciler.apply("bench", &desired, Some(&state)).unwrap();
                black_box(outcome);
            }
            start.elapsed()
        });
    });
}

criterion_group!(subset, bench_subset, bench_noop_plan);
criterion_main!(subset);
