//! Benchmarks for the marketplace escrow and payout math.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hive_ledger::{AccountId, Coins};
use hive_market::{Task, TaskSpec};

fn escrow_task() -> Task {
    Task::new(
        AccountId::new("buyer@example.com"),
        TaskSpec {
            title: "Label images".to_string(),
            detail: "Bounding boxes around cats".to_string(),
            capacity: 250,
            payable_amount: Coins::new(40),
            deadline: chrono::Utc::now() + chrono::Duration::days(7),
            submission_info: "Dataset link".to_string(),
        },
    )
    .expect("valid spec")
}

fn bench_escrow_math(c: &mut Criterion) {
    let task = escrow_task();

    c.bench_function("escrow_total", |b| {
        b.iter(|| black_box(&task).escrow_total());
    });

    c.bench_function("refund_value", |b| {
        b.iter(|| black_box(&task).refund_value());
    });
}

fn bench_payout_conversion(c: &mut Criterion) {
    c.bench_function("payout_cents", |b| {
        b.iter(|| black_box(Coins::new(987_654)).payout_cents());
    });
}

fn bench_slot_accounting(c: &mut Criterion) {
    c.bench_function("consume_and_restore_slot", |b| {
        b.iter_batched(
            escrow_task,
            |mut task| {
                task.consume_slot().expect("capacity available");
                task.restore_slot();
                task
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_escrow_math,
    bench_payout_conversion,
    bench_slot_accounting
);
criterion_main!(benches);
