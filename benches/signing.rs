//! Signing benchmarks.
//!
//! Run with: `cargo bench --bench signing`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pacifica::core::signing::{
    canonical_message, Ed25519Signer, OperationKind, PayloadMap, PayloadValue, RequestSigner,
    SigningHeader, EXPIRY_WINDOW_MS,
};
use pacifica::core::types::{LimitOrder, Side, TpSl};
use rust_decimal::Decimal;

const TIMESTAMP: u64 = 1_716_200_000_000;

fn order_payload() -> PayloadMap {
    let order = LimitOrder::new("BTC", Side::Bid, Decimal::new(99_000, 0), Decimal::new(1, 1))
        .with_take_profit(TpSl::market(Decimal::new(105_000, 0)))
        .with_stop_loss(TpSl::limit(Decimal::new(95_000, 0), Decimal::new(94_900, 0)));
    PayloadValue::object_from(&order).expect("order serializes to an object")
}

/// Flat payload with `width` string fields.
fn wide_payload(width: usize) -> PayloadMap {
    (0..width)
        .map(|i| (format!("field_{i:03}"), PayloadValue::from(format!("value-{i}"))))
        .collect()
}

fn request_signer() -> RequestSigner {
    let key = Ed25519Signer::from_secret(&[7u8; 32]).expect("32-byte seed");
    RequestSigner::new("BenchAccount", "BenchAgent", Arc::new(key))
}

/// Benchmark canonical message construction.
fn bench_canonical_message(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonical_message");
    let header = SigningHeader {
        kind: OperationKind::CreateOrder,
        timestamp: TIMESTAMP,
        expiry_window: EXPIRY_WINDOW_MS,
    };

    let order = order_payload();
    group.throughput(Throughput::Elements(1));
    group.bench_function("limit_order_with_tpsl", |b| {
        b.iter(|| canonical_message(black_box(&header), black_box(&order)))
    });

    for width in [4, 32, 256] {
        let payload = wide_payload(width);
        group.bench_with_input(BenchmarkId::new("flat", width), &payload, |b, payload| {
            b.iter(|| canonical_message(black_box(&header), black_box(payload)))
        });
    }
    group.finish();
}

/// Benchmark full envelope signing with an Ed25519 agent key.
fn bench_sign_envelope(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime");
    let signer = request_signer();
    let payload = order_payload();

    let mut group = c.benchmark_group("sign_envelope");
    group.throughput(Throughput::Elements(1));
    group.bench_function("ed25519_create_order", |b| {
        b.iter(|| {
            runtime.block_on(signer.sign_at(
                OperationKind::CreateOrder,
                black_box(payload.clone()),
                TIMESTAMP,
            ))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_canonical_message, bench_sign_envelope);
criterion_main!(benches);
