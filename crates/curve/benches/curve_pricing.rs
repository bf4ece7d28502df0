//! Benchmarks for curve pricing

use bondfi_curve::{build_curve, Curve};
use bondfi_types::{CurveConfig, TOKEN_UNIT};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_floor_price(c: &mut Criterion) {
    let curve = build_curve(&CurveConfig::default()).unwrap();

    c.bench_function("floor_price_1000_tokens", |b| {
        b.iter(|| curve.price(black_box(5_000_000 * TOKEN_UNIT), black_box(1_000 * TOKEN_UNIT)))
    });
}

fn bench_constant_product_price(c: &mut Criterion) {
    let curve = build_curve(&CurveConfig::ConstantProduct {
        virtual_token_reserve: 1_073_000_000 * TOKEN_UNIT,
        virtual_pay_reserve: 30 * 10u128.pow(18),
    })
    .unwrap();

    c.bench_function("constant_product_price_1000_tokens", |b| {
        b.iter(|| curve.price(black_box(5_000_000 * TOKEN_UNIT), black_box(1_000 * TOKEN_UNIT)))
    });
}

criterion_group!(benches, bench_floor_price, bench_constant_product_price);
criterion_main!(benches);
