//! # Transaction Admission Benchmarks
//!
//! | Path | What it measures |
//! |------|------------------|
//! | check_tx | Full fifteen-stage admission of a signed send |
//! | simulate_tx | Gas estimation, no signature verification |
//! | early_reject | Fee-floor rejection before any signature work |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_18_tx_admission::domain::signing::test_helpers::Secp256k1Signer;
use qc_18_tx_admission::stages::test_helpers::{
    check_ctx, send_msg, signed_send, unsigned_tx, TestChain,
};
use qc_18_tx_admission::AdmissionApi;
use shared_types::DecCoin;
use std::time::Duration;

fn bench_check_tx(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-admission");
    group.measurement_time(Duration::from_secs(10));

    let batch_sizes = [1usize, 10, 100];
    for size in batch_sizes {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("check_tx", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    // fresh chain per batch so sequences line up
                    let chain = TestChain::new();
                    let txs: Vec<_> = (0..size)
                        .map(|_| {
                            let signer = Secp256k1Signer::generate();
                            chain.fund(&signer, 0, 1_000_000);
                            signed_send(&chain, &signer, 0, 2_000, 200_000)
                        })
                        .collect();
                    let handler = chain.options().build().expect("capabilities wired");
                    (chain, handler, txs)
                },
                |(_chain, handler, txs)| {
                    let mut accepted = 0u32;
                    for tx in &txs {
                        if handler.check_tx(&mut check_ctx(10), tx).is_ok() {
                            accepted += 1;
                        }
                    }
                    black_box(accepted)
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_simulate_tx(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-admission");

    let chain = TestChain::new();
    let signer = Secp256k1Signer::generate();
    let address = chain.fund(&signer, 0, 1_000_000);
    let handler = chain.options().build().expect("capabilities wired");
    let tx = unsigned_tx(vec![send_msg(address, 1)], &signer.public_key, 0, 2_000, 200_000);

    group.bench_function("simulate_tx", |b| {
        b.iter(|| {
            let mut ctx = check_ctx(10);
            black_box(handler.simulate_tx(&mut ctx, &tx).is_ok());
            black_box(ctx.gas_meter.consumed())
        })
    });

    group.finish();
}

fn bench_early_reject(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-admission");

    let chain = TestChain::new();
    let signer = Secp256k1Signer::generate();
    chain.fund(&signer, 0, 1_000_000);
    let handler = chain.options().build().expect("capabilities wired");
    let tx = signed_send(&chain, &signer, 0, 1, 200_000);
    let floor: DecCoin = "0.5stake".parse().expect("valid gas price");

    group.bench_function("early_reject", |b| {
        b.iter(|| {
            let mut ctx = check_ctx(10).with_min_gas_prices(vec![floor.clone()]);
            black_box(handler.check_tx(&mut ctx, &tx).is_err())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_check_tx,
    bench_simulate_tx,
    bench_early_reject
);
criterion_main!(benches);
