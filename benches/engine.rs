// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The points-ledger authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Benchmarks for the points ledger engine.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Single-threaded transaction processing
//! - Promotion-priced purchases
//! - The redemption lifecycle (request + processing)
//! - Multi-threaded throughput and lock contention

use chrono::{Duration, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use points_ledger::{
    AccountId, Engine, Principal, Promotion, PromotionId, PromotionKind, RewardRule, Role,
    TransactionRequest,
};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

const CASHIER: Principal = Principal {
    account: AccountId(1_000_000),
    role: Role::Cashier,
};

fn member(id: u32) -> Principal {
    Principal::new(AccountId(id), Role::Member)
}

fn engine_with_members(count: u32) -> Engine {
    let engine = Engine::new();
    engine.register(CASHIER.account, Role::Cashier).unwrap();
    for id in 1..=count {
        engine.register(AccountId(id), Role::Member).unwrap();
    }
    engine
}

fn purchase(account: u32, spend: i64) -> TransactionRequest {
    TransactionRequest::Purchase {
        account: AccountId(account),
        spend: Decimal::from(spend),
        promotion_ids: vec![],
        remark: String::new(),
    }
}

fn purchase_with(account: u32, spend: i64, promotions: Vec<PromotionId>) -> TransactionRequest {
    TransactionRequest::Purchase {
        account: AccountId(account),
        spend: Decimal::from(spend),
        promotion_ids: promotions,
        remark: String::new(),
    }
}

fn redemption(account: u32, amount: i64) -> TransactionRequest {
    TransactionRequest::Redemption {
        account: AccountId(account),
        amount,
        remark: String::new(),
    }
}

fn transfer(sender: u32, recipient: u32, amount: i64) -> TransactionRequest {
    TransactionRequest::Transfer {
        sender: AccountId(sender),
        recipient: AccountId(recipient),
        amount,
        remark: String::new(),
    }
}

fn rate_promotion(id: u32, rate: i64) -> Promotion {
    Promotion {
        id: PromotionId(id),
        name: format!("rate-{rate}"),
        kind: PromotionKind::Automatic,
        rule: RewardRule::Rate(Decimal::from(rate)),
        min_spending: None,
        starts_at: Utc::now() - Duration::days(1),
        ends_at: Utc::now() + Duration::days(1),
    }
}

// =============================================================================
// Single-Threaded Benchmarks
// =============================================================================

fn bench_single_purchase(c: &mut Criterion) {
    c.bench_function("single_purchase", |b| {
        b.iter(|| {
            let engine = engine_with_members(1);
            engine.submit(black_box(purchase(1, 100)), CASHIER).unwrap();
        })
    });
}

fn bench_purchase_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("purchase_throughput");

    for count in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let engine = engine_with_members(1);
                for _ in 0..count {
                    engine.submit(purchase(1, 100), CASHIER).unwrap();
                }
                black_box(&engine);
            })
        });
    }
    group.finish();
}

fn bench_promotion_pricing(c: &mut Criterion) {
    let mut group = c.benchmark_group("promotion_pricing");

    for num_promotions in [1usize, 2, 4].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_promotions),
            num_promotions,
            |b, &num_promotions| {
                let engine = engine_with_members(1);
                let mut ids = Vec::with_capacity(num_promotions);
                for i in 0..num_promotions {
                    engine.catalog().define(rate_promotion(i as u32 + 1, 10));
                    ids.push(PromotionId(i as u32 + 1));
                }
                b.iter(|| {
                    engine
                        .submit(black_box(purchase_with(1, 100, ids.clone())), CASHIER)
                        .unwrap();
                })
            },
        );
    }
    group.finish();
}

// =============================================================================
// Redemption Lifecycle Benchmarks
// =============================================================================

fn bench_redemption_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("redemption_lifecycle");

    group.bench_function("request", |b| {
        let engine = engine_with_members(1);
        engine.submit(purchase(1, 100_000_000), CASHIER).unwrap();
        b.iter(|| {
            engine.submit(black_box(redemption(1, 1)), member(1)).unwrap();
        })
    });

    group.bench_function("request_process", |b| {
        let engine = engine_with_members(1);
        engine.submit(purchase(1, 100_000_000), CASHIER).unwrap();
        b.iter(|| {
            let pending = engine.submit(redemption(1, 1), member(1)).unwrap();
            engine
                .process_redemption(black_box(pending.id), CASHIER)
                .unwrap();
        })
    });

    group.finish();
}

// =============================================================================
// Multi-Threaded Benchmarks
// =============================================================================

fn bench_parallel_purchases_same_account(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_purchases_same_account");

    for count in [1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let engine = Arc::new(engine_with_members(1));
                (0..count).into_par_iter().for_each(|_| {
                    engine.submit(purchase(1, 100), CASHIER).unwrap();
                });
                black_box(&engine);
            })
        });
    }
    group.finish();
}

fn bench_parallel_purchases_different_accounts(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_purchases_different_accounts");

    const MEMBERS: u32 = 1_000;
    for count in [1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let engine = Arc::new(engine_with_members(MEMBERS));
                (0..count).into_par_iter().for_each(|i: u32| {
                    let account = i % MEMBERS + 1;
                    engine.submit(purchase(account, 100), CASHIER).unwrap();
                });
                black_box(&engine);
            })
        });
    }
    group.finish();
}

fn bench_transfer_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfer_contention");
    let total_ops = 10_000u32;

    // Fewer members means more threads competing for the same pair of locks.
    for num_members in [2u32, 10, 100, 1_000].iter() {
        group.throughput(Throughput::Elements(total_ops as u64));
        group.bench_with_input(
            BenchmarkId::new("members", num_members),
            num_members,
            |b, &num_members| {
                b.iter(|| {
                    let engine = Arc::new(engine_with_members(num_members));
                    for id in 1..=num_members {
                        engine.submit(purchase(id, 100_000), CASHIER).unwrap();
                    }

                    (0..total_ops).into_par_iter().for_each(|i| {
                        let sender = i % num_members + 1;
                        let recipient = (i + 1) % num_members + 1;
                        if sender != recipient {
                            // Running dry under contention is a legal outcome.
                            let _ = engine.submit(transfer(sender, recipient, 1), member(sender));
                        }
                    });

                    black_box(&engine);
                })
            },
        );
    }
    group.finish();
}

// =============================================================================
// Read Path Benchmarks
// =============================================================================

fn bench_history_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_growth");

    // How the read path scales as one account's history grows.
    for history_size in [100, 1_000, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(history_size),
            history_size,
            |b, &history_size| {
                let engine = engine_with_members(1);
                for _ in 0..history_size {
                    engine.submit(purchase(1, 100), CASHIER).unwrap();
                }
                b.iter(|| {
                    let history = engine.history(black_box(AccountId(1))).unwrap();
                    black_box(history);
                })
            },
        );
    }
    group.finish();
}

// =============================================================================
// Criterion Groups
// =============================================================================

criterion_group!(
    single_threaded,
    bench_single_purchase,
    bench_purchase_throughput,
    bench_promotion_pricing,
);

criterion_group!(redemptions, bench_redemption_lifecycle,);

criterion_group!(
    multi_threaded,
    bench_parallel_purchases_same_account,
    bench_parallel_purchases_different_accounts,
    bench_transfer_contention,
);

criterion_group!(read_path, bench_history_growth,);

criterion_main!(single_threaded, redemptions, multi_threaded, read_path);
