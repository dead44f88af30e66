//! Benchmark suite for ledger operations and replay strategies
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Covers the engine hot paths (deposit, transfer with its two-account lock),
//! batch partitioning, and a full sync/async replay of a generated script.

use std::io::Write;
use std::sync::Arc;

use retail_ledger::cli::{ReportType, StrategyType};
use retail_ledger::core::BatchProcessor;
use retail_ledger::strategy::{create_strategy, BatchConfig, ReplayOptions};
use retail_ledger::types::{NewUser, Operation};
use retail_ledger::BankingEngine;
use rust_decimal::Decimal;
use tempfile::NamedTempFile;

fn main() {
    divan::main();
}

const ACCOUNTS: usize = 64;

fn funded_engine() -> BankingEngine {
    let engine = BankingEngine::new();
    let user = engine
        .create_user(NewUser::new("Bench", "User", "bench@example.com"))
        .expect("user");
    for i in 0..ACCOUNTS {
        let id = format!("ACC{i:03}");
        engine
            .create_account(&id, "Bench User", "Savings", user.id)
            .expect("account");
        engine
            .deposit(&id, Decimal::new(1_000_000, 0))
            .expect("deposit");
    }
    engine
}

/// A script with `users` users, two accounts each, and rounds of deposits and transfers
fn generated_script(users: usize, rounds: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "op,account,target,amount,name,category,email").expect("write");
    for u in 0..users {
        writeln!(file, "user,,,,User {u},,user{u}@example.com").expect("write");
        writeln!(file, "open,S{u},,,,Savings,user{u}@example.com").expect("write");
        writeln!(file, "open,C{u},,,,Current,user{u}@example.com").expect("write");
    }
    for r in 0..rounds {
        for u in 0..users {
            writeln!(file, "deposit,S{u},,{}.50,,,", r + 10).expect("write");
            writeln!(file, "transfer,S{u},C{u},5,,,").expect("write");
            writeln!(file, "withdraw,C{u},,2.25,,,").expect("write");
        }
    }
    file.flush().expect("flush");
    file
}

#[divan::bench]
fn deposit(bencher: divan::Bencher) {
    let engine = funded_engine();
    bencher.bench(|| engine.deposit("ACC000", Decimal::ONE).expect("deposit"));
}

#[divan::bench]
fn transfer(bencher: divan::Bencher) {
    let engine = funded_engine();
    // Round trip so the source never drains
    bencher.bench(|| {
        engine
            .transfer("ACC001", "ACC002", Decimal::ONE)
            .expect("transfer");
        engine
            .transfer("ACC002", "ACC001", Decimal::ONE)
            .expect("transfer")
    });
}

#[divan::bench(args = [100, 1_000, 10_000])]
fn partition(bencher: divan::Bencher, len: usize) {
    let processor = BatchProcessor::new(Arc::new(BankingEngine::new()));
    let batch: Vec<Operation> = (0..len)
        .map(|i| Operation::Transfer {
            from: format!("ACC{:03}", i % ACCOUNTS),
            to: format!("ACC{:03}", (i * 7 + 1) % ACCOUNTS),
            amount: Decimal::ONE,
        })
        .collect();

    bencher
        .with_inputs(|| batch.clone())
        .bench_local_values(|batch| processor.partition(batch));
}

#[divan::bench(args = [StrategyType::Sync, StrategyType::Async])]
fn replay(bencher: divan::Bencher, strategy_type: StrategyType) {
    let script = generated_script(200, 10);
    let options = ReplayOptions {
        report: ReportType::Summaries,
        ..ReplayOptions::default()
    };
    let strategy = create_strategy(strategy_type, options, Some(BatchConfig::default()));

    bencher.bench_local(|| {
        let mut output = Vec::new();
        strategy
            .process(script.path(), &mut output)
            .expect("Processing failed");
        output
    });
}
