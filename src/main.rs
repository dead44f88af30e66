//! Retail Ledger CLI
//!
//! Replays a CSV script of banking operations and prints a report.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- script.csv > accounts.csv
//! cargo run -- --report summaries script.csv > summaries.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 script.csv
//! RUST_LOG=debug cargo run -- --report journal script.csv
//! ```
//!
//! # Processing Strategies
//!
//! - **sync**: Sequential streaming replay (default)
//! - **async**: Batched replay, independent operations run concurrently
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, output failure, unrecoverable transfer)

use retail_ledger::cli;
use retail_ledger::strategy;
use std::process;

fn main() {
    env_logger::init();

    let args = cli::parse_args();

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, args.to_replay_options(), config)
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
