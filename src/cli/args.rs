use crate::core::CompensationPolicy;
use crate::strategy::{BatchConfig, ReplayOptions};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Replay a banking operations script against an in-memory ledger
#[derive(Parser, Debug)]
#[command(name = "retail-ledger")]
#[command(about = "Replay a banking operations script and report the resulting ledger", long_about = None)]
pub struct CliArgs {
    /// Replay script path
    #[arg(value_name = "INPUT", help = "Path to the replay script (CSV)")]
    pub input_file: PathBuf,

    /// Processing strategy used to replay the script
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Processing strategy: 'sync' for sequential or 'async' for concurrent replay"
    )]
    pub strategy: StrategyType,

    /// Report written to stdout after the replay
    #[arg(
        long = "report",
        value_name = "REPORT",
        default_value = "accounts",
        help = "Report to print: 'accounts', 'summaries' or 'journal'"
    )]
    pub report: ReportType,

    /// Number of operations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Attempts to restore the source of a failed transfer
    #[arg(
        long = "compensation-retries",
        value_name = "COUNT",
        help = "Attempts to restore the source of a failed transfer (default: 5)"
    )]
    pub compensation_retries: Option<u32>,

    /// Delay before the second compensation attempt, doubled afterwards
    #[arg(
        long = "compensation-backoff-ms",
        value_name = "MILLIS",
        help = "Initial delay between compensation attempts in ms (default: 10)"
    )]
    pub compensation_backoff_ms: Option<u64>,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Available reports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportType {
    #[default]
    Accounts,
    Summaries,
    Journal,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments, defaulting what is absent
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Create a CompensationPolicy from CLI arguments, defaulting what is absent
    pub fn to_compensation_policy(&self) -> CompensationPolicy {
        let default = CompensationPolicy::default();
        CompensationPolicy::new(
            self.compensation_retries.unwrap_or(default.max_attempts),
            self.compensation_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(default.initial_backoff),
        )
    }

    pub fn to_replay_options(&self) -> ReplayOptions {
        ReplayOptions {
            report: self.report,
            compensation: self.to_compensation_policy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_strategy(&["program", "input.csv"], StrategyType::Sync)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "input.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "input.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    #[rstest]
    #[case::default_report(&["program", "input.csv"], ReportType::Accounts)]
    #[case::summaries(&["program", "--report", "summaries", "input.csv"], ReportType::Summaries)]
    #[case::journal(&["program", "--report", "journal", "input.csv"], ReportType::Journal)]
    fn test_report_parsing(#[case] args: &[&str], #[case] expected: ReportType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.report, expected);
        assert_eq!(parsed.to_replay_options().report, expected);
    }

    #[rstest]
    #[case::all_defaults(&["program", "input.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["program", "--batch-size", "2000", "input.csv"], 2000, num_cpus::get())]
    #[case::custom_max_concurrent(&["program", "--max-concurrent", "8", "input.csv"], 1000, 8)]
    #[case::zero_batch_size(&["program", "--batch-size", "0", "input.csv"], 1000, num_cpus::get())]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
    }

    #[rstest]
    #[case::defaults(&["program", "input.csv"], 5, 10)]
    #[case::custom(
        &["program", "--compensation-retries", "2", "--compensation-backoff-ms", "50", "input.csv"],
        2,
        50
    )]
    #[case::zero_retries(&["program", "--compensation-retries", "0", "input.csv"], 5, 10)]
    fn test_compensation_policy_conversion(
        #[case] args: &[&str],
        #[case] attempts: u32,
        #[case] backoff_ms: u64,
    ) {
        let policy = CliArgs::try_parse_from(args)
            .unwrap()
            .to_compensation_policy();

        assert_eq!(policy.max_attempts, attempts);
        assert_eq!(policy.initial_backoff, Duration::from_millis(backoff_ms));
    }

    #[rstest]
    #[case::missing_input(&["program"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "input.csv"])]
    #[case::invalid_report(&["program", "--report", "balances", "input.csv"])]
    #[case::negative_retries(&["program", "--compensation-retries", "-1", "input.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
