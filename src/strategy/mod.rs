//! Processing strategy module for replaying scripts
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! covering script parsing, engine application and report output. This allows
//! different processing implementations (synchronous, asynchronous batch) to be
//! selected at runtime.

use crate::cli::{ReportType, StrategyType};
use crate::core::{BankingEngine, CompensationPolicy};
use crate::io::csv_format::{write_accounts_csv, write_journal_csv, write_summaries_csv};
use crate::types::{LedgerError, Operation, TransactionSummary};
use log::{error, warn};
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Settings shared by every strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    /// Which report to write once the script has been replayed
    pub report: ReportType,

    /// Retry policy handed to the engine
    pub compensation: CompensationPolicy,
}

/// Processing strategy trait for complete replay pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the script at `input_path` and write the report to `output`
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the replay script
    /// * `output` - Writer receiving the CSV report
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened
    /// - The output cannot be written
    /// - A transfer could not be compensated (`CompensationFailed`)
    ///
    /// Bad rows and rejected operations are logged and skipped.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `options` - Report selection and compensation policy
/// * `config` - Optional configuration for async batch processing (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    options: ReplayOptions,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(options)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(options, config))
        }
    }
}

/// Log the outcome of one operation; a fatal error stops the replay
pub(crate) fn check_outcome(
    operation: &Operation,
    result: Result<(), LedgerError>,
) -> Result<(), String> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_fatal() => {
            error!("Aborting replay at '{}': {}", operation, e);
            Err(e.to_string())
        }
        Err(e) => {
            warn!("Rejected '{}': {}", operation, e);
            Ok(())
        }
    }
}

/// Write the selected report for the engine's final state
pub(crate) fn write_report(
    engine: &BankingEngine,
    report: ReportType,
    output: &mut dyn Write,
) -> Result<(), String> {
    match report {
        ReportType::Accounts => write_accounts_csv(&engine.accounts(), output),
        ReportType::Summaries => {
            let summaries = engine
                .accounts()
                .iter()
                .map(|account| engine.summary(&account.id))
                .collect::<Result<Vec<TransactionSummary>, LedgerError>>()
                .map_err(|e| format!("Failed to summarize accounts: {}", e))?;
            write_summaries_csv(&summaries, output)
        }
        ReportType::Journal => write_journal_csv(&engine.all_transactions(), output),
    }
}
