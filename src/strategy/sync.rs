//! Synchronous processing strategy
//!
//! A single-threaded implementation of the ProcessingStrategy trait. It
//! delegates:
//! - script parsing to `SyncReader` (iterator interface)
//! - operations to `BankingEngine`
//! - report output to the csv_format writers
//!
//! Rows are streamed one at a time; only the engine state is kept in memory.

use crate::core::BankingEngine;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{check_outcome, write_report, ProcessingStrategy, ReplayOptions};
use log::warn;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncProcessingStrategy {
    options: ReplayOptions,
}

impl SyncProcessingStrategy {
    pub fn new(options: ReplayOptions) -> Self {
        Self { options }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let engine = BankingEngine::with_policy(self.options.compensation);
        let reader = SyncReader::new(input_path)?;

        for result in reader {
            match result {
                Ok(operation) => {
                    let outcome = engine.apply(operation.clone());
                    check_outcome(&operation, outcome)?;
                }
                Err(e) => warn!("Skipping row: {}", e),
            }
        }

        write_report(&engine, self.options.report, output)
    }
}
