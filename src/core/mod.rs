//! Core business logic module
//!
//! This module contains the ledger components and their orchestration:
//! - `traits` - Trait abstractions for interchangeable implementations
//! - `account_ledger` - Account records and balance mutations
//! - `journal` - Append-only transaction journal and summaries
//! - `directory` - User records and account ownership
//! - `locks` - Per-account lock table used by the orchestrator
//! - `engine` - Orchestration, transfers and compensation
//! - `batch_processor` - Concurrent replay of independent operations

pub mod account_ledger;
pub mod batch_processor;
pub mod directory;
pub mod engine;
pub mod journal;
pub mod locks;
pub mod traits;

pub use account_ledger::AccountLedger;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use directory::UserDirectory;
pub use engine::{BankingEngine, CompensationPolicy, OperationReceipt};
pub use journal::TransactionJournal;
pub use locks::AccountLocks;
pub use traits::{Directory, Journal, Ledger};
