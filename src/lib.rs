//! Retail Ledger Library
//! # Overview
//!
//! This library keeps account balances and their transaction history
//! consistent for a small retail bank, and replays CSV operation scripts
//! against it with either a sync or an async strategy.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, Transaction, User, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::account_ledger`] - Authoritative balances, one mutex per account
//!   - [`core::journal`] - Append-only history with per-account summaries
//!   - [`core::directory`] - Users and the accounts they own
//!   - [`core::engine`] - Orchestration, transfers and compensation
//! - [`io`] - Replay script parsing and report output
//! - [`strategy`] - Sync and async replay pipelines
//!
//! # Transaction Types
//!
//! - **Deposit**: Credit funds to an active account
//! - **Withdrawal**: Debit funds from an active account (never below zero)
//! - **Transfer**: Move funds between two accounts, all or nothing
//! - **Interest** / **Fee**: Journal-only entries for credits and charges
//!
//! # Consistency
//!
//! The ledger is the source of truth for balances. A failed transfer leg is
//! compensated by re-depositing into the source; journal writes are best
//! effort and never undo a completed balance change.

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    AccountLedger, BankingEngine, CompensationPolicy, OperationReceipt, TransactionJournal,
    UserDirectory,
};
pub use io::{write_accounts_csv, write_journal_csv, write_summaries_csv};
pub use types::{
    Account, AccountId, AccountStatus, Amount, LedgerError, Operation, Transaction,
    TransactionId, TransactionStatus, TransactionSummary, TransactionType, User, UserId,
};
