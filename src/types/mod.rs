//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account records and status
//! - `transaction`: Journal entries, requests and summaries
//! - `user`: Directory records
//! - `operation`: Replay script operations
//! - `error`: Error types for the ledger

pub mod account;
pub mod error;
pub mod operation;
pub mod transaction;
pub mod user;

pub use account::{Account, AccountId, AccountStatus, Amount};
pub use error::{ErrorKind, LedgerError};
pub use operation::{Operation, OperationKey};
pub use transaction::{
    Transaction, TransactionId, TransactionRequest, TransactionStatus, TransactionSummary,
    TransactionType,
};
pub use user::{NewUser, User, UserId};
