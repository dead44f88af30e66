//! Core traits for the ledger, the transaction journal and the user directory
//!
//! The orchestrator only talks to its collaborators through these traits, so
//! in-memory implementations and test doubles can be swapped freely. All
//! traits are object safe and require `Send + Sync` so components can be
//! shared behind `Arc` across worker threads.

use chrono::{DateTime, Utc};

use crate::types::{
    Account, Amount, LedgerError, NewUser, Transaction, TransactionRequest, TransactionStatus,
    TransactionSummary, TransactionType, User, UserId,
};

/// Owner of account records and the balance invariant
pub trait Ledger: Send + Sync {
    /// Open a new account with a zero balance
    fn create(&self, id: &str, holder: &str, category: &str) -> Result<Account, LedgerError>;

    /// Credit an active account, returning the new balance
    fn deposit(&self, id: &str, amount: Amount) -> Result<Amount, LedgerError>;

    /// Debit an active account, returning the new balance
    fn withdraw(&self, id: &str, amount: Amount) -> Result<Amount, LedgerError>;

    fn balance(&self, id: &str) -> Result<Amount, LedgerError>;

    fn details(&self, id: &str) -> Result<Account, LedgerError>;

    /// Close an account whose balance is exactly zero
    fn close(&self, id: &str) -> Result<(), LedgerError>;

    /// Snapshot of all accounts sorted by id
    fn accounts(&self) -> Vec<Account>;
}

/// Append-only record of balance-affecting operations
pub trait Journal: Send + Sync {
    fn record(&self, request: TransactionRequest) -> Result<Transaction, LedgerError>;

    fn get(&self, id: &str) -> Result<Transaction, LedgerError>;

    /// Entries where the account is source or destination
    fn by_account(&self, account: &str) -> Vec<Transaction>;

    fn by_type(&self, tx_type: TransactionType) -> Vec<Transaction>;

    /// Entries with `start <= timestamp <= end`
    fn by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Transaction>;

    fn all(&self) -> Vec<Transaction>;

    fn update_status(&self, id: &str, status: TransactionStatus) -> Result<(), LedgerError>;

    fn summarize(&self, account: &str) -> Result<TransactionSummary, LedgerError>;
}

/// User registry and user-to-account association
pub trait Directory: Send + Sync {
    fn create_user(&self, user: NewUser) -> Result<User, LedgerError>;

    fn user(&self, id: UserId) -> Result<User, LedgerError>;

    fn user_by_email(&self, email: &str) -> Result<User, LedgerError>;

    fn user_exists(&self, id: UserId) -> bool;

    /// Attach an account to a user; each account may be linked once per user
    fn link_account(&self, user: UserId, account: &str) -> Result<(), LedgerError>;

    /// All users sorted by id
    fn users(&self) -> Vec<User>;
}
