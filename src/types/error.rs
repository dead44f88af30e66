//! Error types for the retail ledger
//!
//! This module defines every error that ledger, journal, directory and
//! orchestrator operations can report. Variants carry the identifiers involved
//! so the message is useful on its own; `LedgerError::kind` collapses them
//! into the coarse categories callers usually branch on.
//!
//! # Error Categories
//!
//! - **Lookup Errors**: missing accounts, transactions or users
//! - **Validation Errors**: empty fields, non-positive amounts
//! - **Rule Violations**: insufficient funds, closed accounts, non-zero close
//! - **Fatal**: a transfer whose compensating re-deposit could not complete

use super::account::{AccountId, AccountStatus};
use super::user::UserId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Coarse classification of a `LedgerError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidInput,
    InvalidAmount,
    InsufficientFunds,
    InactiveAccount,
    NonZeroBalance,
    AlreadyLinked,
    ArithmeticOverflow,
    CompensationFailed,
    Io,
}

/// Main error type for the retail ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Account {account} not found")]
    AccountNotFound { account: AccountId },

    #[error("Transaction {id} not found")]
    TransactionNotFound { id: String },

    /// The user key may be a numeric id or an e-mail address
    #[error("User {user} not found")]
    UserNotFound { user: String },

    #[error("Account {account} already exists")]
    AccountExists { account: AccountId },

    #[error("A user with email {email} already exists")]
    EmailExists { email: String },

    /// A required field was missing or malformed
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Amounts must be strictly positive
    #[error("Invalid amount {amount}: amount must be positive")]
    InvalidAmount { amount: Decimal },

    #[error("Insufficient funds in account {account}: balance {available}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        available: Decimal,
        requested: Decimal,
    },

    /// Deposit, withdrawal or close attempted on an account that is not active
    #[error("Account {account} is {status}")]
    InactiveAccount {
        account: AccountId,
        status: AccountStatus,
    },

    #[error("Account {account} has balance {balance}; it must be zero to close")]
    NonZeroBalance { account: AccountId, balance: Decimal },

    #[error("Account {account} is already linked to user {user}")]
    AlreadyLinked { user: UserId, account: AccountId },

    /// Decimal arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow { operation: String, account: AccountId },

    /// A transfer's deposit leg failed and the withdrawn funds could not be
    /// returned to the source account. The amount is stranded until an
    /// operator intervenes.
    #[error("Compensation failed after {attempts} attempts: {amount} withdrawn from {account} could not be restored (transfer failed with: {cause})")]
    CompensationFailed {
        account: AccountId,
        amount: Decimal,
        attempts: u32,
        cause: Box<LedgerError>,
    },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Parse { line: Option<u64>, message: String },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::Parse {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    pub fn account_not_found(account: &str) -> Self {
        LedgerError::AccountNotFound {
            account: account.to_string(),
        }
    }

    pub fn transaction_not_found(id: &str) -> Self {
        LedgerError::TransactionNotFound { id: id.to_string() }
    }

    pub fn user_not_found(user: impl ToString) -> Self {
        LedgerError::UserNotFound {
            user: user.to_string(),
        }
    }

    pub fn account_exists(account: &str) -> Self {
        LedgerError::AccountExists {
            account: account.to_string(),
        }
    }

    pub fn email_exists(email: &str) -> Self {
        LedgerError::EmailExists {
            email: email.to_string(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        LedgerError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn invalid_amount(amount: Decimal) -> Self {
        LedgerError::InvalidAmount { amount }
    }

    pub fn insufficient_funds(account: &str, available: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account: account.to_string(),
            available,
            requested,
        }
    }

    pub fn inactive_account(account: &str, status: AccountStatus) -> Self {
        LedgerError::InactiveAccount {
            account: account.to_string(),
            status,
        }
    }

    pub fn non_zero_balance(account: &str, balance: Decimal) -> Self {
        LedgerError::NonZeroBalance {
            account: account.to_string(),
            balance,
        }
    }

    pub fn already_linked(user: UserId, account: &str) -> Self {
        LedgerError::AlreadyLinked {
            user,
            account: account.to_string(),
        }
    }

    pub fn arithmetic_overflow(operation: &str, account: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }

    pub fn compensation_failed(
        account: &str,
        amount: Decimal,
        attempts: u32,
        cause: LedgerError,
    ) -> Self {
        LedgerError::CompensationFailed {
            account: account.to_string(),
            amount,
            attempts,
            cause: Box::new(cause),
        }
    }

    /// Classify this error into its coarse kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::AccountNotFound { .. }
            | LedgerError::TransactionNotFound { .. }
            | LedgerError::UserNotFound { .. } => ErrorKind::NotFound,
            LedgerError::AccountExists { .. } | LedgerError::EmailExists { .. } => {
                ErrorKind::AlreadyExists
            }
            LedgerError::InvalidInput { .. } | LedgerError::Parse { .. } => {
                ErrorKind::InvalidInput
            }
            LedgerError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::InactiveAccount { .. } => ErrorKind::InactiveAccount,
            LedgerError::NonZeroBalance { .. } => ErrorKind::NonZeroBalance,
            LedgerError::AlreadyLinked { .. } => ErrorKind::AlreadyLinked,
            LedgerError::ArithmeticOverflow { .. } => ErrorKind::ArithmeticOverflow,
            LedgerError::CompensationFailed { .. } => ErrorKind::CompensationFailed,
            LedgerError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Whether this error means funds may have been lost
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::CompensationFailed
    }
}
