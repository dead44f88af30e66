//! Transaction-related types for the retail ledger
//!
//! This module defines journal entries, the request used to create them and
//! the per-account summary folded from them.

use super::account::{AccountId, Amount};
use super::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// Transaction identifier ("TXN000000000001", ...)
pub type TransactionId = String;

/// Kinds of balance-affecting operations recorded in the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// Funds credited to the destination account
    Deposit,

    /// Funds debited from the source account
    Withdrawal,

    /// Funds moved from the source account to the destination account
    Transfer,

    /// Interest credited to the destination account
    Interest,

    /// Fee debited from the source account
    Fee,
}

impl TransactionType {
    /// Whether entries of this type carry a source account
    pub fn has_source(self) -> bool {
        matches!(
            self,
            TransactionType::Withdrawal | TransactionType::Transfer | TransactionType::Fee
        )
    }

    /// Whether entries of this type carry a destination account
    pub fn has_destination(self) -> bool {
        matches!(
            self,
            TransactionType::Deposit | TransactionType::Transfer | TransactionType::Interest
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::Interest => "INTEREST",
            TransactionType::Fee => "FEE",
        };
        f.write_str(name)
    }
}

/// Processing status of a journal entry
///
/// This is the only field of an entry that may change after it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// Request to append an entry to the journal
///
/// Built with one of the typed constructors so the source/destination shape
/// matches the transaction type; the journal validates it again on record.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    pub tx_type: TransactionType,
    pub from: Option<AccountId>,
    pub to: Option<AccountId>,
    pub amount: Amount,
    pub description: String,
    pub fee: Amount,

    /// Initial status, `Completed` unless the caller says otherwise
    pub status: TransactionStatus,
}

impl TransactionRequest {
    fn new(
        tx_type: TransactionType,
        from: Option<AccountId>,
        to: Option<AccountId>,
        amount: Amount,
        description: &str,
    ) -> Self {
        TransactionRequest {
            tx_type,
            from,
            to,
            amount,
            description: description.to_string(),
            fee: Decimal::ZERO,
            status: TransactionStatus::Completed,
        }
    }

    pub fn deposit(to: &str, amount: Amount) -> Self {
        Self::new(
            TransactionType::Deposit,
            None,
            Some(to.to_string()),
            amount,
            "Cash deposit",
        )
    }

    pub fn withdrawal(from: &str, amount: Amount) -> Self {
        Self::new(
            TransactionType::Withdrawal,
            Some(from.to_string()),
            None,
            amount,
            "Cash withdrawal",
        )
    }

    pub fn transfer(from: &str, to: &str, amount: Amount) -> Self {
        Self::new(
            TransactionType::Transfer,
            Some(from.to_string()),
            Some(to.to_string()),
            amount,
            "Fund transfer",
        )
    }

    pub fn interest(to: &str, amount: Amount) -> Self {
        Self::new(
            TransactionType::Interest,
            None,
            Some(to.to_string()),
            amount,
            "Interest credit",
        )
    }

    pub fn fee(from: &str, amount: Amount) -> Self {
        let mut request = Self::new(
            TransactionType::Fee,
            Some(from.to_string()),
            None,
            amount,
            "Service fee",
        );
        request.fee = amount;
        request
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    /// The account whose balance is snapshotted into the entry
    ///
    /// Credits snapshot the destination, everything else the source.
    pub fn balance_account(&self) -> Option<&str> {
        match self.tx_type {
            TransactionType::Deposit | TransactionType::Interest => self.to.as_deref(),
            _ => self.from.as_deref(),
        }
    }
}

/// An entry in the transaction journal
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,

    /// Position in the journal's append order, used to break timestamp ties
    pub sequence: u64,

    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub from: Option<AccountId>,
    pub to: Option<AccountId>,

    /// Always strictly positive
    pub amount: Amount,

    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub reference: String,

    /// Balance of the affected account right after the ledger mutation
    ///
    /// `None` when the account could not be read at record time.
    pub balance_after: Option<Amount>,

    pub fee: Amount,
}

impl Transaction {
    /// Whether the account appears as source or destination
    pub fn touches(&self, account: &str) -> bool {
        self.from.as_deref() == Some(account) || self.to.as_deref() == Some(account)
    }
}

/// Per-account rollup folded from `Completed` journal entries
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSummary {
    pub account: AccountId,
    pub total_deposits: Amount,
    pub total_withdrawals: Amount,
    pub total_transfers_out: Amount,
    pub total_transfers_in: Amount,
    pub total_fees: Amount,
    pub transaction_count: usize,
    pub last_transaction: Option<DateTime<Utc>>,
}

impl TransactionSummary {
    pub fn empty(account: &str) -> Self {
        TransactionSummary {
            account: account.to_string(),
            total_deposits: Decimal::ZERO,
            total_withdrawals: Decimal::ZERO,
            total_transfers_out: Decimal::ZERO,
            total_transfers_in: Decimal::ZERO,
            total_fees: Decimal::ZERO,
            transaction_count: 0,
            last_transaction: None,
        }
    }

    /// deposits + transfers in - withdrawals - transfers out - fees
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if an intermediate sum leaves the
    /// `Decimal` range.
    pub fn net_amount(&self) -> Result<Amount, LedgerError> {
        self.total_deposits
            .checked_add(self.total_transfers_in)
            .and_then(|net| net.checked_sub(self.total_withdrawals))
            .and_then(|net| net.checked_sub(self.total_transfers_out))
            .and_then(|net| net.checked_sub(self.total_fees))
            .ok_or_else(|| LedgerError::arithmetic_overflow("summary", &self.account))
    }
}
