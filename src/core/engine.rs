//! Banking engine
//!
//! This module provides the `BankingEngine`, which orchestrates the account
//! ledger, the transaction journal and the user directory.
//!
//! The engine enforces the cross-component rules:
//! - accounts are opened only for existing users and linked to them
//! - every successful balance change is followed by a journal entry
//! - a transfer either moves the funds and writes one TRANSFER entry, or
//!   leaves both balances where they were
//!
//! # Journal Writes
//!
//! The ledger is authoritative. If the journal rejects an entry after the
//! ledger has already moved money, the mutation stands: the failure is logged
//! at `warn` and handed back on the receipt instead of being raised.
//!
//! # Transfers
//!
//! A transfer locks both accounts (ascending id order), withdraws from the
//! source, then deposits into the destination. If the deposit fails the
//! withdrawn funds are re-deposited into the source, retrying with
//! exponential backoff per `CompensationPolicy`. Running out of retries is the
//! one fatal condition in the engine: it is logged at `error` and returned as
//! `LedgerError::CompensationFailed`.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, warn};

use crate::core::account_ledger::AccountLedger;
use crate::core::directory::UserDirectory;
use crate::core::journal::TransactionJournal;
use crate::core::locks::AccountLocks;
use crate::core::traits::{Directory, Journal, Ledger};
use crate::types::{
    Account, AccountId, Amount, LedgerError, NewUser, Operation, Transaction,
    TransactionRequest, TransactionStatus, TransactionSummary, User, UserId,
};

/// Upper bound for the delay between two compensation attempts
const MAX_BACKOFF: Duration = Duration::from_secs(1);

/// Retry policy for the compensating re-deposit of a failed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompensationPolicy {
    /// Total number of re-deposit attempts before giving up
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubled after each further one
    pub initial_backoff: Duration,
}

impl Default for CompensationPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(10),
        }
    }
}

impl CompensationPolicy {
    /// Create a policy, falling back to the default attempt count for zero
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        let default = Self::default();

        let max_attempts = if max_attempts == 0 {
            warn!(
                "Invalid compensation attempts ({}), using default ({})",
                max_attempts, default.max_attempts
            );
            default.max_attempts
        } else {
            max_attempts
        };

        Self {
            max_attempts,
            initial_backoff: initial_backoff.min(MAX_BACKOFF),
        }
    }
}

/// Outcome of a successful balance-changing operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationReceipt {
    /// The account the balance refers to (the source, for transfers)
    pub account: AccountId,

    /// Balance of `account` right after the operation
    pub balance: Amount,

    /// The journal entry, if it could be written
    pub transaction: Option<Transaction>,

    /// Why the journal entry is missing; the money movement still happened
    pub journal_error: Option<LedgerError>,
}

impl OperationReceipt {
    pub fn is_journaled(&self) -> bool {
        self.transaction.is_some()
    }
}

/// Orchestrator over the ledger, journal and directory
pub struct BankingEngine {
    ledger: Arc<dyn Ledger>,
    journal: Arc<dyn Journal>,
    directory: Arc<dyn Directory>,
    locks: AccountLocks,
    compensation: CompensationPolicy,
}

impl BankingEngine {
    /// Create an engine wired to fresh in-memory components
    pub fn new() -> Self {
        Self::with_policy(CompensationPolicy::default())
    }

    pub fn with_policy(compensation: CompensationPolicy) -> Self {
        let ledger: Arc<dyn Ledger> = Arc::new(AccountLedger::new());
        let journal = Arc::new(TransactionJournal::new(Arc::clone(&ledger)));
        let directory = Arc::new(UserDirectory::new());
        Self::from_parts(ledger, journal, directory, compensation)
    }

    /// Create an engine over caller-supplied components
    pub fn from_parts(
        ledger: Arc<dyn Ledger>,
        journal: Arc<dyn Journal>,
        directory: Arc<dyn Directory>,
        compensation: CompensationPolicy,
    ) -> Self {
        BankingEngine {
            ledger,
            journal,
            directory,
            locks: AccountLocks::new(),
            compensation,
        }
    }

    pub fn compensation_policy(&self) -> CompensationPolicy {
        self.compensation
    }

    pub fn create_user(&self, user: NewUser) -> Result<User, LedgerError> {
        self.directory.create_user(user)
    }

    pub fn user(&self, id: UserId) -> Result<User, LedgerError> {
        self.directory.user(id)
    }

    pub fn user_by_email(&self, email: &str) -> Result<User, LedgerError> {
        self.directory.user_by_email(email)
    }

    pub fn users(&self) -> Vec<User> {
        self.directory.users()
    }

    /// Accounts linked to a user, in link order
    pub fn user_accounts(&self, user: UserId) -> Result<Vec<Account>, LedgerError> {
        let user = self.directory.user(user)?;
        Ok(user
            .accounts
            .iter()
            .filter_map(|account| self.ledger.details(account).ok())
            .collect())
    }

    /// Open an account for an existing user and link it to them
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the user does not exist
    /// - any ledger `create` error
    /// - any directory `link_account` error
    pub fn create_account(
        &self,
        id: &str,
        holder: &str,
        category: &str,
        user: UserId,
    ) -> Result<Account, LedgerError> {
        if !self.directory.user_exists(user) {
            return Err(LedgerError::user_not_found(user));
        }

        let account = self.ledger.create(id, holder, category)?;
        self.directory.link_account(user, id)?;

        debug!("Account {} linked to user {}", id, user);
        Ok(account)
    }

    pub fn balance(&self, account: &str) -> Result<Amount, LedgerError> {
        self.ledger.balance(account)
    }

    pub fn account(&self, account: &str) -> Result<Account, LedgerError> {
        self.ledger.details(account)
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.ledger.accounts()
    }

    /// Close a zero-balance account
    ///
    /// Holds the account lock so a close can't slip in between a transfer's
    /// withdraw and its compensating re-deposit.
    pub fn close_account(&self, account: &str) -> Result<(), LedgerError> {
        let locks = self.locks.acquire(&[account]);
        let _held = locks.lock();
        self.ledger.close(account)
    }

    /// Deposit funds and journal a DEPOSIT entry
    ///
    /// # Errors
    ///
    /// Ledger errors only; a failed journal write is reported on the receipt.
    pub fn deposit(&self, account: &str, amount: Amount) -> Result<OperationReceipt, LedgerError> {
        let locks = self.locks.acquire(&[account]);
        let _held = locks.lock();

        let balance = self.ledger.deposit(account, amount)?;
        debug!("Deposited {} to {}", amount, account);

        Ok(self.receipt(
            account,
            balance,
            TransactionRequest::deposit(account, amount),
        ))
    }

    /// Withdraw funds and journal a WITHDRAWAL entry
    ///
    /// # Errors
    ///
    /// Ledger errors only; a failed journal write is reported on the receipt.
    pub fn withdraw(
        &self,
        account: &str,
        amount: Amount,
    ) -> Result<OperationReceipt, LedgerError> {
        let locks = self.locks.acquire(&[account]);
        let _held = locks.lock();

        let balance = self.ledger.withdraw(account, amount)?;
        debug!("Withdrew {} from {}", amount, account);

        Ok(self.receipt(
            account,
            balance,
            TransactionRequest::withdrawal(account, amount),
        ))
    }

    /// Move funds between two accounts and journal one TRANSFER entry
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `from == to`
    /// - any error from the source withdrawal, with nothing changed
    /// - any error from the destination deposit, after the source has been
    ///   restored
    /// - `CompensationFailed` if the source could not be restored
    pub fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<OperationReceipt, LedgerError> {
        if from == to {
            return Err(LedgerError::invalid_input(format!(
                "cannot transfer from account {} to itself",
                from
            )));
        }

        let locks = self.locks.acquire(&[from, to]);
        let _held = locks.lock();

        let balance = self.ledger.withdraw(from, amount)?;

        if let Err(cause) = self.ledger.deposit(to, amount) {
            self.compensate(from, amount, &cause)?;
            return Err(cause);
        }
        debug!("Transferred {} from {} to {}", amount, from, to);

        Ok(self.receipt(
            from,
            balance,
            TransactionRequest::transfer(from, to, amount),
        ))
    }

    /// Return withdrawn funds to the source of a failed transfer
    fn compensate(
        &self,
        account: &str,
        amount: Amount,
        cause: &LedgerError,
    ) -> Result<(), LedgerError> {
        let policy = self.compensation;
        let mut backoff = policy.initial_backoff;

        for attempt in 1..=policy.max_attempts {
            match self.ledger.deposit(account, amount) {
                Ok(_) => {
                    warn!(
                        "Transfer from {} failed ({}); restored {} after {} attempt(s)",
                        account, cause, amount, attempt
                    );
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        "Compensation attempt {}/{} for {} on {} failed: {}",
                        attempt, policy.max_attempts, amount, account, e
                    );
                    if attempt < policy.max_attempts {
                        thread::sleep(backoff);
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }
        }

        let failure = LedgerError::compensation_failed(
            account,
            amount,
            policy.max_attempts,
            cause.clone(),
        );
        error!("{}", failure);
        Err(failure)
    }

    /// Build a receipt, writing the journal entry on a best-effort basis
    fn receipt(
        &self,
        account: &str,
        balance: Amount,
        request: TransactionRequest,
    ) -> OperationReceipt {
        let tx_type = request.tx_type;
        let (transaction, journal_error) = match self.journal.record(request) {
            Ok(transaction) => (Some(transaction), None),
            Err(e) => {
                warn!(
                    "Failed to record {} transaction for {}: {}",
                    tx_type, account, e
                );
                (None, Some(e))
            }
        };

        OperationReceipt {
            account: account.to_string(),
            balance,
            transaction,
            journal_error,
        }
    }

    pub fn transaction(&self, id: &str) -> Result<Transaction, LedgerError> {
        self.journal.get(id)
    }

    /// Journal entries touching an account, oldest first
    pub fn transactions_for_account(&self, account: &str) -> Vec<Transaction> {
        self.journal.by_account(account)
    }

    /// Journal entries touching any of a user's accounts, oldest first
    ///
    /// A transfer between two of the user's own accounts appears once.
    pub fn transactions_for_user(&self, user: UserId) -> Result<Vec<Transaction>, LedgerError> {
        let user = self.directory.user(user)?;

        let mut transactions: Vec<Transaction> = user
            .accounts
            .iter()
            .flat_map(|account| self.journal.by_account(account))
            .collect();
        transactions.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.sequence.cmp(&b.sequence))
        });
        transactions.dedup_by(|a, b| a.id == b.id);
        Ok(transactions)
    }

    pub fn all_transactions(&self) -> Vec<Transaction> {
        self.journal.all()
    }

    /// Per-account rollup of completed journal entries
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if a total leaves the `Decimal` range.
    pub fn summary(&self, account: &str) -> Result<TransactionSummary, LedgerError> {
        self.journal.summarize(account)
    }

    pub fn update_transaction_status(
        &self,
        id: &str,
        status: TransactionStatus,
    ) -> Result<(), LedgerError> {
        self.journal.update_status(id, status)
    }

    /// Mark a journal entry as cancelled
    ///
    /// Only the entry's status changes; balances are not touched.
    pub fn cancel_transaction(&self, id: &str) -> Result<(), LedgerError> {
        self.journal.update_status(id, TransactionStatus::Cancelled)
    }
}

impl BankingEngine {
    /// Apply one replay operation
    ///
    /// # Errors
    ///
    /// Whatever the underlying engine operation returns.
    pub fn apply(&self, operation: Operation) -> Result<(), LedgerError> {
        match operation {
            Operation::CreateUser {
                first_name,
                last_name,
                email,
            } => {
                self.create_user(NewUser::new(&first_name, &last_name, &email))?;
            }
            Operation::OpenAccount {
                account,
                email,
                holder,
                category,
            } => {
                let user = self.user_by_email(&email)?;
                let holder = if holder.is_empty() {
                    user.full_name()
                } else {
                    holder
                };
                self.create_account(&account, &holder, &category, user.id)?;
            }
            Operation::Deposit { account, amount } => {
                self.deposit(&account, amount)?;
            }
            Operation::Withdraw { account, amount } => {
                self.withdraw(&account, amount)?;
            }
            Operation::Transfer { from, to, amount } => {
                self.transfer(&from, &to, amount)?;
            }
            Operation::Close { account } => self.close_account(&account)?,
        }
        Ok(())
    }
}

impl Default for BankingEngine {
    fn default() -> Self {
        Self::new()
    }
}
