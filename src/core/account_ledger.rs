//! Account ledger module
//!
//! This module provides the `AccountLedger` struct which owns every account
//! record and enforces the balance rules:
//! - balances never go negative
//! - closed accounts accept no deposits or withdrawals
//! - an account can only be closed with a zero balance
//!
//! # Thread Safety
//!
//! Accounts live in a `DashMap` keyed by account id, each behind its own
//! `Mutex`. A lookup clones the account's `Arc` and releases the shard lock
//! before the mutex is taken, so the check-status / compare-balance / mutate /
//! stamp sequence of one account never blocks operations on other accounts
//! and never interleaves with another mutation of the same account.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use dashmap::DashMap;
use log::debug;
use rust_decimal::Decimal;

use crate::core::traits::Ledger;
use crate::types::{Account, AccountId, AccountStatus, Amount, LedgerError};

type AccountSlot = Arc<Mutex<Account>>;

/// Thread-safe owner of all account records
#[derive(Debug, Default)]
pub struct AccountLedger {
    accounts: DashMap<AccountId, AccountSlot>,
}

impl AccountLedger {
    pub fn new() -> Self {
        AccountLedger {
            accounts: DashMap::new(),
        }
    }

    /// Number of accounts ever opened (closed ones included)
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn slot(&self, id: &str) -> Result<AccountSlot, LedgerError> {
        self.accounts
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    /// Run `f` against the account while holding its lock
    fn with_account<T, F>(&self, id: &str, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<T, LedgerError>,
    {
        let slot = self.slot(id)?;
        let mut account = lock(&slot);
        f(&mut account)
    }
}

fn lock(slot: &Mutex<Account>) -> MutexGuard<'_, Account> {
    // Mutations validate before writing; a poisoned account is still whole.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn require_positive(amount: Amount) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_amount(amount));
    }
    Ok(())
}

fn require_active(account: &Account) -> Result<(), LedgerError> {
    if !account.is_active() {
        return Err(LedgerError::inactive_account(&account.id, account.status));
    }
    Ok(())
}

fn require_field(name: &str, value: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        return Err(LedgerError::invalid_input(format!("{name} must not be empty")));
    }
    Ok(())
}

impl Ledger for AccountLedger {
    /// Open a new account
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the id, holder or category is empty
    /// - `AccountExists` if the id is already taken (closed accounts included)
    fn create(&self, id: &str, holder: &str, category: &str) -> Result<Account, LedgerError> {
        require_field("account id", id)?;
        require_field("holder name", holder)?;
        require_field("account type", category)?;

        let mut created = None;
        let slot = self.accounts.entry(id.to_string()).or_insert_with(|| {
            let account = Account::new(id.to_string(), holder.to_string(), category.to_string());
            created = Some(account.clone());
            Arc::new(Mutex::new(account))
        });
        drop(slot);

        match created {
            Some(account) => {
                debug!("Opened {} account {} for {}", category, id, holder);
                Ok(account)
            }
            None => Err(LedgerError::account_exists(id)),
        }
    }

    /// Credit funds to an account
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `AccountNotFound` if the id is unknown
    /// - `InactiveAccount` if the account is closed
    /// - `ArithmeticOverflow` if the balance would overflow
    fn deposit(&self, id: &str, amount: Amount) -> Result<Amount, LedgerError> {
        require_positive(amount)?;

        self.with_account(id, |account| {
            require_active(account)?;

            let new_balance = account
                .balance
                .checked_add(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("deposit", id))?;

            account.balance = new_balance;
            account.updated_at = Utc::now();
            Ok(new_balance)
        })
    }

    /// Debit funds from an account
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `AccountNotFound` if the id is unknown
    /// - `InactiveAccount` if the account is closed
    /// - `InsufficientFunds` if the balance is lower than `amount`
    fn withdraw(&self, id: &str, amount: Amount) -> Result<Amount, LedgerError> {
        require_positive(amount)?;

        self.with_account(id, |account| {
            require_active(account)?;

            if account.balance < amount {
                return Err(LedgerError::insufficient_funds(
                    id,
                    account.balance,
                    amount,
                ));
            }

            account.balance -= amount;
            account.updated_at = Utc::now();
            Ok(account.balance)
        })
    }

    fn balance(&self, id: &str) -> Result<Amount, LedgerError> {
        self.with_account(id, |account| Ok(account.balance))
    }

    fn details(&self, id: &str) -> Result<Account, LedgerError> {
        self.with_account(id, |account| Ok(account.clone()))
    }

    /// Close an account
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the id is unknown
    /// - `InactiveAccount` if the account is already closed
    /// - `NonZeroBalance` if the balance is not exactly zero
    fn close(&self, id: &str) -> Result<(), LedgerError> {
        self.with_account(id, |account| {
            require_active(account)?;

            if !account.balance.is_zero() {
                return Err(LedgerError::non_zero_balance(id, account.balance));
            }

            account.status = AccountStatus::Closed;
            account.updated_at = Utc::now();
            debug!("Closed account {}", id);
            Ok(())
        })
    }

    fn accounts(&self) -> Vec<Account> {
        let slots: Vec<AccountSlot> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut accounts: Vec<Account> = slots.iter().map(|slot| lock(slot).clone()).collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        accounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;
    use rstest::{fixture, rstest};
    use std::thread;

    #[fixture]
    fn ledger() -> AccountLedger {
        let ledger = AccountLedger::new();
        ledger.create("ACC001", "Jane Doe", "Savings").unwrap();
        ledger
    }

    #[test]
    fn test_create_starts_at_zero_and_active() {
        let ledger = AccountLedger::new();

        let account = ledger.create("ACC001", "Jane Doe", "Savings").unwrap();

        assert_eq!(account.id, "ACC001");
        assert_eq!(account.holder, "Jane Doe");
        assert_eq!(account.category, "Savings");
        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(ledger.len(), 1);
    }

    #[rstest]
    #[case::empty_id("", "Jane Doe", "Savings")]
    #[case::blank_id("   ", "Jane Doe", "Savings")]
    #[case::empty_holder("ACC002", "", "Savings")]
    #[case::empty_category("ACC002", "Jane Doe", "")]
    fn test_create_rejects_missing_fields(
        #[case] id: &str,
        #[case] holder: &str,
        #[case] category: &str,
    ) {
        let ledger = AccountLedger::new();

        let err = ledger.create(id, holder, category).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(ledger.is_empty());
    }

    #[rstest]
    fn test_create_rejects_duplicate_id(ledger: AccountLedger) {
        let err = ledger.create("ACC001", "John Roe", "Current").unwrap_err();

        assert_eq!(err, LedgerError::account_exists("ACC001"));
        // The original holder is untouched
        assert_eq!(ledger.details("ACC001").unwrap().holder, "Jane Doe");
    }

    #[rstest]
    fn test_deposit_increases_balance(ledger: AccountLedger) {
        let balance = ledger.deposit("ACC001", Decimal::new(10050, 2)).unwrap();

        assert_eq!(balance, Decimal::new(10050, 2));
        assert_eq!(ledger.balance("ACC001").unwrap(), Decimal::new(10050, 2));
    }

    #[rstest]
    fn test_deposit_refreshes_updated_timestamp(ledger: AccountLedger) {
        let before = ledger.details("ACC001").unwrap();

        ledger.deposit("ACC001", Decimal::ONE).unwrap();

        let after = ledger.details("ACC001").unwrap();
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(after.created_at, before.created_at);
    }

    #[rstest]
    #[case::zero(Decimal::ZERO)]
    #[case::negative(Decimal::new(-100, 2))]
    fn test_non_positive_amounts_are_rejected(ledger: AccountLedger, #[case] amount: Decimal) {
        assert_eq!(
            ledger.deposit("ACC001", amount).unwrap_err(),
            LedgerError::invalid_amount(amount)
        );
        assert_eq!(
            ledger.withdraw("ACC001", amount).unwrap_err(),
            LedgerError::invalid_amount(amount)
        );
        assert_eq!(ledger.balance("ACC001").unwrap(), Decimal::ZERO);
    }

    #[rstest]
    fn test_unknown_account_is_not_found(ledger: AccountLedger) {
        for err in [
            ledger.deposit("NOPE", Decimal::ONE).unwrap_err(),
            ledger.withdraw("NOPE", Decimal::ONE).unwrap_err(),
            ledger.balance("NOPE").unwrap_err(),
            ledger.details("NOPE").map(|_| ()).unwrap_err(),
            ledger.close("NOPE").unwrap_err(),
        ] {
            assert_eq!(err, LedgerError::account_not_found("NOPE"));
        }
    }

    #[rstest]
    fn test_withdraw_decreases_balance(ledger: AccountLedger) {
        ledger.deposit("ACC001", Decimal::new(1000, 0)).unwrap();

        let balance = ledger.withdraw("ACC001", Decimal::new(200, 0)).unwrap();

        assert_eq!(balance, Decimal::new(800, 0));
    }

    #[rstest]
    fn test_withdraw_insufficient_funds_leaves_balance(ledger: AccountLedger) {
        ledger.deposit("ACC001", Decimal::new(50, 0)).unwrap();

        let err = ledger.withdraw("ACC001", Decimal::new(5001, 2)).unwrap_err();

        assert_eq!(
            err,
            LedgerError::insufficient_funds("ACC001", Decimal::new(50, 0), Decimal::new(5001, 2))
        );
        assert_eq!(ledger.balance("ACC001").unwrap(), Decimal::new(50, 0));
    }

    #[rstest]
    fn test_withdraw_entire_balance(ledger: AccountLedger) {
        ledger.deposit("ACC001", Decimal::new(75, 0)).unwrap();

        let balance = ledger.withdraw("ACC001", Decimal::new(75, 0)).unwrap();

        assert!(balance.is_zero());
    }

    #[rstest]
    fn test_deposit_then_withdraw_has_no_drift(ledger: AccountLedger) {
        ledger.deposit("ACC001", Decimal::new(1234, 2)).unwrap();
        let before = ledger.balance("ACC001").unwrap();

        for _ in 0..1000 {
            ledger.deposit("ACC001", Decimal::new(1, 2)).unwrap();
            ledger.withdraw("ACC001", Decimal::new(1, 2)).unwrap();
        }

        assert_eq!(ledger.balance("ACC001").unwrap(), before);
    }

    #[rstest]
    fn test_deposit_overflow_is_reported(ledger: AccountLedger) {
        ledger.deposit("ACC001", Decimal::MAX).unwrap();

        let err = ledger.deposit("ACC001", Decimal::ONE).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ArithmeticOverflow);
        assert_eq!(ledger.balance("ACC001").unwrap(), Decimal::MAX);
    }

    #[rstest]
    fn test_close_with_balance_fails(ledger: AccountLedger) {
        ledger.deposit("ACC001", Decimal::new(1, 2)).unwrap();

        let err = ledger.close("ACC001").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NonZeroBalance);
        assert!(ledger.details("ACC001").unwrap().is_active());
    }

    #[rstest]
    fn test_closed_account_rejects_mutations(ledger: AccountLedger) {
        ledger.close("ACC001").unwrap();

        let closed = LedgerError::inactive_account("ACC001", AccountStatus::Closed);
        assert_eq!(ledger.deposit("ACC001", Decimal::ONE).unwrap_err(), closed);
        assert_eq!(ledger.withdraw("ACC001", Decimal::ONE).unwrap_err(), closed);
        assert_eq!(ledger.close("ACC001").unwrap_err(), closed);

        // Closed accounts are kept, not removed
        let account = ledger.details("ACC001").unwrap();
        assert_eq!(account.status, AccountStatus::Closed);
        assert_eq!(ledger.accounts().len(), 1);
    }

    #[test]
    fn test_accounts_sorted_by_id() {
        let ledger = AccountLedger::new();
        ledger.create("C", "Holder", "Savings").unwrap();
        ledger.create("A", "Holder", "Savings").unwrap();
        ledger.create("B", "Holder", "Current").unwrap();

        let ids: Vec<String> = ledger.accounts().into_iter().map(|a| a.id).collect();

        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[rstest]
    fn test_concurrent_withdrawals_never_overdraw(ledger: AccountLedger) {
        ledger.deposit("ACC001", Decimal::new(100, 0)).unwrap();
        let ledger = Arc::new(ledger);

        let successes: usize = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let ledger = Arc::clone(&ledger);
                    scope.spawn(move || {
                        (0..50)
                            .filter(|_| ledger.withdraw("ACC001", Decimal::ONE).is_ok())
                            .count()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(successes, 100);
        assert_eq!(ledger.balance("ACC001").unwrap(), Decimal::ZERO);
    }

    #[rstest]
    fn test_concurrent_deposits_are_not_lost(ledger: AccountLedger) {
        let ledger = Arc::new(ledger);

        thread::scope(|scope| {
            for _ in 0..8 {
                let ledger = Arc::clone(&ledger);
                scope.spawn(move || {
                    for _ in 0..125 {
                        ledger.deposit("ACC001", Decimal::new(10, 2)).unwrap();
                    }
                });
            }
        });

        assert_eq!(ledger.balance("ACC001").unwrap(), Decimal::new(100, 0));
    }
}
