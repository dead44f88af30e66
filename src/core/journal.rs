//! Transaction journal
//!
//! This module provides the `TransactionJournal`, the append-only record of
//! every balance-affecting operation. The journal never mutates balances; it
//! reads the ledger once per entry to snapshot the resulting balance.
//!
//! # Identifiers
//!
//! Entry ids come from an atomic sequence (`TXN000000000001`, ...) so they are
//! unique for the lifetime of the process even under concurrent appends.
//! Reference numbers are `REF-` followed by a UUIDv7.
//!
//! # Ordering
//!
//! Entries are stored in a hash map, so every query sorts its result by
//! timestamp and then by sequence before returning it.
//!
//! # Empty Results
//!
//! Listing queries return an empty vector when nothing matches; only lookups
//! of a single entry by id report `TransactionNotFound`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::traits::{Journal, Ledger};
use crate::types::{
    LedgerError, Transaction, TransactionId, TransactionRequest, TransactionStatus,
    TransactionSummary, TransactionType,
};

/// Thread-safe append-only transaction journal
pub struct TransactionJournal {
    transactions: DashMap<TransactionId, Transaction>,
    sequence: AtomicU64,

    /// Read-only view of balances for `balance_after` snapshots
    ledger: Arc<dyn Ledger>,
}

impl TransactionJournal {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        TransactionJournal {
            transactions: DashMap::new(),
            sequence: AtomicU64::new(0),
            ledger,
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    fn collect_sorted<P>(&self, predicate: P) -> Vec<Transaction>
    where
        P: Fn(&Transaction) -> bool,
    {
        let mut matching: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a.sequence.cmp(&b.sequence))
        });
        matching
    }
}

/// Reject requests whose account shape does not fit their type
fn validate(request: &TransactionRequest) -> Result<(), LedgerError> {
    if request.amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_amount(request.amount));
    }

    let tx_type = request.tx_type;
    let has_from = request.from.as_deref().is_some_and(|a| !a.is_empty());
    let has_to = request.to.as_deref().is_some_and(|a| !a.is_empty());

    if has_from != tx_type.has_source() || has_to != tx_type.has_destination() {
        return Err(LedgerError::invalid_input(format!(
            "{} requires {}",
            tx_type,
            match tx_type {
                TransactionType::Transfer => "both a source and a destination account",
                TransactionType::Deposit | TransactionType::Interest => {
                    "a destination account only"
                }
                TransactionType::Withdrawal | TransactionType::Fee => "a source account only",
            }
        )));
    }

    if tx_type == TransactionType::Transfer && request.from == request.to {
        return Err(LedgerError::invalid_input(
            "TRANSFER source and destination must differ",
        ));
    }

    if request.fee < Decimal::ZERO {
        return Err(LedgerError::invalid_input("fee must not be negative"));
    }

    Ok(())
}

impl Journal for TransactionJournal {
    /// Append an entry to the journal
    ///
    /// The caller must already have applied the ledger mutation; the entry's
    /// `balance_after` is the balance read from the ledger right now.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `InvalidInput` if the source/destination accounts don't fit the type
    fn record(&self, request: TransactionRequest) -> Result<Transaction, LedgerError> {
        validate(&request)?;

        let balance_after = request
            .balance_account()
            .and_then(|account| self.ledger.balance(account).ok());

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let transaction = Transaction {
            id: format!("TXN{sequence:012}"),
            sequence,
            tx_type: request.tx_type,
            status: request.status,
            from: request.from,
            to: request.to,
            amount: request.amount,
            timestamp: Utc::now(),
            description: request.description,
            reference: format!("REF-{}", Uuid::now_v7().simple()),
            balance_after,
            fee: request.fee,
        };

        self.transactions
            .insert(transaction.id.clone(), transaction.clone());

        Ok(transaction)
    }

    fn get(&self, id: &str) -> Result<Transaction, LedgerError> {
        self.transactions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::transaction_not_found(id))
    }

    fn by_account(&self, account: &str) -> Vec<Transaction> {
        self.collect_sorted(|tx| tx.touches(account))
    }

    fn by_type(&self, tx_type: TransactionType) -> Vec<Transaction> {
        self.collect_sorted(|tx| tx.tx_type == tx_type)
    }

    fn by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Transaction> {
        self.collect_sorted(|tx| tx.timestamp >= start && tx.timestamp <= end)
    }

    fn all(&self) -> Vec<Transaction> {
        self.collect_sorted(|_| true)
    }

    /// Change the status of an entry
    ///
    /// Any transition is accepted here; callers enforce their own rules.
    fn update_status(&self, id: &str, status: TransactionStatus) -> Result<(), LedgerError> {
        let mut entry = self
            .transactions
            .get_mut(id)
            .ok_or_else(|| LedgerError::transaction_not_found(id))?;
        entry.status = status;
        Ok(())
    }

    /// Fold the `Completed` entries touching an account into a summary
    ///
    /// Transfers count as "out" when the account is the source and "in" when
    /// it is the destination. Interest entries are counted but not totalled.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if a running total leaves the `Decimal`
    /// range, which gross totals can do while every balance stays in range.
    fn summarize(&self, account: &str) -> Result<TransactionSummary, LedgerError> {
        let overflow = || LedgerError::arithmetic_overflow("summary", account);

        self.by_account(account)
            .into_iter()
            .filter(|tx| tx.status == TransactionStatus::Completed)
            .try_fold(TransactionSummary::empty(account), |mut summary, tx| {
                let total = match tx.tx_type {
                    TransactionType::Deposit => Some(&mut summary.total_deposits),
                    TransactionType::Withdrawal => Some(&mut summary.total_withdrawals),
                    TransactionType::Transfer if tx.from.as_deref() == Some(account) => {
                        Some(&mut summary.total_transfers_out)
                    }
                    TransactionType::Transfer => Some(&mut summary.total_transfers_in),
                    TransactionType::Fee => Some(&mut summary.total_fees),
                    TransactionType::Interest => None,
                };
                if let Some(total) = total {
                    *total = total.checked_add(tx.amount).ok_or_else(overflow)?;
                }
                summary.transaction_count += 1;
                if summary.last_transaction.is_none_or(|last| tx.timestamp > last) {
                    summary.last_transaction = Some(tx.timestamp);
                }
                Ok(summary)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account_ledger::AccountLedger;
    use crate::types::ErrorKind;
    use rstest::{fixture, rstest};
    use std::collections::HashSet;
    use std::thread;

    struct Setup {
        ledger: Arc<AccountLedger>,
        journal: TransactionJournal,
    }

    #[fixture]
    fn setup() -> Setup {
        let ledger = Arc::new(AccountLedger::new());
        ledger.create("A1", "Jane Doe", "Savings").unwrap();
        ledger.create("A2", "John Roe", "Current").unwrap();
        let journal = TransactionJournal::new(ledger.clone());
        Setup { ledger, journal }
    }

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    #[rstest]
    fn test_record_assigns_ids_and_completes(setup: Setup) {
        setup.ledger.deposit("A1", dec(1000)).unwrap();

        let tx = setup
            .journal
            .record(TransactionRequest::deposit("A1", dec(1000)))
            .unwrap();

        assert_eq!(tx.id, "TXN000000000001");
        assert_eq!(tx.sequence, 1);
        assert!(tx.reference.starts_with("REF-"));
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.balance_after, Some(dec(1000)));
        assert_eq!(tx.description, "Cash deposit");
        assert_eq!(setup.journal.get(&tx.id).unwrap(), tx);
    }

    #[rstest]
    fn test_balance_snapshot_reads_current_balance(setup: Setup) {
        setup.ledger.deposit("A1", dec(1000)).unwrap();
        setup.ledger.withdraw("A1", dec(300)).unwrap();

        let withdrawal = setup
            .journal
            .record(TransactionRequest::withdrawal("A1", dec(300)))
            .unwrap();
        assert_eq!(withdrawal.balance_after, Some(dec(700)));

        setup.ledger.withdraw("A1", dec(100)).unwrap();
        setup.ledger.deposit("A2", dec(100)).unwrap();
        let transfer = setup
            .journal
            .record(TransactionRequest::transfer("A1", "A2", dec(100)))
            .unwrap();
        assert_eq!(transfer.balance_after, Some(dec(600)));
    }

    #[rstest]
    fn test_balance_snapshot_absent_for_unknown_account(setup: Setup) {
        let tx = setup
            .journal
            .record(TransactionRequest::deposit("GHOST", dec(5)))
            .unwrap();

        assert_eq!(tx.balance_after, None);
    }

    #[rstest]
    #[case::zero(Decimal::ZERO)]
    #[case::negative(dec(-5))]
    fn test_record_rejects_non_positive_amount(setup: Setup, #[case] amount: Decimal) {
        let err = setup
            .journal
            .record(TransactionRequest::deposit("A1", amount))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidAmount);
        assert!(setup.journal.is_empty());
    }

    #[rstest]
    #[case::deposit_with_source(TransactionType::Deposit, Some("A1"), Some("A2"))]
    #[case::deposit_without_destination(TransactionType::Deposit, None, None)]
    #[case::withdrawal_with_destination(TransactionType::Withdrawal, None, Some("A1"))]
    #[case::transfer_missing_destination(TransactionType::Transfer, Some("A1"), None)]
    #[case::transfer_to_self(TransactionType::Transfer, Some("A1"), Some("A1"))]
    #[case::fee_with_destination(TransactionType::Fee, Some("A1"), Some("A2"))]
    fn test_record_rejects_mismatched_accounts(
        setup: Setup,
        #[case] tx_type: TransactionType,
        #[case] from: Option<&str>,
        #[case] to: Option<&str>,
    ) {
        let request = TransactionRequest {
            tx_type,
            from: from.map(String::from),
            to: to.map(String::from),
            amount: dec(10),
            description: String::new(),
            fee: Decimal::ZERO,
            status: TransactionStatus::Completed,
        };

        let err = setup.journal.record(request).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[rstest]
    fn test_record_honours_requested_status(setup: Setup) {
        let tx = setup
            .journal
            .record(
                TransactionRequest::withdrawal("A1", dec(10))
                    .with_status(TransactionStatus::Failed),
            )
            .unwrap();

        assert_eq!(tx.status, TransactionStatus::Failed);
    }

    #[rstest]
    fn test_get_unknown_is_not_found(setup: Setup) {
        assert_eq!(
            setup.journal.get("TXN999").unwrap_err(),
            LedgerError::transaction_not_found("TXN999")
        );
    }

    #[rstest]
    fn test_listing_policies_return_empty(setup: Setup) {
        assert!(setup.journal.by_account("A1").is_empty());
        assert!(setup.journal.by_type(TransactionType::Fee).is_empty());
        assert!(setup
            .journal
            .by_date_range(Utc::now(), Utc::now())
            .is_empty());
        assert!(setup.journal.all().is_empty());
    }

    #[rstest]
    fn test_by_account_matches_source_or_destination_in_order(setup: Setup) {
        let j = &setup.journal;
        let d1 = j.record(TransactionRequest::deposit("A1", dec(100))).unwrap();
        let d2 = j.record(TransactionRequest::deposit("A2", dec(50))).unwrap();
        let t = j
            .record(TransactionRequest::transfer("A2", "A1", dec(20)))
            .unwrap();
        let w = j.record(TransactionRequest::withdrawal("A1", dec(5))).unwrap();

        let ids: Vec<String> = j.by_account("A1").into_iter().map(|tx| tx.id).collect();
        assert_eq!(ids, vec![d1.id, t.id.clone(), w.id]);

        let ids: Vec<String> = j.by_account("A2").into_iter().map(|tx| tx.id).collect();
        assert_eq!(ids, vec![d2.id, t.id]);
    }

    #[rstest]
    fn test_by_type_and_date_range(setup: Setup) {
        let j = &setup.journal;
        let start = Utc::now();
        j.record(TransactionRequest::deposit("A1", dec(100))).unwrap();
        let w = j.record(TransactionRequest::withdrawal("A1", dec(5))).unwrap();
        j.record(TransactionRequest::deposit("A2", dec(7))).unwrap();
        let end = Utc::now();

        assert_eq!(j.by_type(TransactionType::Deposit).len(), 2);
        assert_eq!(j.by_type(TransactionType::Withdrawal), vec![w.clone()]);
        assert_eq!(j.by_date_range(start, end).len(), 3);

        // Both ends are inclusive
        assert_eq!(
            j.by_date_range(w.timestamp, w.timestamp)
                .first()
                .map(|tx| tx.timestamp),
            Some(w.timestamp)
        );
        assert!(j.by_date_range(end, start).is_empty());
    }

    #[rstest]
    fn test_update_status_changes_only_status(setup: Setup) {
        let tx = setup
            .journal
            .record(TransactionRequest::deposit("A1", dec(100)))
            .unwrap();

        setup
            .journal
            .update_status(&tx.id, TransactionStatus::Cancelled)
            .unwrap();

        let updated = setup.journal.get(&tx.id).unwrap();
        assert_eq!(updated.status, TransactionStatus::Cancelled);
        assert_eq!(updated.amount, tx.amount);
        assert_eq!(updated.timestamp, tx.timestamp);
        assert_eq!(updated.reference, tx.reference);
        assert_eq!(
            setup
                .journal
                .update_status("TXN404", TransactionStatus::Failed)
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
    }

    #[rstest]
    fn test_summarize_folds_completed_entries(setup: Setup) {
        let j = &setup.journal;
        j.record(TransactionRequest::deposit("A1", dec(1000))).unwrap();
        j.record(TransactionRequest::deposit("A1", dec(500))).unwrap();
        j.record(TransactionRequest::withdrawal("A1", dec(200))).unwrap();
        j.record(TransactionRequest::transfer("A1", "A2", dec(150)))
            .unwrap();
        j.record(TransactionRequest::transfer("A2", "A1", dec(40)))
            .unwrap();
        let last = j.record(TransactionRequest::fee("A1", dec(3))).unwrap();
        let cancelled = j.record(TransactionRequest::deposit("A1", dec(999))).unwrap();
        j.update_status(&cancelled.id, TransactionStatus::Cancelled)
            .unwrap();

        let summary = j.summarize("A1").unwrap();

        assert_eq!(summary.account, "A1");
        assert_eq!(summary.total_deposits, dec(1500));
        assert_eq!(summary.total_withdrawals, dec(200));
        assert_eq!(summary.total_transfers_out, dec(150));
        assert_eq!(summary.total_transfers_in, dec(40));
        assert_eq!(summary.total_fees, dec(3));
        assert_eq!(summary.transaction_count, 6);
        assert_eq!(summary.last_transaction, Some(last.timestamp));
        assert_eq!(summary.net_amount().unwrap(), dec(1187));

        let other = j.summarize("A2").unwrap();
        assert_eq!(other.total_transfers_in, dec(150));
        assert_eq!(other.total_transfers_out, dec(40));
    }

    #[rstest]
    fn test_summarize_unknown_account_is_empty(setup: Setup) {
        let summary = setup.journal.summarize("NOPE").unwrap();

        assert_eq!(summary, TransactionSummary::empty("NOPE"));
    }

    #[rstest]
    fn test_summarize_reports_total_overflow(setup: Setup) {
        let j = &setup.journal;
        j.record(TransactionRequest::deposit("A1", Decimal::MAX))
            .unwrap();
        j.record(TransactionRequest::withdrawal("A1", dec(1))).unwrap();
        j.record(TransactionRequest::deposit("A1", dec(1))).unwrap();

        let err = j.summarize("A1").unwrap_err();

        assert_eq!(err, LedgerError::arithmetic_overflow("summary", "A1"));
    }

    #[rstest]
    fn test_concurrent_records_get_unique_ids(setup: Setup) {
        let journal = &setup.journal;

        let ids: Vec<String> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(move || {
                        (0..100)
                            .map(|_| {
                                journal
                                    .record(TransactionRequest::deposit("A1", Decimal::ONE))
                                    .unwrap()
                                    .id
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), 800);
        assert_eq!(journal.len(), 800);
    }
}
