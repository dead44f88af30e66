//! CSV format handling for replay scripts and reports
//!
//! This module centralizes all CSV format concerns, providing:
//! - `OperationRecord` structure for deserialization
//! - Conversion from script rows to `Operation`s
//! - Report serialization (accounts, summaries, journal)
//!
//! Conversion and serialization do no file I/O of their own.

use crate::types::{Account, Amount, Operation, Transaction, TransactionSummary};
use chrono::SecondsFormat;
use csv::Writer;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Raw row of a replay script
///
/// Columns: `op,account,target,amount,name,category,email`. Which columns an
/// operation needs depends on `op`; the rest may be empty or missing.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct OperationRecord {
    pub op: String,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Trimmed, non-empty value of an optional column
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>, column: &str, op: &str) -> Result<&'a str, String> {
    present(value).ok_or_else(|| format!("'{}' requires a value for '{}'", op, column))
}

fn parse_amount(record: &OperationRecord, op: &str) -> Result<Amount, String> {
    let raw = required(&record.amount, "amount", op)?;
    Decimal::from_str(raw).map_err(|_| format!("Invalid amount '{}' for '{}'", raw, op))
}

/// Convert a script row into an `Operation`
///
/// Operation names are case-insensitive. Amount sign and range are left to
/// the engine, which reports them as `InvalidAmount`.
///
/// # Errors
///
/// Returns a description of the problem if the operation is unknown, a
/// required column is empty, or the amount is not a decimal number.
pub fn convert_record(record: OperationRecord) -> Result<Operation, String> {
    let op = record.op.trim().to_lowercase();

    let operation = match op.as_str() {
        "user" => {
            let name = required(&record.name, "name", &op)?;
            let (first, last) = name.split_once(char::is_whitespace).unwrap_or((name, ""));
            Operation::CreateUser {
                first_name: first.to_string(),
                last_name: last.trim().to_string(),
                email: required(&record.email, "email", &op)?.to_string(),
            }
        }
        "open" => Operation::OpenAccount {
            account: required(&record.account, "account", &op)?.to_string(),
            email: required(&record.email, "email", &op)?.to_string(),
            holder: present(&record.name).unwrap_or_default().to_string(),
            category: required(&record.category, "category", &op)?.to_string(),
        },
        "deposit" => Operation::Deposit {
            account: required(&record.account, "account", &op)?.to_string(),
            amount: parse_amount(&record, &op)?,
        },
        "withdraw" | "withdrawal" => Operation::Withdraw {
            account: required(&record.account, "account", &op)?.to_string(),
            amount: parse_amount(&record, &op)?,
        },
        "transfer" => Operation::Transfer {
            from: required(&record.account, "account", &op)?.to_string(),
            to: required(&record.target, "target", &op)?.to_string(),
            amount: parse_amount(&record, &op)?,
        },
        "close" => Operation::Close {
            account: required(&record.account, "account", &op)?.to_string(),
        },
        _ => return Err(format!("Unknown operation: '{}'", record.op)),
    };

    Ok(operation)
}

fn money(amount: Amount) -> String {
    format!("{:.2}", amount)
}

fn finish<W: Write>(mut writer: Writer<W>) -> Result<(), String> {
    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

/// Write the accounts report, sorted by account id
///
/// # Errors
///
/// Returns an error string if the output cannot be written.
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "holder", "category", "balance", "status"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted: Vec<&Account> = accounts.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    for account in sorted {
        writer
            .write_record(&[
                account.id.clone(),
                account.holder.clone(),
                account.category.clone(),
                money(account.balance),
                account.status.to_string(),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    finish(writer)
}

/// Write one summary row per account, sorted by account id
///
/// # Errors
///
/// Returns an error string if the output cannot be written or a net amount
/// overflows.
pub fn write_summaries_csv(
    summaries: &[TransactionSummary],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "account",
            "deposits",
            "withdrawals",
            "transfers_in",
            "transfers_out",
            "fees",
            "count",
            "net",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted: Vec<&TransactionSummary> = summaries.iter().collect();
    sorted.sort_by(|a, b| a.account.cmp(&b.account));

    for summary in sorted {
        let net = summary
            .net_amount()
            .map_err(|e| format!("Failed to write summary record: {}", e))?;
        writer
            .write_record(&[
                summary.account.clone(),
                money(summary.total_deposits),
                money(summary.total_withdrawals),
                money(summary.total_transfers_in),
                money(summary.total_transfers_out),
                money(summary.total_fees),
                summary.transaction_count.to_string(),
                money(net),
            ])
            .map_err(|e| format!("Failed to write summary record: {}", e))?;
    }

    finish(writer)
}

/// Write journal entries in the order given
///
/// # Errors
///
/// Returns an error string if the output cannot be written.
pub fn write_journal_csv(
    transactions: &[Transaction],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "id",
            "reference",
            "type",
            "status",
            "from",
            "to",
            "amount",
            "balance_after",
            "fee",
            "timestamp",
            "description",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for tx in transactions {
        writer
            .write_record(&[
                tx.id.clone(),
                tx.reference.clone(),
                tx.tx_type.to_string(),
                tx.status.to_string(),
                tx.from.clone().unwrap_or_default(),
                tx.to.clone().unwrap_or_default(),
                money(tx.amount),
                tx.balance_after.map(money).unwrap_or_default(),
                money(tx.fee),
                tx.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                tx.description.clone(),
            ])
            .map_err(|e| format!("Failed to write journal record: {}", e))?;
    }

    finish(writer)
}
