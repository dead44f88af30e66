//! Account-related types for the retail ledger
//!
//! This module defines the Account structure and its lifecycle status.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// Account identifier (e.g. "ACC001")
pub type AccountId = String;

/// Monetary amount
///
/// Exact decimal arithmetic; binary floating point is never used for money.
pub type Amount = Decimal;

/// Lifecycle status of an account
///
/// The only legal transition is `Active -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountStatus {
    Active,
    Closed,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => f.write_str("Active"),
            AccountStatus::Closed => f.write_str("Closed"),
        }
    }
}

/// A customer account held in the ledger
///
/// Accounts are never removed; closing one is a terminal status change.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Globally unique account identifier
    pub id: AccountId,

    /// Name of the account holder
    pub holder: String,

    /// Open-ended account category ("Savings", "Current", ...)
    pub category: String,

    /// Current balance, never negative
    pub balance: Amount,

    pub status: AccountStatus,

    pub created_at: DateTime<Utc>,

    /// Refreshed on every balance or status change
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with a zero balance and `Active` status
    pub fn new(id: AccountId, holder: String, category: String) -> Self {
        let now = Utc::now();
        Account {
            id,
            holder,
            category,
            balance: Decimal::ZERO,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}
