use std::fmt;

use super::account::{AccountId, Amount};

/// One step of a replay script, validated and ready for the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateUser {
        first_name: String,
        last_name: String,
        email: String,
    },
    /// Open `account` for the user registered under `email`
    ///
    /// An empty `holder` means the user's full name.
    OpenAccount {
        account: AccountId,
        email: String,
        holder: String,
        category: String,
    },
    Deposit {
        account: AccountId,
        amount: Amount,
    },
    Withdraw {
        account: AccountId,
        amount: Amount,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    Close {
        account: AccountId,
    },
}

/// State an operation reads or writes, used to group independent operations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationKey {
    Account(AccountId),
    /// Lower-cased e-mail of a directory entry
    User(String),
}

impl Operation {
    /// Every key this operation touches
    pub fn keys(&self) -> Vec<OperationKey> {
        match self {
            Operation::CreateUser { email, .. } => vec![OperationKey::User(email.to_lowercase())],
            Operation::OpenAccount { account, email, .. } => vec![
                OperationKey::Account(account.clone()),
                OperationKey::User(email.to_lowercase()),
            ],
            Operation::Deposit { account, .. }
            | Operation::Withdraw { account, .. }
            | Operation::Close { account } => vec![OperationKey::Account(account.clone())],
            Operation::Transfer { from, to, .. } => vec![
                OperationKey::Account(from.clone()),
                OperationKey::Account(to.clone()),
            ],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateUser { email, .. } => write!(f, "user {}", email),
            Operation::OpenAccount { account, email, .. } => {
                write!(f, "open {} for {}", account, email)
            }
            Operation::Deposit { account, amount } => write!(f, "deposit {} to {}", amount, account),
            Operation::Withdraw { account, amount } => {
                write!(f, "withdraw {} from {}", amount, account)
            }
            Operation::Transfer { from, to, amount } => {
                write!(f, "transfer {} from {} to {}", amount, from, to)
            }
            Operation::Close { account } => write!(f, "close {}", account),
        }
    }
}
