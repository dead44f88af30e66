//! Directory records for bank customers

use super::account::AccountId;

/// User identifier, assigned sequentially starting at 1
pub type UserId = u32;

/// A registered customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,

    /// Unique across the directory
    pub email: String,

    pub phone: Option<String>,
    pub address: Option<String>,

    /// Linked account ids in link order
    pub accounts: Vec<AccountId>,
}

/// Registration data for a new user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl NewUser {
    pub fn new(first_name: &str, last_name: &str, email: &str) -> Self {
        NewUser {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            ..Default::default()
        }
    }
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
