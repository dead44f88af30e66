//! In-memory user directory
//!
//! Keeps user records keyed by a sequential id, enforces e-mail uniqueness
//! and records which accounts belong to which user.

use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;

use crate::core::traits::Directory;
use crate::types::{LedgerError, NewUser, User, UserId};

/// Thread-safe user registry
#[derive(Debug)]
pub struct UserDirectory {
    users: DashMap<UserId, User>,

    /// Lower-cased e-mail to user id; the uniqueness index
    emails: DashMap<String, UserId>,

    next_id: AtomicU32,
}

impl UserDirectory {
    pub fn new() -> Self {
        UserDirectory {
            users: DashMap::new(),
            emails: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Directory for UserDirectory {
    /// Register a user
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if first name, last name or e-mail is empty
    /// - `EmailExists` if the e-mail (case-insensitive) is already registered
    fn create_user(&self, user: NewUser) -> Result<User, LedgerError> {
        if user.first_name.trim().is_empty()
            || user.last_name.trim().is_empty()
            || user.email.trim().is_empty()
        {
            return Err(LedgerError::invalid_input(
                "first name, last name and email are required",
            ));
        }

        // The e-mail slot stays locked until the record is stored, so a
        // published e-mail always resolves to its user.
        let slot = match self.emails.entry(email_key(&user.email)) {
            Entry::Occupied(_) => return Err(LedgerError::email_exists(&user.email)),
            Entry::Vacant(slot) => slot,
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = User {
            id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email.trim().to_string(),
            phone: user.phone,
            address: user.address,
            accounts: Vec::new(),
        };
        self.users.insert(id, record.clone());
        slot.insert(id);
        debug!("Registered user {} ({})", id, record.email);

        Ok(record)
    }

    fn user(&self, id: UserId) -> Result<User, LedgerError> {
        self.users
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::user_not_found(id))
    }

    fn user_by_email(&self, email: &str) -> Result<User, LedgerError> {
        let id = self
            .emails
            .get(&email_key(email))
            .map(|entry| *entry.value())
            .ok_or_else(|| LedgerError::user_not_found(email))?;
        self.user(id)
    }

    fn user_exists(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    /// Link an account to a user
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the user does not exist
    /// - `AlreadyLinked` if the account is already linked to this user
    fn link_account(&self, user: UserId, account: &str) -> Result<(), LedgerError> {
        let mut entry = self
            .users
            .get_mut(&user)
            .ok_or_else(|| LedgerError::user_not_found(user))?;

        if entry.accounts.iter().any(|linked| linked == account) {
            return Err(LedgerError::already_linked(user, account));
        }
        entry.accounts.push(account.to_string());
        Ok(())
    }

    fn users(&self) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by_key(|user| user.id);
        users
    }
}
