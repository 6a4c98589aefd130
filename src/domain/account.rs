use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Money;

pub type AccountId = i64;
pub type Phone = String;

/// A phone-identified balance holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Sequential identifier, starting at 1 and never reused
    pub id: AccountId,
    /// Unique across all accounts
    pub phone: Phone,
    /// Current balance in minor units
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(id: AccountId, phone: impl Into<Phone>) -> Self {
        Self {
            id,
            phone: phone.into(),
            balance: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_balance(mut self, balance: Money) -> Self {
        self.balance = balance;
        self
    }

    pub fn can_afford(&self, amount: Money) -> bool {
        self.balance >= amount
    }
}

/// Normalize user input into a phone number; `None` if nothing is left.
pub fn normalize_phone(input: &str) -> Option<Phone> {
    let phone = input.trim();
    if phone.is_empty() {
        None
    } else {
        Some(phone.to_string())
    }
}
