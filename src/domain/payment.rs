use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Money};

pub type PaymentId = Uuid;
pub type PaymentCategory = String;

/// Lifecycle of a payment.
///
/// Only `InProgress -> Fail` (a rejection) is reachable. `Done` exists so
/// that stored data carrying a settled status can be read back, but nothing
/// in the wallet settles a payment yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "INPROGRESS")]
    InProgress,
    #[serde(rename = "OK")]
    Done,
    #[serde(rename = "FAIL")]
    Fail,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::InProgress => "INPROGRESS",
            PaymentStatus::Done => "OK",
            PaymentStatus::Fail => "FAIL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INPROGRESS" => Some(PaymentStatus::InProgress),
            "OK" => Some(PaymentStatus::Done),
            "FAIL" => Some(PaymentStatus::Fail),
            _ => None,
        }
    }

    /// A refund is only owed while the payment is still in flight.
    pub fn is_rejectable(&self) -> bool {
        matches!(self, PaymentStatus::InProgress)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A debit against an account. Everything except `status` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub account_id: AccountId,
    /// Always positive
    pub amount: Money,
    pub category: PaymentCategory,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Build an in-progress payment. The caller validates `amount`;
    /// the ledger refuses non-positive amounts before getting here.
    pub fn new(account_id: AccountId, amount: Money, category: impl Into<PaymentCategory>) -> Self {
        debug_assert!(amount > 0, "Payment amount must be positive");
        Self {
            id: Uuid::new_v4(),
            account_id,
            amount,
            category: category.into(),
            status: PaymentStatus::InProgress,
            created_at: Utc::now(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == PaymentStatus::Fail
    }
}
