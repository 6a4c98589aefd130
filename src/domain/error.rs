use thiserror::Error;

use super::{AccountId, FavoriteId, Money, PaymentId, PaymentStatus, Phone};

/// Validation and lookup failures of the wallet. None of them leave the
/// ledger partially modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Phone number must not be empty")]
    InvalidPhone,

    #[error("Phone already registered: {0}")]
    PhoneAlreadyRegistered(Phone),

    #[error("Amount must be positive, got {0}")]
    AmountMustBePositive(Money),

    #[error("Not enough balance on account {account_id}: balance {balance}, required {required}")]
    NotEnoughBalance {
        account_id: AccountId,
        balance: Money,
        required: Money,
    },

    #[error("Balance of account {0} would overflow")]
    BalanceOverflow(AccountId),

    #[error("No account IDs left to allocate")]
    AccountIdsExhausted,

    #[error("No account registered for phone: {0}")]
    PhoneNotRegistered(Phone),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("Favorite not found: {0}")]
    FavoriteNotFound(FavoriteId),

    #[error("Payment {id} cannot be rejected in status {status}")]
    PaymentNotRejectable { id: PaymentId, status: PaymentStatus },

    #[error("Duplicate record in snapshot: {0}")]
    DuplicateRecord(String),

    #[error("Invalid record in snapshot: {0}")]
    InvalidRecord(String),
}
