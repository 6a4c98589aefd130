use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::domain::{
    Account, AccountId, Favorite, FavoriteId, Ledger, LedgerSnapshot, Money, Payment,
    PaymentCategory, PaymentId, WalletError,
};
use crate::storage::Storage;

use super::AppError;

pub type WalletResult<T> = Result<T, WalletError>;

/// Application service providing the wallet operations.
/// This is the primary interface for any client (CLI, tests, embedding code).
///
/// All state lives in one [`Ledger`] behind a single `RwLock`: every
/// read-modify-write holds the write guard for its whole duration, lookups
/// share the read guard. Storage is only touched by [`WalletService::load_from`]
/// and [`WalletService::save_to`].
#[derive(Debug, Default)]
pub struct WalletService {
    ledger: RwLock<Ledger>,
}

impl WalletService {
    /// Create a service with empty collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a service from a snapshot, validating it first.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> WalletResult<Self> {
        let ledger = Ledger::from_snapshot(snapshot)?;
        Ok(Self {
            ledger: RwLock::new(ledger),
        })
    }

    /// Load accounts, payments and favorites from storage.
    pub async fn load_from<S: Storage + ?Sized>(storage: &S) -> Result<Self, AppError> {
        let snapshot = storage.load_snapshot().await?;
        debug!(
            accounts = snapshot.accounts.len(),
            payments = snapshot.payments.len(),
            favorites = snapshot.favorites.len(),
            "loaded wallet from storage"
        );
        Ok(Self::from_snapshot(snapshot)?)
    }

    /// Write the current state to storage. The snapshot is taken under one
    /// read guard; the guard is released before any I/O.
    pub async fn save_to<S: Storage + ?Sized>(&self, storage: &S) -> Result<(), AppError> {
        let snapshot = self.snapshot();
        storage.save_snapshot(&snapshot).await?;
        debug!(
            accounts = snapshot.accounts.len(),
            payments = snapshot.payments.len(),
            favorites = snapshot.favorites.len(),
            "saved wallet to storage"
        );
        Ok(())
    }

    // A panic while holding the guard cannot leave a half-applied
    // mutation behind, so a poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.ledger.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.ledger.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================
    // Account operations
    // ========================

    /// Register a new account for a phone number with a zero balance.
    pub fn register_account(&self, phone: &str) -> WalletResult<Account> {
        let account = traced("register_account", self.write().register_account(phone))?;
        info!(account_id = account.id, phone = %account.phone, "account registered");
        Ok(account)
    }

    /// Credit an account. Returns the account after the deposit.
    pub fn deposit(&self, account_id: AccountId, amount: Money) -> WalletResult<Account> {
        let account = traced("deposit", self.write().deposit(account_id, amount))?;
        info!(account_id, amount, balance = account.balance, "deposit applied");
        Ok(account)
    }

    pub fn find_account_by_id(&self, account_id: AccountId) -> WalletResult<Account> {
        self.read().find_account_by_id(account_id).cloned()
    }

    pub fn find_account_by_phone(&self, phone: &str) -> WalletResult<Account> {
        self.read()
            .find_account_by_phone(phone)
            .cloned()
            .ok_or_else(|| WalletError::PhoneNotRegistered(phone.trim().to_string()))
    }

    /// All accounts, ordered by ID.
    pub fn accounts(&self) -> Vec<Account> {
        self.read().accounts().cloned().collect()
    }

    // ========================
    // Payment operations
    // ========================

    /// Debit an account and record an in-progress payment.
    pub fn pay(
        &self,
        account_id: AccountId,
        amount: Money,
        category: impl Into<PaymentCategory>,
    ) -> WalletResult<Payment> {
        let payment = traced("pay", self.write().pay(account_id, amount, category))?;
        info!(payment_id = %payment.id, account_id, amount, category = %payment.category, "payment created");
        Ok(payment)
    }

    /// Fail an in-progress payment and refund it. A payment that is no
    /// longer in progress is refused, so a refund happens at most once.
    pub fn reject(&self, payment_id: PaymentId) -> WalletResult<Payment> {
        let payment = traced("reject", self.write().reject(payment_id))?;
        info!(payment_id = %payment.id, account_id = payment.account_id, amount = payment.amount, "payment rejected and refunded");
        Ok(payment)
    }

    /// Create a new payment with the parameters of an existing one.
    pub fn repeat(&self, payment_id: PaymentId) -> WalletResult<Payment> {
        let payment = traced("repeat", self.write().repeat(payment_id))?;
        info!(source_id = %payment_id, payment_id = %payment.id, amount = payment.amount, "payment repeated");
        Ok(payment)
    }

    pub fn find_payment_by_id(&self, payment_id: PaymentId) -> WalletResult<Payment> {
        self.read().find_payment_by_id(payment_id).cloned()
    }

    /// All payments in creation order.
    pub fn payments(&self) -> Vec<Payment> {
        self.read().payments().to_vec()
    }

    /// Payments of one account in creation order.
    pub fn filter_payments(&self, account_id: AccountId) -> WalletResult<Vec<Payment>> {
        let ledger = self.read();
        let payments = ledger.filter_payments(account_id)?;
        Ok(payments.into_iter().cloned().collect())
    }

    pub fn filter_payments_by<F>(&self, predicate: F) -> Vec<Payment>
    where
        F: FnMut(&Payment) -> bool,
    {
        let ledger = self.read();
        ledger
            .filter_payments_by(predicate)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Total amount of payments that were not rejected.
    pub fn sum_payments(&self) -> Money {
        self.read().sum_payments()
    }

    // ========================
    // Favorite operations
    // ========================

    /// Save a payment's parameters under a name.
    pub fn favorite_payment(&self, payment_id: PaymentId, name: &str) -> WalletResult<Favorite> {
        let favorite = traced(
            "favorite_payment",
            self.write().favorite_payment(payment_id, name),
        )?;
        info!(favorite_id = %favorite.id, payment_id = %payment_id, name = %favorite.name, "favorite created");
        Ok(favorite)
    }

    /// Pay with the parameters stored in a favorite.
    pub fn pay_from_favorite(&self, favorite_id: FavoriteId) -> WalletResult<Payment> {
        let payment = traced("pay_from_favorite", self.write().pay_from_favorite(favorite_id))?;
        info!(favorite_id = %favorite_id, payment_id = %payment.id, amount = payment.amount, "payment created from favorite");
        Ok(payment)
    }

    pub fn find_favorite_by_id(&self, favorite_id: FavoriteId) -> WalletResult<Favorite> {
        self.read().find_favorite_by_id(favorite_id).cloned()
    }

    /// All favorites in creation order.
    pub fn favorites(&self) -> Vec<Favorite> {
        self.read().favorites().to_vec()
    }

    // ========================
    // Snapshot operations
    // ========================

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.read().snapshot()
    }

    /// Replace the whole state. On error the current state is kept.
    pub fn restore(&self, snapshot: LedgerSnapshot) -> WalletResult<()> {
        let ledger = traced("restore", Ledger::from_snapshot(snapshot))?;
        *self.write() = ledger;
        info!("wallet state restored from snapshot");
        Ok(())
    }
}

/// Log a refused operation. Debit and refund refusals are worth a warning;
/// lookups that miss are routine.
fn traced<T>(operation: &'static str, result: WalletResult<T>) -> WalletResult<T> {
    if let Err(err) = &result {
        match err {
            WalletError::NotEnoughBalance { .. } | WalletError::PaymentNotRejectable { .. } => {
                warn!(operation, error = %err, "operation refused")
            }
            _ => debug!(operation, error = %err, "operation failed"),
        }
    }
    result
}
