use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::{
    normalize_phone, Account, AccountId, Favorite, FavoriteId, Money, Payment, PaymentCategory,
    PaymentId, PaymentStatus, Phone, WalletError,
};

pub type LedgerResult<T> = Result<T, WalletError>;

/// The three collections of the wallet, captured together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub accounts: Vec<Account>,
    pub payments: Vec<Payment>,
    pub favorites: Vec<Favorite>,
}

/// Single-threaded state of the wallet: accounts, payments, favorites and
/// the account ID allocator.
///
/// Every mutating method validates all of its preconditions before touching
/// any collection, so an `Err` always means nothing changed.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Last allocated account ID (0 = none yet)
    last_account_id: AccountId,
    accounts: BTreeMap<AccountId, Account>,
    phones: HashMap<Phone, AccountId>,
    /// Creation order is kept; lookups go through the index
    payments: Vec<Payment>,
    payment_index: HashMap<PaymentId, usize>,
    favorites: Vec<Favorite>,
    favorite_index: HashMap<FavoriteId, usize>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================
    // Accounts
    // ========================

    pub fn register_account(&mut self, phone: &str) -> LedgerResult<Account> {
        let phone = normalize_phone(phone).ok_or(WalletError::InvalidPhone)?;
        if self.phones.contains_key(&phone) {
            return Err(WalletError::PhoneAlreadyRegistered(phone));
        }

        let id = self
            .last_account_id
            .checked_add(1)
            .ok_or(WalletError::AccountIdsExhausted)?;
        self.last_account_id = id;
        let account = Account::new(id, phone);
        self.phones.insert(account.phone.clone(), account.id);
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    /// Credit an account. Returns the account after the deposit.
    pub fn deposit(&mut self, account_id: AccountId, amount: Money) -> LedgerResult<Account> {
        ensure_positive(amount)?;
        let account = self.account_mut(account_id)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(WalletError::BalanceOverflow(account_id))?;
        Ok(account.clone())
    }

    pub fn find_account_by_id(&self, account_id: AccountId) -> LedgerResult<&Account> {
        self.accounts
            .get(&account_id)
            .ok_or(WalletError::AccountNotFound(account_id))
    }

    pub fn find_account_by_phone(&self, phone: &str) -> Option<&Account> {
        let phone = normalize_phone(phone)?;
        self.phones
            .get(&phone)
            .and_then(|id| self.accounts.get(id))
    }

    /// Accounts ordered by ID.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    fn account_mut(&mut self, account_id: AccountId) -> LedgerResult<&mut Account> {
        self.accounts
            .get_mut(&account_id)
            .ok_or(WalletError::AccountNotFound(account_id))
    }

    // ========================
    // Payments
    // ========================

    /// Debit an account and record an `InProgress` payment.
    pub fn pay(
        &mut self,
        account_id: AccountId,
        amount: Money,
        category: impl Into<PaymentCategory>,
    ) -> LedgerResult<Payment> {
        ensure_positive(amount)?;
        let account = self.account_mut(account_id)?;
        if !account.can_afford(amount) {
            return Err(WalletError::NotEnoughBalance {
                account_id,
                balance: account.balance,
                required: amount,
            });
        }

        account.balance -= amount;
        let payment = Payment::new(account_id, amount, category);
        self.push_payment(payment.clone());
        Ok(payment)
    }

    /// Fail an in-flight payment and refund its amount.
    /// Returns the payment in its new state.
    pub fn reject(&mut self, payment_id: PaymentId) -> LedgerResult<Payment> {
        let index = self.payment_position(payment_id)?;
        let (account_id, amount, status) = {
            let payment = &self.payments[index];
            (payment.account_id, payment.amount, payment.status)
        };

        let account = self.account_mut(account_id)?;
        if !status.is_rejectable() {
            return Err(WalletError::PaymentNotRejectable {
                id: payment_id,
                status,
            });
        }
        let refunded = account
            .balance
            .checked_add(amount)
            .ok_or(WalletError::BalanceOverflow(account_id))?;

        account.balance = refunded;
        let payment = &mut self.payments[index];
        payment.status = PaymentStatus::Fail;
        Ok(payment.clone())
    }

    /// Pay again with the parameters of an existing payment.
    pub fn repeat(&mut self, payment_id: PaymentId) -> LedgerResult<Payment> {
        let original = self.find_payment_by_id(payment_id)?;
        let (account_id, amount, category) = (
            original.account_id,
            original.amount,
            original.category.clone(),
        );
        self.find_account_by_id(account_id)?;
        self.pay(account_id, amount, category)
    }

    pub fn find_payment_by_id(&self, payment_id: PaymentId) -> LedgerResult<&Payment> {
        self.payment_position(payment_id)
            .map(|index| &self.payments[index])
    }

    /// Payments in creation order.
    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// Payments of one account in creation order.
    pub fn filter_payments(&self, account_id: AccountId) -> LedgerResult<Vec<&Payment>> {
        self.find_account_by_id(account_id)?;
        Ok(self.filter_payments_by(|p| p.account_id == account_id))
    }

    pub fn filter_payments_by<F>(&self, mut predicate: F) -> Vec<&Payment>
    where
        F: FnMut(&Payment) -> bool,
    {
        self.payments.iter().filter(|p| predicate(p)).collect()
    }

    /// Total of every payment that has not been rejected.
    pub fn sum_payments(&self) -> Money {
        self.payments
            .iter()
            .filter(|p| !p.is_failed())
            .fold(0, |total: Money, p| total.saturating_add(p.amount))
    }

    fn payment_position(&self, payment_id: PaymentId) -> LedgerResult<usize> {
        self.payment_index
            .get(&payment_id)
            .copied()
            .ok_or(WalletError::PaymentNotFound(payment_id))
    }

    fn push_payment(&mut self, payment: Payment) {
        self.payment_index.insert(payment.id, self.payments.len());
        self.payments.push(payment);
    }

    // ========================
    // Favorites
    // ========================

    pub fn favorite_payment(
        &mut self,
        payment_id: PaymentId,
        name: impl Into<String>,
    ) -> LedgerResult<Favorite> {
        let payment = self.find_payment_by_id(payment_id)?;
        let favorite = Favorite::from_payment(payment, name);
        self.push_favorite(favorite.clone());
        Ok(favorite)
    }

    pub fn pay_from_favorite(&mut self, favorite_id: FavoriteId) -> LedgerResult<Payment> {
        let favorite = self.find_favorite_by_id(favorite_id)?;
        let (account_id, amount, category) = (
            favorite.account_id,
            favorite.amount,
            favorite.category.clone(),
        );
        self.pay(account_id, amount, category)
    }

    pub fn find_favorite_by_id(&self, favorite_id: FavoriteId) -> LedgerResult<&Favorite> {
        self.favorite_index
            .get(&favorite_id)
            .map(|&index| &self.favorites[index])
            .ok_or(WalletError::FavoriteNotFound(favorite_id))
    }

    /// Favorites in creation order.
    pub fn favorites(&self) -> &[Favorite] {
        &self.favorites
    }

    fn push_favorite(&mut self, favorite: Favorite) {
        self.favorite_index.insert(favorite.id, self.favorites.len());
        self.favorites.push(favorite);
    }

    // ========================
    // Snapshots
    // ========================

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            accounts: self.accounts.values().cloned().collect(),
            payments: self.payments.clone(),
            favorites: self.favorites.clone(),
        }
    }

    /// Rebuild a ledger from stored collections, checking the same
    /// uniqueness, reference and range rules the live operations enforce.
    /// The allocator resumes after the highest account ID; a stored
    /// `i64::MAX` is accepted but leaves no IDs to allocate.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> LedgerResult<Self> {
        let mut ledger = Self::new();

        for account in snapshot.accounts {
            if normalize_phone(&account.phone).as_deref() != Some(account.phone.as_str()) {
                return Err(WalletError::InvalidPhone);
            }
            if account.id < 1 {
                return Err(WalletError::InvalidRecord(format!(
                    "account ID {} is not positive",
                    account.id
                )));
            }
            if account.balance < 0 {
                return Err(WalletError::InvalidRecord(format!(
                    "account {} has negative balance {}",
                    account.id, account.balance
                )));
            }
            if ledger.accounts.contains_key(&account.id) {
                return Err(WalletError::DuplicateRecord(format!("account {}", account.id)));
            }
            if ledger.phones.contains_key(&account.phone) {
                return Err(WalletError::PhoneAlreadyRegistered(account.phone));
            }
            ledger.last_account_id = ledger.last_account_id.max(account.id);
            ledger.phones.insert(account.phone.clone(), account.id);
            ledger.accounts.insert(account.id, account);
        }

        for payment in snapshot.payments {
            ensure_positive(payment.amount)?;
            ledger.find_account_by_id(payment.account_id)?;
            if ledger.payment_index.contains_key(&payment.id) {
                return Err(WalletError::DuplicateRecord(format!("payment {}", payment.id)));
            }
            ledger.push_payment(payment);
        }

        for favorite in snapshot.favorites {
            ensure_positive(favorite.amount)?;
            ledger.find_account_by_id(favorite.account_id)?;
            if ledger.favorite_index.contains_key(&favorite.id) {
                return Err(WalletError::DuplicateRecord(format!("favorite {}", favorite.id)));
            }
            ledger.push_favorite(favorite);
        }

        Ok(ledger)
    }
}

fn ensure_positive(amount: Money) -> LedgerResult<()> {
    if amount <= 0 {
        return Err(WalletError::AmountMustBePositive(amount));
    }
    Ok(())
}
