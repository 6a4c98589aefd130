use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::domain::{Account, Favorite, LedgerSnapshot, Payment};

use super::Storage;

/// Storage kept in process memory. Nothing survives the process; useful for
/// tests and for embedding the wallet without a database.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    snapshot: Mutex<LedgerSnapshot>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with pre-populated collections.
    pub fn with_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut LedgerSnapshot) -> T) -> Result<T> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load_accounts(&self) -> Result<Vec<Account>> {
        self.with(|s| s.accounts.clone())
    }

    async fn load_payments(&self) -> Result<Vec<Payment>> {
        self.with(|s| s.payments.clone())
    }

    async fn load_favorites(&self) -> Result<Vec<Favorite>> {
        self.with(|s| s.favorites.clone())
    }

    async fn save_accounts(&self, accounts: &[Account]) -> Result<()> {
        self.with(|s| s.accounts = accounts.to_vec())
    }

    async fn save_payments(&self, payments: &[Payment]) -> Result<()> {
        self.with(|s| s.payments = payments.to_vec())
    }

    async fn save_favorites(&self, favorites: &[Favorite]) -> Result<()> {
        self.with(|s| s.favorites = favorites.to_vec())
    }
}
