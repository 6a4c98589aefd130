mod memory;
mod repository;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{Account, Favorite, LedgerSnapshot, Payment};

pub use memory::*;
pub use repository::*;

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Where the wallet keeps its collections between runs.
///
/// The in-memory service is the source of truth while running; storage is
/// read once at start and written back at the end. Each `save_*` replaces
/// the stored collection wholesale.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn load_accounts(&self) -> Result<Vec<Account>>;

    async fn load_payments(&self) -> Result<Vec<Payment>>;

    async fn load_favorites(&self) -> Result<Vec<Favorite>>;

    async fn save_accounts(&self, accounts: &[Account]) -> Result<()>;

    async fn save_payments(&self, payments: &[Payment]) -> Result<()>;

    async fn save_favorites(&self, favorites: &[Favorite]) -> Result<()>;

    async fn load_snapshot(&self) -> Result<LedgerSnapshot> {
        Ok(LedgerSnapshot {
            accounts: self.load_accounts().await?,
            payments: self.load_payments().await?,
            favorites: self.load_favorites().await?,
        })
    }

    /// Accounts go first so that payment and favorite rows always have
    /// an account to reference.
    async fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        self.save_accounts(&snapshot.accounts).await?;
        self.save_payments(&snapshot.payments).await?;
        self.save_favorites(&snapshot.favorites).await?;
        Ok(())
    }
}
