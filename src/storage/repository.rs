use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Account, Favorite, LedgerSnapshot, Payment, PaymentStatus};

use super::{Storage, MIGRATION_001_INITIAL};

/// SQLite-backed storage for accounts, payments and favorites.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        debug!(database_url, "connected to database");
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate). Creates the file if needed.
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Open the database file at `path`, creating and migrating it if needed.
    pub async fn open(path: &str) -> Result<Self> {
        Self::init(&format!("sqlite:{}?mode=rwc", path)).await
    }

    // ========================
    // Replace helpers (run inside a transaction)
    // ========================

    async fn replace_accounts(conn: &mut SqliteConnection, accounts: &[Account]) -> Result<()> {
        sqlx::query("DELETE FROM accounts")
            .execute(&mut *conn)
            .await
            .context("Failed to clear accounts")?;

        for account in accounts {
            sqlx::query(
                r#"
                INSERT INTO accounts (id, phone, balance, created_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(account.id)
            .bind(&account.phone)
            .bind(account.balance)
            .bind(account.created_at.to_rfc3339())
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to save account {}", account.id))?;
        }
        Ok(())
    }

    async fn replace_payments(conn: &mut SqliteConnection, payments: &[Payment]) -> Result<()> {
        sqlx::query("DELETE FROM payments")
            .execute(&mut *conn)
            .await
            .context("Failed to clear payments")?;

        for payment in payments {
            sqlx::query(
                r#"
                INSERT INTO payments (id, account_id, amount, category, status, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(payment.id.to_string())
            .bind(payment.account_id)
            .bind(payment.amount)
            .bind(&payment.category)
            .bind(payment.status.as_str())
            .bind(payment.created_at.to_rfc3339())
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to save payment {}", payment.id))?;
        }
        Ok(())
    }

    async fn replace_favorites(conn: &mut SqliteConnection, favorites: &[Favorite]) -> Result<()> {
        sqlx::query("DELETE FROM favorites")
            .execute(&mut *conn)
            .await
            .context("Failed to clear favorites")?;

        for favorite in favorites {
            sqlx::query(
                r#"
                INSERT INTO favorites (id, account_id, name, amount, category, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(favorite.id.to_string())
            .bind(favorite.account_id)
            .bind(&favorite.name)
            .bind(favorite.amount)
            .bind(&favorite.category)
            .bind(favorite.created_at.to_rfc3339())
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to save favorite {}", favorite.id))?;
        }
        Ok(())
    }

    // ========================
    // Row mapping
    // ========================

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: row.get("id"),
            phone: row.get("phone"),
            balance: row.get("balance"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_payment(row: &sqlx::sqlite::SqliteRow) -> Result<Payment> {
        let id_str: String = row.get("id");
        let status_str: String = row.get("status");
        let created_at_str: String = row.get("created_at");

        Ok(Payment {
            id: Uuid::parse_str(&id_str).context("Invalid payment ID")?,
            account_id: row.get("account_id"),
            amount: row.get("amount"),
            category: row.get("category"),
            status: PaymentStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid payment status: {}", status_str))?,
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_favorite(row: &sqlx::sqlite::SqliteRow) -> Result<Favorite> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Favorite {
            id: Uuid::parse_str(&id_str).context("Invalid favorite ID")?,
            account_id: row.get("account_id"),
            name: row.get("name"),
            amount: row.get("amount"),
            category: row.get("category"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .context("Invalid created_at timestamp")?
        .with_timezone(&Utc))
}

#[async_trait]
impl Storage for Repository {
    async fn load_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query("SELECT id, phone, balance, created_at FROM accounts ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    async fn load_payments(&self) -> Result<Vec<Payment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, amount, category, status, created_at
            FROM payments
            ORDER BY seq
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load payments")?;

        rows.iter().map(Self::row_to_payment).collect()
    }

    async fn load_favorites(&self) -> Result<Vec<Favorite>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, name, amount, category, created_at
            FROM favorites
            ORDER BY seq
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load favorites")?;

        rows.iter().map(Self::row_to_favorite).collect()
    }

    async fn save_accounts(&self, accounts: &[Account]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        Self::replace_accounts(&mut *tx, accounts).await?;
        tx.commit().await.context("Failed to commit accounts")?;
        Ok(())
    }

    async fn save_payments(&self, payments: &[Payment]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        Self::replace_payments(&mut *tx, payments).await?;
        tx.commit().await.context("Failed to commit payments")?;
        Ok(())
    }

    async fn save_favorites(&self, favorites: &[Favorite]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        Self::replace_favorites(&mut *tx, favorites).await?;
        tx.commit().await.context("Failed to commit favorites")?;
        Ok(())
    }

    /// All three collections are replaced in one transaction, so a crash
    /// never leaves payments that belong to a different set of accounts.
    async fn save_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        Self::replace_accounts(&mut *tx, &snapshot.accounts).await?;
        Self::replace_payments(&mut *tx, &snapshot.payments).await?;
        Self::replace_favorites(&mut *tx, &snapshot.favorites).await?;
        tx.commit().await.context("Failed to commit snapshot")?;
        Ok(())
    }
}
