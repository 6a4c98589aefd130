use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::WalletService;
use crate::domain::{format_money, Account, AccountId, Favorite, LedgerSnapshot, Payment};

/// Full wallet dump for export/import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub payments: Vec<Payment>,
    pub favorites: Vec<Favorite>,
}

impl WalletSnapshot {
    pub fn new(snapshot: LedgerSnapshot) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            accounts: snapshot.accounts,
            payments: snapshot.payments,
            favorites: snapshot.favorites,
        }
    }

    pub fn into_ledger_snapshot(self) -> LedgerSnapshot {
        LedgerSnapshot {
            accounts: self.accounts,
            payments: self.payments,
            favorites: self.favorites,
        }
    }

    pub fn record_count(&self) -> usize {
        self.accounts.len() + self.payments.len() + self.favorites.len()
    }
}

/// Exporter for writing wallet data out in various formats
pub struct Exporter<'a> {
    service: &'a WalletService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a WalletService) -> Self {
        Self { service }
    }

    /// Export accounts to CSV format
    pub fn export_accounts_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let accounts = self.service.accounts();
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "phone", "balance", "created_at"])?;

        for account in &accounts {
            csv_writer.write_record([
                account.id.to_string(),
                account.phone.clone(),
                format_money(account.balance),
                account.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(accounts.len())
    }

    /// Export payments to CSV. With an account, only that account's history.
    pub fn export_payments_csv<W: Write>(
        &self,
        writer: W,
        account_id: Option<AccountId>,
    ) -> Result<usize> {
        let payments = match account_id {
            Some(id) => self.service.filter_payments(id)?,
            None => self.service.payments(),
        };
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "account_id",
            "amount",
            "category",
            "status",
            "created_at",
        ])?;

        for payment in &payments {
            csv_writer.write_record([
                payment.id.to_string(),
                payment.account_id.to_string(),
                format_money(payment.amount),
                payment.category.clone(),
                payment.status.as_str().to_string(),
                payment.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(payments.len())
    }

    /// Export favorites to CSV format
    pub fn export_favorites_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let favorites = self.service.favorites();
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "account_id", "name", "amount", "category", "created_at"])?;

        for favorite in &favorites {
            csv_writer.write_record([
                favorite.id.to_string(),
                favorite.account_id.to_string(),
                favorite.name.clone(),
                format_money(favorite.amount),
                favorite.category.clone(),
                favorite.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(favorites.len())
    }

    /// Export everything as a JSON snapshot
    pub fn export_snapshot_json<W: Write>(&self, mut writer: W) -> Result<WalletSnapshot> {
        let snapshot = WalletSnapshot::new(self.service.snapshot());

        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(snapshot)
    }
}
