use anyhow::{Context, Result};
use std::io::Read;

use crate::application::WalletService;
use crate::domain::{Ledger, WalletError};
use crate::io::export::WalletSnapshot;

/// Result of an import operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub accounts: usize,
    pub payments: usize,
    pub favorites: usize,
    /// False for a dry run
    pub applied: bool,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Validate the snapshot without replacing the wallet state
    pub dry_run: bool,
}

/// Importer for loading snapshots into the wallet
pub struct Importer<'a> {
    service: &'a WalletService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a WalletService) -> Self {
        Self { service }
    }

    /// Replace the wallet state with a JSON snapshot.
    ///
    /// The snapshot is validated with the same rules as a live wallet
    /// (unique phones and IDs, payments and favorites pointing at known
    /// accounts, positive amounts). Nothing changes if validation fails.
    pub fn import_snapshot_json<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let snapshot: WalletSnapshot =
            serde_json::from_reader(reader).context("Invalid snapshot JSON")?;

        let result = ImportResult {
            accounts: snapshot.accounts.len(),
            payments: snapshot.payments.len(),
            favorites: snapshot.favorites.len(),
            applied: !options.dry_run,
        };
        let snapshot = snapshot.into_ledger_snapshot();

        if options.dry_run {
            Ledger::from_snapshot(snapshot).map_err(invalid_snapshot)?;
        } else {
            self.service.restore(snapshot).map_err(invalid_snapshot)?;
        }

        Ok(result)
    }
}

fn invalid_snapshot(err: WalletError) -> anyhow::Error {
    anyhow::Error::new(err).context("Snapshot rejected")
}
