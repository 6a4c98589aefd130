use thiserror::Error;

use crate::domain::WalletError;

/// Errors surfaced by operations that cross the storage boundary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}
