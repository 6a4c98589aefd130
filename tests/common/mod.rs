// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use tempfile::TempDir;
use wallet::application::WalletService;
use wallet::domain::{Account, Money, Payment};
use wallet::storage::Repository;

pub const DEFAULT_PHONE: &str = "+992000000001";
pub const DEFAULT_BALANCE: Money = 10_000_00;
pub const DEFAULT_PAYMENT: Money = 1_000_00;
pub const DEFAULT_CATEGORY: &str = "auto";

/// Helper to create a SQLite repository in a temporary directory
pub async fn test_repository() -> Result<(Repository, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let repo = Repository::open(db_path.to_str().unwrap()).await?;
    Ok((repo, temp_dir))
}

/// Test fixture: an account with a balance and a list of payments made from it
pub struct TestAccount {
    pub phone: &'static str,
    pub balance: Money,
    pub payments: Vec<(Money, &'static str)>,
}

impl Default for TestAccount {
    fn default() -> Self {
        Self {
            phone: DEFAULT_PHONE,
            balance: DEFAULT_BALANCE,
            payments: vec![(DEFAULT_PAYMENT, DEFAULT_CATEGORY)],
        }
    }
}

impl TestAccount {
    /// Register, fund and pay according to the fixture
    pub fn add_to(&self, service: &WalletService) -> Result<(Account, Vec<Payment>)> {
        let account = add_account_with_balance(service, self.phone, self.balance)?;
        let payments = self
            .payments
            .iter()
            .map(|(amount, category)| service.pay(account.id, *amount, *category))
            .collect::<Result<Vec<_>, _>>()?;
        let account = service.find_account_by_id(account.id)?;
        Ok((account, payments))
    }
}

/// Register an account and deposit into it
pub fn add_account_with_balance(
    service: &WalletService,
    phone: &str,
    balance: Money,
) -> Result<Account> {
    let account = service.register_account(phone)?;
    if balance > 0 {
        service.deposit(account.id, balance)?;
    }
    Ok(service.find_account_by_id(account.id)?)
}

/// Service with the default account: 10000.00 deposited, one 1000.00 payment
pub fn service_with_default_account() -> Result<(WalletService, Account, Vec<Payment>)> {
    let service = WalletService::new();
    let (account, payments) = TestAccount::default().add_to(&service)?;
    Ok((service, account, payments))
}
