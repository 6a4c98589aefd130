mod common;

use anyhow::Result;
use common::{service_with_default_account, TestAccount, DEFAULT_BALANCE, DEFAULT_PAYMENT};
use uuid::Uuid;
use wallet::application::WalletService;
use wallet::domain::{PaymentStatus, WalletError};

#[test]
fn test_favorite_payment_snapshots_parameters() -> Result<()> {
    let (service, account, payments) = service_with_default_account()?;
    let payment = &payments[0];

    let favorite = service.favorite_payment(payment.id, "buy")?;

    assert_ne!(favorite.id, payment.id);
    assert_eq!(favorite.name, "buy");
    assert_eq!(favorite.account_id, payment.account_id);
    assert_eq!(favorite.amount, payment.amount);
    assert_eq!(favorite.category, payment.category);
    assert_eq!(service.find_favorite_by_id(favorite.id)?, favorite);

    // Saving a favorite does not move money
    assert_eq!(service.find_account_by_id(account.id)?.balance, account.balance);
    Ok(())
}

#[test]
fn test_favorite_payment_unknown_payment() -> Result<()> {
    let (service, _, _) = service_with_default_account()?;
    let missing = Uuid::new_v4();

    assert_eq!(
        service.favorite_payment(missing, "buy"),
        Err(WalletError::PaymentNotFound(missing))
    );
    assert!(service.favorites().is_empty());
    Ok(())
}

#[test]
fn test_pay_from_favorite_debits_account() -> Result<()> {
    let (service, account, payments) = service_with_default_account()?;
    let favorite = service.favorite_payment(payments[0].id, "buy")?;

    let payment = service.pay_from_favorite(favorite.id)?;

    assert_eq!(payment.account_id, favorite.account_id);
    assert_eq!(payment.amount, favorite.amount);
    assert_eq!(payment.category, favorite.category);
    assert_eq!(payment.status, PaymentStatus::InProgress);
    assert_ne!(payment.id, payments[0].id);
    assert_eq!(
        service.find_account_by_id(account.id)?.balance,
        DEFAULT_BALANCE - 2 * DEFAULT_PAYMENT
    );
    Ok(())
}

#[test]
fn test_pay_from_favorite_on_fresh_balance() -> Result<()> {
    // balance 10000, favorite 1000 -> balance 9000 after paying from it
    let service = WalletService::new();
    let (account, payments) = TestAccount::default().add_to(&service)?;
    let favorite = service.favorite_payment(payments[0].id, "buy")?;
    service.reject(payments[0].id)?;
    assert_eq!(service.find_account_by_id(account.id)?.balance, 10_000_00);

    let payment = service.pay_from_favorite(favorite.id)?;

    assert_eq!(payment.amount, 1_000_00);
    assert_eq!(service.find_account_by_id(account.id)?.balance, 9_000_00);
    Ok(())
}

#[test]
fn test_favorite_outlives_source_payment_rejection() -> Result<()> {
    let (service, _, payments) = service_with_default_account()?;
    let favorite = service.favorite_payment(payments[0].id, "buy")?;

    service.reject(payments[0].id)?;

    let stored = service.find_favorite_by_id(favorite.id)?;
    assert_eq!(stored, favorite);
    Ok(())
}

#[test]
fn test_pay_from_favorite_checks_balance() -> Result<()> {
    let service = WalletService::new();
    let (account, payments) = TestAccount {
        balance: 1_000_00,
        payments: vec![(800_00, "rent")],
        ..TestAccount::default()
    }
    .add_to(&service)?;
    let favorite = service.favorite_payment(payments[0].id, "rent")?;

    let result = service.pay_from_favorite(favorite.id);

    assert_eq!(
        result,
        Err(WalletError::NotEnoughBalance {
            account_id: account.id,
            balance: 200_00,
            required: 800_00,
        })
    );
    assert_eq!(service.payments().len(), 1);
    Ok(())
}

#[test]
fn test_pay_from_unknown_favorite() -> Result<()> {
    let (service, _, payments) = service_with_default_account()?;
    service.favorite_payment(payments[0].id, "buy")?;
    let missing = Uuid::new_v4();

    assert_eq!(
        service.pay_from_favorite(missing),
        Err(WalletError::FavoriteNotFound(missing))
    );
    assert_eq!(service.payments().len(), 1);
    Ok(())
}

#[test]
fn test_favorites_are_listed_in_creation_order() -> Result<()> {
    let (service, _, payments) = service_with_default_account()?;

    let first = service.favorite_payment(payments[0].id, "first")?;
    let second = service.favorite_payment(payments[0].id, "second")?;

    let names: Vec<String> = service.favorites().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["first", "second"]);
    assert_ne!(first.id, second.id);
    Ok(())
}
