mod common;

use anyhow::Result;
use common::{service_with_default_account, TestAccount};
use wallet::application::WalletService;
use wallet::io::{ImportOptions, Importer, Exporter, WalletSnapshot};

#[test]
fn test_export_payments_csv() -> Result<()> {
    let (service, _, payments) = service_with_default_account()?;
    service.reject(payments[0].id)?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service).export_payments_csv(&mut buffer, None)?;

    let output = String::from_utf8(buffer)?;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(count, 1);
    assert_eq!(lines[0], "id,account_id,amount,category,status,created_at");
    assert!(lines[1].starts_with(&format!("{},1,1000.00,auto,FAIL,", payments[0].id)));
    Ok(())
}

#[test]
fn test_export_payment_history_for_one_account() -> Result<()> {
    let service = WalletService::new();
    let (first, _) = TestAccount {
        phone: "+992000000001",
        payments: vec![(1_00, "a"), (2_00, "b")],
        ..TestAccount::default()
    }
    .add_to(&service)?;
    TestAccount {
        phone: "+992000000002",
        payments: vec![(3_00, "c")],
        ..TestAccount::default()
    }
    .add_to(&service)?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service).export_payments_csv(&mut buffer, Some(first.id))?;

    assert_eq!(count, 2);
    assert_eq!(String::from_utf8(buffer)?.lines().count(), 3);
    assert!(Exporter::new(&service)
        .export_payments_csv(Vec::new(), Some(99))
        .is_err());
    Ok(())
}

#[test]
fn test_export_accounts_and_favorites_csv() -> Result<()> {
    let (service, _, payments) = service_with_default_account()?;
    service.favorite_payment(payments[0].id, "weekly fuel")?;
    let exporter = Exporter::new(&service);

    let mut accounts = Vec::new();
    assert_eq!(exporter.export_accounts_csv(&mut accounts)?, 1);
    let accounts = String::from_utf8(accounts)?;
    assert!(accounts.lines().nth(1).unwrap().starts_with("1,+992000000001,9000.00,"));

    let mut favorites = Vec::new();
    assert_eq!(exporter.export_favorites_csv(&mut favorites)?, 1);
    assert!(String::from_utf8(favorites)?.contains(",1,weekly fuel,1000.00,auto,"));
    Ok(())
}

#[test]
fn test_snapshot_json_export_then_import() -> Result<()> {
    let (source, _, payments) = service_with_default_account()?;
    source.favorite_payment(payments[0].id, "buy")?;

    let mut buffer = Vec::new();
    let exported = Exporter::new(&source).export_snapshot_json(&mut buffer)?;
    assert_eq!(exported.record_count(), 3);

    let target = WalletService::new();
    let result = Importer::new(&target).import_snapshot_json(buffer.as_slice(), ImportOptions::default())?;

    assert!(result.applied);
    assert_eq!((result.accounts, result.payments, result.favorites), (1, 1, 1));
    assert_eq!(target.snapshot(), source.snapshot());
    Ok(())
}

#[test]
fn test_snapshot_uses_status_labels() -> Result<()> {
    let (service, _, _) = service_with_default_account()?;

    let mut buffer = Vec::new();
    Exporter::new(&service).export_snapshot_json(&mut buffer)?;

    let json: serde_json::Value = serde_json::from_slice(&buffer)?;
    assert_eq!(json["payments"][0]["status"], "INPROGRESS");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[test]
fn test_dry_run_import_leaves_state() -> Result<()> {
    let (source, _, _) = service_with_default_account()?;
    let mut buffer = Vec::new();
    Exporter::new(&source).export_snapshot_json(&mut buffer)?;

    let target = WalletService::new();
    let result = Importer::new(&target)
        .import_snapshot_json(buffer.as_slice(), ImportOptions { dry_run: true })?;

    assert!(!result.applied);
    assert_eq!(result.accounts, 1);
    assert!(target.accounts().is_empty());
    Ok(())
}

#[test]
fn test_invalid_snapshot_keeps_current_state() -> Result<()> {
    let (source, _, _) = service_with_default_account()?;
    let mut snapshot = WalletSnapshot::new(source.snapshot());
    // Duplicate the account: same ID and phone twice
    snapshot.accounts.push(snapshot.accounts[0].clone());
    let json = serde_json::to_vec(&snapshot)?;

    let (target, _, _) = service_with_default_account()?;
    let before = target.snapshot();
    let result = Importer::new(&target).import_snapshot_json(json.as_slice(), ImportOptions::default());

    assert!(result.is_err());
    assert!(format!("{:#}", result.unwrap_err()).contains("Snapshot rejected"));
    assert_eq!(target.snapshot(), before);
    Ok(())
}

#[test]
fn test_malformed_json_is_rejected() {
    let service = WalletService::new();
    let result = Importer::new(&service).import_snapshot_json(&b"{ not json"[..], ImportOptions::default());
    assert!(result.is_err());
}
