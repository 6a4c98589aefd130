use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::application::WalletService;
use crate::config::Config;
use crate::domain::{format_money, parse_money, AccountId, Money, Payment, PaymentStatus};
use crate::storage::Repository;

/// Wallet - phone-number accounts, payments and favorites
#[derive(Parser, Debug)]
#[command(name = "wallet")]
#[command(about = "A small payments wallet: accounts by phone, payments, refunds and favorites")]
#[command(version)]
pub struct Cli {
    /// Database file path (overrides WALLET_DATABASE, default wallet.db)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new database
    Init,

    #[command(flatten)]
    Wallet(WalletCommand),
}

/// Commands that run against a loaded wallet.
#[derive(Subcommand, Debug)]
pub enum WalletCommand {
    /// Register an account for a phone number
    Register {
        /// Phone number (must be unique)
        phone: String,
    },

    /// Add money to an account
    Deposit {
        /// Account ID
        account: AccountId,

        /// Amount (e.g., "50.00" or "50")
        amount: String,
    },

    /// Pay from an account
    Pay {
        /// Account ID
        account: AccountId,

        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Payment category (e.g., "auto", "mobile")
        #[arg(short, long, default_value = "other")]
        category: String,
    },

    /// Reject an in-progress payment and refund it
    Reject {
        /// Payment ID
        id: String,
    },

    /// Pay again with the parameters of an existing payment
    Repeat {
        /// Payment ID
        id: String,
    },

    /// Save a payment as a named favorite
    Favorite {
        /// Payment ID
        payment: String,

        /// Favorite name
        name: String,
    },

    /// Pay using a favorite
    PayFavorite {
        /// Favorite ID
        id: String,
    },

    /// Show an account by ID or phone
    Account {
        /// Account ID
        #[arg(required_unless_present = "phone", conflicts_with = "phone")]
        id: Option<AccountId>,

        /// Look the account up by phone instead
        #[arg(long)]
        phone: Option<String>,
    },

    /// Show a payment
    Payment {
        /// Payment ID
        id: String,
    },

    /// List all accounts
    Accounts,

    /// List payments
    Payments {
        /// Only payments of this account
        #[arg(long)]
        account: Option<AccountId>,

        /// Only payments in this status: INPROGRESS, OK, FAIL
        #[arg(long)]
        status: Option<String>,
    },

    /// List all favorites
    Favorites,

    /// Show the total of all payments that were not rejected
    Total,

    /// Export data to CSV or JSON
    Export {
        /// What to export: accounts, payments, favorites, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Restrict a payments export to one account
        #[arg(long)]
        account: Option<AccountId>,
    },

    /// Replace the wallet with a JSON snapshot
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::from_env().with_database(self.database);
        let log_filter = if self.verbose {
            "wallet=debug".to_string()
        } else {
            config.log_filter.clone()
        };
        init_tracing(&log_filter);

        let path = &config.database_path;
        match self.command {
            Commands::Init => {
                Repository::open(path).await?;
                println!("Database initialized: {}", path);
            }

            Commands::Wallet(command) => {
                let repo = Repository::connect(&format!("sqlite:{}", path))
                    .await
                    .with_context(|| {
                        format!("Cannot open database '{}'. Run `wallet init` first", path)
                    })?;
                let service = WalletService::load_from(&repo).await?;

                if run_command(&service, command)? {
                    service.save_to(&repo).await?;
                }
            }
        }

        Ok(())
    }
}

/// `RUST_LOG` wins over the configured filter. Logs go to stderr so they
/// never mix with command output.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Execute one command against a loaded wallet.
/// Returns whether the wallet changed and needs saving.
fn run_command(service: &WalletService, command: WalletCommand) -> Result<bool> {
    match command {
        WalletCommand::Register { phone } => {
            let account = service.register_account(&phone)?;
            println!("Registered account {} for {}", account.id, account.phone);
            Ok(true)
        }

        WalletCommand::Deposit { account, amount } => {
            let amount = parse_amount(&amount)?;
            let account = service.deposit(account, amount)?;
            println!(
                "Deposited {} to account {} (balance {})",
                format_money(amount),
                account.id,
                format_money(account.balance)
            );
            Ok(true)
        }

        WalletCommand::Pay {
            account,
            amount,
            category,
        } => {
            let amount = parse_amount(&amount)?;
            let payment = service.pay(account, amount, category)?;
            println!(
                "Paid {} from account {} [{}] ({})",
                format_money(payment.amount),
                payment.account_id,
                payment.category,
                payment.id
            );
            Ok(true)
        }

        WalletCommand::Reject { id } => {
            let payment = service.reject(parse_id(&id, "payment")?)?;
            println!(
                "Rejected payment {}: refunded {} to account {}",
                payment.id,
                format_money(payment.amount),
                payment.account_id
            );
            Ok(true)
        }

        WalletCommand::Repeat { id } => {
            let payment = service.repeat(parse_id(&id, "payment")?)?;
            println!(
                "Repeated payment: {} from account {} ({})",
                format_money(payment.amount),
                payment.account_id,
                payment.id
            );
            Ok(true)
        }

        WalletCommand::Favorite { payment, name } => {
            let favorite = service.favorite_payment(parse_id(&payment, "payment")?, &name)?;
            println!(
                "Saved favorite '{}': {} [{}] ({})",
                favorite.name,
                format_money(favorite.amount),
                favorite.category,
                favorite.id
            );
            Ok(true)
        }

        WalletCommand::PayFavorite { id } => {
            let favorite_id = parse_id(&id, "favorite")?;
            let payment = service.pay_from_favorite(favorite_id)?;
            println!(
                "Paid {} from account {} using favorite ({})",
                format_money(payment.amount),
                payment.account_id,
                payment.id
            );
            Ok(true)
        }

        WalletCommand::Account { id, phone } => {
            let account = match (id, phone) {
                (Some(id), _) => service.find_account_by_id(id)?,
                (None, Some(phone)) => service.find_account_by_phone(&phone)?,
                (None, None) => anyhow::bail!("Pass an account ID or --phone"),
            };
            let payments = service.filter_payments(account.id)?;

            println!("Account: {}", account.id);
            println!("  Phone:    {}", account.phone);
            println!("  Balance:  {}", format_money(account.balance));
            println!("  Created:  {}", account.created_at.format("%Y-%m-%d %H:%M:%S"));
            println!("  Payments: {}", payments.len());
            Ok(false)
        }

        WalletCommand::Payment { id } => {
            let payment = service.find_payment_by_id(parse_id(&id, "payment")?)?;
            println!("Payment: {}", payment.id);
            println!("  Account:  {}", payment.account_id);
            println!("  Amount:   {}", format_money(payment.amount));
            println!("  Category: {}", payment.category);
            println!("  Status:   {}", payment.status);
            println!("  Created:  {}", payment.created_at.format("%Y-%m-%d %H:%M:%S"));
            Ok(false)
        }

        WalletCommand::Accounts => {
            let accounts = service.accounts();
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<6} {:<18} {:>14}", "ID", "PHONE", "BALANCE");
                println!("{}", "-".repeat(40));
                for account in accounts {
                    println!(
                        "{:<6} {:<18} {:>14}",
                        account.id,
                        account.phone,
                        format_money(account.balance)
                    );
                }
            }
            Ok(false)
        }

        WalletCommand::Payments { account, status } => {
            let status = status
                .map(|s| {
                    PaymentStatus::from_str(&s).with_context(|| {
                        format!("Invalid status '{}'. Valid: INPROGRESS, OK, FAIL", s)
                    })
                })
                .transpose()?;
            let payments = match account {
                Some(id) => service.filter_payments(id)?,
                None => service.payments(),
            };
            let payments: Vec<Payment> = payments
                .into_iter()
                .filter(|p| status.is_none_or(|s| p.status == s))
                .collect();
            print_payments(&payments);
            Ok(false)
        }

        WalletCommand::Favorites => {
            let favorites = service.favorites();
            if favorites.is_empty() {
                println!("No favorites found.");
            } else {
                println!(
                    "{:<36} {:<16} {:<8} {:>12} {:<12}",
                    "ID", "NAME", "ACCOUNT", "AMOUNT", "CATEGORY"
                );
                println!("{}", "-".repeat(88));
                for favorite in favorites {
                    println!(
                        "{:<36} {:<16} {:<8} {:>12} {:<12}",
                        favorite.id,
                        favorite.name,
                        favorite.account_id,
                        format_money(favorite.amount),
                        favorite.category
                    );
                }
            }
            Ok(false)
        }

        WalletCommand::Total => {
            println!("Total payments: {}", format_money(service.sum_payments()));
            Ok(false)
        }

        WalletCommand::Export {
            export_type,
            output,
            account,
        } => {
            run_export_command(service, &export_type, output.as_deref(), account)?;
            Ok(false)
        }

        WalletCommand::Import { input, dry_run } => run_import_command(service, input.as_deref(), dry_run),
    }
}

fn parse_amount(input: &str) -> Result<Money> {
    parse_money(input).with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", input))
}

fn parse_id(input: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(input.trim())
        .with_context(|| format!("Invalid {} ID '{}' (expected UUID)", what, input))
}

fn print_payments(payments: &[Payment]) {
    if payments.is_empty() {
        println!("No payments found.");
        return;
    }

    println!(
        "{:<36} {:<8} {:>12} {:<12} {:<10}",
        "ID", "ACCOUNT", "AMOUNT", "CATEGORY", "STATUS"
    );
    println!("{}", "-".repeat(82));
    for payment in payments {
        println!(
            "{:<36} {:<8} {:>12} {:<12} {:<10}",
            payment.id,
            payment.account_id,
            format_money(payment.amount),
            payment.category,
            payment.status
        );
    }
}

fn run_export_command(
    service: &WalletService,
    export_type: &str,
    output: Option<&str>,
    account: Option<AccountId>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Cannot create output file '{}'", path))?,
        ),
        None => Box::new(stdout()),
    };
    let exporter = Exporter::new(service);

    let count = match export_type {
        "accounts" => exporter.export_accounts_csv(writer)?,
        "payments" => exporter.export_payments_csv(writer, account)?,
        "favorites" => exporter.export_favorites_csv(writer)?,
        "full" => exporter.export_snapshot_json(writer)?.record_count(),
        other => anyhow::bail!(
            "Unknown export type '{}'. Valid: accounts, payments, favorites, full",
            other
        ),
    };

    if let Some(path) = output {
        eprintln!("Exported {} record(s) to {}", count, path);
    }
    Ok(())
}

fn run_import_command(service: &WalletService, input: Option<&str>, dry_run: bool) -> Result<bool> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{stdin, Read};

    let reader: Box<dyn Read> = match input {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("Cannot open input file '{}'", path))?,
        ),
        None => Box::new(stdin()),
    };

    let result = Importer::new(service).import_snapshot_json(reader, ImportOptions { dry_run })?;
    let verb = if result.applied { "Imported" } else { "Validated" };
    println!(
        "{} {} account(s), {} payment(s), {} favorite(s)",
        verb, result.accounts, result.payments, result.favorites
    );
    Ok(result.applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("wallet").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_pay_with_category() {
        let cli = parse(&["-d", "test.db", "pay", "1", "10.50", "-c", "auto"]);
        assert_eq!(cli.database.as_deref(), Some("test.db"));
        match cli.command {
            Commands::Wallet(WalletCommand::Pay {
                account,
                amount,
                category,
            }) => {
                assert_eq!(account, 1);
                assert_eq!(amount, "10.50");
                assert_eq!(category, "auto");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_pay_favorite_is_kebab_case() {
        let cli = parse(&["pay-favorite", "00000000-0000-0000-0000-000000000000"]);
        assert!(matches!(
            cli.command,
            Commands::Wallet(WalletCommand::PayFavorite { .. })
        ));
    }

    #[test]
    fn test_parse_init_is_not_a_wallet_command() {
        let cli = parse(&["init"]);
        assert!(matches!(cli.command, Commands::Init));
    }

    #[test]
    fn test_account_requires_id_or_phone() {
        assert!(Cli::try_parse_from(["wallet", "account"]).is_err());
        assert!(Cli::try_parse_from(["wallet", "account", "1", "--phone", "+1"]).is_err());
        let cli = parse(&["account", "--phone", "+992000000001"]);
        assert!(matches!(
            cli.command,
            Commands::Wallet(WalletCommand::Account { id: None, phone: Some(_) })
        ));
    }

    #[test]
    fn test_commands_report_mutation() -> Result<()> {
        let service = WalletService::new();

        assert!(run_command(&service, WalletCommand::Register { phone: "+992000000001".into() })?);
        assert!(run_command(
            &service,
            WalletCommand::Deposit {
                account: 1,
                amount: "100".into()
            }
        )?);
        assert!(run_command(
            &service,
            WalletCommand::Pay {
                account: 1,
                amount: "25.50".into(),
                category: "auto".into()
            }
        )?);
        assert!(!run_command(&service, WalletCommand::Accounts)?);
        assert!(!run_command(&service, WalletCommand::Total)?);

        assert_eq!(service.find_account_by_id(1)?.balance, 74_50);
        Ok(())
    }

    #[test]
    fn test_command_errors_propagate() {
        let service = WalletService::new();

        let err = run_command(
            &service,
            WalletCommand::Deposit {
                account: 1,
                amount: "abc".into(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid amount"));

        let err = run_command(&service, WalletCommand::Reject { id: "nope".into() }).unwrap_err();
        assert!(err.to_string().contains("Invalid payment ID"));

        let err = run_command(
            &service,
            WalletCommand::Payments {
                account: None,
                status: Some("settled".into()),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid status"));
    }
}
