use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::LedgerService;
use crate::domain::{Cents, OperationType, Statement, User, UserId, format_cents, parse_cents};

/// Arca - Account Ledger
#[derive(Parser)]
#[command(name = "arca")]
#[command(about = "An append-only account ledger: deposits, withdrawals and transfers")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "ledger.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Deposit funds into an account
    Deposit {
        /// Amount to deposit (e.g., "50.00" or "50")
        amount: String,

        /// Account email
        #[arg(long)]
        account: String,

        /// Description of the deposit
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Withdraw funds from an account
    Withdraw {
        /// Amount to withdraw (e.g., "50.00" or "50")
        amount: String,

        /// Account email
        #[arg(long)]
        account: String,

        /// Description of the withdrawal
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Transfer funds between accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        amount: String,

        /// Sender account email (debited)
        #[arg(long)]
        from: String,

        /// Recipient account email (credited)
        #[arg(long)]
        to: String,

        /// Description of the transfer
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show balance for an account or all accounts
    Balance {
        /// Account email (omit for all accounts)
        account: Option<String>,
    },

    /// Show statement history for an account
    History {
        /// Account email
        #[arg(long)]
        account: String,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show detailed statement information
    #[command(name = "show")]
    ShowStatement {
        /// Statement ID
        id: String,

        /// Requesting account email (must own or have sent the statement)
        #[arg(long)]
        account: String,
    },

    /// Verify ledger integrity
    Check,

    /// Export data to CSV
    Export {
        /// What to export: statements, balances
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Register a new account
    Create {
        /// Holder name
        #[arg(long)]
        name: String,

        /// Email (must be unique)
        #[arg(long)]
        email: String,

        /// Password
        #[arg(long)]
        password: String,
    },

    /// Show account profile and balance
    Show {
        /// Account email
        email: String,
    },

    /// Verify account credentials
    Login {
        /// Account email
        email: String,

        /// Password
        #[arg(long)]
        password: String,
    },

    /// List all accounts
    List,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Account(account_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Deposit {
                amount,
                account,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let user = service.find_account_by_email(&account).await?;
                let statement = service
                    .deposit(
                        user.id,
                        amount_cents,
                        description.as_deref().unwrap_or_default(),
                    )
                    .await?;

                println!(
                    "Recorded deposit: {} into {} ({})",
                    format_cents(statement.amount_cents),
                    user.email,
                    statement.id
                );
            }

            Commands::Withdraw {
                amount,
                account,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let user = service.find_account_by_email(&account).await?;
                let statement = service
                    .withdraw(
                        user.id,
                        amount_cents,
                        description.as_deref().unwrap_or_default(),
                    )
                    .await?;

                println!(
                    "Recorded withdrawal: {} from {} ({})",
                    format_cents(statement.amount_cents),
                    user.email,
                    statement.id
                );
            }

            Commands::Transfer {
                amount,
                from,
                to,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let sender = service.find_account_by_email(&from).await?;
                let recipient = service.find_account_by_email(&to).await?;
                let statement = service
                    .transfer(
                        recipient.id,
                        sender.id,
                        amount_cents,
                        description.as_deref().unwrap_or_default(),
                    )
                    .await?;

                println!(
                    "Recorded transfer: {} {} -> {} ({})",
                    format_cents(statement.amount_cents),
                    sender.email,
                    recipient.email,
                    statement.id
                );
            }

            Commands::Balance { account } => {
                let service = LedgerService::connect(&self.database).await?;
                run_balance_command(&service, account).await?;
            }

            Commands::History { account, format } => {
                let service = LedgerService::connect(&self.database).await?;
                run_history_command(&service, &account, &format).await?;
            }

            Commands::ShowStatement { id, account } => {
                let service = LedgerService::connect(&self.database).await?;
                let statement_id =
                    Uuid::parse_str(&id).context("Invalid statement ID format (expected UUID)")?;

                run_show_statement_command(&service, statement_id, &account).await?;
            }

            Commands::Check => {
                let service = LedgerService::connect(&self.database).await?;
                run_check_command(&service).await?;
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                run_export_command(&service, &export_type, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

async fn run_account_command(service: &LedgerService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            name,
            email,
            password,
        } => {
            let user = service.register_account(&name, &email, &password).await?;
            println!("Created account: {} <{}>", user.name, user.email);
            println!("  ID: {}", user.id);
        }

        AccountCommands::Show { email } => {
            let user = service.find_account_by_email(&email).await?;
            let history = service.statement_history(user.id).await?;

            println!("Account: {} <{}>", user.name, user.email);
            println!("  ID:         {}", user.id);
            println!(
                "  Created:    {}",
                user.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            println!("  Statements: {}", history.statements.len());
            println!("  Balance:    {}", format_cents(history.balance));
        }

        AccountCommands::Login { email, password } => {
            let user = service.authenticate(&email, &password).await?;
            println!("Credentials verified for {} <{}>", user.name, user.email);
        }

        AccountCommands::List => {
            let accounts = service.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<20} {:<30} {:<12}", "NAME", "EMAIL", "CREATED");
                println!("{}", "-".repeat(64));
                for account in accounts {
                    println!(
                        "{:<20} {:<30} {:<12}",
                        truncate(&account.name, 20),
                        truncate(&account.email, 30),
                        account.created_at.format("%Y-%m-%d")
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_balance_command(service: &LedgerService, account: Option<String>) -> Result<()> {
    match account {
        Some(email) => {
            let user = service.find_account_by_email(&email).await?;
            let balance = service.get_balance(user.id).await?;
            println!("{}: {}", user.email, format_cents(balance));
        }
        None => {
            let entries = service.get_all_balances().await?;
            if entries.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<30} {:>12}", "ACCOUNT", "BALANCE");
                println!("{}", "-".repeat(44));
                for entry in entries {
                    println!(
                        "{:<30} {:>12}",
                        truncate(&entry.account.email, 30),
                        format_cents(entry.balance)
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_history_command(service: &LedgerService, email: &str, format: &str) -> Result<()> {
    let user = service.find_account_by_email(email).await?;
    let history = service.statement_history(user.id).await?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        "table" => {
            if history.statements.is_empty() {
                println!("No statements found.");
            } else {
                let emails = service.get_account_emails().await?;

                println!(
                    "{:<12} {:<13} {:>12} {:<30} DESCRIPTION",
                    "DATE", "TYPE", "AMOUNT", "COUNTERPARTY"
                );
                println!("{}", "-".repeat(80));

                for statement in &history.statements {
                    let (label, signed) = describe_for(&user, statement);
                    let counterparty = counterparty_email(&user, statement, &emails);

                    println!(
                        "{:<12} {:<13} {:>12} {:<30} {}",
                        statement.created_at.format("%Y-%m-%d"),
                        label,
                        format_cents(signed),
                        truncate(&counterparty, 30),
                        truncate(&statement.description, 30)
                    );
                }
            }
            println!();
            println!("Balance: {}", format_cents(history.balance));
        }
        other => {
            anyhow::bail!("Invalid format '{}'. Valid formats: table, json", other);
        }
    }
    Ok(())
}

async fn run_show_statement_command(
    service: &LedgerService,
    statement_id: Uuid,
    email: &str,
) -> Result<()> {
    let user = service.find_account_by_email(email).await?;
    let statement = service.get_statement(user.id, statement_id).await?;
    let emails = service.get_account_emails().await?;

    let owner = emails
        .get(&statement.user_id)
        .cloned()
        .unwrap_or_else(|| statement.user_id.to_string());

    println!("Statement: {}", statement.id);
    println!(
        "  Date:        {}",
        statement.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!("  Type:        {}", statement.operation);
    println!("  Amount:      {}", format_cents(statement.amount_cents));
    println!("  Account:     {}", owner);
    if let Some(sender_id) = statement.sender_id {
        let sender = emails
            .get(&sender_id)
            .cloned()
            .unwrap_or_else(|| sender_id.to_string());
        println!("  Sender:      {}", sender);
    }
    if !statement.description.is_empty() {
        println!("  Description: {}", statement.description);
    }

    Ok(())
}

async fn run_check_command(service: &LedgerService) -> Result<()> {
    println!("Checking ledger integrity...\n");

    let report = service.check_integrity().await?;

    println!("Accounts:   {}", report.account_count);
    println!("Statements: {}", report.statement_count);
    println!();

    if report.is_clean() {
        println!("Ledger is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "statements" => {
            let count = exporter.export_statements_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} statements", count);
            }
        }
        "balances" => {
            let count = exporter.export_balances_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} balances", count);
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: statements, balances",
                export_type
            );
        }
    }

    Ok(())
}

/// Label and signed amount of a statement from one account's perspective.
fn describe_for(viewer: &User, statement: &Statement) -> (&'static str, Cents) {
    match statement.operation {
        OperationType::Deposit => ("deposit", statement.amount_cents),
        OperationType::Withdraw => ("withdraw", -statement.amount_cents),
        OperationType::Transfer if statement.user_id == viewer.id => {
            ("transfer in", statement.amount_cents)
        }
        OperationType::Transfer => ("transfer out", -statement.amount_cents),
    }
}

fn counterparty_email(
    viewer: &User,
    statement: &Statement,
    emails: &std::collections::HashMap<UserId, String>,
) -> String {
    let other = match statement.operation {
        OperationType::Transfer if statement.user_id == viewer.id => statement.sender_id,
        OperationType::Transfer => Some(statement.user_id),
        _ => None,
    };

    other
        .map(|id| emails.get(&id).cloned().unwrap_or_else(|| id.to_string()))
        .unwrap_or_default()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("groceries", 20), "groceries");
        assert_eq!(
            truncate("a description that runs long", 20),
            "a description tha..."
        );
        // Cuts between chars, never at a byte offset inside one
        assert_eq!(truncate("ααααααααααα", 20), "ααααααααααα");
        assert_eq!(truncate("αβγδεζηθικλ", 10), "αβγδεζη...");
    }
}
