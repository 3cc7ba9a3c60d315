use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::LedgerService;
use crate::domain::{format_cents, parse_cents, Movement, OperationType, User};

/// Denario - Banking Ledger
#[derive(Parser)]
#[command(name = "denario")]
#[command(about = "A small banking ledger over an append-only statement journal")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "denario.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),

    /// Deposit funds into a user's account
    Deposit {
        /// User email
        email: String,

        /// Amount to deposit (e.g., "50.00" or "50")
        amount: String,

        /// Description of the deposit
        #[arg(short, long, default_value = "deposit")]
        description: String,
    },

    /// Withdraw funds from a user's account
    Withdraw {
        /// User email
        email: String,

        /// Amount to withdraw (e.g., "50.00" or "50")
        amount: String,

        /// Description of the withdrawal
        #[arg(short, long, default_value = "withdraw")]
        description: String,
    },

    /// Transfer funds between two users
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        amount: String,

        /// Sender email
        #[arg(long)]
        from: String,

        /// Receiver email
        #[arg(long)]
        to: String,

        /// Description of the transfer
        #[arg(short, long, default_value = "transfer")]
        description: String,
    },

    /// Show a user's current balance
    Balance {
        /// User email
        email: String,
    },

    /// Show a user's statement, or one movement from it
    Statement {
        /// User email
        email: String,

        /// Movement ID (omit for the full statement)
        id: Option<String>,
    },

    /// Export a user's statement to CSV or JSON
    Export {
        /// User email
        email: String,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Verify journal integrity
    Check,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new user
    Add {
        /// Full name
        name: String,

        /// Email (must be unique)
        email: String,

        /// Password, stored as given
        #[arg(short, long)]
        password: String,
    },

    /// Show a user's profile
    Show {
        /// User email
        email: String,
    },

    /// List all users
    List,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::User(user_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_user_command(&service, user_cmd).await?;
            }

            Commands::Deposit {
                email,
                amount,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let user = service.find_user_by_email(&email).await?;
                let movement = service.deposit(user.id, amount_cents, &description).await?;

                println!(
                    "Deposited {} into {} ({})",
                    format_cents(movement.amount_cents),
                    email,
                    movement.id
                );
            }

            Commands::Withdraw {
                email,
                amount,
                description,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let user = service.find_user_by_email(&email).await?;
                let movement = service
                    .withdraw(user.id, amount_cents, &description)
                    .await?;

                println!(
                    "Withdrew {} from {} ({})",
                    format_cents(movement.amount_cents),
                    email,
                    movement.id
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

                let sender = service.find_user_by_email(&from).await?;
                let receiver = service.find_user_by_email(&to).await?;
                service
                    .transfer(sender.id, receiver.id, amount_cents, &description)
                    .await?;

                println!(
                    "Transferred {} from {} to {}",
                    format_cents(amount_cents),
                    from,
                    to
                );
            }

            Commands::Balance { email } => {
                let service = LedgerService::connect(&self.database).await?;
                let user = service.find_user_by_email(&email).await?;
                let account = service.get_balance(user.id).await?;

                println!("{}: {}", email, format_cents(account.balance_cents));
            }

            Commands::Statement { email, id } => {
                let service = LedgerService::connect(&self.database).await?;
                let user = service.find_user_by_email(&email).await?;

                match id {
                    Some(id) => {
                        let movement_id = Uuid::parse_str(&id)
                            .context("Invalid movement ID format (expected UUID)")?;
                        let movement = service.get_movement(user.id, movement_id).await?;
                        print_movement_detail(&movement);
                    }
                    None => {
                        run_statement_command(&service, &user).await?;
                    }
                }
            }

            Commands::Export {
                email,
                format,
                output,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let user = service.find_user_by_email(&email).await?;
                run_export_command(&service, &user, &format, output.as_deref()).await?;
            }

            Commands::Check => {
                let service = LedgerService::connect(&self.database).await?;
                run_check_command(&service).await?;
            }
        }

        Ok(())
    }
}

async fn run_user_command(service: &LedgerService, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::Add {
            name,
            email,
            password,
        } => {
            let user = service.register_user(name, email, password).await?;
            println!("Registered user: {} ({})", user.email, user.id);
        }

        UserCommands::Show { email } => {
            let user = service.find_user_by_email(&email).await?;
            let account = service.get_balance(user.id).await?;

            println!("User:      {}", user.name);
            println!("Email:     {}", user.email);
            println!("ID:        {}", user.id);
            println!("Created:   {}", user.created_at.format("%Y-%m-%d"));
            println!("Balance:   {}", format_cents(account.balance_cents));
            println!("Movements: {}", account.movements.len());
        }

        UserCommands::List => {
            let users = service.list_users().await?;
            if users.is_empty() {
                println!("No users found.");
            } else {
                println!("{:<28} {:<20} {:<12}", "EMAIL", "NAME", "CREATED");
                println!("{}", "-".repeat(62));
                for user in users {
                    println!(
                        "{:<28} {:<20} {:<12}",
                        truncate(&user.email, 28),
                        truncate(&user.name, 20),
                        user.created_at.format("%Y-%m-%d")
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_statement_command(service: &LedgerService, user: &User) -> Result<()> {
    let account = service.get_balance(user.id).await?;

    if account.movements.is_empty() {
        println!("No movements for {}.", user.email);
        return Ok(());
    }

    println!(
        "{:<6} {:<17} {:<10} {:>12}  {}",
        "SEQ", "DATE", "OPERATION", "AMOUNT", "DESCRIPTION"
    );
    println!("{}", "-".repeat(70));
    for movement in &account.movements {
        println!(
            "{:<6} {:<17} {:<10} {:>12}  {}",
            movement.sequence,
            movement.created_at.format("%Y-%m-%d %H:%M"),
            movement.operation.to_string(),
            format_cents(movement.signed_effect()),
            truncate(&movement.description, 30)
        );
    }
    println!("{}", "-".repeat(70));
    println!(
        "{:<35} {:>12}",
        "Balance:",
        format_cents(account.balance_cents)
    );

    Ok(())
}

fn print_movement_detail(movement: &Movement) {
    println!("Movement:     {}", movement.id);
    println!("Sequence:     {}", movement.sequence);
    println!(
        "Date:         {}",
        movement.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!("Operation:    {}", movement.operation);
    println!("Amount:       {}", format_cents(movement.amount_cents));
    if movement.operation == OperationType::Transfer {
        if let Some(counterparty) = movement.counterparty {
            println!("Counterparty: {}", counterparty);
        }
    }
    println!("Description:  {}", movement.description);
}

async fn run_export_command(
    service: &LedgerService,
    user: &User,
    format: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

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

    match format {
        "csv" => {
            let count = exporter.export_statement_csv(user.id, writer).await?;
            if output.is_some() {
                eprintln!("Exported {} movements", count);
            }
        }
        "json" => {
            let snapshot = exporter.export_statement_json(user.id, writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported statement for {}: {} movements",
                    snapshot.email,
                    snapshot.movements.len()
                );
            }
        }
        _ => {
            anyhow::bail!("Invalid export format '{}'. Valid formats: csv, json", format);
        }
    }

    Ok(())
}

async fn run_check_command(service: &LedgerService) -> Result<()> {
    println!("Checking journal integrity...\n");

    let report = service.check_integrity().await?;

    println!("Users:     {}", report.user_count);
    println!("Movements: {}", report.movement_count);
    println!();

    let mut issues = Vec::new();
    if report.has_sequence_gaps {
        issues.push("sequence numbers have gaps".to_string());
    }
    if report.unknown_user_refs > 0 {
        issues.push(format!(
            "{} movement(s) reference unknown users",
            report.unknown_user_refs
        ));
    }
    if report.zero_amounts > 0 {
        issues.push(format!(
            "{} movement(s) recorded with a zero amount",
            report.zero_amounts
        ));
    }
    if report.transfer_sum_cents != 0 {
        issues.push(format!(
            "transfer legs do not cancel (off by {})",
            format_cents(report.transfer_sum_cents)
        ));
    }

    if issues.is_empty() {
        println!("Journal is consistent.");
    } else {
        println!("Issues found:");
        for issue in &issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Journal integrity check failed");
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
