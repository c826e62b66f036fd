use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use engine::{Currency, Engine, ExpenseCmd, Profile, SettleCmd, parse_amount};
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

mod settings;

type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "splitxo")]
#[command(about = "Shared expenses, balances and settlements")]
struct Cli {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,

    /// Database connection string, overrides the configured database.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage display profiles.
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    /// Manage expenses.
    Expense {
        #[command(subcommand)]
        command: ExpenseCommand,
    },
    /// Manually flag a split.
    Split {
        #[command(subcommand)]
        command: SplitCommand,
    },
    /// Show a user's balances.
    Balances {
        #[arg(long)]
        user: String,
    },
    /// Record a payment between two members.
    Settle(SettleArgs),
    /// Settlement history of a group.
    Settlements {
        #[arg(long)]
        group: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    Add(ExpenseAddArgs),
    Show {
        #[arg(long)]
        id: Uuid,
    },
    Delete {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Args, Debug)]
struct ExpenseAddArgs {
    #[arg(long)]
    group: Uuid,
    #[arg(long)]
    paid_by: String,
    #[arg(long, value_parser = parse_decimal)]
    amount: Decimal,
    #[arg(long, default_value = "INR")]
    currency: Currency,
    /// Expense date (YYYY-MM-DD), defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    receipt: Option<String>,
    /// Explicit share, as `user=amount`. Repeatable.
    #[arg(long = "share", value_parser = parse_share, conflicts_with = "equal")]
    shares: Vec<(String, Decimal)>,
    /// Split equally among these members (comma separated).
    #[arg(long, value_delimiter = ',')]
    equal: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum SplitCommand {
    Settle {
        #[arg(long)]
        id: Uuid,
    },
    Unsettle {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Args, Debug)]
struct SettleArgs {
    #[arg(long)]
    group: Uuid,
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    #[arg(long, value_parser = parse_decimal)]
    amount: Decimal,
    #[arg(long)]
    notes: Option<String>,
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    parse_amount(raw).map_err(|err| err.to_string())
}

fn parse_share(raw: &str) -> Result<(String, Decimal), String> {
    let (user, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected user=amount, got `{raw}`"))?;
    Ok((user.trim().to_string(), parse_decimal(amount)?))
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect(url: &str) -> AppResult<Engine> {
    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(Engine::builder().database(database).build().await?)
}

async fn run(engine: &Engine, command: Command) -> AppResult<()> {
    match command {
        Command::Profile {
            command: ProfileCommand::Add { id, name, email },
        } => {
            let mut profile = Profile::new(id);
            profile.full_name = name;
            profile.email = email;
            print_json(&engine.upsert_profile(profile).await?)
        }
        Command::Expense {
            command: ExpenseCommand::Add(args),
        } => {
            let date = args.date.unwrap_or_else(|| Local::now().date_naive());
            let mut cmd = ExpenseCmd::new(args.group, args.paid_by, args.amount, date)
                .currency(args.currency);
            if let Some(category) = args.category {
                cmd = cmd.category(category);
            }
            if let Some(notes) = args.notes {
                cmd = cmd.notes(notes);
            }
            if let Some(receipt) = args.receipt {
                cmd = cmd.receipt_ref(receipt);
            }
            let cmd = if args.equal.is_empty() {
                args.shares
                    .into_iter()
                    .fold(cmd, |cmd, (user, amount)| cmd.share(user, amount))
            } else {
                cmd.split_equally(&args.equal)?
            };
            print_json(&engine.create_expense(cmd).await?)
        }
        Command::Expense {
            command: ExpenseCommand::Show { id },
        } => print_json(&engine.expense(id).await?),
        Command::Expense {
            command: ExpenseCommand::Delete { id },
        } => {
            engine.delete_expense(id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        Command::Split {
            command: SplitCommand::Settle { id },
        } => print_json(&engine.set_split_settled(id, true).await?),
        Command::Split {
            command: SplitCommand::Unsettle { id },
        } => print_json(&engine.set_split_settled(id, false).await?),
        Command::Balances { user } => print_json(&engine.balances(&user).await?),
        Command::Settle(args) => {
            let mut cmd = SettleCmd::new(args.group, args.from, args.to, args.amount);
            if let Some(notes) = args.notes {
                cmd = cmd.notes(notes);
            }
            print_json(&engine.record_settlement(cmd).await?)
        }
        Command::Settlements { group } => print_json(&engine.list_group_settlements(group).await?),
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "splitxo={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let url = cli.database_url.unwrap_or_else(|| settings.database.url());
    tracing::debug!(%url, "opening database");
    let engine = connect(&url).await?;

    run(&engine, cli.command).await
}
