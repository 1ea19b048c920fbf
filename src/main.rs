use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{CommandFactory, Parser, Subcommand};
use coinyield::core::asset::AssetSymbol;
use coinyield::core::log::init_logging;
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display current market rates
    Rates,
    /// Convert an amount between two assets
    Convert {
        amount: Decimal,
        from: AssetSymbol,
        to: AssetSymbol,
    },
    /// List staking plans
    Plans,
    /// Project the return of a plan for an amount
    Project { plan: String, amount: Decimal },
    /// Show accrual status of a subscription
    Subscription {
        amount: Decimal,
        /// Annual percentage yield, e.g. 12.5
        #[arg(long)]
        apy: Decimal,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Term length in days
        #[arg(long)]
        days: u32,
    },
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

impl TryFrom<Commands> for coinyield::AppCommand {
    type Error = anyhow::Error;

    fn try_from(cmd: Commands) -> Result<coinyield::AppCommand> {
        let command = match cmd {
            Commands::Rates => coinyield::AppCommand::Rates,
            Commands::Convert { amount, from, to } => {
                coinyield::AppCommand::Convert { amount, from, to }
            }
            Commands::Plans => coinyield::AppCommand::Plans,
            Commands::Project { plan, amount } => coinyield::AppCommand::Project { plan, amount },
            Commands::Subscription {
                amount,
                apy,
                start,
                days,
            } => {
                let start = midnight(start);
                coinyield::AppCommand::Subscription {
                    amount,
                    apy_percent: apy,
                    start,
                    end: start + chrono::Duration::days(i64::from(days)),
                }
            }
            Commands::Setup => bail!("Setup command should be handled separately"),
        };
        Ok(command)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => coinyield::cli::setup::setup(),
        Some(cmd) => match coinyield::AppCommand::try_from(cmd) {
            Ok(command) => coinyield::run_command(command, cli.config_path.as_deref()).await,
            Err(e) => Err(e),
        },
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
