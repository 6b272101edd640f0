mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::plan::{CashOnlyArgs, MonthsToTargetArgs, OverviewArgs, TradePlanArgs};

/// Deterministic portfolio rebalancing plans
#[derive(Parser)]
#[command(
    name = "rebal",
    version,
    about = "Deterministic portfolio rebalancing plans",
    long_about = "Computes portfolio rebalancing plans with exact integer-cent \
                  arithmetic. Supports a trade-based plan (buys and sells with \
                  capital-gains tax and fees), a cash-injection-only plan, a \
                  side-by-side overview of both, and a savings-horizon helper. \
                  Monetary input fields are integer cents; weights are basis points."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a self-funding buy/sell plan with taxes and fees
    TradePlan(TradePlanArgs),
    /// Compute the minimum cash injection that rebalances without selling
    CashOnly(CashOnlyArgs),
    /// Compute both strategies side by side with BUY/SELL/HOLD actions
    Overview(OverviewArgs),
    /// Months of saving needed to cover a cash requirement
    MonthsToTarget(MonthsToTargetArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::TradePlan(args) => commands::plan::run_trade_plan(args),
        Commands::CashOnly(args) => commands::plan::run_cash_only(args),
        Commands::Overview(args) => commands::plan::run_overview(args),
        Commands::MonthsToTarget(args) => commands::plan::run_months_to_target(args),
        Commands::Version => {
            println!("rebal {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
