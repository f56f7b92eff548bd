mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::bonds::{BondPriceArgs, BondYieldArgs};
use commands::combinatorics::CountingArgs;
use commands::debt::DebtPayoffArgs;
use commands::dispatch::RunArgs;
use commands::loans::LoanArgs;
use commands::savings::ProjectionArgs;

/// Loan, savings, bond and debt-payoff calculations
#[derive(Parser)]
#[command(
    name = "calc",
    version,
    about = "Loan, savings, bond and debt-payoff calculations",
    long_about = "A CLI for the calculator engines with decimal precision. Supports \
                  amortization schedules, savings projections, bond price and yield, \
                  debt payoff strategies, and combinations/permutations."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Periodic payment and amortization schedule for a loan
    Loan(LoanArgs),
    /// Year-by-year compound interest projection
    Projection(ProjectionArgs),
    /// Bond price, duration and current yield from a market rate
    BondPrice(BondPriceArgs),
    /// Yield to maturity from a bond price
    BondYield(BondYieldArgs),
    /// Simulate paying down several debts with one monthly budget
    DebtPayoff(DebtPayoffArgs),
    /// Compare avalanche and snowball on the same debts
    DebtCompare(DebtPayoffArgs),
    /// Count unordered selections
    Combinations(CountingArgs),
    /// Count ordered selections
    Permutations(CountingArgs),
    /// Run a request tagged with a "calculator" field
    Run(RunArgs),
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

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Loan(args) => commands::loans::run_loan(args),
        Commands::Projection(args) => commands::savings::run_projection(args),
        Commands::BondPrice(args) => commands::bonds::run_bond_price(args),
        Commands::BondYield(args) => commands::bonds::run_bond_yield(args),
        Commands::DebtPayoff(args) => commands::debt::run_debt_payoff(args),
        Commands::DebtCompare(args) => commands::debt::run_debt_compare(args),
        Commands::Combinations(args) => commands::combinatorics::run_combinations(args),
        Commands::Permutations(args) => commands::combinatorics::run_permutations(args),
        Commands::Run(args) => commands::dispatch::run_calculation(args),
        Commands::Version => {
            println!("calc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {:?}", e);
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
