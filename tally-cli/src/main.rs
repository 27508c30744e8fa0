use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tally_core::MonthKey;
use tally_finance::{Flow, detect_recurring, forecast_next_month, monthly_commitment};

mod config;
mod logging;
mod pipeline;
mod report;
mod state;

use config::Config;
use pipeline::{Ledger, build_ledger};

#[derive(Parser, Debug)]
#[command(name = "tally", version, about = "Classify bank statements and summarise spending")]
struct Cli {
    /// Config file (default: ~/.tally/config.toml; .json is also accepted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Statement directory (overrides the config)
    #[arg(long, global = true)]
    statements: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the built-in rules and settings to the config file
    Init,

    /// Write the month-bucketed transaction feed for the dashboard
    Export {
        /// Output file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Wrap the feed as `var data = ...;`
        #[arg(long)]
        js: bool,
    },

    /// Money in, money out and net change per month
    Summary,

    /// Category totals over a month range
    Categories {
        /// First month, YYYY-MM (default: earliest)
        #[arg(long)]
        from: Option<MonthKey>,

        /// Last month, YYYY-MM (default: latest)
        #[arg(long)]
        to: Option<MonthKey>,

        /// Break down income instead of expenses
        #[arg(long)]
        income: bool,
    },

    /// Weekly and monthly repeat payments
    Recurring,

    /// Predicted spend for next month
    Forecast {
        /// Months to look back over (default: from config)
        #[arg(long)]
        lookback: Option<usize>,

        /// Limit number of descriptions printed
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Command::Init = cli.command {
        config::init_config(cli.config.as_deref())?;
        return Ok(());
    }

    let cfg = config::load_config(cli.config.as_deref())?;
    let statements_dir = cli
        .statements
        .clone()
        .unwrap_or_else(|| cfg.statements_dir.clone());
    if !statements_dir.is_dir() {
        bail!(
            "statement directory not found: {} (pass --statements <dir>)",
            statements_dir.display()
        );
    }

    let ledger = build_ledger(&cfg, &statements_dir)?;
    run(cli.command, &cfg, &ledger)
}

fn run(command: Command, cfg: &Config, ledger: &Ledger) -> Result<()> {
    let ignored = cfg.ignored_category.as_str();

    match command {
        Command::Init => {}

        Command::Export { out, js } => {
            let feed = report::render_feed(&ledger.buckets, js)?;
            write_output(out.as_deref(), &feed)?;
        }

        Command::Summary => {
            print!("{}", report::render_summary(&ledger.buckets.totals(ignored)));
            println!(
                "\n{} transactions, {} without a category",
                ledger.stats.total, ledger.stats.uncategorized
            );
        }

        Command::Categories { from, to, income } => {
            let (Some(first), Some(last)) =
                (ledger.buckets.months().next(), ledger.buckets.months().last())
            else {
                println!("No transactions.");
                return Ok(());
            };
            let from: MonthKey = from.unwrap_or(*first);
            let to: MonthKey = to.unwrap_or(*last);
            let flow = if income { Flow::Income } else { Flow::Expenses };

            let shares = ledger.buckets.category_breakdown(from, to, flow, ignored);
            println!("{:?} {from} to {to}\n", flow);
            print!("{}", report::render_breakdown(&shares));
        }

        Command::Recurring => {
            let payments = detect_recurring(ledger.counted(ignored), &cfg.recurring);
            let commitment = monthly_commitment(&payments);
            print!("{}", report::render_recurring(&payments, commitment));
        }

        Command::Forecast { lookback, limit } => {
            let tallies = ledger.buckets.description_tallies(ignored);
            let forecast =
                forecast_next_month(&tallies, lookback.unwrap_or(cfg.forecast.lookback));
            print!("{}", report::render_forecast(&forecast, limit));
        }
    }

    Ok(())
}

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    match out {
        Some(p) => {
            fs::write(p, contents).with_context(|| format!("write {}", p.display()))?;
            tracing::info!(path = %p.display(), "wrote feed");
        }
        None => print!("{contents}"),
    }
    Ok(())
}
