//! CLI entry point for the margin rebalance planner.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use margin_rebalancer::audit::{self, AuditLog};
use margin_rebalancer::config::Config;
use margin_rebalancer::margin;
use margin_rebalancer::planner;
use margin_rebalancer::profit;
use margin_rebalancer::wallet::{DesiredWallet, Wallet};

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Margin-aware portfolio rebalance planner")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute a full iteration plan from a portfolio snapshot
    Plan {
        /// Path to portfolio snapshot JSON
        portfolio: PathBuf,

        /// Path to desired wallet JSON
        desired: PathBuf,

        /// Plan as of this instant (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Override the configured margin strategy (remove | keep | keep_if_small)
        #[arg(long)]
        strategy: Option<String>,

        /// Audit trail file to append to
        #[arg(long, default_value = "audit.jsonl")]
        audit: PathBuf,
    },

    /// Show margin positions, limits, risk level and transfer costs
    Margin {
        /// Path to portfolio snapshot JSON
        portfolio: PathBuf,
    },

    /// Show per-position and aggregate profit
    Profit {
        /// Path to portfolio snapshot JSON
        portfolio: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Plan {
            portfolio,
            desired,
            at,
            strategy,
            audit,
        } => cmd_plan(&config, &portfolio, &desired, at, strategy.as_deref(), &audit),
        Command::Margin { portfolio } => cmd_margin(&config, &portfolio),
        Command::Profit { portfolio } => cmd_profit(&config, &portfolio),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

/// Full dry-run plan; returns false when margin limits are breached.
fn cmd_plan(
    config: &Config,
    portfolio: &Path,
    desired: &Path,
    at: Option<DateTime<Utc>>,
    strategy: Option<&str>,
    audit_path: &Path,
) -> anyhow::Result<bool> {
    let wallet = Wallet::load(portfolio).context("loading portfolio snapshot")?;
    let desired = DesiredWallet::load(desired).context("loading desired wallet")?;
    let now = at.unwrap_or_else(Utc::now);
    let strategy = strategy.map(margin::MarginUnwindStrategy::parse);

    let mut audit = AuditLog::open(audit_path).context("opening audit log")?;
    audit::log_run_started(&mut audit, &config.account.id, &portfolio.display().to_string())?;

    let plan = planner::plan_iteration(config, &wallet, &desired.normalized(), strategy, now);
    print!("{plan}");

    audit::log_plan(&mut audit, &plan)?;
    audit::log_run_completed(&mut audit, plan.margin_limits.is_valid)?;

    if !plan.margin_limits.is_valid {
        eprintln!(
            "\nMargin limits breached: used {:.2} exceeds {:.2}",
            plan.margin_limits.total_used, plan.margin_limits.max_allowed
        );
        return Ok(false);
    }
    Ok(true)
}

/// Margin picture only, no desired wallet needed.
fn cmd_margin(config: &Config, portfolio: &Path) -> anyhow::Result<bool> {
    let wallet = Wallet::load(portfolio).context("loading portfolio snapshot")?;

    let positions = margin::identify_margin_positions(&wallet, &config.margin);
    if positions.is_empty() {
        println!("No margin positions.");
        return Ok(true);
    }

    println!("MARGIN POSITIONS:");
    for p in &positions {
        println!(
            "  {:8} value {:>12.2}  borrowed {:>12.2}  at {:.1}x",
            p.position.base,
            p.position.total_price.unwrap_or(0.0),
            p.margin_value,
            p.leverage,
        );
    }

    let status = margin::check_margin_limits(&wallet, &positions, &config.margin);
    println!("MARGIN STATUS: {status}");

    let limits = margin::validate_margin_limits(&positions, &config.margin);
    match limits.exceeded_by {
        Some(excess) => println!(
            "MARGIN LIMITS: used {:.2} / {:.2} max EXCEEDED by {excess:.2}",
            limits.total_used, limits.max_allowed
        ),
        None => println!(
            "MARGIN LIMITS: used {:.2} / {:.2} max",
            limits.total_used, limits.max_allowed
        ),
    }

    let transfer = margin::calculate_transfer_cost(&positions, &config.margin);
    println!(
        "TRANSFER COST: {:.2} ({} free, {} paid)",
        transfer.total_cost, transfer.free_count, transfer.paid_count
    );

    Ok(limits.is_valid && status.is_valid)
}

/// Per-position profit against cost basis.
fn cmd_profit(config: &Config, portfolio: &Path) -> anyhow::Result<bool> {
    let wallet = Wallet::load(portfolio).context("loading portfolio snapshot")?;

    let summary = profit::calculate_iteration_profit(&wallet, config.profit.min_profit_percent);
    if summary.positions.is_empty() {
        println!("No positions with a computable profit.");
        return Ok(true);
    }

    println!("PROFIT:");
    for p in &summary.positions {
        println!(
            "  {:8} {:>+12.2} ({:+.2}%){}",
            p.base,
            p.profit_amount,
            p.profit_percent,
            if p.meets_threshold { "" } else { "  below gate" },
        );
    }
    println!(
        "TOTAL: {:+.2} ({} up, {} down)",
        summary.total_profit, summary.profit_positions, summary.loss_positions
    );

    Ok(true)
}
