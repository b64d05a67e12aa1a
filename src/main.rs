mod cli;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use colored::*;
use moni_airdrop::{
    config::{Config, RuleConfig},
    eligibility::{AggregateResult, EligibilityAggregator, EligibilityVerdict, HoldingReport},
    error::{self, CheckerError},
    provider::{AlchemyClient, BalanceProvider},
    session::{CheckSession, CheckTicket, SessionState},
    utils,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("moni_airdrop=info,moni_check=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Check {
            address,
            rule,
            concurrent,
            format,
        } => check_address(&config, &address, rule.as_deref(), concurrent, &format).await,

        Commands::Balances { address, format } => show_balances(&config, &address, &format).await,

        Commands::Rules { format } => list_rules(&config, &format),

        Commands::Watch => {
            info!("Watching stdin for wallet addresses...");
            watch_addresses(&config).await
        }
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn build_provider(config: &Config) -> error::Result<Arc<dyn BalanceProvider>> {
    if !config.has_api_key() && config.provider.base_url.is_none() {
        warn!("No provider API key configured; every rule will report an error");
    }
    Ok(Arc::new(AlchemyClient::new(&config.provider)?))
}

fn build_aggregator(config: &Config) -> error::Result<EligibilityAggregator> {
    Ok(EligibilityAggregator::from_config(config, build_provider(config)?))
}

async fn check_address(
    config: &Config,
    address: &str,
    rule: Option<&str>,
    concurrent: bool,
    format: &str,
) -> error::Result<()> {
    let mut config = config.clone();
    if let Some(id) = rule {
        let selected = config
            .rule(id)
            .cloned()
            .ok_or_else(|| CheckerError::Config(format!("unknown rule: {}", id)))?;
        config.rules = vec![selected];
    }
    config.eligibility.concurrent |= concurrent;

    let aggregator = build_aggregator(&config)?;

    if format == "json" {
        let result = aggregator.evaluate_all(address).await;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let spinner = utils::spinner("Checking eligibility...");
    let result = aggregator.evaluate_all(address).await;
    spinner.finish_and_clear();

    print_result(&result);
    Ok(())
}

fn print_result(result: &AggregateResult) {
    println!("\n{}", "=== $MONI Airdrop Eligibility ===".cyan().bold());
    println!("Wallet:  {}", utils::format_address(&result.address));
    println!("Checked: {}", utils::format_timestamp(&result.checked_at));

    if result.is_eligible() {
        println!("\n{}", "Congratulations! You're eligible.".green().bold());
    } else {
        println!("\n{}", "Not eligible for MoniSwap Airdrop".red());
    }

    println!();
    utils::print_table_border(96);
    utils::print_table_row(&["", "Collection", "Balance", "$MONI Value"], &[2, 36, 30, 20]);
    utils::print_table_border(96);

    for outcome in &result.verdicts {
        match &outcome.verdict {
            EligibilityVerdict::Eligible {
                balance_display,
                usd_value,
                token_symbol,
                token_name,
                ..
            } => {
                utils::print_table_row(
                    &[
                        &"✓".green().to_string(),
                        &format!("Holder of {}", token_name),
                        &format!("{} {}", balance_display, token_symbol),
                        &utils::format_usd_colored(*usd_value),
                    ],
                    &[2, 36, 30, 20],
                );
            }
            EligibilityVerdict::Ineligible { message, .. } => {
                utils::print_table_row(
                    &["✗", &outcome.display_name, message, "-"],
                    &[2, 36, 30, 20],
                );
            }
        }
    }
    utils::print_table_border(96);

    println!("Eligible items:    {}", result.total_eligible_count);
    println!("Total $MONI value: {}", utils::format_usd_colored(result.total_usd_value));
}

async fn show_balances(config: &Config, address: &str, format: &str) -> error::Result<()> {
    let aggregator = build_aggregator(config)?;

    let mut holdings: Vec<HoldingReport> = Vec::new();
    let mut missing: Vec<(String, String)> = Vec::new();

    for rule in aggregator.rules() {
        match rule.holding(address).await {
            Ok(Some(report)) => holdings.push(report),
            Ok(None) => missing.push((rule.id().to_string(), "No tokens found for this contract".to_string())),
            Err(e) => {
                warn!("Failed to fetch holding for rule {}: {}", rule.id(), e);
                missing.push((rule.id().to_string(), format!("Error: {}", e)));
            }
        }
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&holdings)?);
        return Ok(());
    }

    println!("\n{}", "=== Token Holdings ===".cyan().bold());
    println!("Wallet: {}", address);

    for report in &holdings {
        println!("\n{} ({})", report.metadata.name.bold(), report.metadata.symbol);
        println!("  Contract:  {}", report.contract_address);
        println!("  Balance:   {} {}", report.formatted_balance.yellow(), report.metadata.symbol);
        println!("  Raw:       {}", report.raw_balance);
        println!("  Decimal:   {}", report.decimal_balance);
        println!("  Decimals:  {}", report.metadata.decimals);
        if let Some(logo) = &report.metadata.logo {
            println!("  Logo:      {}", logo);
        }
        if !report.metadata.fetched {
            println!("  {}", "Metadata unavailable, showing defaults".yellow());
        }
    }

    for (rule_id, message) in &missing {
        println!("\n{}: {}", rule_id, message.dimmed());
    }

    Ok(())
}

#[derive(Serialize)]
struct RuleTable<'a> {
    rules: &'a [RuleConfig],
}

fn list_rules(config: &Config, format: &str) -> error::Result<()> {
    if format == "toml" {
        let table = toml::to_string_pretty(&RuleTable { rules: &config.rules })
            .map_err(|e| CheckerError::Other(e.into()))?;
        println!("{}", table);
        return Ok(());
    }

    println!("{}", "=== Eligibility Rules ===".cyan().bold());
    utils::print_table_border(110);
    utils::print_table_row(
        &["Id", "Collection", "Contract", "Unit Value", "Symbol"],
        &[14, 20, 44, 14, 8],
    );
    utils::print_table_border(110);
    for rule in &config.rules {
        utils::print_table_row(
            &[
                &rule.id,
                &rule.display_name,
                &rule.contract_address,
                &utils::format_usd(rule.unit_usd_value),
                &rule.fallback_symbol,
            ],
            &[14, 20, 44, 14, 8],
        );
    }
    utils::print_table_border(110);

    println!("Dust threshold: {}", config.eligibility.epsilon);
    println!("Rule timeout:   {}ms", config.eligibility.rule_timeout_ms);
    println!(
        "Provider:       {} ({})",
        config.provider.network,
        if config.has_api_key() { "key configured".green() } else { "no API key".red() }
    );

    Ok(())
}

async fn watch_addresses(config: &Config) -> error::Result<()> {
    let aggregator = Arc::new(build_aggregator(config)?);
    let (tx, mut rx) = mpsc::unbounded_channel::<(CheckTicket, error::Result<AggregateResult>)>();
    let mut session = CheckSession::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Connect your ETH wallet to check if you're eligible for the $MONI airdrop.");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line.map_err(|e| CheckerError::Other(e.into()))? {
                    Some(line) => line,
                    None => break,
                };
                let address = line.trim();

                let ticket = if address.is_empty() {
                    session.observe(false, None)
                } else {
                    session.observe(true, Some(address))
                };

                match ticket {
                    Some(ticket) => {
                        println!("{}", format!("Checking eligibility for {}...", utils::format_address(&ticket.address)).blue());
                        spawn_check(aggregator.clone(), ticket, tx.clone());
                    }
                    None => print_state(&session),
                }
            }
            Some((ticket, outcome)) = rx.recv() => {
                apply_outcome(&mut session, &ticket, outcome);
            }
        }
    }

    drop(tx);
    while session.in_progress() {
        match rx.recv().await {
            Some((ticket, outcome)) => apply_outcome(&mut session, &ticket, outcome),
            None => break,
        }
    }

    Ok(())
}

fn spawn_check(
    aggregator: Arc<EligibilityAggregator>,
    ticket: CheckTicket,
    tx: mpsc::UnboundedSender<(CheckTicket, error::Result<AggregateResult>)>,
) {
    tokio::spawn(async move {
        let address = ticket.address.clone();
        let outcome = tokio::spawn(async move { aggregator.evaluate_all(&address).await })
            .await
            .map_err(|e| CheckerError::Other(anyhow::anyhow!("check task failed: {}", e)));

        if tx.send((ticket, outcome)).is_err() {
            debug!("Watcher closed before check finished");
        }
    });
}

fn apply_outcome(session: &mut CheckSession, ticket: &CheckTicket, outcome: error::Result<AggregateResult>) {
    if session.complete(ticket, outcome) {
        print_state(session);
    } else {
        debug!("Ignored superseded check for {}", ticket.address);
    }
}

fn print_state(session: &CheckSession) {
    match session.state() {
        SessionState::NotConnected => {
            println!("Connect your ETH wallet to check if you're eligible for the $MONI airdrop.")
        }
        SessionState::Idle => println!("Checking your wallet..."),
        SessionState::Checking { address, .. } => {
            println!("{}", format!("Still checking {}...", utils::format_address(address)).blue())
        }
        SessionState::Loaded(result) => print_result(result),
        SessionState::Error(message) => {
            println!("{}", format!("Error checking eligibility: {}", message).red())
        }
    }
}
