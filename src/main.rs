//! sapcheck CLI - sapconf / saptune setup checker
//!
//! Collects the host facts once, evaluates the requested tool and exits
//! with a status derived from the findings.

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use sapcheck::check::{Evaluation, SapconfCheck, SaptuneCheck, TuningCheck};
use sapcheck::config::{CheckConfig, CliArgs, Commands, OutputFormat, EXIT_FAIL, EXIT_OK, EXIT_USAGE};
use sapcheck::error::CheckError;
use sapcheck::system::{FactSnapshot, HostCollector, HostIdentity, Overview};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Parse CLI arguments; clap errors are usage errors unless help or
    // version was asked for
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_OK,
                _ => EXIT_USAGE,
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let config = CheckConfig::from_cli(&args);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(args.command, &config) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            if e
                .downcast_ref::<CheckError>()
                .map_or(false, CheckError::is_rule_table_error)
            {
                eprintln!("This sapcheck release does not know the installed setup, please update it.");
            }
            ExitCode::from(EXIT_FAIL)
        }
    }
}

fn run(command: Commands, config: &CheckConfig) -> anyhow::Result<u8> {
    tracing::debug!("Collecting host facts below {}", config.root.display());
    let facts = HostCollector::new(&config.root)
        .collect()
        .context("Cannot collect host facts")?;

    handle_command(command, &facts, config)
}

fn handle_command(command: Commands, facts: &FactSnapshot, config: &CheckConfig) -> anyhow::Result<u8> {
    match command {
        Commands::Overview => cmd_overview(facts, config),
        Commands::Sapconf => cmd_check(&SapconfCheck, facts, config),
        Commands::Saptune => cmd_check(&SaptuneCheck, facts, config),
    }
}

fn cmd_overview(facts: &FactSnapshot, config: &CheckConfig) -> anyhow::Result<u8> {
    let overview = Overview::new(HostIdentity::detect(), facts);

    match config.format {
        OutputFormat::Text => overview.print_summary()?,
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&overview)?),
    }

    Ok(EXIT_OK)
}

fn cmd_check(check: &dyn TuningCheck, facts: &FactSnapshot, config: &CheckConfig) -> anyhow::Result<u8> {
    let evaluation = check
        .evaluate(facts)
        .with_context(|| format!("Checking {} failed", check.name()))?;

    tracing::info!(
        "{}: {} ({} warning(s), {} error(s))",
        evaluation.tool,
        evaluation.status,
        evaluation.warnings,
        evaluation.failures
    );
    print_evaluation(&evaluation, config)?;

    Ok(evaluation.status.exit_code())
}

fn print_evaluation(evaluation: &Evaluation, config: &CheckConfig) -> anyhow::Result<()> {
    match config.format {
        OutputFormat::Text => evaluation.print(config.color)?,
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(evaluation)?),
    }
    Ok(())
}
