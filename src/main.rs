use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use support_diagnostics::{CollectionPlan, DiagnosticConfig};

fn main() -> Result<ExitCode> {
    // stdout carries the plan, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match DiagnosticConfig::parse(args.as_slice()) {
        Ok(config) => config,
        Err(failure) if failure.is_help() => {
            println!("{}", failure);
            return Ok(ExitCode::from(failure.exit_code() as u8));
        }
        Err(failure) => {
            error!("Invalid arguments: {}", failure);
            eprintln!("error: {}", failure);
            eprintln!();
            eprintln!("For more information, try '--help'.");
            return Ok(ExitCode::from(failure.exit_code() as u8));
        }
    };

    info!("Starting support diagnostics v{}", env!("CARGO_PKG_VERSION"));

    let plan = match CollectionPlan::resolve_now(&config) {
        Ok(plan) => plan,
        Err(e) => {
            error!("Cannot build collection plan: {}", e);
            eprintln!("error: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let json = serde_json::to_string_pretty(&plan).context("Failed to serialize collection plan")?;
    println!("{}", json);

    Ok(ExitCode::SUCCESS)
}
