use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use freshprice_catalog::{quote, PricingContext, PricingEngine, Quote};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app_config;

/// Prints the adjusted price of one product.
#[derive(Parser, Debug)]
#[command(name = "dynamic-pricing", version, about)]
struct Cli {
    /// Product description as a JSON object
    #[arg(allow_hyphen_values = true)]
    product: Option<String>,

    /// Price as of this day (YYYY-MM-DD) instead of today
    #[arg(long, value_parser = parse_day)]
    today: Option<NaiveDate>,

    /// Extra configuration file, layered over config/default
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_day(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
}

fn main() -> ExitCode {
    // stdout carries the price, so all logging goes to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = app_config::Config::load(Path::new("config"), cli.config.as_deref())
        .context("Failed to load config")?;
    config.pricing.validate().context("Invalid pricing config")?;

    let context = cli.today.map(PricingContext::new).unwrap_or_default();
    tracing::debug!(today = %context.today, variant = ?config.pricing.variant, "pricing");

    let engine = PricingEngine::new(config.pricing);
    let outcome = quote(cli.product.as_deref(), &context, &engine);

    emit(&outcome)?;
    Ok(ExitCode::from(outcome.exit_code()))
}

/// Write the quote to the process streams the caller reads.
fn emit(quote: &Quote) -> io::Result<()> {
    if let Some(diagnostic) = quote.diagnostic() {
        let mut err = io::stderr().lock();
        writeln!(err, "{}", diagnostic)?;
    }

    if let Some(line) = quote.stdout_line() {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", line)?;
        out.flush()?;
    }

    Ok(())
}
