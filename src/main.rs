//! hunt - TCP port scanner and service fingerprinter.

use anyhow::Result;
use clap::Parser;
use hunt::cli::{load_settings, Cli, Commands};
use hunt::error::CliResult;
use hunt::{output, services};
use std::io::{self, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

fn init_logging(level: tracing::Level) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("hunt={}", level).parse()?)
        .add_directive(level.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

async fn run(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Scan(cmd) => {
            let settings = load_settings(cli.config.as_deref())?;
            cmd.execute(&settings, cli.quiet).await
        }
        Commands::Services => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            output::write_catalog(&mut out, services::catalog())?;
            out.flush()?;
            Ok(())
        }
        Commands::Config(cmd) => cmd.execute(cli.config.as_deref(), cli.quiet),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(log_level(cli.verbose))?;

    if let Err(e) = run(&cli).await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }

    Ok(())
}
