//! sqlweave-migrate CLI

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use sqlweave_migrate::{run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let stdout = std::io::stdout();
    run(&cli, &mut stdout.lock())?;
    Ok(())
}
