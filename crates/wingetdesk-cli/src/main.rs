mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wingetdesk_core::AppSession;
use wingetdesk_core::models::CoreError;

use crate::cli::Cli;

fn main() -> Result<(), CoreError> {
    let cli = Cli::parse();
    let config = cli.config()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(program = %config.program.display(), "starting wingetdesk");

    let mut session = AppSession::new(&config)?;
    cli.run(&mut session)
}
