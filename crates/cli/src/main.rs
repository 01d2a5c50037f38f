mod commands;
mod error;
mod profile;

use commands::{FloodgateCli, FloodgateSubcommand};
use error::CliError;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = FloodgateCli::parse_args();

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::task::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping the run; sent transactions stay sent");
            interrupt.cancel();
        }
    });

    match args.command {
        FloodgateSubcommand::Single { args } => commands::single(*args, cancel).await?,
        FloodgateSubcommand::Swarm { args } => commands::swarm(*args, cancel).await?,
    }
    Ok(())
}
