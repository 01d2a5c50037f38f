pub mod common;
mod floodgate_subcommand;
pub mod single;
pub mod swarm;

use clap::Parser;

pub use floodgate_subcommand::FloodgateSubcommand;
pub use single::single;
pub use swarm::swarm;

#[derive(Parser, Debug)]
#[command(
    name = "floodgate",
    about = "Transaction flood benchmark for Ethereum JSON-RPC nodes"
)]
pub struct FloodgateCli {
    #[command(subcommand)]
    pub command: FloodgateSubcommand,
}

impl FloodgateCli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
