use clap::Subcommand;

use super::single::SingleCommandArgs;
use super::swarm::SwarmCommandArgs;

#[derive(Debug, Subcommand)]
pub enum FloodgateSubcommand {
    #[command(
        name = "single",
        long_about = "Send the whole batch from the master account, then wait for the txpool to drain."
    )]
    Single {
        #[command(flatten)]
        args: Box<SingleCommandArgs>,
    },

    #[command(
        name = "swarm",
        long_about = "Fund a swarm of ephemeral accounts, fan the batches out across them, then wait for the txpool to drain."
    )]
    Swarm {
        #[command(flatten)]
        args: Box<SwarmCommandArgs>,
    },
}
