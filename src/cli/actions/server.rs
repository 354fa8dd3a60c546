use crate::{cli::globals::GlobalArgs, gateway};
use anyhow::Result;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub globals: GlobalArgs,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the gateway fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Global args: {:?}", args.globals);

    gateway::new(args.port, &args.globals).await
}
