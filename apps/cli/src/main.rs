//! DealDesk CLI: contacts, lists, campaigns, and the deal pipeline from the
//! terminal.
//!
//! All data lives in the local store configured in `~/.dealdesk/dealdesk.toml`.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
