mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志系统
    scenario_server::logger::init_logger();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command {
        Some(Commands::Serve { port, no_watch }) => cli::serve(config, port, no_watch).await?,
        Some(Commands::Run { args }) => cli::run(config, args).await?,
        Some(Commands::Runs { limit }) => cli::runs(&config, limit)?,
        None => cli::serve(config, None, false).await?,
    }
    Ok(())
}
