mod cli;
mod commands;
mod config;
mod launch;

use clap::Parser;

use squall_observe::{LoggerConfig, LoggerLevel, init_logger};

use crate::{cli::Cli, launch::Interrupted};

/// 128 + SIGINT, as shells report it.
const INTERRUPTED_EXIT: i32 = 130;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    let cfg = LoggerConfig {
        format: cli.log_format,
        level: LoggerLevel::new(level)?,
        ..Default::default()
    };
    init_logger(&cfg)?;

    let result = commands::run(cli).await;
    if result.as_ref().is_err_and(|e| e.is::<Interrupted>()) {
        // A blocking stdin read may still be pending; skip the runtime's wait for it.
        std::process::exit(INTERRUPTED_EXIT);
    }
    result
}
