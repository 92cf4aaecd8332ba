use clap::{Parser, Subcommand};

use commission_cli::commands::{
    config_cmd::{self, ConfigCommands},
    global_cmd::{self, GlobalCommands},
    user_cmd::{self, UserCommands},
};
use commission_cli::errors::Error;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// Commission admin CLI: manage global and per-user commissions
#[derive(Parser, Debug)]
#[command(name = "commission-admin")]
#[command(about = "Manage global and per-user commissions", long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to ./commission.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(subcommand)]
    Config(ConfigCommands),

    #[command(subcommand)]
    Global(GlobalCommands),

    #[command(subcommand)]
    User(UserCommands),

    /// Show the CLI version
    Version,
}

async fn run(cli: Cli) -> Result<(), Error> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Config(cmd) => config_cmd::execute(cmd, config_path).await,
        Commands::Global(cmd) => global_cmd::execute(cmd, config_path).await,
        Commands::User(cmd) => user_cmd::execute(cmd, config_path).await,
        Commands::Version => {
            println!("commission-admin version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().pretty())
        .with(EnvFilter::from_env("COMMISSION_LOG"))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
