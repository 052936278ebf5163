use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxr::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the rate backend (refresh loop and HTTP endpoints)
    Serve,
    /// Run the Telegram bot front end
    Bot,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config_path = cli.config_path.as_deref();
    let result = match cli.command {
        Some(Commands::Setup) => match config_path {
            Some(path) => fxr::cli::setup::setup_at_path(path),
            None => fxr::cli::setup::setup(),
        },
        Some(Commands::Serve) => fxr::run_command(fxr::AppCommand::Serve, config_path).await,
        Some(Commands::Bot) => fxr::run_command(fxr::AppCommand::Bot, config_path).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
