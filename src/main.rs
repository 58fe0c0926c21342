use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info};

use dealhound::app::{preflight, App};
use dealhound::config::Config;

#[derive(Parser)]
#[command(name = "dealhound", version, about = "Game-deal watcher for Telegram rooms")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: std::path::PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the watcher (default).
    Run,
    /// Validate configuration and connectivity, then exit.
    Check,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Command::Run) {
        Command::Check => {
            if !preflight::run_preflight(&config).await {
                std::process::exit(1);
            }
        }
        Command::Run => {
            config.init_logging();
            info!("dealhound starting");

            tokio::select! {
                result = App::run(config) => {
                    if let Err(e) = result {
                        error!(error = %e, "Fatal error");
                        std::process::exit(1);
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Shutdown signal received");
                }
            }

            info!("dealhound stopped");
        }
    }
}
