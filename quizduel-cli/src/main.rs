mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::CliConfig;
use quizduel_core::{MatchConfig, QuizduelError};
use quizduel_game::GameError;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quizduel")]
#[command(about = "Two-player bidding quiz over a direct connection")]
#[command(version)]
struct Cli {
    /// Config file (defaults to <config dir>/quizduel/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Question bank JSON file (defaults to the bundled sample)
    #[arg(short, long, global = true)]
    bank: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host a match and wait for an opponent
    Host {
        /// Your display name
        #[arg(short, long)]
        name: Option<String>,
        /// Number of rounds
        #[arg(short, long)]
        rounds: Option<u32>,
        /// Question category, or "all"
        #[arg(long)]
        category: Option<String>,
        /// Address to listen on
        #[arg(short, long)]
        listen: Option<String>,
        /// Countdown tick in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,
    },
    /// Join a match hosted at HOST:PORT
    Join {
        /// Host address
        peer: String,
        /// Your display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Inspect the question bank
    #[command(subcommand)]
    Bank(commands::BankCommands),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so they stay out of the prompts
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "quizduel={},quizduel_game={},quizduel_core={}",
            log_level, log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.unwrap_or_else(CliConfig::default_path);
    let config = CliConfig::load(&config_path).await?;
    let bank_path = cli.bank.or_else(|| config.bank_path.clone());

    let result: quizduel_game::Result<()> = match cli.command {
        Commands::Host {
            name,
            rounds,
            category,
            listen,
            tick_ms,
        } => {
            let match_config = MatchConfig::new(
                rounds.unwrap_or(config.rounds),
                category.unwrap_or_else(|| config.category.clone()),
            )
            .with_tick_interval(Duration::from_millis(tick_ms.unwrap_or(config.tick_ms)));

            match commands::load_bank(bank_path.as_deref()).await {
                Ok(bank) => {
                    let opts = commands::HostOptions {
                        display_name: name.unwrap_or_else(|| config.display_name.clone()),
                        listen_addr: listen.unwrap_or_else(|| config.listen_addr.clone()),
                        match_config,
                    };
                    commands::host_match(opts, &bank).await
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Join { peer, name } => {
            commands::join_match(name.unwrap_or_else(|| config.display_name.clone()), &peer).await
        }
        Commands::Bank(cmd) => commands::handle_bank_command(cmd, bank_path.as_deref())
            .await
            .map_err(GameError::from),
    };

    if let Err(e) = result {
        match e {
            GameError::Core(QuizduelError::Transport(msg)) => {
                eprintln!("Error: {}", msg);
                eprintln!("Check the address and that the host is waiting for a player");
            }
            GameError::Core(QuizduelError::Bank(msg)) => {
                eprintln!("Error: {}", msg);
                eprintln!("Use 'quizduel bank categories' to check the question bank");
            }
            GameError::Core(QuizduelError::Config(msg)) => {
                eprintln!("Error: Invalid settings: {}", msg);
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
