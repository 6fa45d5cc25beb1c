use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use coindash::core::log::init_logging;

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

impl From<Commands> for coindash::AppCommand {
    fn from(cmd: Commands) -> coindash::AppCommand {
        match cmd {
            Commands::Coins { query } => coindash::AppCommand::Coins { query },
            Commands::Watch { query } => coindash::AppCommand::Watch { query },
            Commands::Snapshot => coindash::AppCommand::Snapshot,
            Commands::History { coin_id } => coindash::AppCommand::History { coin_id },
            Commands::Theme => coindash::AppCommand::Theme,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch and display coins once
    Coins {
        /// Only show coins whose name or symbol contains this text
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Live dashboard with periodic refresh
    Watch {
        /// Initial search filter
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Ask the backend to store a history snapshot
    Snapshot,
    /// Display stored history for a coin
    History {
        /// Backend coin identifier, e.g. "bitcoin"
        coin_id: String,
    },
    /// Toggle between light and dark theme
    Theme,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => coindash::cli::setup::setup(),
        Some(cmd) => coindash::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
