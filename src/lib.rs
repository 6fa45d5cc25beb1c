pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::render::{ConsoleNotifier, TerminalTheme};
use crate::core::DashboardController;
use crate::core::config::AppConfig;
use crate::providers::HttpMarketClient;
use crate::store::DiskPreferences;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Coins { query: Option<String> },
    Watch { query: Option<String> },
    Snapshot,
    History { coin_id: String },
    Theme,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Crypto Dashboard starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let client = Arc::new(HttpMarketClient::new(&config.api.base_url())?);
    let preferences = DiskPreferences::open_or_memory(&config.default_data_path()?.join("prefs"));
    let palette = Arc::new(TerminalTheme::new());
    let controller = DashboardController::new(
        client,
        preferences,
        palette.clone(),
        Arc::new(ConsoleNotifier),
        config.refresh_period(),
    );

    match command {
        AppCommand::Coins { query } => cli::coins::run(&controller, &palette, query).await,
        AppCommand::Watch { query } => cli::watch::run(&controller, &palette, query).await,
        AppCommand::Snapshot => cli::history::snapshot(&controller).await,
        AppCommand::History { coin_id } => {
            controller.restore_theme();
            cli::history::show(&controller, &palette, &coin_id).await
        }
        AppCommand::Theme => {
            controller.restore_theme();
            let theme = controller.toggle_theme();
            println!("Theme set to {theme}");
            Ok(())
        }
    }
}
