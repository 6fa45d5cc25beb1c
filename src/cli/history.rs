use super::render::{self, TerminalTheme};
use super::ui;
use crate::core::DashboardController;
use anyhow::{Context, Result};

/// Stores a snapshot. The controller already told the user how it went, the
/// error is only returned so the process exits non-zero.
pub async fn snapshot(controller: &DashboardController) -> Result<()> {
    let pb = ui::new_spinner("Storing history snapshot...");
    let result = controller.snapshot_history().await;
    pb.finish_and_clear();
    result?;
    Ok(())
}

pub async fn show(
    controller: &DashboardController,
    palette: &TerminalTheme,
    coin_id: &str,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching history...");
    let records = controller.fetch_history(coin_id).await;
    pb.finish_and_clear();

    let records = records.with_context(|| format!("Could not load history for {coin_id}"))?;
    if records.is_empty() {
        println!("No history stored for {coin_id} yet.");
        return Ok(());
    }
    println!("{}", render::history_table(coin_id, &records, palette));
    Ok(())
}
