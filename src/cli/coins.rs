use super::render::{self, TerminalTheme};
use super::ui;
use crate::core::DashboardController;
use anyhow::{Result, bail};

/// Activates the controller, waits for the eager fetch and prints the
/// filtered table once.
pub async fn run(
    controller: &DashboardController,
    palette: &TerminalTheme,
    query: Option<String>,
) -> Result<()> {
    let mut changes = controller.subscribe();
    if let Some(query) = query {
        controller.set_query(query);
    }

    let pb = ui::new_spinner("Fetching coins...");
    controller.activate();
    loop {
        let view = controller.view();
        if !view.loading && (view.last_fetched_at.is_some() || view.error.is_some()) {
            break;
        }
        if changes.changed().await.is_err() {
            break;
        }
    }
    pb.finish_and_clear();
    controller.deactivate();

    let view = controller.view();
    println!(
        "{}",
        render::dashboard(&view, &controller.filtered_coins(), palette)
    );

    if let Some(error) = view.error {
        bail!(error);
    }
    Ok(())
}
