//! Live dashboard: keeps the controller active and redraws on every change.

use super::render::{self, TerminalTheme};
use crate::core::DashboardController;
use anyhow::Result;
use console::Term;
use std::future::Future;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, warn};

/// A line typed by the user while the dashboard is running.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Refresh,
    Snapshot,
    ToggleTheme,
    Search(String),
    Quit,
    Unknown(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if let Some(query) = trimmed.strip_prefix('/') {
            return Input::Search(query.to_string());
        }
        match trimmed {
            "r" | "refresh" => Input::Refresh,
            "s" | "snapshot" => Input::Snapshot,
            "t" | "theme" => Input::ToggleTheme,
            "q" | "quit" | "exit" => Input::Quit,
            other => Input::Unknown(other.to_string()),
        }
    }
}

const HELP: &str = "[r] refresh  [s] snapshot  [t] theme  [/text] search  [q] quit";

fn redraw(term: &Term, controller: &DashboardController, palette: &TerminalTheme) -> Result<()> {
    let view = controller.view();
    let filtered = controller.filtered_coins();
    term.clear_screen()?;
    term.write_line(&render::dashboard(&view, &filtered, palette))?;
    term.write_line(HELP)?;
    Ok(())
}

/// Turns one read from stdin into an input. `None` means stdin is closed or
/// unreadable and should not be polled again.
fn next_input(line: io::Result<Option<String>>) -> Option<Input> {
    match line {
        Ok(Some(line)) => Some(Input::parse(&line)),
        Ok(None) => {
            debug!("Stdin closed, watching until interrupted");
            None
        }
        Err(e) => {
            warn!(error = %e, "Failed to read stdin, ignoring further input");
            None
        }
    }
}

/// Redraws on every state change and reacts to typed commands until the
/// user quits or `shutdown` resolves. Losing stdin only stops input handling.
async fn watch_loop<R>(
    controller: &DashboardController,
    palette: &TerminalTheme,
    term: &Term,
    mut lines: Lines<R>,
    shutdown: impl Future<Output = ()>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut changes = controller.subscribe();
    let mut stdin_open = true;
    tokio::pin!(shutdown);
    redraw(term, controller, palette)?;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                redraw(term, controller, palette)?;
            }
            line = lines.next_line(), if stdin_open => {
                let Some(input) = next_input(line) else {
                    stdin_open = false;
                    continue;
                };
                match input {
                    Input::Refresh => {
                        // Not awaited: a manual refresh may overlap a scheduled one.
                        let controller = controller.clone();
                        tokio::spawn(async move { controller.refresh_coins().await });
                    }
                    Input::Snapshot => {
                        let controller = controller.clone();
                        tokio::spawn(async move {
                            let _ = controller.snapshot_history().await;
                        });
                    }
                    Input::ToggleTheme => {
                        controller.toggle_theme();
                    }
                    Input::Search(query) => controller.set_query(query),
                    Input::Quit => break,
                    Input::Unknown(other) => debug!(input = %other, "Ignoring unknown input"),
                }
            }
        }
    }
    Ok(())
}

pub async fn run(
    controller: &DashboardController,
    palette: &TerminalTheme,
    query: Option<String>,
) -> Result<()> {
    let term = Term::stdout();
    let lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    if let Some(query) = query {
        controller.set_query(query);
    }
    controller.activate();

    let result = watch_loop(controller, palette, &term, lines, shutdown).await;
    controller.deactivate();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Coin, FetchFailure, HistoryRecord, MarketDataClient, SnapshotAck};
    use crate::core::{Notification, Notifier};
    use crate::store::MemoryPreferences;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    struct EmptyBackend;

    #[async_trait]
    impl MarketDataClient for EmptyBackend {
        async fn list_coins(&self) -> Result<Vec<Coin>, FetchFailure> {
            Ok(Vec::new())
        }

        async fn store_history_snapshot(&self) -> Result<SnapshotAck, FetchFailure> {
            Ok(SnapshotAck(serde_json::Value::Null))
        }

        async fn fetch_history(&self, _coin_id: &str) -> Result<Vec<HistoryRecord>, FetchFailure> {
            Ok(Vec::new())
        }
    }

    struct SilentNotifier;

    impl Notifier for SilentNotifier {
        fn notify(&self, _notification: Notification) {}
    }

    fn controller(palette: &Arc<TerminalTheme>) -> DashboardController {
        DashboardController::new(
            Arc::new(EmptyBackend),
            Arc::new(MemoryPreferences::new()),
            palette.clone(),
            Arc::new(SilentNotifier),
            Duration::from_secs(30 * 60),
        )
    }

    const STILL_RUNNING: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn test_closed_stdin_keeps_watching_until_shutdown() {
        let palette = Arc::new(TerminalTheme::new());
        let controller = controller(&palette);
        let term = Term::buffered_stdout();
        let (stop, stopped) = oneshot::channel::<()>();
        let lines = BufReader::new(&b""[..]).lines();

        let watching = watch_loop(&controller, &palette, &term, lines, async {
            let _ = stopped.await;
        });
        tokio::pin!(watching);

        assert!(timeout(STILL_RUNNING, &mut watching).await.is_err());

        // State changes are still picked up after stdin is gone
        controller.set_query("btc");
        assert!(timeout(STILL_RUNNING, &mut watching).await.is_err());

        stop.send(()).unwrap();
        watching.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreadable_stdin_is_not_fatal() {
        let palette = Arc::new(TerminalTheme::new());
        let controller = controller(&palette);
        let term = Term::buffered_stdout();
        let (stop, stopped) = oneshot::channel::<()>();
        let lines = BufReader::new(&[0xff, 0xfe, b'\n'][..]).lines();

        let watching = watch_loop(&controller, &palette, &term, lines, async {
            let _ = stopped.await;
        });
        tokio::pin!(watching);

        assert!(timeout(STILL_RUNNING, &mut watching).await.is_err());

        stop.send(()).unwrap();
        assert!(watching.await.is_ok());
    }

    #[tokio::test]
    async fn test_quit_and_search_inputs() {
        let palette = Arc::new(TerminalTheme::new());
        let controller = controller(&palette);
        let term = Term::buffered_stdout();
        let lines = BufReader::new(&b"/eth\nq\n"[..]).lines();

        let watching = watch_loop(&controller, &palette, &term, lines, std::future::pending());
        timeout(Duration::from_secs(5), watching)
            .await
            .expect("Quit should end the loop")
            .unwrap();
        assert_eq!(controller.view().query, "eth");
    }

    #[test]
    fn test_next_input_stops_on_eof_and_errors() {
        assert_eq!(next_input(Ok(Some("r".to_string()))), Some(Input::Refresh));
        assert_eq!(next_input(Ok(None)), None);
        assert_eq!(
            next_input(Err(io::Error::new(io::ErrorKind::InvalidData, "bad utf-8"))),
            None
        );
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(Input::parse("r\n"), Input::Refresh);
        assert_eq!(Input::parse(" snapshot "), Input::Snapshot);
        assert_eq!(Input::parse("t"), Input::ToggleTheme);
        assert_eq!(Input::parse("/btc"), Input::Search("btc".to_string()));
        assert_eq!(Input::parse("/"), Input::Search(String::new()));
        assert_eq!(Input::parse("q"), Input::Quit);
        assert_eq!(Input::parse("xyz"), Input::Unknown("xyz".to_string()));
    }
}
