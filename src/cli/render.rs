//! Terminal rendering of the dashboard view

use super::ui;
use crate::core::format::{format_market_cap, format_usd};
use crate::core::{Coin, HistoryRecord, Notification, Notifier, Theme, ThemeApplier, ViewState};
use chrono::Local;
use comfy_table::{Cell, Color};
use serde_json::Value;
use std::sync::RwLock;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Colour palette derived from the active theme. The controller updates it
/// through [`ThemeApplier`].
#[derive(Default)]
pub struct TerminalTheme {
    current: RwLock<Theme>,
}

impl TerminalTheme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn theme(&self) -> Theme {
        self.current.read().map(|t| *t).unwrap_or_default()
    }

    fn accent(&self) -> Color {
        match self.theme() {
            Theme::Light => Color::Blue,
            Theme::Dark => Color::Cyan,
        }
    }

    fn label(&self) -> &'static str {
        match self.theme() {
            Theme::Light => "☀️ Light Mode",
            Theme::Dark => "🌙 Dark Mode",
        }
    }
}

impl ThemeApplier for TerminalTheme {
    fn apply(&self, theme: Theme) {
        if let Ok(mut current) = self.current.write() {
            *current = theme;
        }
    }
}

/// Prints notifications to stdout.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let style = match notification {
            Notification::Success(_) => ui::StyleType::Success,
            Notification::Failure(_) => ui::StyleType::Error,
        };
        println!("{}", ui::style_text(notification.message(), style));
    }
}

pub fn coins_table(coins: &[Coin], palette: &TerminalTheme) -> String {
    let accent = palette.accent();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Coin Name", accent),
        ui::header_cell("Symbol", accent),
        ui::header_cell("Current Price", accent),
        ui::header_cell("Market Cap", accent),
        ui::header_cell("24h Change", accent),
        ui::header_cell("Last Updated", accent),
    ]);

    for coin in coins {
        let glyph = coin.avatar_glyph().map(String::from).unwrap_or_default();
        table.add_row(vec![
            Cell::new(format!("({glyph}) {}", coin.name)),
            Cell::new(&coin.symbol),
            ui::amount_cell(format_usd(coin.price_usd)),
            ui::amount_cell(format_market_cap(coin.market_cap_usd)),
            ui::change_cell(coin.change_24h_percent),
            Cell::new(
                coin.last_updated
                    .with_timezone(&Local)
                    .format(TIME_FORMAT)
                    .to_string(),
            ),
        ]);
    }

    table.to_string()
}

/// Renders the whole dashboard: header, status line and the filtered table.
pub fn dashboard(view: &ViewState, filtered: &[Coin], palette: &TerminalTheme) -> String {
    let mut output = format!(
        "{}  {}\n",
        ui::style_text("Crypto Dashboard", ui::StyleType::Title),
        ui::style_text(palette.label(), ui::StyleType::Subtle)
    );

    if view.loading {
        output.push_str(&ui::style_text("Refreshing...", ui::StyleType::Subtle));
        output.push('\n');
    }
    if let Some(error) = &view.error {
        output.push_str(&ui::style_text(error, ui::StyleType::Error));
        output.push('\n');
    }
    if let Some(fetched_at) = view.last_fetched_at {
        let line = format!(
            "Last updated: {}",
            fetched_at.with_timezone(&Local).format(TIME_FORMAT)
        );
        output.push_str(&ui::style_text(&line, ui::StyleType::Subtle));
        output.push('\n');
    }
    if !view.query.trim().is_empty() {
        output.push_str(&format!("Search: {}\n", view.query.trim()));
    }
    output.push('\n');

    if filtered.is_empty() && !view.loading {
        output.push_str("No cryptocurrencies found\n");
        output.push_str(&ui::style_text(
            "Try adjusting your search query",
            ui::StyleType::Subtle,
        ));
        output.push('\n');
    } else {
        output.push_str(&coins_table(filtered, palette));
        output.push('\n');
    }

    output
}

pub fn history_table(coin_id: &str, records: &[HistoryRecord], palette: &TerminalTheme) -> String {
    let accent = palette.accent();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Recorded", accent),
        ui::header_cell("Price", accent),
        ui::header_cell("Market Cap", accent),
        ui::header_cell("24h Change", accent),
    ]);

    for record in records {
        let recorded = recorded_at(record).unwrap_or_else(|| "N/A".to_string());
        table.add_row(vec![
            Cell::new(recorded),
            record
                .price_usd
                .map_or_else(ui::na_cell, |p| ui::amount_cell(format_usd(p))),
            record
                .market_cap_usd
                .map_or_else(ui::na_cell, |m| ui::amount_cell(format_market_cap(m))),
            ui::change_cell(record.change_24h_percent),
        ]);
    }

    format!(
        "History: {}\n\n{}",
        ui::style_text(coin_id, ui::StyleType::Title),
        table
    )
}

fn recorded_at(record: &HistoryRecord) -> Option<String> {
    ["timestamp", "recordedAt", "createdAt", "lastUpdated"]
        .iter()
        .find_map(|key| record.extra.get(*key))
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}
