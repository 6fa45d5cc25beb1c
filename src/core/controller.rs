//! Dashboard view state and the controller that keeps it in sync with the
//! backend.

use crate::core::coin::{Coin, HistoryRecord, SnapshotAck};
use crate::core::market::{FetchFailure, MarketDataClient};
use crate::core::notify::{Notification, Notifier};
use crate::core::preference::{PreferenceStore, THEME_KEY, Theme, ThemeApplier};
use crate::core::scheduler::{RefreshScheduler, ScheduleHandle};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const SNAPSHOT_STORED: &str = "History snapshot stored!";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub coins: Vec<Coin>,
    pub loading: bool,
    pub error: Option<String>,
    pub query: String,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub theme: Theme,
}

enum Lifecycle {
    Idle,
    Active(ScheduleHandle),
    Deactivated,
}

struct Shared {
    client: Arc<dyn MarketDataClient>,
    preferences: Arc<dyn PreferenceStore>,
    theme_applier: Arc<dyn ThemeApplier>,
    notifier: Arc<dyn Notifier>,
    refresh_period: Duration,
    state: Mutex<ViewState>,
    lifecycle: Mutex<Lifecycle>,
    changes: watch::Sender<u64>,
}

/// Owns the dashboard's [`ViewState`]. Clones share the same state.
///
/// Overlapping [`refresh_coins`](Self::refresh_coins) calls are not
/// coalesced: each applies its result when it completes, so the fetch that
/// finishes last determines the final state.
#[derive(Clone)]
pub struct DashboardController {
    shared: Arc<Shared>,
}

impl DashboardController {
    pub fn new(
        client: Arc<dyn MarketDataClient>,
        preferences: Arc<dyn PreferenceStore>,
        theme_applier: Arc<dyn ThemeApplier>,
        notifier: Arc<dyn Notifier>,
        refresh_period: Duration,
    ) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                client,
                preferences,
                theme_applier,
                notifier,
                refresh_period,
                state: Mutex::new(ViewState::default()),
                lifecycle: Mutex::new(Lifecycle::Idle),
                changes,
            }),
        }
    }

    /// Loads the persisted theme, applies it and starts periodic refresh.
    /// Only the first call has any effect.
    pub fn activate(&self) {
        let mut lifecycle = self.shared.lifecycle();
        if !matches!(*lifecycle, Lifecycle::Idle) {
            warn!("Dashboard controller already activated, ignoring");
            return;
        }

        self.restore_theme();

        let weak = Arc::downgrade(&self.shared);
        let handle = RefreshScheduler::start(
            move || {
                let weak = weak.clone();
                async move {
                    if let Some(shared) = weak.upgrade() {
                        shared.refresh_coins().await;
                    }
                }
            },
            self.shared.refresh_period,
        );
        *lifecycle = Lifecycle::Active(handle);
        info!(period = ?self.shared.refresh_period, "Dashboard controller activated");
    }

    /// Stops periodic refresh. Results of fetches still in flight are
    /// dropped. Safe to call any number of times.
    pub fn deactivate(&self) {
        let previous = std::mem::replace(&mut *self.shared.lifecycle(), Lifecycle::Deactivated);
        match previous {
            Lifecycle::Active(handle) => {
                handle.cancel();
                info!("Dashboard controller deactivated");
            }
            Lifecycle::Idle => debug!("Deactivating a controller that was never activated"),
            Lifecycle::Deactivated => debug!("Dashboard controller already deactivated"),
        }
    }

    /// Reads the persisted theme (light unless `"dark"` is stored) and
    /// applies it.
    pub fn restore_theme(&self) -> Theme {
        let saved = self.shared.preferences.get(THEME_KEY);
        let theme = Theme::from_preference(saved.as_deref());
        self.shared.update(|state| state.theme = theme);
        self.shared.theme_applier.apply(theme);
        debug!(%theme, "Theme restored");
        theme
    }

    pub fn is_active(&self) -> bool {
        matches!(*self.shared.lifecycle(), Lifecycle::Active(_))
    }

    pub async fn refresh_coins(&self) {
        self.shared.refresh_coins().await;
    }

    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.shared.update(|state| state.query = query);
    }

    /// Coins whose name or symbol contains the trimmed query, ignoring case.
    pub fn filtered_coins(&self) -> Vec<Coin> {
        let state = self.shared.state();
        let needle = state.query.trim().to_lowercase();
        if needle.is_empty() {
            return state.coins.clone();
        }
        state
            .coins
            .iter()
            .filter(|coin| coin.matches(&needle))
            .cloned()
            .collect()
    }

    /// Asks the backend to store a snapshot and notifies the user of the
    /// outcome. View state is left untouched. The outcome is also returned
    /// for hosts that need an exit status.
    pub async fn snapshot_history(&self) -> Result<SnapshotAck, FetchFailure> {
        let result = self.shared.client.store_history_snapshot().await;
        let notification = match &result {
            Ok(ack) => {
                debug!(?ack, "History snapshot acknowledged");
                Notification::Success(SNAPSHOT_STORED.to_string())
            }
            Err(e) => {
                warn!(error = %e, "History snapshot failed");
                Notification::Failure(format!("Failed to store history: {e}"))
            }
        };
        self.shared.notifier.notify(notification);
        result
    }

    pub async fn fetch_history(&self, coin_id: &str) -> Result<Vec<HistoryRecord>, FetchFailure> {
        self.shared.client.fetch_history(coin_id).await
    }

    pub fn toggle_theme(&self) -> Theme {
        let mut next = Theme::default();
        self.shared.update(|state| {
            state.theme = state.theme.toggled();
            next = state.theme;
        });
        self.shared.preferences.set(THEME_KEY, next.as_str());
        self.shared.theme_applier.apply(next);
        debug!(theme = %next, "Theme toggled");
        next
    }

    pub fn view(&self) -> ViewState {
        self.shared.state().clone()
    }

    /// Receiver that changes on every state update.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.changes.subscribe()
    }
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut ViewState)) {
        f(&mut self.state());
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }

    /// Applies `f` unless the controller has been deactivated. The lifecycle
    /// lock is held across the write so `deactivate` cannot slip in between.
    fn update_if_live(&self, f: impl FnOnce(&mut ViewState)) -> bool {
        let lifecycle = self.lifecycle();
        if matches!(*lifecycle, Lifecycle::Deactivated) {
            return false;
        }
        self.update(f);
        true
    }

    async fn refresh_coins(&self) {
        let started = self.update_if_live(|state| {
            state.loading = true;
            state.error = None;
        });
        if !started {
            debug!("Controller deactivated, skipping refresh");
            return;
        }

        let applied = match self.client.list_coins().await {
            Ok(coins) => {
                let count = coins.len();
                let applied = self.update_if_live(|state| {
                    state.coins = coins;
                    state.last_fetched_at = Some(Utc::now());
                    state.loading = false;
                });
                if applied {
                    info!(count, "Coins refreshed");
                }
                applied
            }
            Err(e) => {
                let applied = self.update_if_live(|state| {
                    state.error = Some(e.to_string());
                    state.loading = false;
                });
                if applied {
                    warn!(error = %e, "Coin refresh failed, keeping previous list");
                }
                applied
            }
        };
        if !applied {
            debug!("Controller deactivated, dropping refresh result");
        }
    }
}
