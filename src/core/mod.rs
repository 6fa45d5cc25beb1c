//! Dashboard state, market data abstractions and the refresh machinery

pub mod coin;
pub mod config;
pub mod controller;
pub mod format;
pub mod log;
pub mod market;
pub mod notify;
pub mod preference;
pub mod scheduler;

// Re-export main types for cleaner imports
pub use coin::{Coin, HistoryRecord, SnapshotAck};
pub use controller::{DashboardController, ViewState};
pub use market::{FetchFailure, MarketDataClient, Operation};
pub use notify::{Notification, Notifier};
pub use preference::{PreferenceStore, Theme, ThemeApplier};
pub use scheduler::{RefreshScheduler, ScheduleHandle};
