//! Periodic refresh driver

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(30 * 60);

/// Shortest period a schedule runs with. Shorter periods are raised to it.
pub const MIN_REFRESH_PERIOD: Duration = Duration::from_secs(1);

/// Handle to a running schedule. Cancelling stops future firings only;
/// actions already started keep running.
pub struct ScheduleHandle {
    token: CancellationToken,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl ScheduleHandle {
    pub fn cancel(&self) {
        if self.token.is_cancelled() {
            return;
        }
        self.token.cancel();
        // The timer task only waits on ticks, so aborting it is safe. Spawned
        // actions are separate tasks and are left alone.
        if let Some(timer) = self.timer.lock().ok().and_then(|mut slot| slot.take()) {
            timer.abort();
        }
        debug!("Refresh schedule cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct RefreshScheduler;

impl RefreshScheduler {
    /// Runs `action` now and then once every `period` until cancelled.
    /// Periods below [`MIN_REFRESH_PERIOD`] are raised to it. Must be called
    /// from within a tokio runtime.
    pub fn start<F, Fut>(action: F, period: Duration) -> ScheduleHandle
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if period < MIN_REFRESH_PERIOD {
            warn!(?period, min = ?MIN_REFRESH_PERIOD, "Refresh period too short, clamping");
        }
        let period = period.max(MIN_REFRESH_PERIOD);

        let token = CancellationToken::new();
        let task_token = token.clone();

        // The eager run is queued before returning, so even an immediate
        // cancel still sees it through.
        tokio::spawn(action());

        let first_tick = Instant::now() + period;
        let timer = tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        debug!(?period, "Refresh schedule fired");
                        tokio::spawn(action());
                    }
                }
            }
        });

        ScheduleHandle {
            token,
            timer: Mutex::new(Some(timer)),
        }
    }

    pub fn cancel(handle: &ScheduleHandle) {
        handle.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    const PERIOD: Duration = Duration::from_secs(30 * 60);

    fn counting_action(
        counter: Arc<AtomicUsize>,
    ) -> impl Fn() -> futures::future::Ready<()> + Send + Sync + 'static {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_immediately_then_after_period() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = RefreshScheduler::start(counting_action(Arc::clone(&counter)), PERIOD);

        sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // Not before the period elapses
        sleep(PERIOD - Duration::from_millis(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_future_firings() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = RefreshScheduler::start(counting_action(Arc::clone(&counter)), PERIOD);

        sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        RefreshScheduler::cancel(&handle);
        assert!(handle.is_cancelled());

        sleep(PERIOD * 3).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = RefreshScheduler::start(counting_action(Arc::clone(&counter)), PERIOD);

        handle.cancel();
        handle.cancel();
        RefreshScheduler::cancel(&handle);

        // The eager firing was already queued
        sleep(PERIOD * 2).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_does_not_abort_in_flight_action() {
        let finished = Arc::new(AtomicUsize::new(0));
        let action = {
            let finished = Arc::clone(&finished);
            move || {
                let finished = Arc::clone(&finished);
                async move {
                    sleep(Duration::from_secs(5)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                }
            }
        };
        let handle = RefreshScheduler::start(action, PERIOD);

        sleep(Duration::from_millis(1)).await;
        handle.cancel();

        sleep(Duration::from_secs(10)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_clamped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle =
            RefreshScheduler::start(counting_action(Arc::clone(&counter)), Duration::ZERO);

        sleep(Duration::from_millis(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // The timer keeps running at the minimum period instead of dying
        sleep(MIN_REFRESH_PERIOD * 3).await;
        assert!(counter.load(Ordering::SeqCst) >= 3);
        assert!(!handle.timer.lock().unwrap().as_ref().unwrap().is_finished());

        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_schedule() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = RefreshScheduler::start(counting_action(Arc::clone(&counter)), PERIOD);
        sleep(Duration::from_millis(1)).await;
        drop(handle);

        sleep(PERIOD * 2).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
