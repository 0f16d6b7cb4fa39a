//! Background timed refresh
//!
//! While the main loop is blocked waiting for the next window manager
//! event, a `RefreshTimer` repaints the bar at a fixed cadence so title
//! changes that produce no bspwm event (e.g. a terminal updating its
//! title) still show up.
//!
//! Cancellation is cooperative: `stop()` flips a watch flag that the
//! task observes at its wait points. An in-flight render always finishes
//! before the task winds down; nothing is ever aborted mid-write. The
//! hard timeout is a safety net against an orphaned timer running
//! forever should the surrounding event wait never return.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;
use winlist_config::RefreshConfig;

/// Timing knobs for one timer run
#[derive(Debug, Clone, Copy)]
pub struct RefreshTiming {
    /// Delay before the first render
    pub start_delay: Duration,
    /// Time between renders
    pub interval: Duration,
    /// Hard expiry for the whole task
    pub timeout: Duration,
}

impl From<&RefreshConfig> for RefreshTiming {
    fn from(config: &RefreshConfig) -> Self {
        Self {
            start_delay: Duration::from_millis(config.start_delay_ms),
            interval: Duration::from_millis(config.interval_ms),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// A running background refresh task.
///
/// States: idle (before the start delay elapses), running, stopped.
/// Stopped is terminal; a new event cycle creates a new timer.
#[derive(Debug)]
pub struct RefreshTimer {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RefreshTimer {
    /// Spawn the timer. `render` is invoked once per tick until `stop()`
    /// is called or the cumulative scheduled time exceeds the timeout.
    pub fn start<F, Fut>(timing: RefreshTiming, render: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timing.start_delay) => {}
                _ = stop_rx.changed() => return,
            }

            let mut iterations: u32 = 0;
            loop {
                if *stop_rx.borrow() {
                    return;
                }

                render().await;

                iterations += 1;
                if timing.interval * iterations > timing.timeout {
                    warn!(
                        iterations,
                        "refresh timer hit its hard timeout, self-stopping"
                    );
                    return;
                }

                tokio::select! {
                    _ = tokio::time::sleep(timing.interval) => {}
                    _ = stop_rx.changed() => return,
                }
            }
        });

        Self { stop_tx, handle }
    }

    /// Request cooperative cancellation. Safe to call any number of
    /// times, from any task; an in-flight render completes first.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Wait for the task to wind down. Call after `stop()` when the
    /// caller must not overlap its own writes with a final render.
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn timing(start_delay_ms: u64, interval_ms: u64, timeout_ms: u64) -> RefreshTiming {
        RefreshTiming {
            start_delay: Duration::from_millis(start_delay_ms),
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    fn counting_render(
        count: &Arc<AtomicUsize>,
    ) -> impl Fn() -> std::future::Ready<()> + Send + 'static {
        let count = count.clone();
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_start_delay_renders_at_most_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let timer = RefreshTimer::start(timing(1000, 100, 60_000), counting_render(&count));

        timer.stop();
        timer.join().await;

        assert!(count.load(Ordering::SeqCst) <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_timeout_self_stops_without_external_stop() {
        let count = Arc::new(AtomicUsize::new(0));
        let timer = RefreshTimer::start(timing(0, 100, 450), counting_render(&count));

        // no stop() call: join must still return once the timeout trips
        timer.join().await;

        // renders at 0,100,200,300,400ms of scheduled time; the fifth
        // render pushes the cumulative schedule past 450ms
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_renders_repeat_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let timer = RefreshTimer::start(timing(0, 100, 60_000), counting_render(&count));

        tokio::time::sleep(Duration::from_millis(350)).await;
        timer.stop();
        timer.join().await;

        let rendered = count.load(Ordering::SeqCst);
        assert!(rendered >= 3, "expected at least 3 renders, got {}", rendered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let count = Arc::new(AtomicUsize::new(0));
        let timer = RefreshTimer::start(timing(0, 100, 60_000), counting_render(&count));

        timer.stop();
        timer.stop();
        timer.stop();
        timer.join().await;
    }
}
