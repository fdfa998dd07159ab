//! Fixed-tick driver for a telemetry instance.

use log::debug;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Runs an async handler at a fixed wall-clock interval on its own task.
/// Pausing skips ticks without tearing the task down; stopping is
/// idempotent. The handler returning `false` also ends the loop, which is
/// how a decoded STOP reaches the scheduler.
pub struct Scheduler {
    pause_tx: watch::Sender<bool>,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Scheduler
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send,
    {
        let (pause_tx, pause_rx) = watch::channel(false);
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of a tokio interval fires immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if *pause_rx.borrow() {
                            continue;
                        }
                        if !tick().await {
                            break;
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Scheduler {
            pause_tx,
            stop_tx,
            handle,
        }
    }

    pub fn pause(&self) {
        debug!("tick loop paused");
        let _ = self.pause_tx.send(true);
    }

    pub fn resume(&self) {
        debug!("tick loop resumed");
        let _ = self.pause_tx.send(false);
    }

    pub fn stop(&self) {
        debug!("tick loop stopping");
        let _ = self.stop_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the tick task to wind down after a stop.
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    #[tokio::test(flavor = "multi_thread")]
    async fn ticks_at_fixed_interval() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let scheduler = Scheduler::spawn(Duration::from_millis(5), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

        sleep(Duration::from_millis(60)).await;
        assert!(count.load(Ordering::SeqCst) >= 4);
        scheduler.stop();
        scheduler.join().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pause_and_resume() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let scheduler = Scheduler::spawn(Duration::from_millis(5), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

        sleep(Duration::from_millis(30)).await;
        scheduler.pause();
        sleep(Duration::from_millis(20)).await;
        let paused_at = count.load(Ordering::SeqCst);
        sleep(Duration::from_millis(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), paused_at);

        scheduler.resume();
        sleep(Duration::from_millis(30)).await;
        assert!(count.load(Ordering::SeqCst) > paused_at);

        scheduler.stop();
        scheduler.join().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn handler_returning_false_stops_the_loop() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let scheduler = Scheduler::spawn(Duration::from_millis(2), move || {
            let counter = Arc::clone(&counter);
            async move { counter.fetch_add(1, Ordering::SeqCst) < 3 }
        });

        sleep(Duration::from_millis(50)).await;
        assert!(scheduler.is_finished());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_is_idempotent() {
        let scheduler = Scheduler::spawn(Duration::from_millis(2), || async { true });
        scheduler.stop();
        scheduler.stop();
        sleep(Duration::from_millis(20)).await;
        assert!(scheduler.is_finished());
    }
}
