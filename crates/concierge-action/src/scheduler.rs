//! Background ticker for timer expiration.
//!
//! Polls the [`TimerService`] on a fixed interval and hands the expiry
//! message of every finished timer to a [`NotificationSink`]. The timer lock
//! is released before any notification is delivered.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior};

use crate::timer::{expiry_message, TimerService};

/// Receiver of timer notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, text: String);
}

impl<F> NotificationSink for F
where
    F: Fn(String) + Send + Sync,
{
    fn notify(&self, text: String) {
        self(text)
    }
}

/// Background scheduler that expires timers.
pub struct Scheduler {
    timers: Arc<TimerService>,
    sink: Arc<dyn NotificationSink>,
    interval: Duration,
    shutdown: Arc<Notify>,
}

impl Scheduler {
    pub fn new(
        timers: Arc<TimerService>,
        sink: Arc<dyn NotificationSink>,
        interval: Duration,
    ) -> Self {
        Self {
            timers,
            sink,
            interval: interval.max(Duration::from_millis(1)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Run the ticker until [`shutdown`](Self::shutdown) is called.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(interval_ms = self.interval.as_millis() as u64, "Timer ticker started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(Instant::now());
                }
                _ = self.shutdown.notified() => {
                    tracing::debug!("Timer ticker stopped");
                    return;
                }
            }
        }
    }

    /// Expire due timers and deliver their notifications.
    ///
    /// Returns the number of timers that expired.
    pub fn tick(&self, now: Instant) -> usize {
        let expired = self.timers.collect_expired(now);
        for timer in &expired {
            tracing::info!(id = timer.id, "Timer expired");
            self.sink.notify(expiry_message(timer));
        }
        expired.len()
    }

    /// Signal the run loop to stop.
    ///
    /// A permit is stored if the loop is not currently waiting, so calling
    /// this before `run` still stops it on its first iteration.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<String>>,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, text: String) {
            self.messages.lock().unwrap().push(text);
        }
    }

    fn make_scheduler() -> (Arc<TimerService>, Arc<RecordingSink>, Arc<Scheduler>) {
        let timers = Arc::new(TimerService::new());
        let sink = Arc::new(RecordingSink::default());
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&timers),
            sink.clone(),
            Duration::from_secs(1),
        ));
        (timers, sink, scheduler)
    }

    #[tokio::test]
    async fn test_scheduler_shutdown() {
        let (_, _, scheduler) = make_scheduler();
        scheduler.shutdown();
        tokio::time::timeout(Duration::from_secs(2), scheduler.run())
            .await
            .expect("Scheduler should shut down within timeout");
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_notifies_expired_timers() {
        let (timers, sink, scheduler) = make_scheduler();
        timers.create("3", Some("eggs")).unwrap();
        timers.create("10 minutes", Some("laundry")).unwrap();

        assert_eq!(scheduler.tick(Instant::now()), 0);
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(scheduler.tick(Instant::now()), 1);

        let messages = sink.messages.lock().unwrap().clone();
        assert_eq!(
            messages,
            vec!["Your 3 seconds timer for 'eggs' (ID: 1) has concluded!".to_string()]
        );
        assert_eq!(timers.active_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_expires_within_one_tick() {
        let (timers, sink, scheduler) = make_scheduler();
        timers.create("2", Some("tea")).unwrap();

        let handle = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.run().await }
        });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(sink.messages.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(sink.messages.lock().unwrap().len(), 1);

        scheduler.shutdown();
        handle.await.unwrap();
        assert_eq!(timers.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_expiry_race_has_one_winner() {
        for cancel_first in [true, false] {
            let (timers, sink, scheduler) = make_scheduler();
            let timer = timers.create("5", Some("race")).unwrap();
            tokio::time::advance(Duration::from_secs(5)).await;

            let (cancelled, expired) = if cancel_first {
                let cancelled = timers.cancel(Some("1"));
                (cancelled, scheduler.tick(timer.end_time))
            } else {
                let expired = scheduler.tick(timer.end_time);
                (timers.cancel(Some("1")), expired)
            };

            let notified = sink.messages.lock().unwrap().len();
            assert_eq!(cancelled.is_ok() as usize + expired, 1);
            assert_eq!(notified, expired);
            if !cancel_first {
                assert!(cancelled.is_err());
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_tick_from_threads() {
        let (timers, sink, scheduler) = make_scheduler();
        let timer = timers.create("1", Some("contended")).unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;

        let canceller = {
            let timers = Arc::clone(&timers);
            std::thread::spawn(move || timers.cancel(Some("contended")).is_ok())
        };
        let ticker = {
            let scheduler = Arc::clone(&scheduler);
            let end = timer.end_time;
            std::thread::spawn(move || scheduler.tick(end))
        };
        let cancelled = canceller.join().unwrap();
        let expired = ticker.join().unwrap();

        assert_eq!(cancelled as usize + expired, 1);
        assert_eq!(sink.messages.lock().unwrap().len(), expired);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |text: String| seen.lock().unwrap().push(text)
        };
        sink.notify("ding".to_string());
        assert_eq!(seen.lock().unwrap().as_slice(), ["ding".to_string()]);
    }
}
