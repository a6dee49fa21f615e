//! Poll and countdown timers for one open session.
//!
//! The scheduler owns every periodic task it starts and aborts them all on
//! `shutdown` (or drop). Fetches spawned by a poll tick are not cancelled:
//! they finish against whatever callback they captured.

use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{Session, SessionId};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use crate::backend::QuizBackend;
use crate::error::BackendError;

pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

pub struct Scheduler {
    runtime: Handle,
    poll: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            poll: None,
            countdown: None,
        }
    }

    /// Fetch `session_id` right away and then every `every`.
    ///
    /// Each tick spawns its own fetch, so a slow response never delays the
    /// next tick and responses may arrive out of order.
    pub fn start_polling<F>(
        &mut self,
        backend: Arc<dyn QuizBackend>,
        session_id: SessionId,
        every: Duration,
        on_snapshot: F,
    ) where
        F: Fn(Result<Session, BackendError>) + Send + Sync + 'static,
    {
        self.stop_polling();
        let on_snapshot = Arc::new(on_snapshot);
        let runtime = self.runtime.clone();
        debug!(%session_id, every_ms = every.as_millis(), "polling started");

        self.poll = Some(self.runtime.spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let backend = Arc::clone(&backend);
                let session_id = session_id.clone();
                let on_snapshot = Arc::clone(&on_snapshot);
                runtime.spawn(async move {
                    let result = backend.get_session(&session_id).await;
                    on_snapshot(result);
                });
            }
        }));
    }

    /// Call `on_tick` every `every`, starting one period from now.
    pub fn start_countdown<F>(&mut self, every: Duration, on_tick: F)
    where
        F: Fn() + Send + 'static,
    {
        self.stop_countdown();
        debug!("countdown timer started");
        self.countdown = Some(self.runtime.spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                on_tick();
            }
        }));
    }

    pub fn stop_polling(&mut self) {
        if let Some(handle) = self.poll.take() {
            handle.abort();
        }
    }

    pub fn stop_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.abort();
            debug!("countdown timer stopped");
        }
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    #[must_use]
    pub fn is_counting_down(&self) -> bool {
        self.countdown.is_some()
    }

    /// Cancel every periodic task.
    pub fn shutdown(&mut self) {
        self.stop_polling();
        self.stop_countdown();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_on_interval() {
        let backend = InMemoryBackend::demo();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new(Handle::current());
        let started = Instant::now();

        scheduler.start_polling(
            Arc::new(backend.clone()),
            SessionId::new("demo"),
            Duration::from_secs(3),
            move |result| {
                let _ = tx.send(result);
            },
        );

        for _ in 0..3 {
            let snapshot = rx.recv().await.expect("snapshot");
            assert!(snapshot.is_ok());
        }
        assert_eq!(started.elapsed(), Duration::from_secs(6));
        assert_eq!(backend.fetch_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_errors_do_not_stop_polling() {
        let backend = InMemoryBackend::demo();
        backend.fail_next_fetches(2);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new(Handle::current());
        scheduler.start_polling(
            Arc::new(backend),
            SessionId::new("demo"),
            Duration::from_secs(3),
            move |result| {
                let _ = tx.send(result);
            },
        );

        assert!(rx.recv().await.unwrap().is_err());
        assert!(rx.recv().await.unwrap().is_err());
        assert!(rx.recv().await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_both_timers() {
        let backend = InMemoryBackend::demo();
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new(Handle::current());

        scheduler.start_polling(
            Arc::new(backend.clone()),
            SessionId::new("demo"),
            Duration::from_secs(3),
            |_| {},
        );
        let counter = Arc::clone(&ticks);
        scheduler.start_countdown(COUNTDOWN_TICK, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert_eq!(backend.fetch_calls(), 2);

        scheduler.shutdown();
        assert!(!scheduler.is_polling());
        assert!(!scheduler.is_counting_down());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert_eq!(backend.fetch_calls(), 2);
    }
}
