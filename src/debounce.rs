//! Debouncing of bursty triggers.
//!
//! Keystroke-driven filter edits and resize-driven width recomputation arrive
//! in bursts; only the last event of a burst should cause a pipeline pass.
//! [`Debouncer`] is the synchronous core with the clock passed in, suitable
//! for an event loop that already polls. With the `async` feature,
//! [`DebounceHandle`] runs the same policy on a tokio task and can be
//! cancelled (or dropped) so nothing fires after its consumer is gone.

use std::time::{Duration, Instant};

/// Quiet period used for resize-driven recomputation.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(100);

/// Collapses a burst of events into the last one, released after a quiet
/// period with no new events.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Debouncer { quiet, pending: None }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Record an event; it replaces any pending one and restarts the timer.
    pub fn push(&mut self, event: T, now: Instant) {
        self.pending = Some((event, now + self.quiet));
    }

    /// Release the pending event if its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.pending.take().map(|(event, _)| event),
            _ => None,
        }
    }

    /// Drop the pending event, returning it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(event, _)| event)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending event becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Debouncer::new(DEFAULT_QUIET_PERIOD)
    }
}

#[cfg(feature = "async")]
pub use self::task::DebounceHandle;

#[cfg(feature = "async")]
mod task {
    use std::sync::{Arc, Mutex, MutexGuard};
    use std::time::Duration;
    use tokio::task::JoinHandle;

    type Sink<T> = Arc<dyn Fn(T) + Send + Sync>;

    /// Tokio-backed debouncer.
    ///
    /// Each trigger aborts the previously scheduled delivery and schedules a
    /// new one, so the sink sees only the last event of a burst. Must be
    /// triggered from within a tokio runtime.
    pub struct DebounceHandle<T> {
        quiet: Duration,
        sink: Sink<T>,
        scheduled: Mutex<Option<JoinHandle<()>>>,
    }

    impl<T: Send + 'static> DebounceHandle<T> {
        pub fn new(quiet: Duration, sink: impl Fn(T) + Send + Sync + 'static) -> Self {
            DebounceHandle {
                quiet,
                sink: Arc::new(sink),
                scheduled: Mutex::new(None),
            }
        }

        pub fn trigger(&self, event: T) {
            let sink = Arc::clone(&self.sink);
            let quiet = self.quiet;
            let task = tokio::spawn(async move {
                tokio::time::sleep(quiet).await;
                sink(event);
            });

            if let Some(previous) = self.slot().replace(task) {
                previous.abort();
            }
        }

        /// Abort the scheduled delivery, if any.
        pub fn cancel(&self) {
            if let Some(task) = self.slot().take() {
                task.abort();
                log::debug!("debounce: pending delivery cancelled");
            }
        }

        /// True while a delivery is scheduled and has not run yet.
        pub fn is_pending(&self) -> bool {
            self.slot().as_ref().map_or(false, |task| !task.is_finished())
        }
    }

    impl<T> DebounceHandle<T> {
        fn slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
            // the guarded value is a task handle; a poisoned lock leaves it usable
            self.scheduled.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }
    }

    impl<T> Drop for DebounceHandle<T> {
        fn drop(&mut self) {
            if let Some(task) = self.slot().take() {
                task.abort();
            }
        }
    }

    impl<T> std::fmt::Debug for DebounceHandle<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("DebounceHandle").field("quiet", &self.quiet).finish_non_exhaustive()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_collapses_to_last_event() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        debouncer.push("a", start);
        debouncer.push("ab", start + Duration::from_millis(40));
        debouncer.push("abc", start + Duration::from_millis(80));

        assert_eq!(debouncer.poll(start + Duration::from_millis(150)), None);
        assert_eq!(debouncer.deadline(), Some(start + Duration::from_millis(180)));
        assert_eq!(debouncer.poll(start + Duration::from_millis(180)), Some("abc"));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + Duration::from_secs(10)), None);
    }

    #[test]
    fn test_cancel_discards_pending_event() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.push(1, start);
        assert_eq!(debouncer.cancel(), Some(1));
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
        assert_eq!(debouncer.quiet_period(), DEFAULT_QUIET_PERIOD);
    }

    #[cfg(feature = "async")]
    mod async_handle {
        use super::super::DebounceHandle;
        use std::sync::{Arc, Mutex};
        use std::time::Duration;

        fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) + Send + Sync + 'static) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink_seen = Arc::clone(&seen);
            (seen, move |v| sink_seen.lock().unwrap().push(v))
        }

        #[tokio::test(start_paused = true)]
        async fn test_only_last_trigger_is_delivered() {
            let (seen, sink) = recorder();
            let handle = DebounceHandle::new(Duration::from_millis(100), sink);

            handle.trigger(1);
            tokio::time::sleep(Duration::from_millis(30)).await;
            handle.trigger(2);
            tokio::time::sleep(Duration::from_millis(30)).await;
            handle.trigger(3);
            assert!(handle.is_pending());

            tokio::time::sleep(Duration::from_millis(150)).await;
            assert_eq!(*seen.lock().unwrap(), vec![3]);
            assert!(!handle.is_pending());
        }

        #[tokio::test(start_paused = true)]
        async fn test_cancel_and_drop_prevent_delivery() {
            let (seen, sink) = recorder();
            let handle = DebounceHandle::new(Duration::from_millis(100), sink);
            handle.trigger(1);
            handle.cancel();
            tokio::time::sleep(Duration::from_millis(200)).await;
            assert!(seen.lock().unwrap().is_empty());

            handle.trigger(2);
            drop(handle);
            tokio::time::sleep(Duration::from_millis(200)).await;
            assert!(seen.lock().unwrap().is_empty());
        }
    }
}
