//! Purpose: Repeating background callback and a log heartbeat built on it.
//! Exports: `IntervalTimer`, `heartbeat`, `DEFAULT_HEARTBEAT_MESSAGE`.
//! Role: Periodic "still alive" logging for long native calls.
//! Invariants: The callback runs once immediately, then once per interval until stopped.
//! Invariants: After `stop` returns the callback is never invoked again.
//! Invariants: The interval is strictly positive.
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::Level;

use crate::core::error::{Error, ErrorKind, Result};

pub const DEFAULT_HEARTBEAT_MESSAGE: &str = "I am alive";

pub struct IntervalTimer {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl IntervalTimer {
    pub fn start<F>(interval: Duration, mut callback: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        if interval.is_zero() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("interval must be greater than zero"));
        }
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("rawprint-interval".to_string())
            .spawn(move || {
                loop {
                    callback();
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to spawn interval thread")
                    .with_source(err)
            })?;
        tracing::debug!(interval_ms = interval.as_millis() as u64, "interval timer started");
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        // Dropping the sender wakes the thread even mid-wait.
        self.stop_tx.take();
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle.join().map_err(|_| {
            Error::new(ErrorKind::Internal).with_message("interval callback panicked")
        })?;
        tracing::debug!("interval timer stopped");
        Ok(())
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::warn!(error = %err, "interval timer did not stop cleanly");
        }
    }
}

/// Logs `message` at `level` now and every `interval` until the timer is stopped.
pub fn heartbeat(interval: Duration, level: Level, message: impl Into<String>) -> Result<IntervalTimer> {
    let message = message.into();
    IntervalTimer::start(interval, move || match level {
        Level::TRACE => tracing::trace!(target: "rawprint::heartbeat", "{message}"),
        Level::DEBUG => tracing::debug!(target: "rawprint::heartbeat", "{message}"),
        Level::INFO => tracing::info!(target: "rawprint::heartbeat", "{message}"),
        Level::WARN => tracing::warn!(target: "rawprint::heartbeat", "{message}"),
        _ => tracing::error!(target: "rawprint::heartbeat", "{message}"),
    })
}

#[cfg(test)]
mod tests {
    use super::{IntervalTimer, heartbeat};
    use crate::core::error::ErrorKind;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn callback_runs_immediately_and_repeats() {
        let (tx, rx) = mpsc::channel();
        let timer = IntervalTimer::start(Duration::from_millis(5), move || {
            let _ = tx.send(());
        })
        .expect("start");

        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(5)).expect("tick");
        }
        timer.stop().expect("stop");
    }

    #[test]
    fn no_calls_after_stop() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let timer = IntervalTimer::start(Duration::from_millis(1), move || {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .expect("start");
        std::thread::sleep(Duration::from_millis(20));
        timer.stop().expect("stop");

        let after_stop = count.load(Ordering::SeqCst);
        assert!(after_stop >= 1);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn long_interval_stops_promptly() {
        let timer = IntervalTimer::start(Duration::from_secs(3600), || {}).expect("start");
        let started = std::time::Instant::now();
        timer.stop().expect("stop");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn panicking_callback_is_internal() {
        let timer = IntervalTimer::start(Duration::from_millis(1), || panic!("boom")).expect("start");
        std::thread::sleep(Duration::from_millis(20));
        let err = timer.stop().expect_err("panic surfaced");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn zero_interval_is_usage() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let err = IntervalTimer::start(Duration::ZERO, move || {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .err()
        .expect("zero interval rejected");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        let err = heartbeat(Duration::ZERO, tracing::Level::INFO, "alive")
            .err()
            .expect("zero heartbeat rejected");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn heartbeat_starts_and_stops() {
        let timer = heartbeat(Duration::from_millis(1), tracing::Level::DEBUG, "alive").expect("start");
        timer.stop().expect("stop");
    }
}
