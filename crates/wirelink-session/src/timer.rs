//! The two per-session timers: the shared deadline watcher and the idle
//! heartbeat.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{sleep_until, Instant, Sleep};

// Placeholder expiry for a timer that has never been armed.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 24 * 3600);

/// A single shared deadline governing both connect and read phases.
///
/// Every timed operation re-arms the deadline to "now + timeout" before it
/// is issued. The watcher ([`expired`](Self::expired)) compares the current
/// expiry against the clock each time the underlying timer fires: when a
/// newer operation has pushed the expiry out since the timer was set, the
/// watcher re-arms itself instead of reporting a timeout. This avoids
/// missed or premature timeouts under concurrent rearm races.
pub(crate) struct Deadline {
    expiry: Instant,
    sleep: Pin<Box<Sleep>>,
}

impl Deadline {
    pub(crate) fn new() -> Self {
        let expiry = Instant::now() + FAR_FUTURE;
        Self {
            expiry,
            sleep: Box::pin(sleep_until(expiry)),
        }
    }

    /// (Re)arm the deadline to `timeout` from now.
    pub(crate) fn arm(&mut self, timeout: Duration) {
        self.expiry = Instant::now() + timeout;
        let expiry = self.expiry;
        self.sleep.as_mut().reset(expiry);
    }

    /// Resolves once the current deadline has truly passed.
    ///
    /// Cancellation-safe: dropping the future mid-wait and re-calling picks
    /// the watch back up against whatever the expiry is then.
    pub(crate) async fn expired(&mut self) {
        loop {
            if Instant::now() >= self.expiry {
                return;
            }
            // The timer may still be set to an expiry that has since been
            // pushed out; chase the current one.
            if self.sleep.deadline() != self.expiry {
                let expiry = self.expiry;
                self.sleep.as_mut().reset(expiry);
            }
            self.sleep.as_mut().await;
        }
    }
}

/// The idle heartbeat timer.
///
/// Armed whenever the outbox drains, cancelled the moment a user write
/// starts, so a heartbeat never overlaps or interleaves user traffic.
pub(crate) struct Heartbeat {
    sleep: Pin<Box<Sleep>>,
    armed: bool,
}

impl Heartbeat {
    pub(crate) fn new() -> Self {
        Self {
            sleep: Box::pin(sleep_until(Instant::now() + FAR_FUTURE)),
            armed: false,
        }
    }

    /// Schedule the next heartbeat `interval` from now.
    pub(crate) fn arm(&mut self, interval: Duration) {
        self.sleep.as_mut().reset(Instant::now() + interval);
        self.armed = true;
    }

    /// Drop the scheduled heartbeat, if any.
    pub(crate) fn cancel(&mut self) {
        self.armed = false;
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.armed
    }

    /// Resolves when the armed interval elapses. Only awaited while armed.
    pub(crate) async fn elapsed(&mut self) {
        if Instant::now() < self.sleep.deadline() {
            self.sleep.as_mut().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_fires_once_timeout_passes() {
        let mut deadline = Deadline::new();
        let start = Instant::now();
        deadline.arm(Duration::from_millis(100));
        deadline.expired().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_pushes_the_expiry_out() {
        let mut deadline = Deadline::new();
        let start = Instant::now();
        deadline.arm(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(500)).await;
        deadline.arm(Duration::from_secs(1));
        deadline.expired().await;
        // 500ms in, re-armed for another full second.
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_watch_resumes_against_current_expiry() {
        let mut deadline = Deadline::new();
        deadline.arm(Duration::from_millis(100));
        // Simulate losing the select race: abandon a watch mid-wait.
        tokio::select! {
            () = deadline.expired() => {}
            () = tokio::time::sleep(Duration::from_millis(10)) => {}
        }
        let start = Instant::now();
        deadline.expired().await;
        assert!(start.elapsed() <= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_elapses_after_interval() {
        let mut heartbeat = Heartbeat::new();
        let start = Instant::now();
        heartbeat.arm(Duration::from_millis(250));
        assert!(heartbeat.is_armed());
        heartbeat.elapsed().await;
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_disarms_without_touching_the_timer() {
        let mut heartbeat = Heartbeat::new();
        heartbeat.arm(Duration::from_millis(250));
        heartbeat.cancel();
        assert!(!heartbeat.is_armed());
        heartbeat.arm(Duration::from_millis(100));
        assert!(heartbeat.is_armed());
    }
}
