//! Virtual-clock context implementing RunContext for deterministic tests.

use async_trait::async_trait;
use bondsim_env::RunContext;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Run context backed by a virtual clock.
///
/// This implements `RunContext` using:
/// - A virtual clock that only moves when someone sleeps or advances it
/// - Simulated sleep that advances virtual time and yields to the executor
///
/// A paused worker polling every 100ms therefore costs no wall-clock time,
/// and the amount of virtual time that passed tells a test how many polls
/// happened.
pub struct VirtualContext {
    /// Current virtual time (nanoseconds since context creation)
    virtual_time_ns: Arc<Mutex<u64>>,
}

impl VirtualContext {
    /// Creates a new VirtualContext at time zero.
    pub fn new() -> Self {
        Self {
            virtual_time_ns: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn clock(&self) -> MutexGuard<'_, u64> {
        self.virtual_time_ns
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        let mut time = self.clock();
        *time = time.saturating_add(duration.as_nanos() as u64);
    }

    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        *self.clock()
    }
}

impl Default for VirtualContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for VirtualContext {
    fn clone(&self) -> Self {
        Self {
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
        }
    }
}

#[async_trait]
impl RunContext for VirtualContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    async fn sleep(&self, duration: Duration) {
        self.advance_time(duration);
        // Let the initiator run so a resume or cancel can arrive
        tokio::task::yield_now().await;
    }

    async fn yield_now(&self) {
        tokio::task::yield_now().await;
    }

    fn spawn<F>(&self, _name: &str, future: F) -> JoinHandle<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_context_time() {
        let ctx = VirtualContext::new();
        assert_eq!(ctx.now(), Duration::ZERO);

        ctx.advance_time(Duration::from_secs(1));
        assert_eq!(ctx.now(), Duration::from_secs(1));

        ctx.advance_time(Duration::from_millis(500));
        assert_eq!(ctx.now(), Duration::from_millis(1500));
    }

    #[test]
    fn test_virtual_context_clones_share_clock() {
        let ctx = VirtualContext::new();
        let other = ctx.clone();

        other.advance_time(Duration::from_millis(250));
        assert_eq!(ctx.time_ns(), 250_000_000);
    }

    #[tokio::test]
    async fn test_virtual_sleep_advances_without_waiting() {
        let ctx = VirtualContext::shared();
        let wall = std::time::Instant::now();

        for _ in 0..50 {
            ctx.sleep(Duration::from_secs(60)).await;
        }

        assert_eq!(ctx.now(), Duration::from_secs(3000));
        assert!(wall.elapsed() < Duration::from_secs(5));
    }
}
