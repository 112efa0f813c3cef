//! Core environment context trait for BondSim run workers.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// The central interface for environment interaction.
///
/// This trait abstracts time and task scheduling so that the run worker
/// executes unchanged in production (tokio) and in deterministic tests
/// (virtual clock).
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time` and `tokio::spawn`
/// - **Testing**: `VirtualContext` (in `bondsim_sim`) - sleep advances a virtual clock
///
/// # Cooperative Scheduling
///
/// A run is CPU-bound. The worker calls [`RunContext::yield_now`] at every
/// pair boundary and [`RunContext::sleep`] while paused, so the executor
/// underneath is never blocked for longer than one pair or one poll interval.
#[async_trait]
pub trait RunContext: Send + Sync + 'static {
    /// Returns the monotonic time since context creation.
    ///
    /// In tests, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In tests: advances the virtual clock and yields
    async fn sleep(&self, duration: Duration);

    /// Yields to the scheduler without waiting.
    async fn yield_now(&self);

    /// Spawns a background task and returns its handle.
    ///
    /// The handle is how an initiator terminates a worker abruptly.
    fn spawn<F>(&self, name: &str, future: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static;
}
