//! BondSim Environment Abstraction Layer
//!
//! This crate provides the abstraction that lets a run worker execute in
//! both **Production** (tokio) and **Test** (virtual clock) environments.
//!
//! # Core Concept
//!
//! The worker never touches the clock or the executor directly:
//! - Time (`now()`, `sleep()`) for the pause poll
//! - Scheduling (`yield_now()`, `spawn()`) for cooperative pair boundaries
//!
//! so a pause/resume test can run against a virtual clock without real
//! waiting.
//!
//! # Example
//!
//! ```ignore
//! use bondsim_env::RunContext;
//!
//! async fn wait_while_paused<Ctx: RunContext>(ctx: &Ctx, paused: impl Fn() -> bool) {
//!     while paused() {
//!         ctx.sleep(Duration::from_millis(100)).await;
//!     }
//! }
//! ```

mod context;
mod types;
mod error;
mod tokio_impl;

pub use context::RunContext;
pub use types::RunId;
pub use error::EnvError;
pub use tokio_impl::TokioContext;
