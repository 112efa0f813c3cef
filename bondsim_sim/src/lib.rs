//! BondSim run controller
//!
//! This crate hosts the asynchronous side of BondSim: a worker actor that
//! executes one run at a time, the session that drives it, and the tooling
//! (timeline playback, JSON export, CLI) around finished runs.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        RunSession                          │
//! │   state · progress · history · summary · observers         │
//! └───────┬───────────────────────────────────────▲────────────┘
//!         │ Command                               │ Notification
//!         │ start / pause / resume / cancel       │ progress / complete / error
//! ┌───────▼───────────────────────────────────────┴────────────┐
//! │                        RunWorker                           │
//! │   generate_population → select_pairs → simulate_pair ...  │
//! │   (bondsim_core, driven through a RunContext)              │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use bondsim_core::RunParams;
//! use bondsim_env::TokioContext;
//! use bondsim_sim::RunSession;
//!
//! let mut session = RunSession::new(TokioContext::shared());
//! session.start(RunParams::default().with_seed(42))?;
//! session.run_to_end().await;
//! println!("{:?}", session.summary());
//! ```

mod context;
mod worker;
mod session;
mod timeline;
mod exporter;

pub use context::VirtualContext;
pub use worker::{spawn_worker, spawn_worker_with_id, ControllerConfig, WorkerHandle};
pub use session::{Progress, RunSession, SessionObserver, SessionState, WORKER_LOST};
pub use timeline::{MonthSnapshot, Timeline, DEFAULT_SPEED};
pub use exporter::RunExport;
