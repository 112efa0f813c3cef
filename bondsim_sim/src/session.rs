//! Run session: the initiator side of the worker protocol.
//!
//! A session owns at most one worker at a time. It turns the worker's
//! notification stream into observable state (progress, history, summary,
//! error) and fans every change out to registered observers.
//!
//! # State Machine
//!
//! ```text
//!            start                 complete
//!   Idle ─────────────► Running ─────────────► Complete
//!    ▲                  │    ▲    error
//!    │ cancel / reset   │    │ ─────────────► Error
//!    └──────────────────┤    │
//!                 pause ▼    │ resume
//!                      Paused
//! ```
//!
//! `start` is accepted in every state and abandons whatever run was active.

use crate::worker::{spawn_worker, ControllerConfig, WorkerHandle};
use bondsim_core::{Command, Notification, Outcome, PairResult, RunParams, RunSummary};
use bondsim_env::{EnvError, RunContext, RunId};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, trace, warn};

/// Message surfaced when the worker's stream ends without a terminal notification.
pub const WORKER_LOST: &str = "worker terminated unexpectedly";

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Complete,
    Error,
}

impl SessionState {
    /// Returns the display name.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Complete => "complete",
            SessionState::Error => "error",
        }
    }

    /// True while a worker is executing a run.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Running | SessionState::Paused)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Pairs processed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    /// Rounded percentage; 0 when there is nothing to do.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.completed as f64 / self.total as f64 * 100.0).round() as u32
    }
}

/// Receives session events. Every method defaults to a no-op.
pub trait SessionObserver: Send {
    fn on_progress(&mut self, _progress: &Progress, _result: &PairResult) {}
    fn on_complete(&mut self, _summary: &RunSummary) {}
    fn on_error(&mut self, _message: &str) {}
    fn on_state_change(&mut self, _from: SessionState, _to: SessionState) {}
}

/// Initiator that drives one worker at a time.
pub struct RunSession<C: RunContext> {
    ctx: Arc<C>,
    config: ControllerConfig,

    /// Active worker and its notification stream
    worker: Option<(WorkerHandle, UnboundedReceiver<Notification>)>,

    state: SessionState,
    params: Option<RunParams>,
    progress: Progress,

    /// Results carried by progress notifications, in arrival order
    history: Vec<PairResult>,
    summary: Option<RunSummary>,
    error: Option<String>,

    observers: Vec<Box<dyn SessionObserver>>,
}

impl<C: RunContext> RunSession<C> {
    /// Creates an idle session with the default controller config.
    pub fn new(ctx: Arc<C>) -> Self {
        Self::with_config(ctx, ControllerConfig::default())
    }

    /// Creates an idle session with a custom controller config.
    pub fn with_config(ctx: Arc<C>, config: ControllerConfig) -> Self {
        Self {
            ctx,
            config,
            worker: None,
            state: SessionState::Idle,
            params: None,
            progress: Progress::default(),
            history: Vec::new(),
            summary: None,
            error: None,
            observers: Vec::new(),
        }
    }

    /// Registers an observer.
    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Starts a new run, abandoning any active one.
    pub fn start(&mut self, params: RunParams) -> Result<RunId, EnvError> {
        let total = params.num_collisions;
        let command = Command::Start {
            params: params.clone(),
        };
        self.launch(total, Some(params), |handle| handle.post(command))
    }

    /// Spawns a fresh worker and hands it its first message.
    fn launch(
        &mut self,
        total: usize,
        params: Option<RunParams>,
        post: impl FnOnce(&WorkerHandle) -> Result<(), EnvError>,
    ) -> Result<RunId, EnvError> {
        self.release_worker(true);
        self.history.clear();
        self.summary = None;
        self.error = None;
        self.progress = Progress {
            completed: 0,
            total,
        };

        let (handle, notifications) = spawn_worker(Arc::clone(&self.ctx), self.config);
        let id = handle.id();
        post(&handle)?;
        info!("[{}] session started run of {} pairs", id, total);

        self.worker = Some((handle, notifications));
        self.params = params;
        self.set_state(SessionState::Running);
        Ok(id)
    }

    /// Asks the worker to pause at the next pair boundary.
    pub fn pause(&mut self) -> Result<(), EnvError> {
        self.post(Command::Pause)?;
        self.set_state(SessionState::Paused);
        Ok(())
    }

    /// Lets a paused worker continue.
    pub fn resume(&mut self) -> Result<(), EnvError> {
        self.post(Command::Resume)?;
        self.set_state(SessionState::Running);
        Ok(())
    }

    /// Cancels the active run. Nothing is reported for it afterwards.
    pub fn cancel(&mut self) {
        if let Some((handle, _)) = &self.worker {
            // Best effort; the worker is terminated either way
            let _ = handle.post(Command::Cancel);
        }
        self.release_worker(true);
        self.set_state(SessionState::Idle);
    }

    /// Cancels and forgets everything about the last run.
    pub fn reset(&mut self) {
        self.cancel();
        self.history.clear();
        self.summary = None;
        self.error = None;
        self.progress = Progress::default();
        self.params = None;
    }

    /// Dispatches a raw JSON command. Unrecognized messages are ignored.
    pub fn post_raw(&mut self, json: &str) -> Result<(), EnvError> {
        match Command::decode(json) {
            Ok(Some(Command::Start { params })) => self.start(params).map(|_| ()),
            Ok(Some(Command::Pause)) => self.pause(),
            Ok(Some(Command::Resume)) => self.resume(),
            Ok(Some(Command::Cancel)) => {
                self.cancel();
                Ok(())
            }
            Ok(None) => {
                trace!("session ignoring unrecognized message");
                Ok(())
            }
            // Reported through the worker like any other failed start
            Err(e) => self
                .launch(0, None, |handle| handle.post_rejected_start(e))
                .map(|_| ()),
        }
    }

    fn post(&self, command: Command) -> Result<(), EnvError> {
        match &self.worker {
            Some((handle, _)) if self.state.is_active() => handle.post(command),
            _ => Err(EnvError::closed("no active run")),
        }
    }

    // ========================================================================
    // EVENTS
    // ========================================================================

    /// Waits for the next notification from the worker and applies it.
    ///
    /// Returns `None` when no run is active.
    pub async fn next_event(&mut self) -> Option<Notification> {
        let received = match self.worker.as_mut() {
            Some((_, notifications)) => notifications.recv().await,
            None => return None,
        };

        let notification = match received {
            Some(n) => n,
            None if self.state.is_active() => {
                warn!("{}", WORKER_LOST);
                Notification::error(WORKER_LOST)
            }
            None => {
                self.release_worker(false);
                return None;
            }
        };

        self.apply(&notification);
        Some(notification)
    }

    /// Drives the session until the run completes or fails.
    ///
    /// A paused session produces no events; resume it first.
    pub async fn run_to_end(&mut self) -> SessionState {
        while self.state.is_active() {
            if self.next_event().await.is_none() {
                break;
            }
        }
        self.state
    }

    fn apply(&mut self, notification: &Notification) {
        match notification {
            Notification::Progress {
                completed,
                total,
                result,
            } => {
                self.progress = Progress {
                    completed: *completed,
                    total: *total,
                };
                debug!(
                    "progress {}/{} ({}%)",
                    completed,
                    total,
                    self.progress.percent()
                );
                let progress = self.progress;
                for observer in self.observers.iter_mut() {
                    observer.on_progress(&progress, result);
                }
                self.history.push(result.clone());
            }
            Notification::Complete { summary } => {
                self.release_worker(false);
                self.summary = Some(summary.clone());
                for observer in self.observers.iter_mut() {
                    observer.on_complete(summary);
                }
                self.set_state(SessionState::Complete);
            }
            Notification::Error { message } => {
                self.release_worker(true);
                self.error = Some(message.clone());
                for observer in self.observers.iter_mut() {
                    observer.on_error(message);
                }
                self.set_state(SessionState::Error);
            }
        }
    }

    fn release_worker(&mut self, abort: bool) {
        if let Some((handle, _)) = self.worker.take() {
            if abort {
                handle.terminate();
            }
        }
    }

    fn set_state(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        debug!("session {} -> {}", from, to);
        for observer in self.observers.iter_mut() {
            observer.on_state_change(from, to);
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn progress_percent(&self) -> u32 {
        self.progress.percent()
    }

    /// Parameters of the current or last run.
    pub fn params(&self) -> Option<&RunParams> {
        self.params.as_ref()
    }

    /// Results seen so far (one per progress notification).
    pub fn history(&self) -> &[PairResult] {
        &self.history
    }

    pub fn formed_results(&self) -> Vec<&PairResult> {
        self.history.iter().filter(|r| r.formed).collect()
    }

    pub fn stable_results(&self) -> Vec<&PairResult> {
        self.history
            .iter()
            .filter(|r| r.outcome == Outcome::Stable)
            .collect()
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::VirtualContext;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorded {
        progress: Vec<usize>,
        completes: usize,
        errors: Vec<String>,
        transitions: Vec<(SessionState, SessionState)>,
    }

    struct Recorder(Arc<Mutex<Recorded>>);

    impl SessionObserver for Recorder {
        fn on_progress(&mut self, progress: &Progress, _result: &PairResult) {
            self.0.lock().unwrap().progress.push(progress.completed);
        }
        fn on_complete(&mut self, _summary: &RunSummary) {
            self.0.lock().unwrap().completes += 1;
        }
        fn on_error(&mut self, message: &str) {
            self.0.lock().unwrap().errors.push(message.to_string());
        }
        fn on_state_change(&mut self, from: SessionState, to: SessionState) {
            self.0.lock().unwrap().transitions.push((from, to));
        }
    }

    fn session() -> RunSession<VirtualContext> {
        RunSession::new(VirtualContext::shared())
    }

    fn small_params() -> RunParams {
        RunParams::default()
            .with_population(10)
            .with_collisions(5)
            .with_max_duration(12)
            .with_seed(42)
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(Progress { completed: 0, total: 0 }.percent(), 0);
        assert_eq!(Progress { completed: 1, total: 3 }.percent(), 33);
        assert_eq!(Progress { completed: 2, total: 3 }.percent(), 67);
        assert_eq!(Progress { completed: 120, total: 120 }.percent(), 100);
    }

    #[tokio::test]
    async fn test_run_to_complete() {
        let mut session = session();
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        session.subscribe(Box::new(Recorder(Arc::clone(&recorded))));

        session.start(small_params()).unwrap();
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.progress(), Progress { completed: 0, total: 5 });

        assert_eq!(session.run_to_end().await, SessionState::Complete);
        assert_eq!(session.progress_percent(), 100);
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.formed_results().len(), 2);
        assert_eq!(session.stable_results().len(), 2);
        assert_eq!(session.summary().unwrap().formed_relationships, 5);
        assert!(session.error().is_none());

        // Worker released: nothing more to receive
        assert!(session.next_event().await.is_none());

        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.progress, vec![1, 5]);
        assert_eq!(recorded.completes, 1);
        assert_eq!(
            recorded.transitions,
            vec![
                (SessionState::Idle, SessionState::Running),
                (SessionState::Running, SessionState::Complete),
            ]
        );
    }

    #[tokio::test]
    async fn test_error_state() {
        let mut session = session();
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        session.subscribe(Box::new(Recorder(Arc::clone(&recorded))));

        session
            .start(RunParams::default().with_population(1).with_collisions(3))
            .unwrap();
        assert_eq!(session.run_to_end().await, SessionState::Error);
        assert!(session.summary().is_none());
        assert!(session.error().is_some());
        assert_eq!(recorded.lock().unwrap().errors.len(), 1);
    }

    #[tokio::test]
    async fn test_pause_resume_transitions() {
        let mut session = session();
        session.start(small_params()).unwrap();

        session.pause().unwrap();
        assert_eq!(session.state(), SessionState::Paused);
        session.resume().unwrap();
        assert_eq!(session.state(), SessionState::Running);

        assert_eq!(session.run_to_end().await, SessionState::Complete);
        assert_eq!(session.summary().unwrap().total_pairs, 5);
    }

    #[tokio::test]
    async fn test_pause_requires_active_run() {
        let mut session = session();
        assert!(session.pause().is_err());
        assert!(session.resume().is_err());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_cancel_and_reset() {
        let mut session = session();
        session
            .start(small_params().with_collisions(200).with_population(30))
            .unwrap();
        let first = session.next_event().await;
        assert!(matches!(first, Some(Notification::Progress { completed: 1, .. })));

        session.cancel();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.next_event().await.is_none());
        assert_eq!(session.history().len(), 1);

        session.reset();
        assert!(session.history().is_empty());
        assert_eq!(session.progress(), Progress::default());
        assert!(session.params().is_none());
    }

    #[tokio::test]
    async fn test_restart_discards_previous_run() {
        let mut session = session();
        session
            .start(small_params().with_collisions(300).with_population(30))
            .unwrap();
        let _ = session.next_event().await;

        session.start(small_params()).unwrap();
        assert!(session.history().is_empty());
        assert_eq!(session.run_to_end().await, SessionState::Complete);
        assert_eq!(session.summary().unwrap().total_pairs, 5);
        assert!(session.history().iter().all(|r| r.pair_id < 5));
    }

    #[tokio::test]
    async fn test_post_raw() {
        let mut session = session();
        session.post_raw(r#"{"type":"bogus"}"#).unwrap();
        session.post_raw("{").unwrap();
        assert_eq!(session.state(), SessionState::Idle);

        session
            .post_raw(r#"{"type":"start","params":{"populationSize":10,"numCollisions":5,"maxDuration":12,"randomSeed":42}}"#)
            .unwrap();
        assert_eq!(session.state(), SessionState::Running);
        session.post_raw(r#"{"type":"pause"}"#).unwrap();
        assert_eq!(session.state(), SessionState::Paused);
        session.post_raw(r#"{"type":"cancel"}"#).unwrap();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_post_raw_bad_start_params() {
        let mut session = session();
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        session.subscribe(Box::new(Recorder(Arc::clone(&recorded))));

        session.start(small_params().with_collisions(300).with_population(30)).unwrap();
        let _ = session.next_event().await;

        session
            .post_raw(r#"{"type":"start","params":{"randomSeed":-1}}"#)
            .unwrap();
        assert_eq!(session.run_to_end().await, SessionState::Error);
        assert!(session.error().unwrap().contains("start"));
        assert!(session.summary().is_none());
        assert!(session.history().is_empty());
        assert!(session.params().is_none());
        assert_eq!(recorded.lock().unwrap().errors.len(), 1);
    }

    #[tokio::test]
    async fn test_same_seed_same_summary() {
        let mut a = session();
        let mut b = session();
        a.start(small_params()).unwrap();
        b.start(small_params()).unwrap();
        a.run_to_end().await;
        b.run_to_end().await;
        assert_eq!(a.summary(), b.summary());
        assert_eq!(a.history(), b.history());
    }
}
