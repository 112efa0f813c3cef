//! Run worker: the actor that owns one run's state.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  Command (mpsc)   ┌──────────────────────────────┐
//! │ WorkerHandle │ ────────────────► │ RunWorker                    │
//! │  (initiator) │                   │  paused / cancelled flags    │
//! │              │ ◄──────────────── │  LcgRng, accumulated results │
//! └──────────────┘ Notification      └──────────────────────────────┘
//! ```
//!
//! The worker owns every piece of mutable run state; nothing is shared.
//! Commands are only looked at between pairs and inside the pause wait, so
//! a pair's simulation is never interrupted halfway.

use bondsim_core::{
    generate_population, select_pairs, simulate_pair, summarize, Command, EngineError, LcgRng,
    Notification, RunParams,
};
use bondsim_env::{EnvError, RunContext, RunId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Controller tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    /// How long a paused worker sleeps between flag checks
    pub poll_interval: Duration,

    /// Progress is reported for every pair index divisible by this, and for the last pair
    pub progress_every: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            progress_every: 50,
        }
    }
}

impl ControllerConfig {
    /// Sets the pause poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the progress cadence (values below 1 are treated as 1).
    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every.max(1);
        self
    }
}

// ============================================================================
// HANDLE
// ============================================================================

/// Initiator-side handle to a spawned worker.
///
/// Dropping the handle closes the command channel, which the worker treats
/// as a cancel.
pub struct WorkerHandle {
    id: RunId,
    commands: UnboundedSender<Inbound>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Identifier used in this worker's log lines.
    pub fn id(&self) -> RunId {
        self.id
    }

    /// Posts a command to the worker.
    pub fn post(&self, command: Command) -> Result<(), EnvError> {
        trace!("[{}] -> {}", self.id, command.name());
        self.send(Inbound::Command(command))
    }

    /// Posts a `start` that could not be decoded. The worker abandons any
    /// active run and reports `err` as the run's error.
    pub(crate) fn post_rejected_start(&self, err: EngineError) -> Result<(), EnvError> {
        trace!("[{}] -> start (rejected)", self.id);
        self.send(Inbound::RejectedStart(err))
    }

    /// Posts a raw JSON message. Unrecognized messages are dropped.
    ///
    /// Returns whether the message was a known command.
    pub fn post_raw(&self, json: &str) -> Result<bool, EnvError> {
        match Command::decode(json) {
            Ok(Some(command)) => self.post(command).map(|_| true),
            Ok(None) => {
                trace!("[{}] ignoring unrecognized message", self.id);
                Ok(false)
            }
            Err(e) => self.post_rejected_start(e).map(|_| true),
        }
    }

    fn send(&self, inbound: Inbound) -> Result<(), EnvError> {
        self.commands
            .send(inbound)
            .map_err(|_| EnvError::closed(format!("run worker {}", self.id)))
    }

    /// True once the worker task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Terminates the worker abruptly. No further notification is sent.
    pub fn terminate(self) {
        debug!("[{}] terminated", self.id);
        self.task.abort();
    }
}

/// Spawns a worker on `ctx` and returns its handle and notification stream.
pub fn spawn_worker<C: RunContext>(
    ctx: Arc<C>,
    config: ControllerConfig,
) -> (WorkerHandle, UnboundedReceiver<Notification>) {
    spawn_worker_with_id(ctx, config, RunId::new())
}

/// Like [`spawn_worker`] with a caller-chosen id.
pub fn spawn_worker_with_id<C: RunContext>(
    ctx: Arc<C>,
    config: ControllerConfig,
    id: RunId,
) -> (WorkerHandle, UnboundedReceiver<Notification>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (notify_tx, notify_rx) = mpsc::unbounded_channel();

    let worker = RunWorker {
        id,
        ctx: Arc::clone(&ctx),
        config,
        rng: LcgRng::default(),
        paused: false,
        cancelled: false,
        commands: command_rx,
        notifications: notify_tx,
    };
    let task = ctx.spawn("run-worker", worker.run());

    let handle = WorkerHandle {
        id,
        commands: command_tx,
        task,
    };
    (handle, notify_rx)
}

// ============================================================================
// WORKER
// ============================================================================

/// What travels over the command channel.
#[derive(Debug)]
enum Inbound {
    Command(Command),
    /// A `start` whose params could not be decoded
    RejectedStart(EngineError),
}

/// Params of a requested run, or why the request was unusable.
type StartRequest = Result<RunParams, EngineError>;

/// How a single run ended.
#[derive(Debug)]
enum RunExit {
    Completed,
    Failed,
    Cancelled,
    /// A new `start` arrived mid-run
    Restart(StartRequest),
    /// The initiator is gone
    Disconnected,
}

struct RunWorker<C: RunContext> {
    id: RunId,
    ctx: Arc<C>,
    config: ControllerConfig,
    /// Persists across runs of this worker unless a run supplies a seed
    rng: LcgRng,
    paused: bool,
    cancelled: bool,
    commands: UnboundedReceiver<Inbound>,
    notifications: UnboundedSender<Notification>,
}

impl<C: RunContext> RunWorker<C> {
    async fn run(mut self) {
        let mut pending: Option<StartRequest> = None;

        loop {
            let request = match pending.take() {
                Some(request) => request,
                None => match self.commands.recv().await {
                    Some(Inbound::Command(Command::Start { params })) => Ok(params),
                    Some(Inbound::RejectedStart(err)) => Err(err),
                    Some(Inbound::Command(other)) => {
                        trace!("[{}] {} ignored while idle", self.id, other.name());
                        continue;
                    }
                    None => break,
                },
            };

            let exit = match request {
                Ok(params) => self.execute(params).await,
                Err(err) => self.fail(err),
            };

            match exit {
                RunExit::Restart(next) => {
                    debug!("[{}] restarting with new params", self.id);
                    pending = Some(next);
                }
                RunExit::Disconnected => break,
                RunExit::Completed | RunExit::Failed | RunExit::Cancelled => {}
            }
        }

        debug!("[{}] worker exiting", self.id);
    }

    async fn execute(&mut self, params: RunParams) -> RunExit {
        self.paused = false;
        self.cancelled = false;
        if let Some(seed) = params.random_seed {
            self.rng.reseed(seed);
        }

        if let Err(e) = params.validate() {
            return self.fail(e);
        }

        info!(
            "[{}] run started: population={} pairs={} strategy={} horizon={}",
            self.id,
            params.population_size,
            params.num_collisions,
            params.pairing_strategy,
            params.max_duration
        );

        let population = generate_population(params.population_size, &mut self.rng);
        let pairs = match select_pairs(
            &population,
            params.pairing_strategy,
            params.num_collisions,
            &mut self.rng,
        ) {
            Ok(pairs) => pairs,
            Err(e) => return self.fail(e),
        };

        let total = pairs.len();
        let every = self.config.progress_every.max(1);
        let mut results = Vec::with_capacity(total);

        for (i, (a, b)) in pairs.into_iter().enumerate() {
            if let Some(exit) = self.checkpoint().await {
                return exit;
            }

            let result = simulate_pair(i, a, b, &params, &mut self.rng);

            if i % every == 0 || i + 1 == total {
                let progress = Notification::Progress {
                    completed: i + 1,
                    total,
                    result: result.clone(),
                };
                if !self.emit(progress) {
                    return RunExit::Disconnected;
                }
            }
            results.push(result);

            self.ctx.yield_now().await;
        }

        let summary = summarize(&results);
        info!(
            "[{}] run complete: formed={}/{} stable={}",
            self.id, summary.formed_relationships, summary.total_pairs, summary.stable_relationships
        );

        if self.emit(Notification::Complete { summary }) {
            RunExit::Completed
        } else {
            RunExit::Disconnected
        }
    }

    /// Pair boundary: applies queued commands and waits out a pause.
    async fn checkpoint(&mut self) -> Option<RunExit> {
        loop {
            if let Some(exit) = self.drain_commands() {
                return Some(exit);
            }
            if self.cancelled {
                debug!("[{}] run cancelled", self.id);
                return Some(RunExit::Cancelled);
            }
            if !self.paused {
                return None;
            }
            self.ctx.sleep(self.config.poll_interval).await;
        }
    }

    fn drain_commands(&mut self) -> Option<RunExit> {
        loop {
            match self.commands.try_recv() {
                Ok(Inbound::Command(Command::Pause)) => {
                    debug!("[{}] paused", self.id);
                    self.paused = true;
                }
                Ok(Inbound::Command(Command::Resume)) => {
                    debug!("[{}] resumed", self.id);
                    self.paused = false;
                }
                Ok(Inbound::Command(Command::Cancel)) => self.cancelled = true,
                Ok(Inbound::Command(Command::Start { params })) => {
                    return Some(RunExit::Restart(Ok(params)))
                }
                Ok(Inbound::RejectedStart(err)) => return Some(RunExit::Restart(Err(err))),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => return Some(RunExit::Disconnected),
            }
        }
    }

    fn fail(&self, err: EngineError) -> RunExit {
        warn!("[{}] run failed: {}", self.id, err);
        if self.emit(Notification::error(err)) {
            RunExit::Failed
        } else {
            RunExit::Disconnected
        }
    }

    fn emit(&self, notification: Notification) -> bool {
        self.notifications.send(notification).is_ok()
    }
}
