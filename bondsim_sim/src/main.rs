//! BondSim CLI
//!
//! Runs one relationship-dynamics simulation through a run session and
//! reports progress, the summary and optionally a yearly timeline.

use bondsim_core::{EngineError, PairResult, PairingStrategy, RunParams, RunSummary};
use bondsim_env::{EnvError, TokioContext};
use bondsim_sim::{
    ControllerConfig, Progress, RunExport, RunSession, SessionObserver, SessionState, Timeline,
};
use clap::Parser;
use thiserror::Error;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Months between timeline rows.
const TIMELINE_STEP: usize = 12;

/// BondSim relationship dynamics simulator
#[derive(Parser, Debug)]
#[command(name = "bondsim")]
#[command(about = "Simulate relationship formation and dissolution", long_about = None)]
struct Args {
    /// JSON file with run parameters (flags override its values)
    #[arg(long)]
    params: Option<String>,

    /// Number of individuals to generate
    #[arg(short, long)]
    population: Option<usize>,

    /// Number of pairs to simulate
    #[arg(short, long)]
    collisions: Option<usize>,

    /// Pairing strategy (random, similarity, preference)
    #[arg(short = 'S', long)]
    strategy: Option<String>,

    /// External stress level [0, 1]
    #[arg(long)]
    stress: Option<f64>,

    /// Month horizon per pair
    #[arg(short = 'm', long)]
    max_duration: Option<usize>,

    /// Minimum initial attraction for a relationship to form
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Positive interaction rate
    #[arg(long)]
    alpha: Option<f64>,

    /// Negative interaction rate
    #[arg(long)]
    beta: Option<f64>,

    /// Bond decay rate
    #[arg(long)]
    gamma: Option<f64>,

    /// Random seed (defaults to the worker's initial seed)
    #[arg(short, long)]
    seed: Option<u32>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Log a yearly snapshot of the relationships still alive
    #[arg(long)]
    timeline: bool,

    /// Export params, results and summary to a JSON file
    #[arg(long)]
    export: Option<String>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Invalid parameters: {0}")]
    Params(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker unavailable: {0}")]
    Env(#[from] EnvError),

    #[error("Run failed: {0}")]
    Run(String),
}

/// Logs session events as they arrive.
struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_progress(&mut self, progress: &Progress, result: &PairResult) {
        info!(
            "  {:>3}% {}/{} | pair {} ({} × {}) {} after {} months",
            progress.percent(),
            progress.completed,
            progress.total,
            result.pair_id,
            result.individual1,
            result.individual2,
            result.outcome,
            result.duration
        );
    }

    fn on_complete(&mut self, summary: &RunSummary) {
        log_summary(summary);
    }

    fn on_error(&mut self, message: &str) {
        error!("✗ {}", message);
    }

    fn on_state_change(&mut self, from: SessionState, to: SessionState) {
        debug!("session {} -> {}", from, to);
    }
}

fn log_summary(summary: &RunSummary) {
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("Pairs:            {}", summary.total_pairs);
    info!("Formed:           {}", summary.formed_relationships);
    info!("Stable:           {}", summary.stable_relationships);
    info!("Avg duration:     {:.2} months", summary.avg_duration);
    info!("Avg final bond:   {:.3}", summary.avg_final_bond);
    info!("Avg satisfaction: {:.3}", summary.avg_satisfaction);
    info!("Durations:        {:?}", summary.duration_distribution);
}

/// Loads the params file (if any) and applies flag overrides.
fn build_params(args: &Args) -> Result<RunParams, CliError> {
    let mut params = match &args.params {
        Some(path) => RunParams::from_json(&std::fs::read_to_string(path)?)?,
        None => RunParams::default(),
    };

    if let Some(v) = args.population {
        params.population_size = v;
    }
    if let Some(v) = args.collisions {
        params.num_collisions = v;
    }
    if let Some(s) = &args.strategy {
        params.pairing_strategy = s
            .parse::<PairingStrategy>()
            .map_err(EngineError::invalid_params)?;
    }
    if let Some(v) = args.stress {
        params.stress_level = v;
    }
    if let Some(v) = args.max_duration {
        params.max_duration = v;
    }
    if let Some(v) = args.threshold {
        params.initial_attraction_threshold = v;
    }
    if let Some(v) = args.alpha {
        params.alpha = v;
    }
    if let Some(v) = args.beta {
        params.beta = v;
    }
    if let Some(v) = args.gamma {
        params.gamma = v;
    }
    if let Some(v) = args.seed {
        params.random_seed = Some(v);
    }

    Ok(params)
}

async fn run(args: Args) -> Result<(), CliError> {
    let params = build_params(&args)?;

    // Timeline and export need every result, not just the sampled ones
    let config = if args.timeline || args.export.is_some() {
        ControllerConfig::default().with_progress_every(1)
    } else {
        ControllerConfig::default()
    };

    let mut session = RunSession::with_config(TokioContext::shared(), config);
    if !args.json {
        info!("BondSim v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "population={} pairs={} strategy={} horizon={} stress={}",
            params.population_size,
            params.num_collisions,
            params.pairing_strategy,
            params.max_duration,
            params.stress_level
        );
        session.subscribe(Box::new(LogObserver));
    }

    let run_id = session.start(params.clone())?;
    let state = session.run_to_end().await;

    let snapshots = if args.timeline {
        let timeline = Timeline::new(session.history());
        let snapshots = timeline.snapshots(TIMELINE_STEP);
        if !args.json {
            info!("month | active | dissolved | avg bond | avg satisfaction");
            for s in &snapshots {
                info!(
                    "{:>5} | {:>6} | {:>9} | {:>8.3} | {:>16.3}",
                    s.month, s.active_count, s.dissolution_count, s.avg_bond, s.avg_satisfaction
                );
            }
        }
        snapshots
    } else {
        Vec::new()
    };

    if let Some(path) = &args.export {
        let mut export = RunExport::new(run_id.to_string(), params);
        export.results = session.history().to_vec();
        export.timeline = snapshots;
        export.finalize(
            session.summary().cloned(),
            session.error().map(str::to_string),
        );
        export.write_to_file(path)?;
        info!("Exported {} results to {}", export.results.len(), path);
    }

    match state {
        SessionState::Complete => {
            if args.json {
                if let Some(summary) = session.summary() {
                    println!("{}", serde_json::to_string_pretty(summary).map_err(EngineError::from)?);
                }
            }
            Ok(())
        }
        _ => Err(CliError::Run(
            session.error().unwrap_or("run did not complete").to_string(),
        )),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
