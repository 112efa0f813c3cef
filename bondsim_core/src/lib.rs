//! BondSim Core - Deterministic Relationship Dynamics Engine
//!
//! This library simulates pairwise "relationship" dynamics between synthetic
//! individuals and reduces the outcomes into summary statistics:
//! 1. **Random Source**: 32-bit LCG + clamped Box–Muller sampler, one stream per run
//! 2. **Population**: fixed-size set of individuals with sampled trait vectors
//! 3. **Pairing**: ordered pair sequence under a pairing strategy
//! 4. **Dynamics**: month-by-month bond/satisfaction integration with stochastic dissolution
//! 5. **Summary**: aggregate statistics over all pair outcomes
//!
//! The engine is pure and single-threaded; the run controller that drives it
//! under the start/pause/resume/cancel protocol lives in `bondsim_sim`.
//!
//! # Determinism
//!
//! Every draw goes through one sequential [`LcgRng`]. Generation fully
//! precedes pairing, which fully precedes simulation draws, so the same seed
//! and parameters always reproduce the same trajectories and summary.

pub mod error;
pub mod rng;
pub mod types;
pub mod params;
pub mod population;
pub mod pairing;
pub mod dynamics;
pub mod summary;
pub mod protocol;

// Re-export key types for convenience
pub use error::EngineError;
pub use rng::{LcgRng, DEFAULT_SEED};
pub use types::{
    AttachmentStyle, DissolutionReason, Individual, Outcome, PairResult, PersonalityTraits,
    RelationshipSkills, RunSummary, TimeStep, Values,
};
pub use params::{PairingStrategy, RunParams};
pub use population::generate_population;
pub use pairing::select_pairs;
pub use dynamics::simulate_pair;
pub use summary::summarize;
pub use protocol::{Command, Notification};
