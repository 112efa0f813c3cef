//! Run parameters.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Policy used to choose which two individuals are simulated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingStrategy {
    /// Uniform partner, distinct from the first individual
    #[default]
    Random,

    /// Best of five sampled candidates by trait similarity
    Similarity,

    /// Declared placeholder; currently pairs exactly like `Random`
    Preference,
}

impl PairingStrategy {
    /// Returns all strategies.
    pub fn all() -> Vec<PairingStrategy> {
        vec![
            PairingStrategy::Random,
            PairingStrategy::Similarity,
            PairingStrategy::Preference,
        ]
    }

    /// Returns the strategy name.
    pub fn name(&self) -> &'static str {
        match self {
            PairingStrategy::Random => "random",
            PairingStrategy::Similarity => "similarity",
            PairingStrategy::Preference => "preference",
        }
    }
}

impl std::fmt::Display for PairingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for PairingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(PairingStrategy::Random),
            "similarity" | "similar" => Ok(PairingStrategy::Similarity),
            "preference" | "pref" => Ok(PairingStrategy::Preference),
            _ => Err(format!("Unknown pairing strategy: {}", s)),
        }
    }
}

/// Configuration for one run.
///
/// Probabilities and weights are expected in [0, 1] but are not range
/// checked; out-of-range values propagate arithmetically. Only sizes that
/// would break index arithmetic and non-finite numbers are rejected by
/// [`RunParams::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunParams {
    /// Number of individuals to generate
    pub population_size: usize,

    /// Number of pairs to simulate
    pub num_collisions: usize,

    /// Pair selection policy
    pub pairing_strategy: PairingStrategy,

    /// External stress [0, 1]
    pub stress_level: f64,

    /// Month horizon per pair
    pub max_duration: usize,

    /// Minimum attraction for a relationship to form
    pub initial_attraction_threshold: f64,

    /// Positive interaction rate
    pub alpha: f64,

    /// Negative interaction rate
    pub beta: f64,

    /// Bond decay rate
    pub gamma: f64,

    /// Overrides the worker's current seed when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u32>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            population_size: 500,
            num_collisions: 1000,
            pairing_strategy: PairingStrategy::Random,
            stress_level: 0.3,
            max_duration: 120, // 10 years in months
            initial_attraction_threshold: 0.3,
            alpha: 0.15,
            beta: 0.10,
            gamma: 0.02,
            random_seed: None,
        }
    }
}

impl RunParams {
    /// Sets the population size.
    pub fn with_population(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the number of pairs to simulate.
    pub fn with_collisions(mut self, count: usize) -> Self {
        self.num_collisions = count;
        self
    }

    /// Sets the pairing strategy.
    pub fn with_strategy(mut self, strategy: PairingStrategy) -> Self {
        self.pairing_strategy = strategy;
        self
    }

    /// Sets the month horizon.
    pub fn with_max_duration(mut self, months: usize) -> Self {
        self.max_duration = months;
        self
    }

    /// Sets the external stress level.
    pub fn with_stress(mut self, stress: f64) -> Self {
        self.stress_level = stress;
        self
    }

    /// Sets the formation threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.initial_attraction_threshold = threshold;
        self
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Parses parameters from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rejects parameters the engine cannot run.
    ///
    /// A population of 0 has no valid index and a population of 1 can never
    /// yield a distinct partner, so both are errors. `num_collisions == 0` is
    /// valid and produces an empty summary.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.population_size < 2 {
            return Err(EngineError::invalid_params(format!(
                "populationSize must be at least 2, got {}",
                self.population_size
            )));
        }

        let rates = [
            ("stressLevel", self.stress_level),
            ("initialAttractionThreshold", self.initial_attraction_threshold),
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
        ];
        for (name, value) in rates {
            if !value.is_finite() {
                return Err(EngineError::invalid_params(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
