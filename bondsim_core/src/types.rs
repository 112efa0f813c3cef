//! Data model shared by the engine, the run controller and its consumers.
//!
//! Wire names follow the message protocol: camelCase for results and
//! summaries, snake_case for trait names inside an [`Individual`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight used for a preference key an individual does not carry.
pub const DEFAULT_PREFERENCE_WEIGHT: f64 = 0.3;

/// Preference key: weight on a partner's agreeableness.
pub const PREF_AGREEABLENESS: &str = "agreeableness";

/// Preference key: weight on a partner's emotional regulation.
pub const PREF_EMOTIONAL_REGULATION: &str = "emotional_regulation";

/// Number of buckets in [`RunSummary::duration_distribution`].
pub const DURATION_BUCKETS: usize = 10;

// =============================================================================
// INDIVIDUAL
// =============================================================================

/// Big-five personality dimensions, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalityTraits {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

/// Attachment dimensions, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttachmentStyle {
    pub anxiety: f64,
    pub avoidance: f64,
}

/// Value dimensions, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Values {
    pub family_orientation: f64,
    pub career_ambition: f64,
    pub novelty_seeking: f64,
    pub security_seeking: f64,
    pub social_orientation: f64,
}

/// Relationship skill dimensions, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSkills {
    pub emotional_regulation: f64,
    pub communication_quality: f64,
    pub conflict_resolution: f64,
    pub empathy: f64,
}

/// A synthetic individual. Created once by the population generator and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: u32,
    pub personality: PersonalityTraits,
    pub attachment: AttachmentStyle,
    pub values: Values,
    pub skills: RelationshipSkills,
    /// Age in years, [20, 49]
    pub age: u32,
    /// Sparse partner-preference weights
    pub preference_weights: BTreeMap<String, f64>,
}

impl Individual {
    /// Returns the preference weight for `key`, or
    /// [`DEFAULT_PREFERENCE_WEIGHT`] when the key is absent.
    pub fn preference_weight(&self, key: &str) -> f64 {
        self.preference_weights
            .get(key)
            .copied()
            .unwrap_or(DEFAULT_PREFERENCE_WEIGHT)
    }
}

// =============================================================================
// TRAJECTORY & RESULTS
// =============================================================================

/// One month of a pair's state. Appended to a trajectory, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeStep {
    /// Month index
    pub t: u32,

    /// Bond strength [0, 1]
    #[serde(rename = "B")]
    pub bond: f64,

    /// Partner 1 satisfaction [0, 1]
    #[serde(rename = "S1")]
    pub s1: f64,

    /// Partner 2 satisfaction [0, 1]
    #[serde(rename = "S2")]
    pub s2: f64,

    /// Dissolution happened this month (always the last step if set)
    pub dissolved: bool,
}

impl TimeStep {
    /// Mean satisfaction of both partners.
    pub fn avg_satisfaction(&self) -> f64 {
        (self.s1 + self.s2) / 2.0
    }
}

/// How a pair's simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Attraction below the formation threshold
    NeverFormed,
    /// Reached the horizon without dissolving
    Stable,
    /// Dissolved before the horizon
    Dissolved,
}

impl Outcome {
    /// Returns the wire tag.
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::NeverFormed => "never_formed",
            Outcome::Stable => "stable",
            Outcome::Dissolved => "dissolved",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Why a relationship dissolved, classified at the dissolution month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DissolutionReason {
    LowBond,
    LowSatisfaction,
    Stress,
    Incompatibility,
}

impl DissolutionReason {
    /// Returns the wire tag.
    pub fn name(&self) -> &'static str {
        match self {
            DissolutionReason::LowBond => "low_bond",
            DissolutionReason::LowSatisfaction => "low_satisfaction",
            DissolutionReason::Stress => "stress",
            DissolutionReason::Incompatibility => "incompatibility",
        }
    }
}

impl std::fmt::Display for DissolutionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of simulating one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairResult {
    /// Position in the pair sequence
    pub pair_id: usize,
    pub individual1: u32,
    pub individual2: u32,
    pub formed: bool,
    /// Trajectory length in months
    pub duration: usize,
    pub outcome: Outcome,
    pub trajectory: Vec<TimeStep>,
    pub final_bond_strength: f64,
    pub avg_satisfaction1: f64,
    pub avg_satisfaction2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dissolution_reason: Option<DissolutionReason>,
}

impl PairResult {
    /// Mean of both partners' average satisfaction.
    pub fn mean_satisfaction(&self) -> f64 {
        (self.avg_satisfaction1 + self.avg_satisfaction2) / 2.0
    }

    /// Returns the step at `month`, if the trajectory reaches it.
    pub fn step_at(&self, month: usize) -> Option<&TimeStep> {
        self.trajectory.get(month)
    }
}

// =============================================================================
// SUMMARY
// =============================================================================

/// Aggregate over every pair result of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total_pairs: usize,
    pub formed_relationships: usize,
    pub stable_relationships: usize,
    pub avg_duration: f64,
    pub avg_final_bond: f64,
    pub avg_satisfaction: f64,
    pub duration_distribution: [usize; DURATION_BUCKETS],
    /// Reserved; always empty
    pub compatibility_matrix: Vec<Vec<f64>>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            total_pairs: 0,
            formed_relationships: 0,
            stable_relationships: 0,
            avg_duration: 0.0,
            avg_final_bond: 0.0,
            avg_satisfaction: 0.0,
            duration_distribution: [0; DURATION_BUCKETS],
            compatibility_matrix: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> PairResult {
        PairResult {
            pair_id: 3,
            individual1: 1,
            individual2: 2,
            formed: true,
            duration: 1,
            outcome: Outcome::Dissolved,
            trajectory: vec![TimeStep { t: 0, bond: 0.08, s1: 0.4, s2: 0.6, dissolved: true }],
            final_bond_strength: 0.08,
            avg_satisfaction1: 0.4,
            avg_satisfaction2: 0.6,
            dissolution_reason: Some(DissolutionReason::LowBond),
        }
    }

    #[test]
    fn test_preference_weight_default() {
        let mut weights = BTreeMap::new();
        weights.insert(PREF_AGREEABLENESS.to_string(), 0.55);

        let individual = Individual {
            id: 0,
            personality: PersonalityTraits {
                openness: 0.5,
                conscientiousness: 0.5,
                extraversion: 0.5,
                agreeableness: 0.5,
                neuroticism: 0.5,
            },
            attachment: AttachmentStyle { anxiety: 0.3, avoidance: 0.3 },
            values: Values {
                family_orientation: 0.5,
                career_ambition: 0.5,
                novelty_seeking: 0.5,
                security_seeking: 0.5,
                social_orientation: 0.5,
            },
            skills: RelationshipSkills {
                emotional_regulation: 0.5,
                communication_quality: 0.5,
                conflict_resolution: 0.5,
                empathy: 0.5,
            },
            age: 30,
            preference_weights: weights,
        };

        assert_eq!(individual.preference_weight(PREF_AGREEABLENESS), 0.55);
        assert_eq!(individual.preference_weight(PREF_EMOTIONAL_REGULATION), DEFAULT_PREFERENCE_WEIGHT);
    }

    #[test]
    fn test_pair_result_wire_names() {
        let json = serde_json::to_value(sample_result()).unwrap();

        assert_eq!(json["pairId"], 3);
        assert_eq!(json["outcome"], "dissolved");
        assert_eq!(json["dissolutionReason"], "low_bond");
        assert_eq!(json["finalBondStrength"], 0.08);
        assert_eq!(json["avgSatisfaction1"], 0.4);
        assert_eq!(json["trajectory"][0]["B"], 0.08);
        assert_eq!(json["trajectory"][0]["S2"], 0.6);
    }

    #[test]
    fn test_reason_omitted_when_absent() {
        let mut result = sample_result();
        result.dissolution_reason = None;
        result.outcome = Outcome::Stable;

        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("dissolutionReason"));

        let back: PairResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_summary_default_is_well_formed() {
        let summary = RunSummary::default();
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["durationDistribution"].as_array().unwrap().len(), DURATION_BUCKETS);
        assert!(json["compatibilityMatrix"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(Outcome::NeverFormed.to_string(), "never_formed");
        assert_eq!(DissolutionReason::LowSatisfaction.to_string(), "low_satisfaction");
    }
}
