//! Relationship Integrator
//! =======================
//!
//! Advances one pair's state month by month until dissolution or the horizon.
//!
//! # State Machine
//!
//! ```text
//!              attraction < threshold
//!   [start] ───────────────────────────▶ NeverFormed
//!      │
//!      ▼
//!   Active ──(draw < p_dissolve)──▶ Dissolved
//!      │
//!      └──(maxDuration months)────▶ Stable
//! ```
//!
//! # Bond Update (one month, dt = 1)
//!
//! ```text
//! dB = α·positive(B) − β·negative − γ·B
//! ```
//!
//! `positive` is amplified by the current bond strength; `negative` takes
//! the bond strength as an argument but does not depend on it.

use crate::params::RunParams;
use crate::rng::LcgRng;
use crate::types::{
    DissolutionReason, Individual, Outcome, PairResult, TimeStep, PREF_AGREEABLENESS,
    PREF_EMOTIONAL_REGULATION,
};

/// Bond strength below which dissolution is near certain.
pub const COLLAPSE_BOND: f64 = 0.05;

/// Dissolution probability once the bond has collapsed.
pub const COLLAPSE_PROBABILITY: f64 = 0.95;

/// Largest monthly satisfaction change per partner.
pub const MAX_SATISFACTION_DELTA: f64 = 0.05;

/// Upper bound on the months reserved up front for a trajectory.
const TRAJECTORY_RESERVE: usize = 1024;

// =============================================================================
// INTERACTION TERMS
// =============================================================================

/// Static pre-formation compatibility in [0, 1].
///
/// Weighted sum of value similarity (0.35), extraversion complementarity
/// (0.2), mean agreeableness (0.25) and a secure-attachment proxy (0.2).
pub fn initial_attraction(a: &Individual, b: &Individual) -> f64 {
    let value_similarity = 1.0
        - ((a.values.family_orientation - b.values.family_orientation).abs() * 0.4
            + (a.values.security_seeking - b.values.security_seeking).abs() * 0.3
            + (a.values.novelty_seeking - b.values.novelty_seeking).abs() * 0.3);

    // A moderate extraversion gap is fine; only the excess over 0.4 counts
    let extraversion_gap = (a.personality.extraversion - b.personality.extraversion).abs();
    let extraversion_complement = 1.0 - (extraversion_gap - 0.4).max(0.0);

    let agreeableness = (a.personality.agreeableness + b.personality.agreeableness) / 2.0;
    let secure_attachment = 1.0 - (a.attachment.anxiety + b.attachment.avoidance) / 2.0 * 0.4;

    (value_similarity * 0.35
        + extraversion_complement * 0.2
        + agreeableness * 0.25
        + secure_attachment * 0.2)
        .clamp(0.0, 1.0)
}

/// Positive interaction rate, amplified by bond strength.
pub fn positive_interactions(a: &Individual, b: &Individual, bond: f64) -> f64 {
    let communication = (a.skills.communication_quality + b.skills.communication_quality) / 2.0;
    let empathy = (a.skills.empathy + b.skills.empathy) / 2.0;
    let value_alignment =
        1.0 - (a.values.family_orientation - b.values.family_orientation).abs() * 0.5;

    (communication * 0.4 + empathy * 0.35 + value_alignment * 0.25) * (0.5 + bond * 0.5)
}

/// Negative interaction rate.
///
/// Accepts the bond strength for symmetry with [`positive_interactions`]
/// but has no bond feedback.
pub fn negative_interactions(a: &Individual, b: &Individual, _bond: f64) -> f64 {
    let neuroticism = (a.personality.neuroticism + b.personality.neuroticism) / 2.0;
    let anxiety = (a.attachment.anxiety + b.attachment.anxiety) / 2.0;
    let poor_conflict_resolution =
        1.0 - (a.skills.conflict_resolution + b.skills.conflict_resolution) / 2.0;

    neuroticism * 0.4 + anxiety * 0.3 + poor_conflict_resolution * 0.3
}

/// Monthly satisfaction change for `this` partner, clamped to ±0.05.
///
/// Driven by how well `partner` matches `this` partner's preferences, the
/// current bond strength, and external stress scaled by own neuroticism.
pub fn satisfaction_delta(this: &Individual, partner: &Individual, bond: f64, stress: f64) -> f64 {
    let match_score = partner.personality.agreeableness
        * this.preference_weight(PREF_AGREEABLENESS)
        + partner.skills.emotional_regulation * this.preference_weight(PREF_EMOTIONAL_REGULATION);

    let stress_effect = -stress * this.personality.neuroticism * 0.4;
    let bond_contribution = (bond - 0.5) * 0.3;

    (match_score * 0.04 + bond_contribution * 0.02 + stress_effect * 0.01)
        .clamp(-MAX_SATISFACTION_DELTA, MAX_SATISFACTION_DELTA)
}

/// Probability that the relationship dissolves this month.
pub fn dissolution_probability(bond: f64, s1: f64, s2: f64, stress: f64) -> f64 {
    if bond < COLLAPSE_BOND {
        return COLLAPSE_PROBABILITY;
    }

    let avg_satisfaction = (s1 + s2) / 2.0;
    ((1.0 - bond) * 0.02 + (1.0 - avg_satisfaction) * 0.02 + stress * 0.01).clamp(0.0, 1.0)
}

/// Classifies a dissolution: low bond, then low satisfaction, then stress.
pub fn classify_dissolution(step: &TimeStep, stress: f64) -> DissolutionReason {
    if step.bond < 0.1 {
        DissolutionReason::LowBond
    } else if step.avg_satisfaction() < 0.3 {
        DissolutionReason::LowSatisfaction
    } else if stress > 0.6 {
        DissolutionReason::Stress
    } else {
        DissolutionReason::Incompatibility
    }
}

// =============================================================================
// TRAJECTORY
// =============================================================================

/// Simulates one pair and returns its immutable result.
///
/// Draws exactly one uniform value per simulated month and none for a pair
/// that never forms.
pub fn simulate_pair(
    pair_id: usize,
    a: &Individual,
    b: &Individual,
    params: &RunParams,
    rng: &mut LcgRng,
) -> PairResult {
    let attraction = initial_attraction(a, b);

    if attraction < params.initial_attraction_threshold {
        return PairResult {
            pair_id,
            individual1: a.id,
            individual2: b.id,
            formed: false,
            duration: 0,
            outcome: Outcome::NeverFormed,
            trajectory: Vec::new(),
            final_bond_strength: 0.0,
            avg_satisfaction1: 0.0,
            avg_satisfaction2: 0.0,
            dissolution_reason: None,
        };
    }

    let stress = params.stress_level;
    let mut bond = attraction;
    let mut s1 = 0.5 + (attraction - 0.5) * 0.3;
    let mut s2 = s1;

    let mut trajectory = Vec::with_capacity(params.max_duration.min(TRAJECTORY_RESERVE));
    let mut dissolution_reason = None;

    for t in 0..params.max_duration {
        let d_bond = params.alpha * positive_interactions(a, b, bond)
            - params.beta * negative_interactions(a, b, bond)
            - params.gamma * bond;
        let d_s1 = satisfaction_delta(a, b, bond, stress);
        let d_s2 = satisfaction_delta(b, a, bond, stress);

        bond = (bond + d_bond).clamp(0.0, 1.0);
        s1 = (s1 + d_s1).clamp(0.0, 1.0);
        s2 = (s2 + d_s2).clamp(0.0, 1.0);

        let p_dissolve = dissolution_probability(bond, s1, s2, stress);
        let dissolved = rng.next_f64() < p_dissolve;

        let step = TimeStep {
            t: t as u32,
            bond,
            s1,
            s2,
            dissolved,
        };
        trajectory.push(step);

        if dissolved {
            dissolution_reason = Some(classify_dissolution(&step, stress));
            break;
        }
    }

    let last = trajectory.last().copied();
    let months = trajectory.len().max(1) as f64;
    let avg_satisfaction1 = trajectory.iter().map(|s| s.s1).sum::<f64>() / months;
    let avg_satisfaction2 = trajectory.iter().map(|s| s.s2).sum::<f64>() / months;

    let outcome = match last {
        Some(step) if step.dissolved => Outcome::Dissolved,
        _ => Outcome::Stable,
    };

    PairResult {
        pair_id,
        individual1: a.id,
        individual2: b.id,
        formed: true,
        duration: trajectory.len(),
        outcome,
        final_bond_strength: last.map(|s| s.bond).unwrap_or(0.0),
        trajectory,
        avg_satisfaction1,
        avg_satisfaction2,
        dissolution_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::select_pairs;
    use crate::params::PairingStrategy;
    use crate::population::generate_population;
    use approx::assert_relative_eq;

    fn population(seed: u32, n: usize) -> Vec<Individual> {
        generate_population(n, &mut LcgRng::new(seed))
    }

    #[test]
    fn test_attraction_in_range() {
        let people = population(1, 30);

        for a in &people {
            for b in &people {
                let attraction = initial_attraction(a, b);
                assert!((0.0..=1.0).contains(&attraction));
            }
        }
    }

    #[test]
    fn test_attraction_uses_cross_attachment() {
        // anxiety of the first partner, avoidance of the second
        let people = population(2, 2);
        let (mut a, b) = (people[0].clone(), people[1].clone());
        let before = initial_attraction(&a, &b);

        a.attachment.avoidance = (a.attachment.avoidance + 0.3).min(1.0);
        assert_eq!(initial_attraction(&a, &b), before);

        a.attachment.anxiety = 0.0;
        assert!(initial_attraction(&a, &b) >= before);
    }

    #[test]
    fn test_negative_term_ignores_bond() {
        let people = population(3, 2);
        let (a, b) = (&people[0], &people[1]);

        let low = negative_interactions(a, b, 0.0);
        let high = negative_interactions(a, b, 1.0);
        assert_eq!(low, high);

        assert!(positive_interactions(a, b, 1.0) > positive_interactions(a, b, 0.0));
    }

    #[test]
    fn test_satisfaction_delta_clamped() {
        let people = population(4, 10);

        for a in &people {
            for b in &people {
                for bond in [0.0, 0.5, 1.0] {
                    for stress in [0.0, 1.0, 50.0] {
                        let delta = satisfaction_delta(a, b, bond, stress);
                        assert!(delta.abs() <= MAX_SATISFACTION_DELTA);
                    }
                }
            }
        }
    }

    #[test]
    fn test_dissolution_probability() {
        assert_eq!(dissolution_probability(0.04, 1.0, 1.0, 0.0), COLLAPSE_PROBABILITY);
        assert_relative_eq!(dissolution_probability(1.0, 1.0, 1.0, 0.0), 0.0);
        assert_relative_eq!(
            dissolution_probability(0.5, 0.4, 0.6, 0.3),
            0.5 * 0.02 + 0.5 * 0.02 + 0.3 * 0.01,
            epsilon = 1e-15
        );
        assert_eq!(dissolution_probability(0.5, 0.5, 0.5, 500.0), 1.0);
    }

    #[test]
    fn test_classify_priority() {
        let step = |bond, s| TimeStep { t: 0, bond, s1: s, s2: s, dissolved: true };

        assert_eq!(classify_dissolution(&step(0.05, 0.1), 0.9), DissolutionReason::LowBond);
        assert_eq!(classify_dissolution(&step(0.5, 0.2), 0.9), DissolutionReason::LowSatisfaction);
        assert_eq!(classify_dissolution(&step(0.5, 0.5), 0.9), DissolutionReason::Stress);
        assert_eq!(classify_dissolution(&step(0.5, 0.5), 0.6), DissolutionReason::Incompatibility);
    }

    #[test]
    fn test_formation_gate() {
        let people = population(5, 2);
        let params = RunParams::default().with_threshold(1.5);
        let mut rng = LcgRng::new(42);

        let result = simulate_pair(7, &people[0], &people[1], &params, &mut rng);

        assert!(!result.formed);
        assert_eq!(result.outcome, Outcome::NeverFormed);
        assert!(result.trajectory.is_empty());
        assert_eq!(result.duration, 0);
        assert_eq!(result.final_bond_strength, 0.0);
        assert_eq!(result.avg_satisfaction1, 0.0);
        assert_eq!(result.avg_satisfaction2, 0.0);
        assert_eq!(result.pair_id, 7);
        // No draws for a pair that never forms
        assert_eq!(rng.state(), 42);
    }

    #[test]
    fn test_stable_run_reaches_horizon() {
        let mut rng = LcgRng::new(42);
        let people = generate_population(10, &mut rng);
        let pairs = select_pairs(&people, PairingStrategy::Random, 5, &mut rng).unwrap();
        let params = RunParams::default().with_max_duration(12);

        let (a, b) = pairs[0];
        let result = simulate_pair(0, a, b, &params, &mut rng);

        assert!(result.formed);
        assert_eq!(result.outcome, Outcome::Stable);
        assert_eq!(result.duration, 12);
        assert_eq!(result.final_bond_strength, 1.0);
        assert!(result.dissolution_reason.is_none());
        for (i, step) in result.trajectory.iter().enumerate() {
            assert_eq!(step.t as usize, i);
            assert!(!step.dissolved);
        }
    }

    #[test]
    fn test_collapsed_bond_dissolves_as_low_bond() {
        let people = population(6, 2);
        let mut params = RunParams::default().with_max_duration(500).with_threshold(0.0);
        params.alpha = 0.0;
        params.beta = 1.0;
        let mut rng = LcgRng::new(1);

        let result = simulate_pair(0, &people[0], &people[1], &params, &mut rng);

        assert_eq!(result.outcome, Outcome::Dissolved);
        assert_eq!(result.dissolution_reason, Some(DissolutionReason::LowBond));
        let last = result.trajectory.last().unwrap();
        assert!(last.dissolved);
        assert_eq!(last.bond, 0.0);
        assert_eq!(result.final_bond_strength, last.bond);
        assert_eq!(result.duration, result.trajectory.len());
    }

    #[test]
    fn test_huge_horizon_does_not_reserve_it() {
        let people = population(6, 2);
        let mut params = RunParams::default()
            .with_max_duration(usize::MAX / 2)
            .with_threshold(0.0);
        params.alpha = 0.0;
        params.beta = 1.0;
        let mut rng = LcgRng::new(1);

        let result = simulate_pair(0, &people[0], &people[1], &params, &mut rng);

        assert_eq!(result.outcome, Outcome::Dissolved);
        assert_eq!(result.dissolution_reason, Some(DissolutionReason::LowBond));
        assert!(result.trajectory.capacity() <= TRAJECTORY_RESERVE);
    }

    #[test]
    fn test_dissolved_step_is_last() {
        let people = population(7, 40);
        let params = RunParams::default().with_stress(0.9).with_max_duration(200);
        let mut rng = LcgRng::new(17);

        for (i, pair) in people.windows(2).enumerate() {
            let result = simulate_pair(i, &pair[0], &pair[1], &params, &mut rng);
            assert!(result.trajectory.len() <= params.max_duration);

            if let Some(pos) = result.trajectory.iter().position(|s| s.dissolved) {
                assert_eq!(pos, result.trajectory.len() - 1);
                assert_eq!(result.outcome, Outcome::Dissolved);
                assert!(result.dissolution_reason.is_some());
            }
        }
    }

    #[test]
    fn test_average_satisfaction_is_trajectory_mean() {
        let people = population(8, 2);
        let params = RunParams::default().with_threshold(0.0).with_max_duration(30);
        let mut rng = LcgRng::new(3);

        let result = simulate_pair(0, &people[0], &people[1], &params, &mut rng);
        let n = result.trajectory.len() as f64;
        let mean1 = result.trajectory.iter().map(|s| s.s1).sum::<f64>() / n;
        let mean2 = result.trajectory.iter().map(|s| s.s2).sum::<f64>() / n;

        assert_relative_eq!(result.avg_satisfaction1, mean1);
        assert_relative_eq!(result.avg_satisfaction2, mean2);
    }

    #[test]
    fn test_zero_horizon_is_stable_and_empty() {
        let people = population(9, 2);
        let params = RunParams::default().with_threshold(0.0).with_max_duration(0);
        let mut rng = LcgRng::new(42);

        let result = simulate_pair(0, &people[0], &people[1], &params, &mut rng);

        assert!(result.formed);
        assert_eq!(result.outcome, Outcome::Stable);
        assert_eq!(result.duration, 0);
        assert_eq!(result.final_bond_strength, 0.0);
        assert_eq!(rng.state(), 42);
    }
}
