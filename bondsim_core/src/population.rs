//! Population Generator
//! ====================
//!
//! Produces a fixed-size set of individuals with sampled trait vectors.
//!
//! The draw order below is the reproducibility contract: neuroticism first,
//! then the anxiety that depends on it, then the remaining traits in
//! declaration order, age, and finally the two preference weights.

use crate::rng::LcgRng;
use crate::types::{
    AttachmentStyle, Individual, PersonalityTraits, RelationshipSkills, Values,
    PREF_AGREEABLENESS, PREF_EMOTIONAL_REGULATION,
};
use std::collections::BTreeMap;

/// Generates one individual, consuming draws from `rng` in the fixed order.
pub fn generate_individual(id: u32, rng: &mut LcgRng) -> Individual {
    let neuroticism = rng.gaussian(0.5, 0.2);
    // Anxiety is correlated with neuroticism
    let anxiety = rng.gaussian(0.3 + neuroticism * 0.3, 0.15);

    let personality = PersonalityTraits {
        openness: rng.gaussian(0.5, 0.2),
        conscientiousness: rng.gaussian(0.5, 0.2),
        extraversion: rng.gaussian(0.5, 0.2),
        agreeableness: rng.gaussian(0.5, 0.2),
        neuroticism,
    };

    let attachment = AttachmentStyle {
        anxiety: anxiety.clamp(0.0, 1.0),
        avoidance: rng.gaussian(0.3, 0.2),
    };

    let values = Values {
        family_orientation: rng.gaussian(0.5, 0.25),
        career_ambition: rng.gaussian(0.5, 0.25),
        novelty_seeking: rng.gaussian(0.5, 0.2),
        security_seeking: rng.gaussian(0.5, 0.2),
        social_orientation: rng.gaussian(0.5, 0.2),
    };

    let skills = RelationshipSkills {
        emotional_regulation: rng.gaussian(0.5, 0.2),
        communication_quality: rng.gaussian(0.5, 0.2),
        conflict_resolution: rng.gaussian(0.5, 0.2),
        empathy: rng.gaussian(0.5, 0.2),
    };

    let age = (rng.next_f64() * 30.0).floor() as u32 + 20;

    let mut preference_weights = BTreeMap::new();
    preference_weights.insert(PREF_AGREEABLENESS.to_string(), 0.3 + rng.next_f64() * 0.4);
    preference_weights.insert(
        PREF_EMOTIONAL_REGULATION.to_string(),
        0.2 + rng.next_f64() * 0.3,
    );

    Individual {
        id,
        personality,
        attachment,
        values,
        skills,
        age,
        preference_weights,
    }
}

/// Generates `size` individuals with ids `0..size`.
pub fn generate_population(size: usize, rng: &mut LcgRng) -> Vec<Individual> {
    (0..size)
        .map(|id| generate_individual(id as u32, rng))
        .collect()
}
