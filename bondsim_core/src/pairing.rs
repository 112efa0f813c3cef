//! Pair Selector
//! =============
//!
//! Turns a population and a strategy into the ordered pair sequence a run
//! simulates. The position of a pair in the sequence becomes its pair id.

use crate::error::EngineError;
use crate::params::PairingStrategy;
use crate::rng::LcgRng;
use crate::types::Individual;

/// Candidates sampled per pair by the similarity strategy.
pub const SIMILARITY_TRIALS: usize = 5;

/// Similarity of two individuals in (-inf, 1]; 1 means identical on the
/// compared dimensions.
///
/// ```text
/// score = 1 - (mean|Δpersonality| * 0.6 + mean|Δvalues| * 0.4)
/// ```
///
/// Personality covers all five dimensions; values cover family orientation
/// and career ambition only.
pub fn similarity_score(a: &Individual, b: &Individual) -> f64 {
    let (pa, pb) = (&a.personality, &b.personality);
    let personality_diff = ((pa.openness - pb.openness).abs()
        + (pa.conscientiousness - pb.conscientiousness).abs()
        + (pa.extraversion - pb.extraversion).abs()
        + (pa.agreeableness - pb.agreeableness).abs()
        + (pa.neuroticism - pb.neuroticism).abs())
        / 5.0;

    let values_diff = ((a.values.family_orientation - b.values.family_orientation).abs()
        + (a.values.career_ambition - b.values.career_ambition).abs())
        / 2.0;

    1.0 - (personality_diff * 0.6 + values_diff * 0.4)
}

fn lookup(population: &[Individual], index: usize) -> Result<&Individual, EngineError> {
    population.get(index).ok_or(EngineError::IndexOutOfRange {
        index,
        len: population.len(),
    })
}

/// Picks the most similar of [`SIMILARITY_TRIALS`] sampled candidates.
///
/// Self-draws are skipped without a replacement draw. Falls back to the
/// next index (wrapping) when no usable candidate was drawn.
fn most_similar(
    population: &[Individual],
    first: usize,
    rng: &mut LcgRng,
) -> Result<usize, EngineError> {
    let n = population.len();
    let anchor = lookup(population, first)?;

    let mut best_score = -1.0;
    let mut best_idx = (first + 1) % n;

    for _ in 0..SIMILARITY_TRIALS {
        let candidate = rng.index(n);
        if candidate == first {
            continue;
        }

        let score = similarity_score(anchor, lookup(population, candidate)?);
        if score > best_score {
            best_score = score;
            best_idx = candidate;
        }
    }

    Ok(best_idx)
}

/// Redraws until the partner differs from `first`.
fn distinct_partner(n: usize, first: usize, rng: &mut LcgRng) -> usize {
    let mut second = first;
    while second == first {
        second = rng.index(n);
    }
    second
}

/// Builds `count` pairs from `population` under `strategy`.
///
/// `Preference` has no dedicated branch and pairs exactly like `Random`.
///
/// # Errors
/// - [`EngineError::EmptyPopulation`] when `population` is empty and pairs are requested
/// - [`EngineError::InvalidParams`] when a distinct partner can never be found
pub fn select_pairs<'a>(
    population: &'a [Individual],
    strategy: PairingStrategy,
    count: usize,
    rng: &mut LcgRng,
) -> Result<Vec<(&'a Individual, &'a Individual)>, EngineError> {
    let n = population.len();
    if count == 0 {
        return Ok(Vec::new());
    }
    if n == 0 {
        return Err(EngineError::EmptyPopulation);
    }
    if n == 1 && strategy != PairingStrategy::Similarity {
        return Err(EngineError::invalid_params(format!(
            "{} pairing needs at least two individuals",
            strategy
        )));
    }

    let mut pairs = Vec::with_capacity(count);
    for _ in 0..count {
        let first = rng.index(n);

        let second = match strategy {
            PairingStrategy::Similarity => most_similar(population, first, rng)?,
            PairingStrategy::Random | PairingStrategy::Preference => {
                distinct_partner(n, first, rng)
            }
        };

        pairs.push((lookup(population, first)?, lookup(population, second)?));
    }

    Ok(pairs)
}
