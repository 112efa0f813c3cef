//! Aggregator: reduces every pair result of a run into a [`RunSummary`].

use crate::types::{Outcome, PairResult, RunSummary, DURATION_BUCKETS};

fn mean_by<F>(results: &[&PairResult], f: F) -> f64
where
    F: Fn(&PairResult) -> f64,
{
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| f(r)).sum::<f64>() / results.len() as f64
}

/// Histogram of formed durations in [`DURATION_BUCKETS`] buckets.
///
/// Buckets are relative to the longest observed duration (at least 1):
/// `bucket = min(9, floor(duration / max_observed * 10))`.
pub fn duration_histogram(formed: &[&PairResult]) -> [usize; DURATION_BUCKETS] {
    let mut buckets = [0usize; DURATION_BUCKETS];
    let max_observed = formed.iter().map(|r| r.duration).max().unwrap_or(0).max(1);

    for result in formed {
        let scaled = (result.duration as f64 / max_observed as f64 * DURATION_BUCKETS as f64).floor();
        let bucket = (scaled as usize).min(DURATION_BUCKETS - 1);
        buckets[bucket] += 1;
    }

    buckets
}

/// Aggregates the complete, ordered result list of one run.
///
/// Averages are taken over formed pairs only and are 0 when none formed.
/// The compatibility matrix is reserved and always empty.
pub fn summarize(results: &[PairResult]) -> RunSummary {
    let formed: Vec<&PairResult> = results.iter().filter(|r| r.formed).collect();
    let stable = formed
        .iter()
        .filter(|r| r.outcome == Outcome::Stable)
        .count();

    RunSummary {
        total_pairs: results.len(),
        formed_relationships: formed.len(),
        stable_relationships: stable,
        avg_duration: mean_by(&formed, |r| r.duration as f64),
        avg_final_bond: mean_by(&formed, |r| r.final_bond_strength),
        avg_satisfaction: mean_by(&formed, |r| r.mean_satisfaction()),
        duration_distribution: duration_histogram(&formed),
        compatibility_matrix: Vec::new(),
    }
}
