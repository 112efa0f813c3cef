//! Month-by-month playback over the formed relationships of a run.

use bondsim_core::PairResult;
use serde::{Deserialize, Serialize};

/// Playback speed in months per second.
pub const DEFAULT_SPEED: f64 = 12.0;

/// Aggregate state of all relationships alive at one month.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSnapshot {
    pub month: usize,
    /// Formed relationships whose trajectory reaches this month
    pub active_count: usize,
    /// Of those, how many dissolved in this month
    pub dissolution_count: usize,
    pub avg_bond: f64,
    pub avg_satisfaction: f64,
}

/// Cursor over the months of a finished run.
#[derive(Debug, Clone)]
pub struct Timeline {
    /// Formed results only
    results: Vec<PairResult>,
    max_month: usize,
    cursor: f64,
    playing: bool,
    speed: f64,
}

impl Timeline {
    /// Builds a timeline from a run's results; unformed pairs are skipped.
    pub fn new(results: &[PairResult]) -> Self {
        let results: Vec<PairResult> = results.iter().filter(|r| r.formed).cloned().collect();
        let max_month = results
            .iter()
            .map(|r| r.trajectory.len().saturating_sub(1))
            .max()
            .unwrap_or(0);

        Self {
            results,
            max_month,
            cursor: 0.0,
            playing: false,
            speed: DEFAULT_SPEED,
        }
    }

    /// Sets the playback speed in months per second.
    pub fn with_speed(mut self, months_per_sec: f64) -> Self {
        self.speed = months_per_sec;
        self
    }

    pub fn max_month(&self) -> usize {
        self.max_month
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    /// The whole month under the cursor.
    pub fn display_month(&self) -> usize {
        self.cursor.floor() as usize
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Moves the cursor, clamped to `[0, max_month]`.
    pub fn seek(&mut self, month: f64) {
        self.cursor = if month.is_finite() {
            month.clamp(0.0, self.max_month as f64)
        } else {
            0.0
        };
    }

    pub fn step_forward(&mut self) {
        let next = (self.display_month() + 1).min(self.max_month);
        self.cursor = next as f64;
    }

    pub fn step_back(&mut self) {
        let prev = self.display_month().saturating_sub(1);
        self.cursor = prev as f64;
    }

    /// Stops playback and rewinds.
    pub fn reset(&mut self) {
        self.playing = false;
        self.cursor = 0.0;
    }

    /// Starts playback, rewinding first if already at the end.
    pub fn play(&mut self) {
        if self.playing {
            return;
        }
        if self.cursor >= self.max_month as f64 {
            self.cursor = 0.0;
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Advances playback by `dt_secs` of wall time.
    pub fn advance(&mut self, dt_secs: f64) {
        if !self.playing {
            return;
        }
        self.cursor += dt_secs * self.speed;
        let end = self.max_month as f64;
        if self.cursor >= end {
            self.cursor = end;
            self.playing = false;
        }
    }

    /// Snapshot at the month under the cursor.
    pub fn current(&self) -> MonthSnapshot {
        self.snapshot(self.display_month())
    }

    /// Aggregates every relationship whose trajectory reaches `month`.
    pub fn snapshot(&self, month: usize) -> MonthSnapshot {
        let steps: Vec<_> = self.results.iter().filter_map(|r| r.step_at(month)).collect();
        if steps.is_empty() {
            return MonthSnapshot {
                month,
                ..MonthSnapshot::default()
            };
        }

        let n = steps.len() as f64;
        MonthSnapshot {
            month,
            active_count: steps.len(),
            dissolution_count: steps.iter().filter(|s| s.dissolved).count(),
            avg_bond: steps.iter().map(|s| s.bond).sum::<f64>() / n,
            avg_satisfaction: steps.iter().map(|s| s.avg_satisfaction()).sum::<f64>() / n,
        }
    }

    /// Snapshots at months `0, every, 2*every, ...` up to and including `max_month`.
    pub fn snapshots(&self, every: usize) -> Vec<MonthSnapshot> {
        let every = every.max(1);
        let mut months: Vec<usize> = (0..=self.max_month).step_by(every).collect();
        if months.last() != Some(&self.max_month) {
            months.push(self.max_month);
        }
        months.into_iter().map(|m| self.snapshot(m)).collect()
    }
}
