//! Deterministic Random Source
//! ===========================
//!
//! A 32-bit linear congruential generator plus a clamped Box–Muller sampler.
//!
//! RULE: every draw in a run goes through one `LcgRng`, in a fixed order
//! (population, then pairing, then simulation). Call order is part of the
//! reproducibility contract, so never draw from it speculatively.

use rand::{RngCore, SeedableRng};
use std::f64::consts::PI;

/// Seed used when a run does not supply one.
pub const DEFAULT_SEED: u32 = 42;

const MULTIPLIER: u32 = 1_664_525;
const INCREMENT: u32 = 1_013_904_223;

/// 2^32, the modulus of the generator.
const MODULUS: f64 = 4_294_967_296.0;

/// Smallest `u1` fed to the logarithm in Box–Muller.
const MIN_UNIFORM: f64 = 1e-10;

/// Seeded LCG: `state = state * 1664525 + 1013904223 (mod 2^32)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LcgRng {
    state: u32,
}

impl LcgRng {
    /// Creates a generator at the given seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Replaces the current state with `seed`.
    pub fn reseed(&mut self, seed: u32) {
        self.state = seed;
    }

    /// Returns the current internal state.
    pub fn state(&self) -> u32 {
        self.state
    }

    fn step(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        self.state
    }

    /// Uniform draw in [0, 1): the new state divided by 2^32.
    pub fn next_f64(&mut self) -> f64 {
        self.step() as f64 / MODULUS
    }

    /// Normal draw via Box–Muller, clamped to [0, 1].
    ///
    /// Consumes exactly two uniform draws.
    pub fn gaussian(&mut self, mean: f64, std: f64) -> f64 {
        let u1 = self.next_f64().max(MIN_UNIFORM);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        (mean + std * z).clamp(0.0, 1.0)
    }

    /// Uniform index in `[0, n)`: `floor(next_f64() * n)`.
    pub fn index(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64).floor() as usize
    }
}

impl Default for LcgRng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RngCore for LcgRng {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.step() as u64;
        let hi = self.step() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for LcgRng {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }

    /// Truncates to the low 32 bits so `seed_from_u64(42)` matches `new(42)`.
    fn seed_from_u64(state: u64) -> Self {
        Self::new(state as u32)
    }
}
