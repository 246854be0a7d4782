use std::sync::Mutex;

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Source of synthetic plausibility scores for recommendations that arrive
/// without one. Injected through `AppState` so tests can pin exact values.
pub trait ScoreSource: Send + Sync {
    /// Draws a score from the half-open interval `[lo, hi)`.
    fn sample(&self, lo: f64, hi: f64) -> f64;
}

/// Production score source backed by a seedable RNG.
pub struct RngScores {
    rng: Mutex<StdRng>,
}

impl RngScores {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic variant for reproducing a run.
    #[allow(dead_code)]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl ScoreSource for RngScores {
    fn sample(&self, lo: f64, hi: f64) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(lo..hi)
    }
}

/// Deterministic score source returning a fixed value. Used in tests to
/// assert exact aggregate scores.
#[allow(dead_code)]
pub struct FixedScores(pub f64);

impl ScoreSource for FixedScores {
    fn sample(&self, _lo: f64, _hi: f64) -> f64 {
        self.0
    }
}
