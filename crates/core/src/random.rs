//! Injectable randomness for probabilistic self-tests

/// Source of uniform samples in `[0, 1)`
pub trait RandomSource: Send + Sync {
    /// Next sample
    fn next_f64(&self) -> f64;
}

/// Thread-local generator from `rand`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::random::<f64>()
    }
}

/// Always returns the same sample; lets tests pick a branch
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        self.0
    }
}
