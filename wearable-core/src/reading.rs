//! Heart-rate readings and the anomaly predicate.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lowest reading a sensor can produce (inclusive).
pub const HEART_RATE_MIN: u32 = 30;
/// Upper bound of sensor readings (exclusive).
pub const HEART_RATE_MAX: u32 = 160;
/// Readings below this are anomalous.
pub const ANOMALY_LOW: u32 = 40;
/// Readings above this are anomalous.
pub const ANOMALY_HIGH: u32 = 140;

/// Whether a reading falls outside the safe range `[40, 140]`.
#[must_use]
pub const fn is_anomalous(bpm: u32) -> bool {
    bpm < ANOMALY_LOW || bpm > ANOMALY_HIGH
}

/// Produces heart-rate readings for a single session.
///
/// Every session owns its source, so two concurrent streams never share
/// generator state.
pub trait ReadingSource: Send {
    /// Next reading in beats per minute, within `[HEART_RATE_MIN, HEART_RATE_MAX)`.
    fn next_reading(&mut self) -> u32;
}

/// Uniform readings over `[30, 160)` drawn from a pseudo-random generator.
#[derive(Debug, Clone)]
pub struct RngReadingSource<R = StdRng> {
    rng: R,
}

impl<R: Rng + Send> RngReadingSource<R> {
    /// Wrap an existing generator.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngReadingSource<StdRng> {
    /// Deterministic source for reproducible sessions.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Source seeded from operating system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng + Send> ReadingSource for RngReadingSource<R> {
    fn next_reading(&mut self) -> u32 {
        self.rng.gen_range(HEART_RATE_MIN..HEART_RATE_MAX)
    }
}

impl<T: ReadingSource + ?Sized> ReadingSource for Box<T> {
    fn next_reading(&mut self) -> u32 {
        (**self).next_reading()
    }
}
