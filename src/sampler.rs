//! Row offset and think-time sampling.

use emulator_types::SampleKey;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Default upper bound (exclusive) for sampled row offsets.
pub const DEFAULT_TABLE_SIZE: u64 = 11_000;

/// Default upper bound (exclusive) for the think-time delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(2);

/// One sampled offset and the delay to wait before fetching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub key: SampleKey,
    pub delay: Duration,
}

/// Picks offsets uniformly in `[0, table_size)` and delays uniformly in
/// `[0, max_delay)`, with replacement. Nothing but the generator state is
/// carried between samples.
#[derive(Debug)]
pub struct Sampler {
    table_size: u64,
    max_delay: Duration,
    rng: StdRng,
}

impl Sampler {
    pub fn new(table_size: u64, max_delay: Duration) -> Self {
        Self {
            table_size,
            max_delay,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Same seed, same sequence of samples.
    pub fn seeded(table_size: u64, max_delay: Duration, seed: u64) -> Self {
        Self {
            table_size,
            max_delay,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn table_size(&self) -> u64 {
        self.table_size
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn sample(&mut self) -> Sample {
        Sample {
            key: self.sample_key(),
            delay: self.sample_delay(),
        }
    }

    /// A zero table size always yields offset 0.
    pub fn sample_key(&mut self) -> SampleKey {
        if self.table_size == 0 {
            return SampleKey(0);
        }
        SampleKey(self.rng.random_range(0..self.table_size))
    }

    pub fn sample_delay(&mut self) -> Duration {
        if self.max_delay.is_zero() {
            return Duration::ZERO;
        }
        let bound = u64::try_from(self.max_delay.as_nanos()).unwrap_or(u64::MAX);
        Duration::from_nanos(self.rng.random_range(0..bound))
    }

    /// Suspend the caller for `delay`.
    pub async fn pace(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
