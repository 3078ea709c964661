use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SamplerError;

/// Outcomes paired with integer weights. Always holds at least one outcome
/// with a positive weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedDistribution<T> {
    entries: Vec<(T, u32)>,
    total: u64,
}

impl<T> WeightedDistribution<T> {
    pub fn new(entries: Vec<(T, u32)>) -> Result<Self, SamplerError> {
        if entries.is_empty() {
            return Err(SamplerError::InvalidDistribution {
                reason: "no outcomes".to_string(),
            });
        }
        let total: u64 = entries.iter().map(|(_, w)| u64::from(*w)).sum();
        if total == 0 {
            return Err(SamplerError::InvalidDistribution {
                reason: "all weights are zero".to_string(),
            });
        }
        Ok(Self { entries, total })
    }

    pub fn from_parts(outcomes: &[T], weights: &[u32]) -> Result<Self, SamplerError>
    where
        T: Clone,
    {
        if outcomes.len() != weights.len() {
            return Err(SamplerError::InvalidDistribution {
                reason: format!(
                    "{} outcomes but {} weights",
                    outcomes.len(),
                    weights.len()
                ),
            });
        }
        Self::new(outcomes.iter().cloned().zip(weights.iter().copied()).collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> u64 {
        self.total
    }

    pub fn entries(&self) -> &[(T, u32)] {
        &self.entries
    }

    /// Walks the cumulative weights in order and returns the first outcome
    /// whose running sum exceeds `roll`. Rolls past the total land on the
    /// last outcome.
    pub fn pick(&self, roll: u64) -> &T {
        let mut acc = 0u64;
        for (outcome, weight) in &self.entries {
            acc += u64::from(*weight);
            if roll < acc {
                return outcome;
            }
        }
        &self.entries[self.entries.len() - 1].0
    }
}

/// Categorical sampler over an injected random source.
///
/// Each call to [`WeightedSampler::sample`] consumes exactly one draw, so a
/// seeded source replays the same sequence of outcomes.
#[derive(Debug, Clone)]
pub struct WeightedSampler<R = StdRng> {
    rng: R,
    draws: u64,
}

impl WeightedSampler<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> WeightedSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    pub fn sample<'a, T>(&mut self, distribution: &'a WeightedDistribution<T>) -> &'a T {
        let roll = self.rng.gen_range(0..distribution.total_weight());
        self.draws += 1;
        distribution.pick(roll)
    }

    /// Build the distribution and sample it in one step.
    pub fn sample_weighted<T: Clone>(
        &mut self,
        outcomes: &[T],
        weights: &[u32],
    ) -> Result<T, SamplerError> {
        let distribution = WeightedDistribution::from_parts(outcomes, weights)?;
        Ok(self.sample(&distribution).clone())
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }
}
