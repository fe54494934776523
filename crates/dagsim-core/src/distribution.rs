//! Distribution families and the seedable sampling unit attached to nodes.

use std::fmt;

use rand::distr::Bernoulli;
use rand::distr::Distribution as _;
use rand::distr::weighted::WeightedIndex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Poisson, StandardNormal};

use crate::error::DistributionError;
use crate::link::Link;

/// Default standard deviation for the Normal family.
pub const DEFAULT_SCALE: f64 = 1.0;

const PROBABILITY_TOLERANCE: f64 = 1e-8;

/// Closed set of supported distribution families with their parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Family {
    /// Gaussian with mean taken from the linear predictor.
    Normal { scale: f64 },
    /// Single binomial trial with success probability `expit(lp)`.
    Bernoulli,
    /// Count with rate `exp(lp)`.
    Poisson,
    /// Categorical draw over a fixed value set; ignores the linear predictor.
    Discrete {
        values: Vec<f64>,
        probabilities: Vec<f64>,
    },
}

impl Family {
    pub fn name(&self) -> &'static str {
        match self {
            Family::Normal { .. } => "Normal",
            Family::Bernoulli => "Binomial",
            Family::Poisson => "Poisson",
            Family::Discrete { .. } => "Discrete",
        }
    }

    pub fn link(&self) -> Link {
        match self {
            Family::Normal { .. } => Link::Identity,
            Family::Bernoulli => Link::Logit,
            Family::Poisson => Link::Log,
            Family::Discrete { .. } => Link::None,
        }
    }

    /// Map a linear predictor value to this family's natural parameter.
    pub fn invlink(&self, x: f64) -> f64 {
        self.link().inverse(x)
    }

    /// Draw one sample per natural parameter entry from `rng`.
    ///
    /// Parameters are checked here, at sampling time, so a misconfigured
    /// family only fails once its node is actually simulated.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        natural: &[f64],
        rng: &mut R,
    ) -> Result<Vec<f64>, DistributionError> {
        match self {
            Family::Normal { scale } => {
                let scale = *scale;
                if !scale.is_finite() || scale < 0.0 {
                    return Err(DistributionError::InvalidScale(scale));
                }
                Ok(natural
                    .iter()
                    .map(|mean| {
                        let z: f64 = StandardNormal.sample(rng);
                        mean + scale * z
                    })
                    .collect())
            }
            Family::Bernoulli => natural
                .iter()
                .map(|p| -> Result<f64, DistributionError> {
                    let trial = Bernoulli::new(*p).map_err(|err| {
                        DistributionError::InvalidProbability {
                            value: *p,
                            reason: err.to_string(),
                        }
                    })?;
                    Ok(if trial.sample(rng) { 1.0 } else { 0.0 })
                })
                .collect(),
            Family::Poisson => natural
                .iter()
                .map(|rate| -> Result<f64, DistributionError> {
                    // exp() underflows to exactly zero for very negative
                    // predictors; a zero rate always yields a zero count.
                    if *rate == 0.0 {
                        return Ok(0.0);
                    }
                    let poisson =
                        Poisson::<f64>::new(*rate).map_err(|err| DistributionError::InvalidRate {
                            value: *rate,
                            reason: err.to_string(),
                        })?;
                    Ok(poisson.sample(rng))
                })
                .collect(),
            Family::Discrete {
                values,
                probabilities,
            } => {
                if values.len() != probabilities.len() {
                    return Err(DistributionError::ShapeMismatch {
                        values: values.len(),
                        probabilities: probabilities.len(),
                    });
                }
                let total: f64 = probabilities.iter().sum();
                if !values.is_empty() && (total - 1.0).abs() > PROBABILITY_TOLERANCE {
                    return Err(DistributionError::ProbabilitiesNotNormalized(total));
                }
                let index = WeightedIndex::new(probabilities)
                    .map_err(|err| DistributionError::InvalidWeights(err.to_string()))?;
                Ok(natural
                    .iter()
                    .map(|_| values[index.sample(rng)])
                    .collect())
            }
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} distribution ", self.name())?;
        match self {
            Family::Normal { scale } => write!(f, "{{scale: {scale}}}"),
            Family::Bernoulli | Family::Poisson => write!(f, "{{}}"),
            Family::Discrete {
                values,
                probabilities,
            } => write!(
                f,
                "{{values: {}, p: {}}}",
                format_list(values),
                format_list(probabilities)
            ),
        }
    }
}

fn format_list(items: &[f64]) -> String {
    let inner: Vec<String> = items.iter().map(|item| item.to_string()).collect();
    format!("[{}]", inner.join(", "))
}

/// A distribution family bound to its own random stream.
#[derive(Debug, Clone)]
pub struct Distribution {
    family: Family,
    seed: Option<u64>,
    rng: ChaCha8Rng,
}

impl Distribution {
    /// Create a distribution; without a seed the stream comes from OS entropy.
    pub fn new(family: Family, seed: Option<u64>) -> Self {
        Self {
            family,
            seed,
            rng: stream(seed),
        }
    }

    pub fn normal(scale: f64) -> Self {
        Self::new(Family::Normal { scale }, None)
    }

    pub fn bernoulli() -> Self {
        Self::new(Family::Bernoulli, None)
    }

    pub fn poisson() -> Self {
        Self::new(Family::Poisson, None)
    }

    pub fn discrete(values: Vec<f64>, probabilities: Vec<f64>) -> Self {
        Self::new(
            Family::Discrete {
                values,
                probabilities,
            },
            None,
        )
    }

    /// Replace the stream with one seeded from `seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.reseed(Some(seed));
        self
    }

    /// Restart the owned stream; `None` draws fresh OS entropy.
    pub fn reseed(&mut self, seed: Option<u64>) {
        self.seed = seed;
        self.rng = stream(seed);
    }

    pub fn family(&self) -> &Family {
        &self.family
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn invlink(&self, x: f64) -> f64 {
        self.family.invlink(x)
    }

    /// Simulate one value per linear predictor entry using the owned stream.
    pub fn simulate(&mut self, linear_predictor: &[f64]) -> Result<Vec<f64>, DistributionError> {
        let natural = self.family.link().inverse_all(linear_predictor);
        self.family.draw(&natural, &mut self.rng)
    }

    /// Same as [`Distribution::simulate`] but consuming an explicit stream.
    pub fn simulate_with<R: Rng + ?Sized>(
        &self,
        linear_predictor: &[f64],
        rng: &mut R,
    ) -> Result<Vec<f64>, DistributionError> {
        let natural = self.family.link().inverse_all(linear_predictor);
        self.family.draw(&natural, rng)
    }
}

impl Default for Distribution {
    fn default() -> Self {
        Self::normal(DEFAULT_SCALE)
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.family, f)
    }
}

fn stream(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    }
}
