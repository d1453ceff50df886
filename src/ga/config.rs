//! GA configuration.
//!
//! [`GeneticConfig`] holds the operators and every parameter that controls
//! the evolutionary loop. Builder methods store values as given; nothing is
//! clamped. [`GeneticAlgorithm::new`](super::GeneticAlgorithm::new) calls
//! [`validate`](GeneticConfig::validate) and refuses invalid settings.

use super::crossover::{Crossover, OnePointCrossover};
use super::error::ConfigError;
use super::mutation::{GaussianMutator, Mutator};
use super::selection::{RandomSelector, Selector};
use std::num::NonZeroUsize;

/// Configuration for the genetic algorithm.
///
/// # Defaults
///
/// ```
/// use u_evolve::ga::GeneticConfig;
///
/// let config = GeneticConfig::default();
/// assert_eq!(config.crossover_rate, 0.8);
/// assert!(config.elitism);
/// assert_eq!(config.elitism_size, 1);
/// assert_eq!(config.max_generation, None);
/// assert_eq!(config.target_fitness, f64::INFINITY);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_evolve::ga::{BitFlipMutator, GeneticConfig, TournamentSelector};
///
/// let config = GeneticConfig::default()
///     .with_selector(TournamentSelector::new(3).unwrap())
///     .with_mutator(BitFlipMutator::new())
///     .with_mutation_rate(0.1)
///     .with_max_generation(200)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug)]
pub struct GeneticConfig {
    /// Parent selection strategy.
    pub selector: Box<dyn Selector>,

    pub crossover: Box<dyn Crossover>,

    /// Mutation operator. Its rate is overwritten by
    /// [`mutation_rate`](Self::mutation_rate) when the engine is built.
    pub mutator: Box<dyn Mutator>,

    /// Probability of recombining a selected couple, in `(0, 1]`.
    ///
    /// When crossover is not applied the parents are copied unchanged.
    pub crossover_rate: f64,

    /// Mutation probability handed to the mutator, in `(0, 1]`.
    pub mutation_rate: f64,

    /// Whether the best individuals are carried into the next generation.
    pub elitism: bool,

    /// Number of elites when [`elitism`](Self::elitism) is on. Must not
    /// exceed the population size.
    pub elitism_size: usize,

    /// Stop once this many generations have completed. `None` is unbounded.
    pub max_generation: Option<usize>,

    /// Stop once the best fitness reaches this value.
    pub target_fitness: f64,

    /// Fill the non-elite slots with copies of the best individuals instead
    /// of selection and crossover. The worst `elitism_size` drop out.
    pub skip_crossover: bool,

    pub skip_mutation: bool,

    /// Threads used for fitness evaluation.
    pub worker_count: usize,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,

    /// Optional wall-clock time limit in milliseconds.
    ///
    /// Checked before each generation, so a run may overshoot by one
    /// generation's worth of work.
    pub time_limit_ms: Option<u64>,

    /// Stop after this many consecutive generations without a best-fitness
    /// improvement.
    pub stagnation_limit: Option<usize>,

    /// Consecutive failed reproduction attempts tolerated before `evolve`
    /// gives up with the last error.
    pub max_consecutive_failures: usize,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            selector: Box::new(RandomSelector::new()),
            crossover: Box::new(OnePointCrossover::new()),
            mutator: Box::new(GaussianMutator::new()),
            crossover_rate: 0.8,
            mutation_rate: 0.05,
            elitism: true,
            elitism_size: 1,
            max_generation: None,
            target_fitness: f64::INFINITY,
            skip_crossover: false,
            skip_mutation: false,
            worker_count: default_worker_count(),
            seed: None,
            time_limit_ms: None,
            stagnation_limit: None,
            max_consecutive_failures: 100,
        }
    }
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

impl GeneticConfig {
    pub fn with_selector(mut self, selector: impl Selector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    pub fn with_crossover(mut self, crossover: impl Crossover + 'static) -> Self {
        self.crossover = Box::new(crossover);
        self
    }

    pub fn with_mutator(mut self, mutator: impl Mutator + 'static) -> Self {
        self.mutator = Box::new(mutator);
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Enables or disables elitism.
    pub fn with_elitism(mut self, elitism: bool) -> Self {
        self.elitism = elitism;
        self
    }

    pub fn with_elitism_size(mut self, size: usize) -> Self {
        self.elitism_size = size;
        self
    }

    pub fn with_max_generation(mut self, n: usize) -> Self {
        self.max_generation = Some(n);
        self
    }

    pub fn with_target_fitness(mut self, target: f64) -> Self {
        self.target_fitness = target;
        self
    }

    pub fn with_skip_crossover(mut self, skip: bool) -> Self {
        self.skip_crossover = skip;
        self
    }

    pub fn with_skip_mutation(mut self, skip: bool) -> Self {
        self.skip_mutation = skip;
        self
    }

    pub fn with_worker_count(mut self, n: usize) -> Self {
        self.worker_count = n;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn with_stagnation_limit(mut self, generations: usize) -> Self {
        self.stagnation_limit = Some(generations);
        self
    }

    pub fn with_max_consecutive_failures(mut self, n: usize) -> Self {
        self.max_consecutive_failures = n;
        self
    }

    /// Number of individuals copied verbatim into each new generation.
    pub fn elite_count(&self) -> usize {
        if self.elitism {
            self.elitism_size
        } else {
            0
        }
    }

    /// Validates every parameter that does not depend on the population.
    ///
    /// The elitism size is checked against the population when evolution
    /// starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.crossover_rate > 0.0 && self.crossover_rate <= 1.0) {
            return Err(ConfigError::InvalidCrossoverRate(self.crossover_rate));
        }
        if !(self.mutation_rate > 0.0 && self.mutation_rate <= 1.0) {
            return Err(ConfigError::InvalidMutationRate(self.mutation_rate));
        }
        if self.max_generation == Some(0) {
            return Err(ConfigError::InvalidMaxGeneration);
        }
        if self.target_fitness.is_nan() {
            return Err(ConfigError::InvalidTargetFitness);
        }
        if self.worker_count == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        if self.time_limit_ms == Some(0) {
            return Err(ConfigError::InvalidTimeLimit);
        }
        if self.stagnation_limit == Some(0) {
            return Err(ConfigError::InvalidStagnationLimit);
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::InvalidFailureLimit);
        }
        Ok(())
    }
}
