//! GA evolutionary loop execution.
//!
//! [`GeneticAlgorithm`] orchestrates the complete evolutionary process:
//! evaluation → stop check → selection → crossover → mutation →
//! evaluation → sort → repeat.
//!
//! Fitness evaluation runs on a rayon thread pool owned by the engine. The
//! pool is handed to each [`evolve`](GeneticAlgorithm::evolve) call and
//! dropped when the call returns, on success and on error alike.

use super::config::GeneticConfig;
use super::error::{ConfigError, GaError, MutatorError};
use super::types::{Individual, Offspring, Population};
use crate::random::rng_from_optional_seed;
use rand::rngs::StdRng;
use rand::Rng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// A population-level predicate; evolution halts when it returns `true`.
pub type StopCondition = Box<dyn Fn(&Population) -> bool + Send + Sync>;

/// Observer invoked once per completed generation.
pub type GenerationTracker = Box<dyn FnMut(&GenerationResult) + Send>;

/// Why [`GeneticAlgorithm::evolve`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The cancellation flag was raised.
    Cancelled,
    MaxGeneration,
    TargetFitness,
    TimeLimit,
    /// The best fitness did not improve for `stagnation_limit` generations.
    Stagnation,
    /// The custom stop condition at this registration index fired.
    Custom(usize),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Cancelled => f.write_str("cancelled"),
            StopReason::MaxGeneration => f.write_str("max generation reached"),
            StopReason::TargetFitness => f.write_str("target fitness reached"),
            StopReason::TimeLimit => f.write_str("time limit reached"),
            StopReason::Stagnation => f.write_str("stagnation"),
            StopReason::Custom(i) => write!(f, "custom stop condition {i}"),
        }
    }
}

/// Summary of one completed generation, delivered to the tracker.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Generation number after the step (first step is 1).
    pub generation: usize,

    pub best_individual: Individual,

    /// Same as `best_individual.fitness()`.
    pub best_fitness: f64,

    /// Time spent in selection, crossover and mutation.
    pub reproduction_duration: Duration,

    /// Time spent evaluating and sorting.
    pub evaluation_duration: Duration,
}

impl GenerationResult {
    pub fn generation_duration(&self) -> Duration {
        self.reproduction_duration + self.evaluation_duration
    }
}

/// The evolution engine.
///
/// Built once from a validated [`GeneticConfig`]; [`evolve`] may be called
/// repeatedly, each call replacing the retained population.
///
/// [`evolve`]: GeneticAlgorithm::evolve
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use u_evolve::ga::{
///     BitFlipMutator, Chromosome, GeneticAlgorithm, GeneticConfig, Individual,
///     Population, StopReason, TournamentSelector,
/// };
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let population: Population = (0..20)
///     .map(|_| Individual::new(Chromosome::random_bits(8, &mut rng)))
///     .collect();
///
/// let config = GeneticConfig::default()
///     .with_selector(TournamentSelector::new(2).unwrap())
///     .with_mutator(BitFlipMutator::new())
///     .with_mutation_rate(0.1)
///     .with_max_generation(200)
///     .with_target_fitness(8.0)
///     .with_seed(1);
/// let mut ga = GeneticAlgorithm::new(config).unwrap();
///
/// let reason = ga
///     .evolve(population, |ind| {
///         let ones = ind.chromosome().iter().filter(|g| g.as_bool() == Some(true)).count();
///         ind.set_fitness(ones as f64);
///     })
///     .unwrap();
///
/// assert!(matches!(reason, StopReason::TargetFitness | StopReason::MaxGeneration));
/// assert_eq!(ga.population().len(), 20);
/// ```
pub struct GeneticAlgorithm {
    config: GeneticConfig,
    pool: Option<ThreadPool>,
    rng: StdRng,
    population: Population,
    stop_conditions: Vec<StopCondition>,
    tracker: Option<GenerationTracker>,
    fitness_history: Vec<f64>,
}

impl GeneticAlgorithm {
    /// Validates `config`, applies its mutation rate to the mutator and
    /// starts the worker pool.
    ///
    /// # Errors
    /// Any [`ConfigError`] reported by [`GeneticConfig::validate`], or
    /// [`ConfigError::WorkerPool`] if the threads cannot be spawned.
    pub fn new(mut config: GeneticConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rate = config.mutation_rate;
        config
            .mutator
            .set_mutation_rate(rate)
            .map_err(|_| ConfigError::InvalidMutationRate(rate))?;

        let pool = build_pool(config.worker_count)?;
        let rng = rng_from_optional_seed(config.seed);

        Ok(Self {
            config,
            pool: Some(pool),
            rng,
            population: Population::new(),
            stop_conditions: Vec::new(),
            tracker: None,
            fitness_history: Vec::new(),
        })
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    /// Registers an extra stop condition, checked before every generation.
    pub fn add_stop_condition<C>(&mut self, condition: C)
    where
        C: Fn(&Population) -> bool + Send + Sync + 'static,
    {
        self.stop_conditions.push(Box::new(condition));
    }

    /// Installs the per-generation observer, replacing any previous one.
    pub fn set_generation_tracker<T>(&mut self, tracker: T)
    where
        T: FnMut(&GenerationResult) + Send + 'static,
    {
        self.tracker = Some(Box::new(tracker));
    }

    /// The retained population, sorted best-first after any `evolve` call.
    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn best_individual(&self) -> Option<&Individual> {
        self.population.best_individual()
    }

    pub fn generation(&self) -> usize {
        self.population.generation()
    }

    /// Best fitness after the initial evaluation and after each generation.
    pub fn fitness_history(&self) -> &[f64] {
        &self.fitness_history
    }

    /// Runs evolution until a stop condition holds.
    ///
    /// `fitness` is called once per individual per generation, possibly from
    /// several threads at once, and must record its result with
    /// [`Individual::set_fitness`].
    ///
    /// # Errors
    /// Configuration errors that depend on the population, domain errors,
    /// selection errors the population size rules out, and operator errors
    /// that persist for `max_consecutive_failures` attempts in a row. On error the retained population is the last
    /// complete generation.
    pub fn evolve<F>(&mut self, population: Population, fitness: F) -> Result<StopReason, GaError>
    where
        F: Fn(&mut Individual) + Sync,
    {
        self.evolve_with_cancel(population, fitness, None)
    }

    /// [`evolve`](Self::evolve) with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, evolution stops
    /// before the next generation and returns [`StopReason::Cancelled`].
    pub fn evolve_with_cancel<F>(
        &mut self,
        population: Population,
        fitness: F,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<StopReason, GaError>
    where
        F: Fn(&mut Individual) + Sync,
    {
        if population.is_empty() {
            return Err(ConfigError::EmptyPopulation.into());
        }
        let elite = self.config.elite_count();
        if elite > population.len() {
            return Err(ConfigError::ElitismExceedsPopulation {
                elitism_size: elite,
                population_size: population.len(),
            }
            .into());
        }

        // Dropped on every return path below.
        let pool = match self.pool.take() {
            Some(pool) => pool,
            None => build_pool(self.config.worker_count)?,
        };

        info!(
            population_size = population.len(),
            elitism = elite,
            workers = pool.current_num_threads(),
            "evolution started"
        );

        let started = Instant::now();
        self.population = population;
        self.fitness_history.clear();

        evaluate(&pool, self.population.individuals_mut(), &fitness);
        self.population.sort();

        let mut best_so_far = self.best_fitness();
        self.fitness_history.push(best_so_far);
        let mut stagnant = 0usize;

        loop {
            if let Some(reason) = self.check_stop(cancel.as_deref(), started, stagnant) {
                info!(
                    generation = self.population.generation(),
                    best_fitness = self.best_fitness(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    reason = %reason,
                    "evolution finished"
                );
                return Ok(reason);
            }

            self.step(&pool, &fitness, elite)?;

            let best = self.best_fitness();
            if best > best_so_far {
                best_so_far = best;
                stagnant = 0;
            } else {
                stagnant += 1;
            }
            self.fitness_history.push(best);
        }
    }

    fn best_fitness(&self) -> f64 {
        self.population
            .best_individual()
            .map_or(f64::NEG_INFINITY, Individual::fitness)
    }

    /// Built-in conditions first, then custom ones in registration order.
    fn check_stop(
        &self,
        cancel: Option<&AtomicBool>,
        started: Instant,
        stagnant: usize,
    ) -> Option<StopReason> {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Some(StopReason::Cancelled);
        }
        if let Some(max) = self.config.max_generation {
            if self.population.generation() >= max {
                return Some(StopReason::MaxGeneration);
            }
        }
        if self.best_fitness() >= self.config.target_fitness {
            return Some(StopReason::TargetFitness);
        }
        if let Some(ms) = self.config.time_limit_ms {
            if started.elapsed() >= Duration::from_millis(ms) {
                return Some(StopReason::TimeLimit);
            }
        }
        if let Some(limit) = self.config.stagnation_limit {
            if stagnant >= limit {
                return Some(StopReason::Stagnation);
            }
        }
        self.stop_conditions
            .iter()
            .position(|condition| condition(&self.population))
            .map(StopReason::Custom)
    }

    /// One generation. The retained population is only replaced once every
    /// candidate has been produced.
    fn step<F>(&mut self, pool: &ThreadPool, fitness: &F, elite: usize) -> Result<(), GaError>
    where
        F: Fn(&mut Individual) + Sync,
    {
        let reproduction_start = Instant::now();
        let size = self.population.len();
        let limit = size - elite;

        let mut candidates = if self.config.skip_crossover {
            self.population.individuals()[..limit].to_vec()
        } else {
            self.reproduce(limit)?
        };
        if !self.config.skip_mutation {
            self.mutate_all(&mut candidates)?;
        }

        let mut next = Vec::with_capacity(size);
        next.extend_from_slice(&self.population.individuals()[..elite]);
        next.extend(candidates);
        *self.population.individuals_mut() = next;
        let reproduction_duration = reproduction_start.elapsed();

        let evaluation_start = Instant::now();
        evaluate(pool, self.population.individuals_mut(), fitness);
        self.population.sort();
        let evaluation_duration = evaluation_start.elapsed();

        self.population.advance_generation();
        let generation = self.population.generation();

        let Some(best) = self.population.best_individual() else {
            return Ok(());
        };
        debug!(
            generation,
            best_fitness = best.fitness(),
            reproduction_us = reproduction_duration.as_micros() as u64,
            evaluation_us = evaluation_duration.as_micros() as u64,
            "generation complete"
        );

        if let Some(tracker) = self.tracker.as_mut() {
            let result = GenerationResult {
                generation,
                best_fitness: best.fitness(),
                best_individual: best.clone(),
                reproduction_duration,
                evaluation_duration,
            };
            tracker(&result);
        }
        Ok(())
    }

    /// Collects `limit` offspring from selection and crossover.
    fn reproduce(&mut self, limit: usize) -> Result<Vec<Individual>, GaError> {
        let mut stream = Vec::with_capacity(limit);
        let mut failures = 0usize;

        while stream.len() < limit {
            match reproduce_once(&self.config, &self.population, &mut self.rng) {
                Ok(offspring) => {
                    failures = 0;
                    let room = limit - stream.len();
                    stream.extend(offspring.into_individuals().into_iter().take(room));
                }
                Err(err) if err.is_recoverable() => {
                    failures += 1;
                    if failures >= self.config.max_consecutive_failures {
                        error!(
                            generation = self.population.generation(),
                            failures,
                            error = %err,
                            "reproduction kept failing; giving up"
                        );
                        return Err(err);
                    }
                    warn!(
                        generation = self.population.generation(),
                        failures,
                        error = %err,
                        "reproduction attempt discarded"
                    );
                }
                Err(err) => {
                    error!(
                        generation = self.population.generation(),
                        error = %err,
                        "reproduction cannot proceed"
                    );
                    return Err(err);
                }
            }
        }
        Ok(stream)
    }

    /// Mutates every candidate. Non-domain failures leave the individual
    /// unmutated and are reported once per generation.
    fn mutate_all(&mut self, candidates: &mut [Individual]) -> Result<(), GaError> {
        let mut failed = 0usize;
        let mut last_error = None;

        for individual in candidates.iter_mut() {
            match self.config.mutator.mutate(individual, &mut self.rng) {
                Ok(()) => {}
                Err(MutatorError::Domain(err)) => return Err(GaError::Domain(err)),
                Err(err) => {
                    failed += 1;
                    last_error = Some(err);
                }
            }
        }

        if let Some(err) = last_error {
            warn!(
                generation = self.population.generation(),
                failed,
                error = %err,
                "mutation failed; individuals kept unmutated"
            );
        }
        Ok(())
    }
}

impl fmt::Debug for GeneticAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneticAlgorithm")
            .field("config", &self.config)
            .field("generation", &self.population.generation())
            .field("population_size", &self.population.len())
            .field("stop_conditions", &self.stop_conditions.len())
            .field("has_tracker", &self.tracker.is_some())
            .finish()
    }
}

/// One selection plus optional crossover.
fn reproduce_once(
    config: &GeneticConfig,
    population: &Population,
    rng: &mut StdRng,
) -> Result<Offspring, GaError> {
    let (a, b) = config.selector.select_parents(population, rng)?;
    if rng.random_bool(config.crossover_rate) {
        Ok(config.crossover.recombine(a, b, rng)?)
    } else if config.crossover.has_single_offspring() {
        Ok(Offspring::Single(a.clone()))
    } else {
        Ok(Offspring::Pair(a.clone(), b.clone()))
    }
}

fn build_pool(workers: usize) -> Result<ThreadPool, ConfigError> {
    Ok(ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("u-evolve-worker-{i}"))
        .build()?)
}

/// Evaluate all individuals; returns once every call has finished.
fn evaluate<F>(pool: &ThreadPool, individuals: &mut [Individual], fitness: &F)
where
    F: Fn(&mut Individual) + Sync,
{
    pool.install(|| individuals.par_iter_mut().for_each(|ind| fitness(ind)));
}

// ============================================================================
// Tests
// ============================================================================
