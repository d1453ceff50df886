//! Genetic Algorithm engine.
//!
//! A pluggable GA core over typed chromosomes. Users seed a [`Population`],
//! pick operators in a [`GeneticConfig`], and hand a fitness callback to
//! [`GeneticAlgorithm::evolve`].
//!
//! # Core Traits
//!
//! - [`Selector`]: picks parents from a population
//! - [`Crossover`]: recombines two parents into one or two offspring
//! - [`Mutator`]: perturbs one individual in place
//!
//! # Key Types
//!
//! - [`Chromosome`], [`Gene`], [`GeneKind`]: the data model
//! - [`Individual`], [`Population`], [`Offspring`]
//! - [`GeneticConfig`]: operators and loop parameters
//! - [`GeneticAlgorithm`]: executes the evolutionary loop
//! - [`GenerationResult`], [`StopReason`]: what the loop reports
//! - [`GaError`] and the per-family error enums
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - De Jong (2006), *Evolutionary Computation: A Unified Approach*

mod chromosome;
mod config;
mod crossover;
mod error;
mod mutation;
mod runner;
mod selection;
mod types;

pub use chromosome::{AlleleRange, Chromosome, Gene, GeneKind};
pub use config::GeneticConfig;
pub use crossover::{
    Crossover, FixedPointCrossover, OnePointCrossover, Order1Crossover, TwoPointCrossover,
    UniformCrossover,
};
pub use error::{ConfigError, CrossoverError, DomainError, GaError, MutatorError, SelectionError};
pub use mutation::{
    BitFlipMutator, GaussianMutator, IntegerMutator, InversionMutator, Mutator, RandomMutator,
    ScrambleMutator, SwapMutator, DEFAULT_MUTATION_RATE,
};
pub use runner::{
    GenerationResult, GenerationTracker, GeneticAlgorithm, StopCondition, StopReason,
};
pub use selection::{
    CompetitionSelector, RandomSelector, RankSelector, RouletteSelector, Selector,
    TournamentSelector,
};
pub use types::{Individual, Offspring, Population, UNEVALUATED};
