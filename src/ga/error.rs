//! Error taxonomy for the GA engine.
//!
//! Each operator family reports its own error type. [`GaError`] is what
//! [`GeneticAlgorithm::evolve`](super::GeneticAlgorithm::evolve) returns; it
//! wraps the others and decides which failures the reproduction loop may
//! skip ([`GaError::is_recoverable`]).

use super::chromosome::GeneKind;
use thiserror::Error;

/// Violation of a chromosome invariant.
///
/// Raised by chromosome editing methods. Inside the engine a domain error is
/// never recovered from: it means an operator produced an invalid chromosome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// A gene of the wrong variant was offered to a chromosome.
    #[error("gene kind mismatch: chromosome holds {expected} genes, got {found}")]
    KindMismatch { expected: GeneKind, found: GeneKind },

    /// A permutation chromosome already holds this allele.
    #[error("allele {0} already present; permutation values must not repeat")]
    DuplicateAllele(i64),

    #[error("gene index {index} out of bounds for chromosome of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Operation needs at least one gene.
    #[error("chromosome is empty")]
    EmptyChromosome,

    #[error("{0} chromosome is not numeric")]
    NotNumeric(GeneKind),

    /// Allele range with `min > max`, or float limits or width that are not finite.
    #[error("invalid allele range: min {min} > max {max} or not finite")]
    InvalidRange { min: f64, max: f64 },
}

/// Parent selection failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("cannot select from an empty population")]
    EmptyPopulation,

    #[error("tournament size must be at least 1")]
    InvalidTournamentSize,

    #[error("tournament size {size} exceeds population size {population}")]
    TournamentTooLarge { size: usize, population: usize },

    /// Two distinct parents were required but the population is too small.
    #[error("need at least {required} individuals to select distinct parents, population has {available}")]
    NotEnoughIndividuals { required: usize, available: usize },

    /// Roulette weights must be non-negative.
    #[error("individual {index} has negative fitness {fitness}; roulette selection needs fitness >= 0")]
    NegativeFitness { index: usize, fitness: f64 },
}

impl SelectionError {
    /// Whether the population itself rules selection out. No retry within
    /// the same generation can change the outcome.
    pub fn is_population_precondition(&self) -> bool {
        matches!(
            self,
            SelectionError::EmptyPopulation
                | SelectionError::InvalidTournamentSize
                | SelectionError::TournamentTooLarge { .. }
                | SelectionError::NotEnoughIndividuals { .. }
        )
    }
}

/// Recombination failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CrossoverError {
    #[error("parent chromosomes differ in kind: {first} vs {second}")]
    KindMismatch { first: GeneKind, second: GeneKind },

    #[error("parent chromosomes differ in length: {first} vs {second}")]
    LengthMismatch { first: usize, second: usize },

    /// The operator cannot preserve the invariants of this chromosome kind.
    #[error("{operator} does not support {kind} chromosomes")]
    UnsupportedKind {
        operator: &'static str,
        kind: GeneKind,
    },

    #[error("chromosome length {length} is too short, need at least {required}")]
    ChromosomeTooShort { length: usize, required: usize },

    #[error("crossover point {point} out of range for chromosome length {length}")]
    PointOutOfRange { point: usize, length: usize },

    #[error("swap probability {0} outside [0, 1]")]
    InvalidProbability(f64),

    /// Order-1 parents must be permutations of the same value set.
    #[error("parents are not permutations of the same value set")]
    IncompatiblePermutations,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Mutation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutatorError {
    #[error("mutation rate {0} outside [0, 1]")]
    InvalidRate(f64),

    #[error("{operator} does not support {kind} chromosomes")]
    UnsupportedKind {
        operator: &'static str,
        kind: GeneKind,
    },

    #[error("standard deviation {0} must be finite and positive")]
    InvalidStdDev(f64),

    #[error("invalid integer range [{min}, {max}]")]
    InvalidRange { min: i64, max: i64 },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Invalid engine configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("crossover rate {0} must be in (0, 1]")]
    InvalidCrossoverRate(f64),

    #[error("mutation rate {0} must be in (0, 1]")]
    InvalidMutationRate(f64),

    #[error("max_generation must be at least 1")]
    InvalidMaxGeneration,

    #[error("worker_count must be at least 1")]
    InvalidWorkerCount,

    #[error("target fitness must not be NaN")]
    InvalidTargetFitness,

    #[error("time_limit_ms must be positive or None")]
    InvalidTimeLimit,

    #[error("stagnation_limit must be positive or None")]
    InvalidStagnationLimit,

    #[error("max_consecutive_failures must be at least 1")]
    InvalidFailureLimit,

    #[error("initial population is empty")]
    EmptyPopulation,

    #[error("elitism size {elitism_size} exceeds population size {population_size}")]
    ElitismExceedsPopulation {
        elitism_size: usize,
        population_size: usize,
    },

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Error returned by the evolution engine.
#[derive(Debug, Error)]
pub enum GaError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("crossover error: {0}")]
    Crossover(CrossoverError),

    #[error("mutator error: {0}")]
    Mutator(MutatorError),

    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
}

impl GaError {
    /// Whether a single reproduction attempt that failed with this error can
    /// be discarded and retried.
    pub fn is_recoverable(&self) -> bool {
        match self {
            GaError::Selection(err) => !err.is_population_precondition(),
            GaError::Crossover(_) | GaError::Mutator(_) => true,
            GaError::Configuration(_) | GaError::Domain(_) => false,
        }
    }
}

impl From<CrossoverError> for GaError {
    fn from(err: CrossoverError) -> Self {
        match err {
            CrossoverError::Domain(domain) => GaError::Domain(domain),
            other => GaError::Crossover(other),
        }
    }
}

impl From<MutatorError> for GaError {
    fn from(err: MutatorError) -> Self {
        match err {
            MutatorError::Domain(domain) => GaError::Domain(domain),
            other => GaError::Mutator(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_are_lifted_out_of_operator_errors() {
        let err: GaError = CrossoverError::Domain(DomainError::DuplicateAllele(3)).into();
        assert!(matches!(err, GaError::Domain(DomainError::DuplicateAllele(3))));
        assert!(!err.is_recoverable());

        let err: GaError = MutatorError::Domain(DomainError::EmptyChromosome).into();
        assert!(matches!(err, GaError::Domain(DomainError::EmptyChromosome)));
    }

    #[test]
    fn test_operator_errors_are_recoverable() {
        let err: GaError = SelectionError::NegativeFitness {
            index: 0,
            fitness: -1.0,
        }
        .into();
        assert!(err.is_recoverable());

        let err: GaError = CrossoverError::InvalidProbability(2.0).into();
        assert!(err.is_recoverable());

        let err: GaError = MutatorError::InvalidRate(-1.0).into();
        assert!(err.is_recoverable());

        let err: GaError = ConfigError::InvalidWorkerCount.into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_population_preconditions_are_not_retried() {
        let err: GaError = SelectionError::NotEnoughIndividuals {
            required: 2,
            available: 1,
        }
        .into();
        assert!(!err.is_recoverable());

        let err: GaError = SelectionError::TournamentTooLarge {
            size: 3,
            population: 2,
        }
        .into();
        assert!(!err.is_recoverable());

        let err: GaError = SelectionError::EmptyPopulation.into();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_messages_name_the_problem() {
        let err = SelectionError::TournamentTooLarge {
            size: 4,
            population: 3,
        };
        assert_eq!(
            err.to_string(),
            "tournament size 4 exceeds population size 3"
        );
    }
}
