//! Mutation operators.
//!
//! A [`Mutator`] perturbs one individual's chromosome in place. Fitness is
//! left untouched and therefore stale until the engine re-evaluates.
//!
//! Per-gene operators ([`GaussianMutator`], [`BitFlipMutator`],
//! [`IntegerMutator`], [`RandomMutator`]) roll the mutation rate once per
//! gene. Structural operators ([`SwapMutator`], [`InversionMutator`],
//! [`ScrambleMutator`]) roll it once per call and only reorder genes, so
//! they are safe on permutation chromosomes.

use super::chromosome::{AlleleRange, Gene, GeneKind, UNBOUNDED_INTEGER};
use super::error::MutatorError;
use super::types::Individual;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use rand_distr::{Distribution, StandardNormal};
use std::fmt;

/// Mutation rate used by operators built with `new()`.
pub const DEFAULT_MUTATION_RATE: f64 = 0.05;

/// An in-place perturbation strategy.
pub trait Mutator: Send + Sync + fmt::Debug {
    /// Mutates `individual` in place.
    ///
    /// # Errors
    /// [`MutatorError::UnsupportedKind`] when the chromosome kind does not
    /// fit the operator; [`MutatorError::Domain`] if an edit breaks a
    /// chromosome invariant.
    fn mutate(&self, individual: &mut Individual, rng: &mut dyn RngCore)
        -> Result<(), MutatorError>;

    fn mutation_rate(&self) -> f64;

    /// # Errors
    /// [`MutatorError::InvalidRate`] unless `0 <= rate <= 1`.
    fn set_mutation_rate(&mut self, rate: f64) -> Result<(), MutatorError>;
}

fn check_rate(rate: f64) -> Result<f64, MutatorError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(MutatorError::InvalidRate(rate))
    }
}

fn require_kind(
    operator: &'static str,
    expected: GeneKind,
    individual: &Individual,
) -> Result<(), MutatorError> {
    let kind = individual.chromosome().kind();
    if kind == expected {
        Ok(())
    } else {
        Err(MutatorError::UnsupportedKind { operator, kind })
    }
}

/// Two distinct positions `start < end` within `0..n`; requires `n >= 2`.
fn random_span(n: usize, rng: &mut dyn RngCore) -> (usize, usize) {
    let picks = rand::seq::index::sample(rng, n, 2);
    let (a, b) = (picks.index(0), picks.index(1));
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Implements the rate accessors shared by every operator.
macro_rules! rate_accessors {
    () => {
        fn mutation_rate(&self) -> f64 {
            self.rate
        }

        fn set_mutation_rate(&mut self, rate: f64) -> Result<(), MutatorError> {
            self.rate = check_rate(rate)?;
            Ok(())
        }
    };
}

// ============================================================================
// Gaussian
// ============================================================================

/// Adds `N(0, std_dev^2)` noise to each float gene with probability `rate`.
#[derive(Debug, Clone)]
pub struct GaussianMutator {
    rate: f64,
    std_dev: f64,
}

impl Default for GaussianMutator {
    fn default() -> Self {
        Self {
            rate: DEFAULT_MUTATION_RATE,
            std_dev: 1.0,
        }
    }
}

impl GaussianMutator {
    /// Unit standard deviation, default rate.
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// [`MutatorError::InvalidStdDev`] unless `std_dev` is finite and positive.
    pub fn with_std_dev(mut self, std_dev: f64) -> Result<Self, MutatorError> {
        if !(std_dev.is_finite() && std_dev > 0.0) {
            return Err(MutatorError::InvalidStdDev(std_dev));
        }
        self.std_dev = std_dev;
        Ok(self)
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

impl Mutator for GaussianMutator {
    fn mutate(
        &self,
        individual: &mut Individual,
        rng: &mut dyn RngCore,
    ) -> Result<(), MutatorError> {
        require_kind("GaussianMutator", GeneKind::Float, individual)?;
        for gene in individual.chromosome_mut().genes_mut() {
            if let Gene::Float(value) = gene {
                if rng.random_bool(self.rate) {
                    let z: f64 = StandardNormal.sample(rng);
                    *value += z * self.std_dev;
                }
            }
        }
        Ok(())
    }

    rate_accessors!();
}

// ============================================================================
// Bit flip
// ============================================================================

/// Inverts each bit with probability `rate`.
#[derive(Debug, Clone)]
pub struct BitFlipMutator {
    rate: f64,
}

impl Default for BitFlipMutator {
    fn default() -> Self {
        Self {
            rate: DEFAULT_MUTATION_RATE,
        }
    }
}

impl BitFlipMutator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mutator for BitFlipMutator {
    fn mutate(
        &self,
        individual: &mut Individual,
        rng: &mut dyn RngCore,
    ) -> Result<(), MutatorError> {
        require_kind("BitFlipMutator", GeneKind::Bit, individual)?;
        for gene in individual.chromosome_mut().genes_mut() {
            if let Gene::Bit(bit) = gene {
                if rng.random_bool(self.rate) {
                    *bit = !*bit;
                }
            }
        }
        Ok(())
    }

    rate_accessors!();
}

// ============================================================================
// Integer resampling
// ============================================================================

/// Replaces each integer gene with probability `rate` by a uniform draw from
/// `[min, max]`.
#[derive(Debug, Clone)]
pub struct IntegerMutator {
    rate: f64,
    min: i64,
    max: i64,
}

impl IntegerMutator {
    /// # Errors
    /// [`MutatorError::InvalidRange`] if `min > max`.
    pub fn new(min: i64, max: i64) -> Result<Self, MutatorError> {
        if min > max {
            return Err(MutatorError::InvalidRange { min, max });
        }
        Ok(Self {
            rate: DEFAULT_MUTATION_RATE,
            min,
            max,
        })
    }

    pub fn bounds(&self) -> (i64, i64) {
        (self.min, self.max)
    }
}

impl Mutator for IntegerMutator {
    fn mutate(
        &self,
        individual: &mut Individual,
        rng: &mut dyn RngCore,
    ) -> Result<(), MutatorError> {
        require_kind("IntegerMutator", GeneKind::Integer, individual)?;
        for gene in individual.chromosome_mut().genes_mut() {
            if let Gene::Integer(value) = gene {
                if rng.random_bool(self.rate) {
                    *value = rng.random_range(self.min..=self.max);
                }
            }
        }
        Ok(())
    }

    rate_accessors!();
}

// ============================================================================
// Swap / inversion / scramble
// ============================================================================

/// With probability `rate`, swaps two distinct positions. Any kind.
#[derive(Debug, Clone)]
pub struct SwapMutator {
    rate: f64,
}

impl Default for SwapMutator {
    fn default() -> Self {
        Self {
            rate: DEFAULT_MUTATION_RATE,
        }
    }
}

impl SwapMutator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mutator for SwapMutator {
    fn mutate(
        &self,
        individual: &mut Individual,
        rng: &mut dyn RngCore,
    ) -> Result<(), MutatorError> {
        let n = individual.chromosome().len();
        if n < 2 || !rng.random_bool(self.rate) {
            return Ok(());
        }
        let (i, j) = random_span(n, rng);
        individual.chromosome_mut().swap_genes(i, j)?;
        Ok(())
    }

    rate_accessors!();
}

/// With probability `rate`, reverses a random segment of at least two genes.
#[derive(Debug, Clone)]
pub struct InversionMutator {
    rate: f64,
}

impl Default for InversionMutator {
    fn default() -> Self {
        Self {
            rate: DEFAULT_MUTATION_RATE,
        }
    }
}

impl InversionMutator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mutator for InversionMutator {
    fn mutate(
        &self,
        individual: &mut Individual,
        rng: &mut dyn RngCore,
    ) -> Result<(), MutatorError> {
        let n = individual.chromosome().len();
        if n < 2 || !rng.random_bool(self.rate) {
            return Ok(());
        }
        let (start, end) = random_span(n, rng);
        individual.chromosome_mut().genes_mut()[start..=end].reverse();
        Ok(())
    }

    rate_accessors!();
}

/// With probability `rate`, shuffles a random segment of at least two genes.
#[derive(Debug, Clone)]
pub struct ScrambleMutator {
    rate: f64,
}

impl Default for ScrambleMutator {
    fn default() -> Self {
        Self {
            rate: DEFAULT_MUTATION_RATE,
        }
    }
}

impl ScrambleMutator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mutator for ScrambleMutator {
    fn mutate(
        &self,
        individual: &mut Individual,
        rng: &mut dyn RngCore,
    ) -> Result<(), MutatorError> {
        let n = individual.chromosome().len();
        if n < 2 || !rng.random_bool(self.rate) {
            return Ok(());
        }
        let (start, end) = random_span(n, rng);
        individual.chromosome_mut().genes_mut()[start..=end].shuffle(rng);
        Ok(())
    }

    rate_accessors!();
}

// ============================================================================
// Random resampling
// ============================================================================

/// Replaces each gene with probability `rate` by a fresh allele.
///
/// Bits are redrawn fairly. Integers and floats are drawn from the
/// chromosome's [`AlleleRange`] when it has one; otherwise integers span the
/// 32-bit signed range and floats come from the standard normal
/// distribution. Permutations are rejected since resampling would repeat
/// values.
#[derive(Debug, Clone)]
pub struct RandomMutator {
    rate: f64,
}

impl Default for RandomMutator {
    fn default() -> Self {
        Self {
            rate: DEFAULT_MUTATION_RATE,
        }
    }
}

impl RandomMutator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mutator for RandomMutator {
    fn mutate(
        &self,
        individual: &mut Individual,
        rng: &mut dyn RngCore,
    ) -> Result<(), MutatorError> {
        let chromosome = individual.chromosome_mut();
        let kind = chromosome.kind();
        if kind == GeneKind::Permutation {
            return Err(MutatorError::UnsupportedKind {
                operator: "RandomMutator",
                kind,
            });
        }

        let (int_min, int_max) = match chromosome.range() {
            Some(AlleleRange::Integer { min, max }) => (min, max),
            _ => UNBOUNDED_INTEGER,
        };
        let float_range = match chromosome.range() {
            Some(AlleleRange::Float { min, max }) => Some((min, max)),
            _ => None,
        };

        for gene in chromosome.genes_mut() {
            if !rng.random_bool(self.rate) {
                continue;
            }
            match gene {
                Gene::Bit(bit) => *bit = rng.random_bool(0.5),
                Gene::Integer(value) => *value = rng.random_range(int_min..=int_max),
                Gene::Float(value) => {
                    *value = match float_range {
                        Some((min, max)) => rng.random_range(min..=max),
                        None => StandardNormal.sample(rng),
                    }
                }
                Gene::Permutation(_) => {}
            }
        }
        Ok(())
    }

    rate_accessors!();
}
