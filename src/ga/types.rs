//! Individuals, populations, and crossover offspring.
//!
//! Fitness is maximized: populations sort best-first by descending fitness.
//! An individual that has not been evaluated yet carries
//! [`UNEVALUATED`] (negative infinity) and therefore sorts last.

use super::chromosome::Chromosome;
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fitness of an individual that has not been evaluated.
pub const UNEVALUATED: f64 = f64::NEG_INFINITY;

/// A candidate solution: one chromosome, its fitness, and optional
/// user-attached data.
///
/// The fitness callback passed to
/// [`GeneticAlgorithm::evolve`](super::GeneticAlgorithm::evolve) receives
/// `&mut Individual` and records its result with [`set_fitness`]. Auxiliary
/// values computed along the way (for example raw objective terms before
/// scaling) can be stored with [`set_custom_data`].
///
/// [`set_fitness`]: Individual::set_fitness
/// [`set_custom_data`]: Individual::set_custom_data
///
/// # Examples
///
/// ```
/// use u_evolve::ga::{Chromosome, Individual};
///
/// let mut ind = Individual::new(Chromosome::from_bits([true, false, true]));
/// assert!(!ind.is_evaluated());
///
/// let ones = ind.chromosome().iter().filter(|g| g.as_bool() == Some(true)).count();
/// ind.set_fitness(ones as f64);
/// ind.set_custom_data(vec![ones]);
///
/// assert_eq!(ind.fitness(), 2.0);
/// assert_eq!(ind.custom_data::<Vec<usize>>(), Some(&vec![2]));
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Individual {
    chromosome: Chromosome,
    fitness: f64,
    #[cfg_attr(feature = "serde", serde(skip))]
    custom_data: Option<Arc<dyn Any + Send + Sync>>,
}

impl Individual {
    /// Wraps a chromosome in an unevaluated individual.
    pub fn new(chromosome: Chromosome) -> Self {
        Self {
            chromosome,
            fitness: UNEVALUATED,
            custom_data: None,
        }
    }

    /// Wraps a chromosome with a known fitness.
    pub fn with_fitness(chromosome: Chromosome, fitness: f64) -> Self {
        Self {
            chromosome,
            fitness,
            custom_data: None,
        }
    }

    pub fn chromosome(&self) -> &Chromosome {
        &self.chromosome
    }

    /// Mutable access for mutation operators.
    ///
    /// Chromosome editing methods keep the kind and permutation invariants.
    /// Fitness is not reset; it stays stale until the next evaluation.
    pub fn chromosome_mut(&mut self) -> &mut Chromosome {
        &mut self.chromosome
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// Whether a fitness value has been recorded.
    pub fn is_evaluated(&self) -> bool {
        self.fitness != UNEVALUATED
    }

    /// Returns the attached data if it is of type `T`.
    pub fn custom_data<T: Any>(&self) -> Option<&T> {
        self.custom_data.as_deref()?.downcast_ref::<T>()
    }

    /// Attaches arbitrary data, replacing any previous value.
    pub fn set_custom_data<T: Any + Send + Sync>(&mut self, data: T) {
        self.custom_data = Some(Arc::new(data));
    }

    pub fn clear_custom_data(&mut self) {
        self.custom_data = None;
    }

    /// Orders two individuals best-first (descending fitness).
    ///
    /// NaN fitness ranks like an unevaluated individual, which keeps the
    /// ordering total.
    pub fn cmp_by_fitness_desc(&self, other: &Self) -> Ordering {
        sort_key(other.fitness).total_cmp(&sort_key(self.fitness))
    }
}

fn sort_key(fitness: f64) -> f64 {
    if fitness.is_nan() {
        UNEVALUATED
    } else {
        fitness
    }
}

impl fmt::Debug for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Individual")
            .field("chromosome", &self.chromosome)
            .field("fitness", &self.fitness)
            .field("has_custom_data", &self.custom_data.is_some())
            .finish()
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fitness {} | {}", self.fitness, self.chromosome)
    }
}

/// The individuals under evolution plus the generation counter.
///
/// The engine sorts the population once per generation, after evaluation;
/// [`best_individual`](Population::best_individual) relies on that order.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Population {
    individuals: Vec<Individual>,
    generation: usize,
}

impl Population {
    /// Creates an empty population at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_individuals(individuals: Vec<Individual>) -> Self {
        Self {
            individuals,
            generation: 0,
        }
    }

    pub fn add_individual(&mut self, individual: Individual) {
        self.individuals.push(individual);
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Individual> {
        self.individuals.get(index)
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Individual> {
        self.individuals.iter()
    }

    /// Number of completed evolution steps.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Stable sort by descending fitness; ties keep insertion order.
    pub fn sort(&mut self) {
        self.individuals.sort_by(Individual::cmp_by_fitness_desc);
    }

    /// First individual, which is the fittest once the population is sorted.
    pub fn best_individual(&self) -> Option<&Individual> {
        self.individuals.first()
    }

    pub(crate) fn individuals_mut(&mut self) -> &mut Vec<Individual> {
        &mut self.individuals
    }

    pub(crate) fn advance_generation(&mut self) {
        self.generation += 1;
    }
}

impl Index<usize> for Population {
    type Output = Individual;

    fn index(&self, index: usize) -> &Individual {
        &self.individuals[index]
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Individual;
    type IntoIter = std::slice::Iter<'a, Individual>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.iter()
    }
}

impl IntoIterator for Population {
    type Item = Individual;
    type IntoIter = std::vec::IntoIter<Individual>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.into_iter()
    }
}

impl FromIterator<Individual> for Population {
    fn from_iter<T: IntoIterator<Item = Individual>>(iter: T) -> Self {
        Self::from_individuals(iter.into_iter().collect())
    }
}

/// The one or two individuals produced by a single crossover call.
#[derive(Debug, Clone)]
pub enum Offspring {
    Single(Individual),
    Pair(Individual, Individual),
}

impl Offspring {
    pub fn len(&self) -> usize {
        match self {
            Offspring::Single(_) => 1,
            Offspring::Pair(..) => 2,
        }
    }

    /// Always `false`; present for symmetry with [`len`](Offspring::len).
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn first(&self) -> &Individual {
        match self {
            Offspring::Single(a) | Offspring::Pair(a, _) => a,
        }
    }

    pub fn second(&self) -> Option<&Individual> {
        match self {
            Offspring::Single(_) => None,
            Offspring::Pair(_, b) => Some(b),
        }
    }

    pub fn into_individuals(self) -> Vec<Individual> {
        match self {
            Offspring::Single(a) => vec![a],
            Offspring::Pair(a, b) => vec![a, b],
        }
    }
}
