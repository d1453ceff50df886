//! Gene and chromosome data model.
//!
//! A [`Chromosome`] is an ordered sequence of [`Gene`]s that all share one
//! [`GeneKind`]. The kind is fixed at construction; editing methods reject
//! genes of any other kind, and permutation chromosomes additionally reject
//! repeated alleles.
//!
//! Operators reorder or rebuild gene sequences but never change a gene's
//! variant, so every chromosome produced inside the engine keeps the kind of
//! its parents.
//!
//! # Examples
//!
//! ```
//! use u_evolve::ga::{Chromosome, Gene, GeneKind};
//!
//! let mut tour = Chromosome::from_permutation([2, 0, 1]).unwrap();
//! assert_eq!(tour.kind(), GeneKind::Permutation);
//! assert!(tour.add_gene(Gene::Permutation(1)).is_err());
//! tour.add_gene(Gene::Permutation(3)).unwrap();
//! assert_eq!(tour.to_integers(), Some(vec![2, 0, 1, 3]));
//! ```

use super::error::DomainError;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::collections::HashSet;
use std::fmt;
use std::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The variant shared by every gene of a chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GeneKind {
    Bit,
    Integer,
    Float,
    /// Integers drawn from a fixed set without repetition.
    Permutation,
}

impl fmt::Display for GeneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeneKind::Bit => "bit",
            GeneKind::Integer => "integer",
            GeneKind::Float => "float",
            GeneKind::Permutation => "permutation",
        };
        f.write_str(name)
    }
}

/// A single allele wrapped in its variant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Gene {
    Bit(bool),
    Integer(i64),
    Float(f64),
    Permutation(i64),
}

impl Gene {
    /// Returns the variant of this gene.
    pub fn kind(&self) -> GeneKind {
        match self {
            Gene::Bit(_) => GeneKind::Bit,
            Gene::Integer(_) => GeneKind::Integer,
            Gene::Float(_) => GeneKind::Float,
            Gene::Permutation(_) => GeneKind::Permutation,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Gene::Bit(b) => Some(b),
            _ => None,
        }
    }

    /// Integer allele of an integer or permutation gene.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Gene::Integer(v) | Gene::Permutation(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Gene::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric value of the allele; `None` for bits.
    fn numeric(&self) -> Option<f64> {
        match *self {
            Gene::Integer(v) | Gene::Permutation(v) => Some(v as f64),
            Gene::Float(v) => Some(v),
            Gene::Bit(_) => None,
        }
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gene::Bit(b) => write!(f, "{b}"),
            Gene::Integer(v) | Gene::Permutation(v) => write!(f, "{v}"),
            Gene::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Gene {
    fn from(b: bool) -> Self {
        Gene::Bit(b)
    }
}

impl From<i64> for Gene {
    fn from(v: i64) -> Self {
        Gene::Integer(v)
    }
}

impl From<f64> for Gene {
    fn from(v: f64) -> Self {
        Gene::Float(v)
    }
}

/// Sampling range for freshly drawn alleles.
///
/// Recorded by the seeding constructors and consulted by
/// [`RandomMutator`](super::RandomMutator).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AlleleRange {
    /// Inclusive integer range.
    Integer { min: i64, max: i64 },
    /// Float range, `min <= allele <= max`.
    Float { min: f64, max: f64 },
}

/// Range used for integer chromosomes built without explicit bounds.
pub(crate) const UNBOUNDED_INTEGER: (i64, i64) = (i32::MIN as i64, i32::MAX as i64);

/// An ordered sequence of genes of one kind.
///
/// Cloning copies the gene storage, so editing a clone never affects the
/// original.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chromosome {
    kind: GeneKind,
    genes: Vec<Gene>,
    range: Option<AlleleRange>,
}

impl Chromosome {
    /// Creates an empty chromosome of the given kind.
    pub fn empty(kind: GeneKind) -> Self {
        Self {
            kind,
            genes: Vec::new(),
            range: None,
        }
    }

    /// Builds a chromosome from explicit genes, checking every invariant.
    pub fn from_genes(kind: GeneKind, genes: Vec<Gene>) -> Result<Self, DomainError> {
        let chromosome = Self {
            kind,
            genes,
            range: None,
        };
        chromosome.validate()?;
        Ok(chromosome)
    }

    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        Self {
            kind: GeneKind::Bit,
            genes: bits.into_iter().map(Gene::Bit).collect(),
            range: None,
        }
    }

    pub fn from_integers<I: IntoIterator<Item = i64>>(values: I) -> Self {
        Self {
            kind: GeneKind::Integer,
            genes: values.into_iter().map(Gene::Integer).collect(),
            range: None,
        }
    }

    pub fn from_floats<I: IntoIterator<Item = f64>>(values: I) -> Self {
        Self {
            kind: GeneKind::Float,
            genes: values.into_iter().map(Gene::Float).collect(),
            range: None,
        }
    }

    /// Builds a permutation chromosome; fails on a repeated value.
    pub fn from_permutation<I: IntoIterator<Item = i64>>(values: I) -> Result<Self, DomainError> {
        Self::from_genes(
            GeneKind::Permutation,
            values.into_iter().map(Gene::Permutation).collect(),
        )
    }

    /// `len` uniformly random bits.
    pub fn random_bits<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        Self::from_bits((0..len).map(|_| rng.random_bool(0.5)))
    }

    /// `len` integers drawn uniformly from `[min, max]`.
    ///
    /// The range is remembered for later resampling.
    pub fn random_integers<R: Rng + ?Sized>(
        len: usize,
        min: i64,
        max: i64,
        rng: &mut R,
    ) -> Result<Self, DomainError> {
        if min > max {
            return Err(DomainError::InvalidRange {
                min: min as f64,
                max: max as f64,
            });
        }
        let mut chromosome = Self::from_integers((0..len).map(|_| rng.random_range(min..=max)));
        chromosome.range = Some(AlleleRange::Integer { min, max });
        Ok(chromosome)
    }

    /// `len` integers spanning the 32-bit signed range.
    pub fn random_integers_unbounded<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        let (min, max) = UNBOUNDED_INTEGER;
        Self::from_integers((0..len).map(|_| rng.random_range(min..=max)))
    }

    /// `len` floats drawn uniformly from `[min, max]`.
    pub fn random_floats<R: Rng + ?Sized>(
        len: usize,
        min: f64,
        max: f64,
        rng: &mut R,
    ) -> Result<Self, DomainError> {
        if !(max - min).is_finite() || min > max {
            return Err(DomainError::InvalidRange { min, max });
        }
        let mut chromosome = Self::from_floats((0..len).map(|_| rng.random_range(min..=max)));
        chromosome.range = Some(AlleleRange::Float { min, max });
        Ok(chromosome)
    }

    /// `len` floats drawn from the standard normal distribution.
    pub fn standard_normal_floats<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        Self::from_floats((0..len).map(|_| StandardNormal.sample(rng)))
    }

    /// A shuffled permutation of `start..start + len`.
    pub fn random_permutation<R: Rng + ?Sized>(len: usize, start: i64, rng: &mut R) -> Self {
        let mut values: Vec<i64> = (0..len as i64).map(|i| start + i).collect();
        values.shuffle(rng);
        Self {
            kind: GeneKind::Permutation,
            genes: values.into_iter().map(Gene::Permutation).collect(),
            range: None,
        }
    }

    /// Attaches a sampling range. The range kind must match the chromosome.
    pub fn with_range(mut self, range: AlleleRange) -> Result<Self, DomainError> {
        let range_kind = match range {
            AlleleRange::Integer { min, max } => {
                if min > max {
                    return Err(DomainError::InvalidRange {
                        min: min as f64,
                        max: max as f64,
                    });
                }
                GeneKind::Integer
            }
            AlleleRange::Float { min, max } => {
                if !(max - min).is_finite() || min > max {
                    return Err(DomainError::InvalidRange { min, max });
                }
                GeneKind::Float
            }
        };
        if range_kind != self.kind {
            return Err(DomainError::KindMismatch {
                expected: self.kind,
                found: range_kind,
            });
        }
        self.range = Some(range);
        Ok(self)
    }

    pub fn kind(&self) -> GeneKind {
        self.kind
    }

    pub fn range(&self) -> Option<AlleleRange> {
        self.range
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn gene(&self, index: usize) -> Option<&Gene> {
        self.genes.get(index)
    }

    /// Read-only view of the gene sequence.
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Gene> {
        self.genes.iter()
    }

    pub fn contains(&self, gene: &Gene) -> bool {
        self.genes.contains(gene)
    }

    /// Appends a gene.
    ///
    /// # Errors
    /// [`DomainError::KindMismatch`] for a foreign variant,
    /// [`DomainError::DuplicateAllele`] for a repeated permutation value.
    pub fn add_gene(&mut self, gene: Gene) -> Result<(), DomainError> {
        self.check_kind(&gene)?;
        self.check_unique(&gene, None)?;
        self.genes.push(gene);
        Ok(())
    }

    /// Replaces the gene at `index`.
    ///
    /// For permutation chromosomes the new value may equal the value it
    /// replaces, but not any other value already present.
    pub fn set_gene(&mut self, index: usize, gene: Gene) -> Result<(), DomainError> {
        self.check_index(index, self.genes.len())?;
        self.check_kind(&gene)?;
        self.check_unique(&gene, Some(index))?;
        self.genes[index] = gene;
        Ok(())
    }

    /// Inserts a gene before `index`; `index == len()` appends.
    pub fn insert_gene(&mut self, index: usize, gene: Gene) -> Result<(), DomainError> {
        self.check_index(index, self.genes.len() + 1)?;
        self.check_kind(&gene)?;
        self.check_unique(&gene, None)?;
        self.genes.insert(index, gene);
        Ok(())
    }

    /// Exchanges two genes. Valid for every kind.
    pub fn swap_genes(&mut self, a: usize, b: usize) -> Result<(), DomainError> {
        let len = self.genes.len();
        self.check_index(a, len)?;
        self.check_index(b, len)?;
        self.genes.swap(a, b);
        Ok(())
    }

    /// Checks that every gene matches the kind and permutation values are
    /// distinct.
    pub fn validate(&self) -> Result<(), DomainError> {
        for gene in &self.genes {
            self.check_kind(gene)?;
        }
        if self.kind == GeneKind::Permutation {
            let mut seen = HashSet::with_capacity(self.genes.len());
            for gene in &self.genes {
                if let Gene::Permutation(v) = *gene {
                    if !seen.insert(v) {
                        return Err(DomainError::DuplicateAllele(v));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn to_bits(&self) -> Option<Vec<bool>> {
        self.genes.iter().map(Gene::as_bool).collect()
    }

    /// Alleles of an integer or permutation chromosome.
    pub fn to_integers(&self) -> Option<Vec<i64>> {
        self.genes.iter().map(Gene::as_i64).collect()
    }

    pub fn to_floats(&self) -> Option<Vec<f64>> {
        self.genes.iter().map(Gene::as_f64).collect()
    }

    /// Mean allele value of a numeric chromosome.
    pub fn average(&self) -> Result<f64, DomainError> {
        if self.kind == GeneKind::Bit {
            return Err(DomainError::NotNumeric(self.kind));
        }
        if self.genes.is_empty() {
            return Err(DomainError::EmptyChromosome);
        }
        let sum: f64 = self.genes.iter().filter_map(Gene::numeric).sum();
        Ok(sum / self.genes.len() as f64)
    }

    /// Mutable gene storage for reordering and same-kind replacement.
    ///
    /// Callers must keep every gene's variant and, for permutations, must
    /// only reorder.
    pub(crate) fn genes_mut(&mut self) -> &mut [Gene] {
        &mut self.genes
    }

    /// A chromosome of the same kind and range holding `genes`.
    pub(crate) fn with_genes(&self, genes: Vec<Gene>) -> Self {
        debug_assert!(genes.iter().all(|g| g.kind() == self.kind));
        Self {
            kind: self.kind,
            genes,
            range: self.range,
        }
    }

    fn check_kind(&self, gene: &Gene) -> Result<(), DomainError> {
        if gene.kind() == self.kind {
            Ok(())
        } else {
            Err(DomainError::KindMismatch {
                expected: self.kind,
                found: gene.kind(),
            })
        }
    }

    fn check_unique(&self, gene: &Gene, replacing: Option<usize>) -> Result<(), DomainError> {
        let Gene::Permutation(value) = *gene else {
            return Ok(());
        };
        let clash = self
            .genes
            .iter()
            .enumerate()
            .any(|(i, g)| Some(i) != replacing && *g == Gene::Permutation(value));
        if clash {
            Err(DomainError::DuplicateAllele(value))
        } else {
            Ok(())
        }
    }

    fn check_index(&self, index: usize, bound: usize) -> Result<(), DomainError> {
        if index < bound {
            Ok(())
        } else {
            Err(DomainError::IndexOutOfBounds {
                index,
                len: self.genes.len(),
            })
        }
    }
}

impl Index<usize> for Chromosome {
    type Output = Gene;

    fn index(&self, index: usize) -> &Gene {
        &self.genes[index]
    }
}

impl<'a> IntoIterator for &'a Chromosome {
    type Item = &'a Gene;
    type IntoIter = std::slice::Iter<'a, Gene>;

    fn into_iter(self) -> Self::IntoIter {
        self.genes.iter()
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} chromosome [", self.kind)?;
        for (i, gene) in self.genes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{gene}")?;
        }
        f.write_str("]")
    }
}
