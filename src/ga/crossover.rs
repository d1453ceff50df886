//! Crossover operators.
//!
//! Every operator implements [`Crossover`]: it reads two parents and builds
//! one or two freshly allocated offspring. Parents are never modified and
//! offspring never share gene storage with them.
//!
//! # Operators
//!
//! - [`OnePointCrossover`]: random split point, tails exchanged
//! - [`FixedPointCrossover`]: caller-chosen split point
//! - [`TwoPointCrossover`]: middle segment exchanged
//! - [`UniformCrossover`]: independent per-position swaps
//! - [`Order1Crossover`] (OX): Davis (1985), preserves permutations
//!
//! Only [`Order1Crossover`] accepts permutation chromosomes; the positional
//! operators would duplicate values and fail with
//! [`CrossoverError::UnsupportedKind`] instead.
//!
//! # References
//!
//! - Davis (1985), "Applying Adaptive Algorithms to Epistatic Domains"
//! - Syswerda (1989), "Uniform Crossover in Genetic Algorithms"

use super::chromosome::{Chromosome, Gene, GeneKind};
use super::error::CrossoverError;
use super::types::{Individual, Offspring};
use rand::{Rng, RngCore};
use std::collections::HashSet;
use std::fmt;

/// A recombination strategy.
pub trait Crossover: Send + Sync + fmt::Debug {
    /// Produces offspring from two parents.
    ///
    /// # Errors
    /// Fails when the parents differ in kind or length, or when the operator
    /// cannot handle their chromosome kind or length.
    fn recombine(
        &self,
        parent_a: &Individual,
        parent_b: &Individual,
        rng: &mut dyn RngCore,
    ) -> Result<Offspring, CrossoverError>;

    /// Whether [`recombine`](Crossover::recombine) returns exactly one child.
    fn has_single_offspring(&self) -> bool;
}

/// Checks that both parents share kind and length; returns the length.
fn check_parents(a: &Chromosome, b: &Chromosome) -> Result<usize, CrossoverError> {
    if a.kind() != b.kind() {
        return Err(CrossoverError::KindMismatch {
            first: a.kind(),
            second: b.kind(),
        });
    }
    if a.len() != b.len() {
        return Err(CrossoverError::LengthMismatch {
            first: a.len(),
            second: b.len(),
        });
    }
    Ok(a.len())
}

fn reject_permutation(operator: &'static str, kind: GeneKind) -> Result<(), CrossoverError> {
    if kind == GeneKind::Permutation {
        Err(CrossoverError::UnsupportedKind { operator, kind })
    } else {
        Ok(())
    }
}

fn require_length(length: usize, required: usize) -> Result<(), CrossoverError> {
    if length < required {
        Err(CrossoverError::ChromosomeTooShort { length, required })
    } else {
        Ok(())
    }
}

fn into_offspring(single: bool, a: Chromosome, b: Chromosome) -> Offspring {
    if single {
        Offspring::Single(Individual::new(a))
    } else {
        Offspring::Pair(Individual::new(a), Individual::new(b))
    }
}

/// Head of `a` up to `point`, tail of `b` from `point`, and the complement.
fn exchange_tails(a: &[Gene], b: &[Gene], point: usize) -> (Vec<Gene>, Vec<Gene>) {
    let mut child_a = Vec::with_capacity(a.len());
    child_a.extend_from_slice(&a[..point]);
    child_a.extend_from_slice(&b[point..]);

    let mut child_b = Vec::with_capacity(b.len());
    child_b.extend_from_slice(&b[..point]);
    child_b.extend_from_slice(&a[point..]);

    (child_a, child_b)
}

// ============================================================================
// One-point / fixed-point
// ============================================================================

/// Single split point drawn uniformly from `[1, len - 1]`.
///
/// `child_a = a[..k] + b[k..]`, `child_b = b[..k] + a[k..]`.
#[derive(Debug, Clone, Default)]
pub struct OnePointCrossover {
    single_offspring: bool,
}

impl OnePointCrossover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_single_offspring(mut self, single: bool) -> Self {
        self.single_offspring = single;
        self
    }
}

impl Crossover for OnePointCrossover {
    fn recombine(
        &self,
        parent_a: &Individual,
        parent_b: &Individual,
        rng: &mut dyn RngCore,
    ) -> Result<Offspring, CrossoverError> {
        let (a, b) = (parent_a.chromosome(), parent_b.chromosome());
        let len = check_parents(a, b)?;
        reject_permutation("OnePointCrossover", a.kind())?;
        require_length(len, 2)?;

        let point = rng.random_range(1..len);
        let (genes_a, genes_b) = exchange_tails(a.genes(), b.genes(), point);
        Ok(into_offspring(
            self.single_offspring,
            a.with_genes(genes_a),
            b.with_genes(genes_b),
        ))
    }

    fn has_single_offspring(&self) -> bool {
        self.single_offspring
    }
}

/// One-point crossover at a caller-chosen split point.
///
/// The point must lie in `[1, len - 1]` for the parents being recombined.
#[derive(Debug, Clone)]
pub struct FixedPointCrossover {
    point: usize,
    single_offspring: bool,
}

impl FixedPointCrossover {
    pub fn new(point: usize) -> Self {
        Self {
            point,
            single_offspring: false,
        }
    }

    pub fn point(&self) -> usize {
        self.point
    }

    pub fn with_single_offspring(mut self, single: bool) -> Self {
        self.single_offspring = single;
        self
    }
}

impl Crossover for FixedPointCrossover {
    fn recombine(
        &self,
        parent_a: &Individual,
        parent_b: &Individual,
        _rng: &mut dyn RngCore,
    ) -> Result<Offspring, CrossoverError> {
        let (a, b) = (parent_a.chromosome(), parent_b.chromosome());
        let len = check_parents(a, b)?;
        reject_permutation("FixedPointCrossover", a.kind())?;
        if self.point == 0 || self.point >= len {
            return Err(CrossoverError::PointOutOfRange {
                point: self.point,
                length: len,
            });
        }

        let (genes_a, genes_b) = exchange_tails(a.genes(), b.genes(), self.point);
        Ok(into_offspring(
            self.single_offspring,
            a.with_genes(genes_a),
            b.with_genes(genes_b),
        ))
    }

    fn has_single_offspring(&self) -> bool {
        self.single_offspring
    }
}

// ============================================================================
// Two-point
// ============================================================================

/// Two distinct cut points `i < j` in `[1, len - 1]`; the segment `[i, j)`
/// is exchanged between the parents.
#[derive(Debug, Clone, Default)]
pub struct TwoPointCrossover {
    single_offspring: bool,
}

impl TwoPointCrossover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_single_offspring(mut self, single: bool) -> Self {
        self.single_offspring = single;
        self
    }
}

impl Crossover for TwoPointCrossover {
    fn recombine(
        &self,
        parent_a: &Individual,
        parent_b: &Individual,
        rng: &mut dyn RngCore,
    ) -> Result<Offspring, CrossoverError> {
        let (a, b) = (parent_a.chromosome(), parent_b.chromosome());
        let len = check_parents(a, b)?;
        reject_permutation("TwoPointCrossover", a.kind())?;
        require_length(len, 3)?;

        let cuts = rand::seq::index::sample(rng, len - 1, 2);
        let (x, y) = (cuts.index(0) + 1, cuts.index(1) + 1);
        let (start, end) = if x < y { (x, y) } else { (y, x) };

        let mut genes_a = a.genes().to_vec();
        let mut genes_b = b.genes().to_vec();
        genes_a[start..end].copy_from_slice(&b.genes()[start..end]);
        genes_b[start..end].copy_from_slice(&a.genes()[start..end]);

        Ok(into_offspring(
            self.single_offspring,
            a.with_genes(genes_a),
            b.with_genes(genes_b),
        ))
    }

    fn has_single_offspring(&self) -> bool {
        self.single_offspring
    }
}

// ============================================================================
// Uniform
// ============================================================================

/// Each position is swapped between the parents with probability `p`.
///
/// `p = 1.0` makes the first child a copy of the second parent; `p = 0.0`
/// makes it a copy of the first.
#[derive(Debug, Clone)]
pub struct UniformCrossover {
    probability: f64,
    single_offspring: bool,
}

impl Default for UniformCrossover {
    fn default() -> Self {
        Self {
            probability: 0.5,
            single_offspring: false,
        }
    }
}

impl UniformCrossover {
    /// # Errors
    /// [`CrossoverError::InvalidProbability`] unless `0 <= probability <= 1`.
    pub fn new(probability: f64) -> Result<Self, CrossoverError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(CrossoverError::InvalidProbability(probability));
        }
        Ok(Self {
            probability,
            single_offspring: false,
        })
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn with_single_offspring(mut self, single: bool) -> Self {
        self.single_offspring = single;
        self
    }
}

impl Crossover for UniformCrossover {
    fn recombine(
        &self,
        parent_a: &Individual,
        parent_b: &Individual,
        rng: &mut dyn RngCore,
    ) -> Result<Offspring, CrossoverError> {
        let (a, b) = (parent_a.chromosome(), parent_b.chromosome());
        check_parents(a, b)?;
        reject_permutation("UniformCrossover", a.kind())?;

        let mut genes_a = a.genes().to_vec();
        let mut genes_b = b.genes().to_vec();
        for (ga, gb) in genes_a.iter_mut().zip(genes_b.iter_mut()) {
            if rng.random_bool(self.probability) {
                std::mem::swap(ga, gb);
            }
        }

        Ok(into_offspring(
            self.single_offspring,
            a.with_genes(genes_a),
            b.with_genes(genes_b),
        ))
    }

    fn has_single_offspring(&self) -> bool {
        self.single_offspring
    }
}

// ============================================================================
// Order-1 (OX)
// ============================================================================

/// Order Crossover (OX) for permutation chromosomes.
///
/// Preserves the **relative order** of elements from both parents.
///
/// # Algorithm (Davis, 1985)
///
/// 1. Select a random segment `[start, end]`
/// 2. Copy the segment from one parent to the child at the same positions
/// 3. Fill remaining positions with elements from the other parent, in their
///    original order, skipping elements already present in the child
///
/// Both parents must be permutations of the same value set; every child is
/// then a permutation of that set.
///
/// # Complexity
/// O(n) time, O(n) space
#[derive(Debug, Clone, Default)]
pub struct Order1Crossover {
    single_offspring: bool,
}

impl Order1Crossover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_single_offspring(mut self, single: bool) -> Self {
        self.single_offspring = single;
        self
    }
}

impl Crossover for Order1Crossover {
    fn recombine(
        &self,
        parent_a: &Individual,
        parent_b: &Individual,
        rng: &mut dyn RngCore,
    ) -> Result<Offspring, CrossoverError> {
        let (a, b) = (parent_a.chromosome(), parent_b.chromosome());
        let n = check_parents(a, b)?;
        if a.kind() != GeneKind::Permutation {
            return Err(CrossoverError::UnsupportedKind {
                operator: "Order1Crossover",
                kind: a.kind(),
            });
        }
        if !same_value_set(a.genes(), b.genes()) {
            return Err(CrossoverError::IncompatiblePermutations);
        }

        if n < 2 {
            return Ok(into_offspring(self.single_offspring, a.clone(), b.clone()));
        }

        let (start, end) = random_segment(n, rng);

        let child_a = a.with_genes(ox_build_child(a.genes(), b.genes(), start, end));
        child_a.validate()?;
        let child_b = b.with_genes(ox_build_child(b.genes(), a.genes(), start, end));
        child_b.validate()?;

        Ok(into_offspring(self.single_offspring, child_a, child_b))
    }

    fn has_single_offspring(&self) -> bool {
        self.single_offspring
    }
}

fn same_value_set(a: &[Gene], b: &[Gene]) -> bool {
    let mut va: Vec<i64> = a.iter().filter_map(Gene::as_i64).collect();
    let mut vb: Vec<i64> = b.iter().filter_map(Gene::as_i64).collect();
    va.sort_unstable();
    vb.sort_unstable();
    va == vb
}

/// Build one OX child: copy segment from `template`, fill from `donor`.
fn ox_build_child(template: &[Gene], donor: &[Gene], start: usize, end: usize) -> Vec<Gene> {
    let n = template.len();
    let mut child: Vec<Option<Gene>> = vec![None; n];
    let mut in_segment: HashSet<i64> = HashSet::with_capacity(end - start + 1);

    // Step 1: Copy segment from template
    for i in start..=end {
        child[i] = Some(template[i]);
        if let Some(v) = template[i].as_i64() {
            in_segment.insert(v);
        }
    }

    // Step 2: Fill from donor, starting after segment end, wrapping around
    let mut pos = (end + 1) % n;
    for offset in 0..n {
        let gene = donor[(end + 1 + offset) % n];
        let seen = gene.as_i64().is_some_and(|v| in_segment.contains(&v));
        if !seen {
            child[pos] = Some(gene);
            pos = (pos + 1) % n;
        }
    }

    child.into_iter().flatten().collect()
}

/// Pick a random segment `[start, end]` within `0..n` where `start <= end`.
pub(crate) fn random_segment(n: usize, rng: &mut dyn RngCore) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use proptest::prelude::*;

    fn ints(values: &[i64]) -> Individual {
        Individual::new(Chromosome::from_integers(values.iter().copied()))
    }

    fn perm(values: &[i64]) -> Individual {
        Individual::new(Chromosome::from_permutation(values.iter().copied()).unwrap())
    }

    fn alleles(offspring: &Offspring) -> (Vec<i64>, Vec<i64>) {
        (
            offspring.first().chromosome().to_integers().unwrap(),
            offspring.second().unwrap().chromosome().to_integers().unwrap(),
        )
    }

    // ---- Parent compatibility ----

    #[test]
    fn test_kind_mismatch_rejected() {
        let mut rng = create_rng(42);
        let a = ints(&[1, 2, 3]);
        let b = Individual::new(Chromosome::from_floats([1.0, 2.0, 3.0]));
        assert_eq!(
            OnePointCrossover::new().recombine(&a, &b, &mut rng).unwrap_err(),
            CrossoverError::KindMismatch {
                first: GeneKind::Integer,
                second: GeneKind::Float
            }
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut rng = create_rng(42);
        let a = ints(&[1, 2, 3]);
        let b = ints(&[1, 2]);
        assert_eq!(
            UniformCrossover::default().recombine(&a, &b, &mut rng).unwrap_err(),
            CrossoverError::LengthMismatch {
                first: 3,
                second: 2
            }
        );
    }

    #[test]
    fn test_positional_operators_reject_permutations() {
        let mut rng = create_rng(42);
        let a = perm(&[0, 1, 2, 3, 4]);
        let b = perm(&[4, 3, 2, 1, 0]);
        let operators: Vec<Box<dyn Crossover>> = vec![
            Box::new(OnePointCrossover::new()),
            Box::new(FixedPointCrossover::new(2)),
            Box::new(TwoPointCrossover::new()),
            Box::new(UniformCrossover::default()),
        ];
        for op in &operators {
            assert!(
                matches!(
                    op.recombine(&a, &b, &mut rng),
                    Err(CrossoverError::UnsupportedKind {
                        kind: GeneKind::Permutation,
                        ..
                    })
                ),
                "{op:?} accepted a permutation"
            );
        }
    }

    // ---- One-point ----

    #[test]
    fn test_one_point_mixes_both_parents() {
        let mut rng = create_rng(42);
        let a = ints(&(0..50).collect::<Vec<_>>());
        let b = ints(&(100..150).collect::<Vec<_>>());
        let offspring = OnePointCrossover::new().recombine(&a, &b, &mut rng).unwrap();
        assert_eq!(offspring.len(), 2);
        let (c1, c2) = alleles(&offspring);
        assert!(c1.iter().any(|&v| v < 100) && c1.iter().any(|&v| v >= 100));
        assert!(c2.iter().any(|&v| v < 100) && c2.iter().any(|&v| v >= 100));
    }

    #[test]
    fn test_one_point_needs_two_genes() {
        let mut rng = create_rng(42);
        assert_eq!(
            OnePointCrossover::new()
                .recombine(&ints(&[1]), &ints(&[2]), &mut rng)
                .unwrap_err(),
            CrossoverError::ChromosomeTooShort {
                length: 1,
                required: 2
            }
        );
    }

    #[test]
    fn test_single_offspring_flag() {
        let mut rng = create_rng(42);
        let op = OnePointCrossover::new().with_single_offspring(true);
        assert!(op.has_single_offspring());
        let offspring = op.recombine(&ints(&[1, 2, 3]), &ints(&[4, 5, 6]), &mut rng).unwrap();
        assert!(matches!(offspring, Offspring::Single(_)));
    }

    #[test]
    fn test_offspring_are_unevaluated_and_parents_untouched() {
        let mut rng = create_rng(42);
        let mut a = ints(&[1, 2, 3, 4]);
        a.set_fitness(10.0);
        let b = ints(&[5, 6, 7, 8]);
        let offspring = TwoPointCrossover::new().recombine(&a, &b, &mut rng).unwrap();
        assert!(!offspring.first().is_evaluated());
        assert_eq!(a.chromosome().to_integers(), Some(vec![1, 2, 3, 4]));
        assert_eq!(b.chromosome().to_integers(), Some(vec![5, 6, 7, 8]));
    }

    proptest! {
        #[test]
        fn prop_one_point_partitions_parents(seed in any::<u64>(), len in 2usize..40) {
            let mut rng = create_rng(seed);
            let a: Vec<i64> = (0..len as i64).collect();
            let b: Vec<i64> = (1000..1000 + len as i64).collect();
            let offspring = OnePointCrossover::new()
                .recombine(&ints(&a), &ints(&b), &mut rng)
                .unwrap();
            let (c1, c2) = alleles(&offspring);

            let k = c1.iter().zip(&a).take_while(|(x, y)| x == y).count();
            prop_assert!(k >= 1 && k <= len - 1);
            prop_assert_eq!(&c1[..k], &a[..k]);
            prop_assert_eq!(&c1[k..], &b[k..]);
            prop_assert_eq!(&c2[..k], &b[..k]);
            prop_assert_eq!(&c2[k..], &a[k..]);
        }
    }

    // ---- Fixed-point ----

    #[test]
    fn test_fixed_point_split() {
        let mut rng = create_rng(42);
        let x: Vec<i64> = (0..10).collect();
        let y: Vec<i64> = (10..20).collect();
        let offspring = FixedPointCrossover::new(3)
            .recombine(&ints(&x), &ints(&y), &mut rng)
            .unwrap();
        let (c1, c2) = alleles(&offspring);
        assert_eq!(&c1[..3], &x[..3]);
        assert_eq!(&c1[3..], &y[3..]);
        assert_eq!(&c2[..3], &y[..3]);
        assert_eq!(&c2[3..], &x[3..]);
    }

    #[test]
    fn test_fixed_point_out_of_range() {
        let mut rng = create_rng(42);
        for point in [0, 5, 9] {
            assert_eq!(
                FixedPointCrossover::new(point)
                    .recombine(&ints(&[1, 2, 3, 4, 5]), &ints(&[5, 4, 3, 2, 1]), &mut rng)
                    .unwrap_err(),
                CrossoverError::PointOutOfRange {
                    point,
                    length: 5
                }
            );
        }
    }

    // ---- Two-point ----

    #[test]
    fn test_two_point_differs_from_both_parents() {
        let mut rng = create_rng(42);
        let x = [1, 2, 3, 4, 5, 6];
        let y = [11, 12, 13, 14, 15, 16];
        for _ in 0..100 {
            let offspring = TwoPointCrossover::new()
                .recombine(&ints(&x), &ints(&y), &mut rng)
                .unwrap();
            let (c1, c2) = alleles(&offspring);
            assert_ne!(c1, x.to_vec());
            assert_ne!(c1, y.to_vec());
            // First and last positions are never exchanged.
            assert_eq!(c1[0], 1);
            assert_eq!(c2[0], 11);
            // Each position comes from exactly one parent.
            for i in 0..6 {
                assert!(
                    (c1[i] == x[i] && c2[i] == y[i]) || (c1[i] == y[i] && c2[i] == x[i])
                );
            }
        }
    }

    #[test]
    fn test_two_point_needs_three_genes() {
        let mut rng = create_rng(42);
        assert!(matches!(
            TwoPointCrossover::new().recombine(&ints(&[1, 2]), &ints(&[3, 4]), &mut rng),
            Err(CrossoverError::ChromosomeTooShort { required: 3, .. })
        ));
    }

    // ---- Uniform ----

    #[test]
    fn test_uniform_probability_extremes() {
        let mut rng = create_rng(42);
        let x = Individual::new(Chromosome::from_floats([0.1, 0.2, 0.3, 0.4, 0.5]));
        let y = Individual::new(Chromosome::from_floats([1.1, 1.2, 1.3, 1.4, 1.5]));

        let all = UniformCrossover::new(1.0).unwrap().recombine(&x, &y, &mut rng).unwrap();
        assert_eq!(all.first().chromosome().genes(), y.chromosome().genes());
        assert_eq!(all.second().unwrap().chromosome().genes(), x.chromosome().genes());

        let none = UniformCrossover::new(0.0).unwrap().recombine(&x, &y, &mut rng).unwrap();
        assert_eq!(none.first().chromosome().genes(), x.chromosome().genes());
        assert_eq!(none.second().unwrap().chromosome().genes(), y.chromosome().genes());
    }

    #[test]
    fn test_uniform_invalid_probability() {
        assert_eq!(
            UniformCrossover::new(-0.1).unwrap_err(),
            CrossoverError::InvalidProbability(-0.1)
        );
        assert!(UniformCrossover::new(1.1).is_err());
        assert!(UniformCrossover::new(f64::NAN).is_err());
    }

    // ---- Order-1 ----

    #[test]
    fn test_order1_requires_permutations() {
        let mut rng = create_rng(42);
        assert!(matches!(
            Order1Crossover::new().recombine(&ints(&[0, 1, 2]), &ints(&[2, 1, 0]), &mut rng),
            Err(CrossoverError::UnsupportedKind {
                kind: GeneKind::Integer,
                ..
            })
        ));
    }

    #[test]
    fn test_order1_rejects_different_value_sets() {
        let mut rng = create_rng(42);
        assert_eq!(
            Order1Crossover::new()
                .recombine(&perm(&[0, 1, 2]), &perm(&[1, 2, 3]), &mut rng)
                .unwrap_err(),
            CrossoverError::IncompatiblePermutations
        );
    }

    #[test]
    fn test_order1_single_element() {
        let mut rng = create_rng(42);
        let offspring = Order1Crossover::new()
            .recombine(&perm(&[7]), &perm(&[7]), &mut rng)
            .unwrap();
        assert_eq!(alleles(&offspring), (vec![7], vec![7]));
    }

    #[test]
    fn test_order1_identical_parents() {
        let mut rng = create_rng(42);
        let p = [3, 1, 4, 0, 2];
        let offspring = Order1Crossover::new()
            .recombine(&perm(&p), &perm(&p), &mut rng)
            .unwrap();
        assert_eq!(alleles(&offspring), (p.to_vec(), p.to_vec()));
    }

    proptest! {
        #[test]
        fn prop_order1_children_are_permutations(seed in any::<u64>(), len in 1usize..30, start in -5i64..5) {
            let mut rng = create_rng(seed);
            let a = Individual::new(Chromosome::random_permutation(len, start, &mut rng));
            let b = Individual::new(Chromosome::random_permutation(len, start, &mut rng));
            let offspring = Order1Crossover::new().recombine(&a, &b, &mut rng).unwrap();

            let expected: Vec<i64> = (start..start + len as i64).collect();
            for child in offspring.into_individuals() {
                prop_assert_eq!(child.chromosome().kind(), GeneKind::Permutation);
                let mut values = child.chromosome().to_integers().unwrap();
                values.sort_unstable();
                prop_assert_eq!(&values, &expected);
            }
        }
    }

    #[test]
    fn test_random_segment_bounds() {
        let mut rng = create_rng(42);
        for _ in 0..1000 {
            let (start, end) = random_segment(10, &mut rng);
            assert!(start <= end);
            assert!(end < 10);
        }
    }
}
