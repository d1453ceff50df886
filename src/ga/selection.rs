//! Parent selection strategies.
//!
//! Selection determines which individuals are chosen as parents for
//! crossover. Different strategies provide different selection pressure.
//! Every strategy implements [`Selector`]; the engine holds one as
//! `Box<dyn Selector>`.
//!
//! All strategies assume **maximization** (higher fitness = better).
//! Selection never modifies the population.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use super::error::SelectionError;
use super::types::{Individual, Population};
use rand::{Rng, RngCore};
use std::fmt;

/// Redraws attempted before the second parent falls back to a uniform pick
/// among the remaining individuals.
const DISTINCT_PARENT_RETRIES: usize = 32;

/// A parent selection strategy.
///
/// Implementors provide [`select_index`](Selector::select_index); the parent
/// pair logic, including incest prevention, is shared.
pub trait Selector: Send + Sync + fmt::Debug {
    /// Picks the index of one individual.
    fn select_index(
        &self,
        population: &Population,
        rng: &mut dyn RngCore,
    ) -> Result<usize, SelectionError>;

    /// Whether the two parents of a couple must be different individuals.
    fn incest_prevention(&self) -> bool;

    /// Whether [`select_parents`](Selector::select_parents) must return two
    /// distinct individuals. Defaults to the incest prevention flag.
    fn requires_distinct_parents(&self) -> bool {
        self.incest_prevention()
    }

    /// Picks one individual.
    fn select<'a>(
        &self,
        population: &'a Population,
        rng: &mut dyn RngCore,
    ) -> Result<&'a Individual, SelectionError> {
        let idx = self.select_index(population, rng)?;
        Ok(&population[idx])
    }

    /// Picks the indices of a parent couple.
    ///
    /// When distinct parents are required, the second parent is redrawn a
    /// bounded number of times and then taken uniformly from the other
    /// individuals, so this never loops forever.
    ///
    /// # Errors
    /// [`SelectionError::NotEnoughIndividuals`] when distinct parents are
    /// required and the population holds fewer than two individuals, plus
    /// any error of the strategy itself.
    fn select_parent_indices(
        &self,
        population: &Population,
        rng: &mut dyn RngCore,
    ) -> Result<(usize, usize), SelectionError> {
        if !self.requires_distinct_parents() {
            let first = self.select_index(population, rng)?;
            let second = self.select_index(population, rng)?;
            return Ok((first, second));
        }

        let n = population.len();
        if n < 2 {
            return Err(SelectionError::NotEnoughIndividuals {
                required: 2,
                available: n,
            });
        }

        let first = self.select_index(population, rng)?;
        for _ in 0..DISTINCT_PARENT_RETRIES {
            let second = self.select_index(population, rng)?;
            if second != first {
                return Ok((first, second));
            }
        }

        let mut second = rng.random_range(0..n - 1);
        if second >= first {
            second += 1;
        }
        Ok((first, second))
    }

    /// Picks a parent couple.
    fn select_parents<'a>(
        &self,
        population: &'a Population,
        rng: &mut dyn RngCore,
    ) -> Result<(&'a Individual, &'a Individual), SelectionError> {
        let (a, b) = self.select_parent_indices(population, rng)?;
        Ok((&population[a], &population[b]))
    }
}

fn ensure_not_empty(population: &Population) -> Result<usize, SelectionError> {
    match population.len() {
        0 => Err(SelectionError::EmptyPopulation),
        n => Ok(n),
    }
}

/// Uniform random selection.
#[derive(Debug, Clone, Default)]
pub struct RandomSelector {
    incest_prevention: bool,
}

impl RandomSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_incest_prevention(mut self, enabled: bool) -> Self {
        self.incest_prevention = enabled;
        self
    }
}

impl Selector for RandomSelector {
    fn select_index(
        &self,
        population: &Population,
        rng: &mut dyn RngCore,
    ) -> Result<usize, SelectionError> {
        let n = ensure_not_empty(population)?;
        Ok(rng.random_range(0..n))
    }

    fn incest_prevention(&self) -> bool {
        self.incest_prevention
    }
}

/// Fitness-proportionate (roulette wheel) selection.
///
/// Probability of selection is proportional to fitness, which must be
/// non-negative. When every fitness is zero the pick is uniform.
///
/// **Warning**: Susceptible to super-individual dominance when
/// fitness variance is high.
///
/// # Complexity
/// O(n) per selection (linear scan)
#[derive(Debug, Clone, Default)]
pub struct RouletteSelector {
    incest_prevention: bool,
}

impl RouletteSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_incest_prevention(mut self, enabled: bool) -> Self {
        self.incest_prevention = enabled;
        self
    }
}

impl Selector for RouletteSelector {
    fn select_index(
        &self,
        population: &Population,
        rng: &mut dyn RngCore,
    ) -> Result<usize, SelectionError> {
        let n = ensure_not_empty(population)?;
        if n == 1 {
            return Ok(0);
        }

        for (index, ind) in population.iter().enumerate() {
            let fitness = ind.fitness();
            if !(fitness >= 0.0) {
                return Err(SelectionError::NegativeFitness { index, fitness });
            }
        }

        // An infinitely fit individual takes the whole wheel.
        if let Some(idx) = population.iter().position(|ind| ind.fitness().is_infinite()) {
            return Ok(idx);
        }

        // Weights are scaled into [0, 1] so the total stays finite.
        let max = population.iter().map(Individual::fitness).fold(0.0, f64::max);
        if max <= 0.0 {
            return Ok(rng.random_range(0..n));
        }
        let total: f64 = population.iter().map(|ind| ind.fitness() / max).sum();

        let threshold = rng.random_range(0.0..total);
        let mut cumulative = 0.0;
        let mut last_positive = 0;
        for (i, ind) in population.iter().enumerate() {
            let w = ind.fitness() / max;
            if w > 0.0 {
                last_positive = i;
            }
            cumulative += w;
            if cumulative > threshold {
                return Ok(i);
            }
        }

        Ok(last_positive) // floating-point fallback
    }

    fn incest_prevention(&self) -> bool {
        self.incest_prevention
    }
}

/// Rank-based selection.
///
/// Individuals are ordered by fitness and selection probability is
/// proportional to rank position, not raw fitness value. This avoids
/// the scaling problems of roulette wheel selection.
///
/// Linear ranking: the worst individual has weight 1, the best weight `n`.
///
/// Reference: Baker (1985), "Adaptive Selection Methods for Genetic
/// Algorithms"
///
/// # Complexity
/// O(n log n) per selection (sort)
#[derive(Debug, Clone, Default)]
pub struct RankSelector {
    incest_prevention: bool,
}

impl RankSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_incest_prevention(mut self, enabled: bool) -> Self {
        self.incest_prevention = enabled;
        self
    }
}

impl Selector for RankSelector {
    fn select_index(
        &self,
        population: &Population,
        rng: &mut dyn RngCore,
    ) -> Result<usize, SelectionError> {
        let n = ensure_not_empty(population)?;
        if n == 1 {
            return Ok(0);
        }

        // Worst first, so position + 1 is the rank weight.
        let mut ranked: Vec<usize> = (0..n).collect();
        ranked.sort_by(|&a, &b| population[b].cmp_by_fitness_desc(&population[a]));

        let total = (n as u64) * (n as u64 + 1) / 2;
        let threshold = rng.random_range(0..total);
        let mut cumulative = 0u64;
        for (rank, &idx) in ranked.iter().enumerate() {
            cumulative += rank as u64 + 1;
            if cumulative > threshold {
                return Ok(idx);
            }
        }

        Ok(ranked[n - 1])
    }

    fn incest_prevention(&self) -> bool {
        self.incest_prevention
    }
}

/// Tournament selection: draw `size` distinct individuals at random and
/// keep the fittest.
///
/// Higher `size` = stronger selection pressure.
/// - 2: light pressure (good for diversity)
/// - 3-5: moderate pressure (typical default)
/// - >5: strong pressure (risk of premature convergence)
///
/// A tournament always yields two distinct parents, so
/// [`select_parents`](Selector::select_parents) needs at least two
/// individuals regardless of the incest prevention flag.
///
/// # Complexity
/// O(size) per selection
#[derive(Debug, Clone)]
pub struct TournamentSelector {
    size: usize,
    incest_prevention: bool,
}

impl TournamentSelector {
    /// # Errors
    /// [`SelectionError::InvalidTournamentSize`] when `size` is zero.
    pub fn new(size: usize) -> Result<Self, SelectionError> {
        if size == 0 {
            return Err(SelectionError::InvalidTournamentSize);
        }
        Ok(Self {
            size,
            incest_prevention: false,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn with_incest_prevention(mut self, enabled: bool) -> Self {
        self.incest_prevention = enabled;
        self
    }
}

impl Selector for TournamentSelector {
    fn select_index(
        &self,
        population: &Population,
        rng: &mut dyn RngCore,
    ) -> Result<usize, SelectionError> {
        let n = ensure_not_empty(population)?;
        if self.size > n {
            return Err(SelectionError::TournamentTooLarge {
                size: self.size,
                population: n,
            });
        }

        let contestants = rand::seq::index::sample(rng, n, self.size);
        let mut best: Option<usize> = None;
        for idx in contestants.iter() {
            best = match best {
                Some(b) if population[b].fitness() >= population[idx].fitness() => Some(b),
                _ => Some(idx),
            };
        }
        Ok(best.unwrap_or(0))
    }

    fn incest_prevention(&self) -> bool {
        self.incest_prevention
    }

    fn requires_distinct_parents(&self) -> bool {
        true
    }
}

/// Pairwise competition: two distinct individuals drawn uniformly, the
/// fitter one wins; equal fitness is decided by a coin flip.
///
/// The least fit individual can never win, so a size-2 population always
/// yields its better member.
#[derive(Debug, Clone, Default)]
pub struct CompetitionSelector {
    incest_prevention: bool,
}

impl CompetitionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_incest_prevention(mut self, enabled: bool) -> Self {
        self.incest_prevention = enabled;
        self
    }
}

impl Selector for CompetitionSelector {
    fn select_index(
        &self,
        population: &Population,
        rng: &mut dyn RngCore,
    ) -> Result<usize, SelectionError> {
        let n = ensure_not_empty(population)?;
        if n == 1 {
            return Ok(0);
        }

        let a = rng.random_range(0..n);
        let mut b = rng.random_range(0..n - 1);
        if b >= a {
            b += 1;
        }

        let (fa, fb) = (population[a].fitness(), population[b].fitness());
        let winner = if fa > fb {
            a
        } else if fb > fa {
            b
        } else if rng.random_bool(0.5) {
            a
        } else {
            b
        };
        Ok(winner)
    }

    fn incest_prevention(&self) -> bool {
        self.incest_prevention
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::Chromosome;
    use crate::random::create_rng;

    fn make_population(fitnesses: &[f64]) -> Population {
        fitnesses
            .iter()
            .enumerate()
            .map(|(i, &f)| Individual::with_fitness(Chromosome::from_integers([i as i64]), f))
            .collect()
    }

    fn count_selections<S: Selector>(selector: &S, pop: &Population, draws: usize) -> Vec<u32> {
        let mut rng = create_rng(42);
        let mut counts = vec![0u32; pop.len()];
        for _ in 0..draws {
            let idx = selector.select_index(pop, &mut rng).unwrap();
            counts[idx] += 1;
        }
        counts
    }

    // ---- Empty and single-individual populations ----

    #[test]
    fn test_empty_population_fails_for_every_selector() {
        let pop = Population::new();
        let mut rng = create_rng(42);
        let selectors: Vec<Box<dyn Selector>> = vec![
            Box::new(RandomSelector::new()),
            Box::new(RouletteSelector::new()),
            Box::new(RankSelector::new()),
            Box::new(TournamentSelector::new(1).unwrap()),
            Box::new(CompetitionSelector::new()),
        ];
        for selector in &selectors {
            assert_eq!(
                selector.select(&pop, &mut rng).unwrap_err(),
                SelectionError::EmptyPopulation,
                "{selector:?}"
            );
        }
    }

    #[test]
    fn test_single_individual_is_returned() {
        let pop = make_population(&[10.0]);
        let mut rng = create_rng(42);

        assert_eq!(RandomSelector::new().select_index(&pop, &mut rng), Ok(0));
        assert_eq!(RouletteSelector::new().select_index(&pop, &mut rng), Ok(0));
        assert_eq!(RankSelector::new().select_index(&pop, &mut rng), Ok(0));
        assert_eq!(CompetitionSelector::new().select_index(&pop, &mut rng), Ok(0));
        assert_eq!(
            TournamentSelector::new(1).unwrap().select_index(&pop, &mut rng),
            Ok(0)
        );
    }

    // ---- Tournament ----

    #[test]
    fn test_tournament_zero_size_rejected() {
        assert_eq!(
            TournamentSelector::new(0).unwrap_err(),
            SelectionError::InvalidTournamentSize
        );
    }

    #[test]
    fn test_tournament_size_exceeds_population() {
        let pop = make_population(&[1.0, 2.0, 3.0]);
        let mut rng = create_rng(42);
        let selector = TournamentSelector::new(4).unwrap();
        assert_eq!(
            selector.select(&pop, &mut rng).unwrap_err(),
            SelectionError::TournamentTooLarge {
                size: 4,
                population: 3
            }
        );
    }

    #[test]
    fn test_tournament_single_individual_cannot_form_couple() {
        let pop = make_population(&[10.0]);
        let mut rng = create_rng(42);
        let selector = TournamentSelector::new(1).unwrap();
        assert_eq!(
            selector.select_parents(&pop, &mut rng).unwrap_err(),
            SelectionError::NotEnoughIndividuals {
                required: 2,
                available: 1
            }
        );
    }

    #[test]
    fn test_tournament_parents_are_distinct() {
        let pop = make_population(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut rng = create_rng(42);
        let selector = TournamentSelector::new(2).unwrap();
        for _ in 0..200 {
            let (a, b) = selector.select_parent_indices(&pop, &mut rng).unwrap();
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_tournament_full_size_always_picks_best() {
        let pop = make_population(&[10.0, 5.0, 1.0, 8.0]);
        let counts = count_selections(&TournamentSelector::new(4).unwrap(), &pop, 1000);
        assert_eq!(counts, vec![1000, 0, 0, 0]);
    }

    #[test]
    fn test_tournament_size_1_is_random() {
        let pop = make_population(&[10.0, 5.0, 1.0, 8.0]);
        let counts = count_selections(&TournamentSelector::new(1).unwrap(), &pop, 10000);
        for &c in &counts {
            assert!(c > 1500, "expected uniform, got counts: {counts:?}");
        }
    }

    #[test]
    fn test_tournament_varies_couples() {
        let pop = make_population(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut rng = create_rng(3);
        let selector = TournamentSelector::new(2).unwrap();
        let mut outcomes = std::collections::HashSet::new();
        for _ in 0..20 {
            outcomes.insert(selector.select_parent_indices(&pop, &mut rng).unwrap());
        }
        assert!(outcomes.len() > 1);
    }

    // ---- Roulette ----

    #[test]
    fn test_roulette_favors_fitter() {
        let pop = make_population(&[1.0, 2.0, 3.0, 4.0, 10.0]);
        let counts = count_selections(&RouletteSelector::new(), &pop, 10000);
        assert!(
            counts[4] > counts[0],
            "fitter should be selected more often: {counts:?}"
        );
    }

    #[test]
    fn test_roulette_never_picks_zero_weight() {
        let pop = make_population(&[0.0, 3.0, 0.0, 1.0]);
        let counts = count_selections(&RouletteSelector::new(), &pop, 5000);
        assert_eq!(counts[0], 0);
        assert_eq!(counts[2], 0);
        assert!(counts[1] > counts[3]);
    }

    #[test]
    fn test_roulette_all_zero_is_uniform() {
        let pop = make_population(&[0.0, 0.0, 0.0, 0.0]);
        let counts = count_selections(&RouletteSelector::new(), &pop, 10000);
        for &c in &counts {
            assert!(c > 1500, "expected uniform, got counts: {counts:?}");
        }
    }

    #[test]
    fn test_roulette_handles_huge_fitness() {
        let pop = make_population(&[1e308, 1e308, 0.0]);
        let counts = count_selections(&RouletteSelector::new(), &pop, 2000);
        assert!(counts[0] > 0 && counts[1] > 0, "both should be reachable: {counts:?}");
        assert_eq!(counts[2], 0);
    }

    #[test]
    fn test_roulette_rejects_negative_fitness() {
        let pop = make_population(&[1.0, -2.0, 3.0]);
        let mut rng = create_rng(42);
        assert_eq!(
            RouletteSelector::new().select_index(&pop, &mut rng),
            Err(SelectionError::NegativeFitness {
                index: 1,
                fitness: -2.0
            })
        );
    }

    // ---- Rank ----

    #[test]
    fn test_rank_favors_higher_ranks() {
        let pop = make_population(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let counts = count_selections(&RankSelector::new(), &pop, 10000);
        assert!(counts[4] > counts[0], "{counts:?}");
        assert!(counts.iter().all(|&c| c > 0), "every rank should be reachable: {counts:?}");
    }

    #[test]
    fn test_rank_ignores_fitness_skew() {
        // The huge outlier only counts as rank n, not as 1e12 weight.
        let pop = make_population(&[1.0, 2.0, 1e12]);
        let counts = count_selections(&RankSelector::new(), &pop, 6000);
        // Expected shares: 1/6, 2/6, 3/6.
        assert!(counts[0] > 700 && counts[0] < 1300, "{counts:?}");
        assert!(counts[2] > 2700 && counts[2] < 3300, "{counts:?}");
    }

    // ---- Competition ----

    #[test]
    fn test_competition_two_individuals_picks_fitter() {
        let pop = make_population(&[1.0, 10.0]);
        let counts = count_selections(&CompetitionSelector::new(), &pop, 200);
        assert_eq!(counts, vec![0, 200]);
    }

    #[test]
    fn test_competition_win_rate_grows_with_fitness() {
        let pop = make_population(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let counts = count_selections(&CompetitionSelector::new(), &pop, 10000);
        for w in counts.windows(2) {
            assert!(w[0] < w[1], "win counts should increase with fitness: {counts:?}");
        }
    }

    // ---- Incest prevention ----

    #[test]
    fn test_incest_prevention_yields_distinct_parents() {
        let pop = make_population(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut rng = create_rng(42);
        let selectors: Vec<Box<dyn Selector>> = vec![
            Box::new(RandomSelector::new().with_incest_prevention(true)),
            Box::new(RouletteSelector::new().with_incest_prevention(true)),
            Box::new(RankSelector::new().with_incest_prevention(true)),
            Box::new(TournamentSelector::new(2).unwrap().with_incest_prevention(true)),
            Box::new(CompetitionSelector::new().with_incest_prevention(true)),
        ];
        for selector in &selectors {
            for _ in 0..200 {
                let (a, b) = selector.select_parents(&pop, &mut rng).unwrap();
                assert!(!std::ptr::eq(a, b), "{selector:?} returned the same parent twice");
            }
        }
    }

    #[test]
    fn test_incest_prevention_with_deterministic_winner_terminates() {
        // Competition on two individuals always returns index 1, so the
        // second parent has to come from the fallback draw.
        let pop = make_population(&[1.0, 10.0]);
        let mut rng = create_rng(42);
        let selector = CompetitionSelector::new().with_incest_prevention(true);
        assert_eq!(selector.select_parent_indices(&pop, &mut rng), Ok((1, 0)));
    }

    #[test]
    fn test_incest_prevention_single_individual_fails() {
        let pop = make_population(&[1.0]);
        let mut rng = create_rng(42);
        let selector = RandomSelector::new().with_incest_prevention(true);
        assert!(matches!(
            selector.select_parents(&pop, &mut rng),
            Err(SelectionError::NotEnoughIndividuals { .. })
        ));
    }

    #[test]
    fn test_without_incest_prevention_single_individual_pairs_with_itself() {
        let pop = make_population(&[1.0]);
        let mut rng = create_rng(42);
        let (a, b) = RandomSelector::new().select_parents(&pop, &mut rng).unwrap();
        assert!(std::ptr::eq(a, b));
    }
}
