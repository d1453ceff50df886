//! Criterion benchmarks for the u-evolve engine.
//!
//! Uses synthetic problems (OneMax, a tour over points on a circle) to
//! measure engine overhead independent of any domain.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use u_evolve::ga::{
    BitFlipMutator, Chromosome, GeneticAlgorithm, GeneticConfig, Individual, InversionMutator,
    Order1Crossover, Population, TournamentSelector,
};
use u_evolve::random::create_rng;

// ===========================================================================
// OneMax: maximize number of 1-bits
// ===========================================================================

fn onemax_population(size: usize, len: usize) -> Population {
    let mut rng = create_rng(42);
    (0..size)
        .map(|_| Individual::new(Chromosome::random_bits(len, &mut rng)))
        .collect()
}

fn onemax(ind: &mut Individual) {
    let ones = ind
        .chromosome()
        .iter()
        .filter(|g| g.as_bool() == Some(true))
        .count();
    ind.set_fitness(ones as f64);
}

// ===========================================================================
// Circle tour: points evenly spaced on a unit circle, optimum visits them
// in order. Fitness is the negative tour length.
// ===========================================================================

fn tour_population(size: usize, cities: usize) -> Population {
    let mut rng = create_rng(42);
    (0..size)
        .map(|_| Individual::new(Chromosome::random_permutation(cities, 0, &mut rng)))
        .collect()
}

fn circle_tour(ind: &mut Individual) {
    let Some(order) = ind.chromosome().to_integers() else {
        return;
    };
    let n = order.len() as f64;
    let point = |i: i64| {
        let angle = std::f64::consts::TAU * i as f64 / n;
        (angle.cos(), angle.sin())
    };
    let length: f64 = order
        .iter()
        .zip(order.iter().cycle().skip(1))
        .map(|(&a, &b)| {
            let (ax, ay) = point(a);
            let (bx, by) = point(b);
            (ax - bx).hypot(ay - by)
        })
        .sum();
    ind.set_fitness(-length);
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_onemax(c: &mut Criterion) {
    let mut group = c.benchmark_group("ga_onemax");
    group.sample_size(10);

    for (len, pop, gen) in [(32usize, 50usize, 50usize), (128, 100, 30), (512, 100, 20)] {
        group.bench_with_input(
            BenchmarkId::new(format!("l{}_p{}_g{}", len, pop, gen), len),
            &(len, pop, gen),
            |b, &(len, pop, gen)| {
                b.iter(|| {
                    let config = GeneticConfig::default()
                        .with_selector(TournamentSelector::new(3).expect("valid size"))
                        .with_mutator(BitFlipMutator::new())
                        .with_mutation_rate(1.0 / len as f64)
                        .with_max_generation(gen)
                        .with_seed(42);
                    let mut ga = GeneticAlgorithm::new(config).expect("valid config");
                    let reason = ga.evolve(black_box(onemax_population(pop, len)), onemax);
                    black_box(reason)
                })
            },
        );
    }

    group.finish();
}

fn bench_circle_tour(c: &mut Criterion) {
    let mut group = c.benchmark_group("ga_circle_tour");
    group.sample_size(10);

    for &cities in &[20usize, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(cities), &cities, |b, &cities| {
            b.iter(|| {
                let config = GeneticConfig::default()
                    .with_selector(TournamentSelector::new(3).expect("valid size"))
                    .with_crossover(Order1Crossover::new())
                    .with_mutator(InversionMutator::new())
                    .with_mutation_rate(0.2)
                    .with_elitism_size(2)
                    .with_max_generation(30)
                    .with_seed(42);
                let mut ga = GeneticAlgorithm::new(config).expect("valid config");
                let reason = ga.evolve(black_box(tour_population(100, cities)), circle_tour);
                black_box(reason)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_onemax, bench_circle_tour);
criterion_main!(benches);
