//! Pluggable genetic-algorithm engine.
//!
//! - **Data model**: bit, integer, float and permutation chromosomes with
//!   invariant-checked editing.
//! - **Operators**: interchangeable selection, crossover and mutation
//!   strategies behind small traits.
//! - **Engine**: a generational loop with elitism, parallel fitness
//!   evaluation on an owned worker pool, bounded retry of failed
//!   reproduction attempts, and disjunctive stop conditions.
//!
//! # Architecture
//!
//! The crate contains no problem-specific concepts. Fitness is an opaque
//! callback; everything it needs is reachable from the
//! [`Individual`](ga::Individual) it receives.
//!
//! Logging goes through `tracing`; install a subscriber in the binary to see
//! it.

pub mod ga;
pub mod random;
