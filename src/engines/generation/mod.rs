pub mod crossover;
pub mod mutation;
pub mod random;
pub mod weights;

pub use crossover::crossover_trees;
pub use mutation::{modify_by_random_percent, mutate, MutationRates};
pub use random::random_expression;
pub use weights::{CrossoverWeights, MutationWeights};
