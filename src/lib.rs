//! Evolvable boolean decision-expression trees.
//!
//! `genexpr` represents rule sets (for example trading-signal entry
//! conditions) as trees of logical groups and comparison leaves, and
//! evolves them with genetic operators: weighted random mutation,
//! add/remove of sub-expressions, and two-point crossover between
//! parents. Fitness scoring and the population loop belong to the
//! caller; this crate owns the representation, the operators, and the
//! JSON wire format.
//!
//! ```
//! use genexpr::{Expression, ExpressionConfig, Payload, VariableConfig};
//!
//! let mut config = ExpressionConfig::default();
//! config
//!     .variables
//!     .insert("RSI14".to_string(), VariableConfig::bounded(0.0, 100.0));
//! config.seed = Some(42);
//!
//! let mut expression = Expression::new(config).unwrap();
//! expression.set_random_tree().unwrap();
//! expression.mutate(None).unwrap();
//!
//! let payload: Payload = [("RSI14".to_string(), 55.0)].into_iter().collect();
//! let _signal = expression.evaluate(&payload);
//!
//! let wire = expression.serialize();
//! assert_eq!(Expression::deserialize(&wire).unwrap(), *expression.root());
//! ```

pub mod codec;
pub mod config;
pub mod engines;
pub mod error;
pub mod expression;
pub mod types;
pub mod variables;

pub use config::{ExpressionConfig, VariableConfig};
pub use engines::evaluation::evaluate;
pub use engines::generation::{CrossoverWeights, MutationRates, MutationWeights};
pub use error::{GenexprError, Result};
pub use expression::Expression;
pub use types::{Combinator, Node, NodePath, Operand, Operator, Payload};
pub use variables::VariableSet;
