use crate::codec;
use crate::config::ExpressionConfig;
use crate::engines::evaluation::evaluate;
use crate::engines::generation::crossover::crossover_trees;
use crate::engines::generation::mutation::{self, MutationRates};
use crate::engines::generation::random::random_expression;
use crate::engines::generation::weights::{CrossoverWeights, MutationWeights};
use crate::error::{GenexprError, Result};
use crate::types::{Combinator, Node, Payload};
use crate::variables::VariableSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// One evolvable rule set: a boolean decision tree plus the variable
/// configuration and mutation rates it evolves under.
///
/// An instance exclusively owns its tree. Mutations edit it in place;
/// crossover clones both parents' trees before splicing, so distinct
/// instances never alias structure.
pub struct Expression {
    tree: Node,
    variables: VariableSet,
    rates: MutationRates,
    rng: StdRng,
}

impl Expression {
    pub fn new(config: ExpressionConfig) -> Result<Self> {
        let tree = codec::deserialize(&config.tree)?;
        Self::from_tree(tree, config)
    }

    /// Construct from an already-built tree, skipping the wire format.
    /// The `tree` field of `config` is ignored.
    pub fn from_tree(tree: Node, config: ExpressionConfig) -> Result<Self> {
        config.validate()?;
        let rng = build_rng(config.seed);
        let rates = MutationRates {
            min_percent: config.mutate_min_percent,
            max_percent: config.mutate_max_percent,
        };
        Self::from_parts(tree, VariableSet::new(config.variables), rates, rng)
    }

    fn from_parts(
        tree: Node,
        variables: VariableSet,
        rates: MutationRates,
        rng: StdRng,
    ) -> Result<Self> {
        if !tree.is_group() {
            return Err(GenexprError::InvalidRoot(
                "the root of the tree must be a logical group".to_string(),
            ));
        }
        Ok(Self {
            tree,
            variables,
            rates,
            rng,
        })
    }

    /// Snapshot of the instance as a construction config. The seed is
    /// not carried over; a rebuilt instance draws fresh entropy.
    pub fn config(&self) -> ExpressionConfig {
        ExpressionConfig {
            tree: codec::serialize(&self.tree),
            variables: self.variables.entries().clone(),
            mutate_min_percent: self.rates.min_percent,
            mutate_max_percent: self.rates.max_percent,
            seed: None,
        }
    }

    pub fn root(&self) -> &Node {
        &self.tree
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        self.tree.get(path)
    }

    pub fn node_count(&self) -> usize {
        self.tree.node_count()
    }

    pub fn variables(&self) -> &VariableSet {
        &self.variables
    }

    /// Reduce the tree to a boolean against a payload.
    pub fn evaluate(&self, payload: &Payload) -> bool {
        evaluate(&self.tree, payload)
    }

    /// Apply one weighted-random mutation primitive, retrying past
    /// transient failures.
    pub fn mutate(&mut self, weights: Option<MutationWeights>) -> Result<()> {
        mutation::mutate(
            &mut self.tree,
            &self.variables,
            self.rates,
            weights.unwrap_or_default(),
            &mut self.rng,
        )
    }

    /// Append a freshly generated node to a random group.
    pub fn add_random_expression(&mut self) -> Result<()> {
        mutation::add_random(&mut self.tree, &self.variables, &mut self.rng)
    }

    /// Remove a random child from a random group holding more than one
    /// child. Returns whether anything was removed.
    pub fn remove_random_expression(&mut self) -> bool {
        mutation::remove_random(&mut self.tree, &mut self.rng)
    }

    /// Re-draw the constant of a random one-sided leaf.
    pub fn mutate_random_expression(&mut self) -> Result<()> {
        mutation::perturb_random(&mut self.tree, &self.variables, self.rates, &mut self.rng)
    }

    /// Replace the tree with a fresh single-expression group under a
    /// random combinator.
    pub fn set_random_tree(&mut self) -> Result<()> {
        let combinator = Combinator::ALL[self.rng.gen_range(0..Combinator::ALL.len())];
        let child = random_expression(&self.variables, false, &mut self.rng)?;
        self.tree = Node::Group {
            combinator,
            children: vec![child],
        };
        log::debug!("regenerated tree: {}", self.tree);
        Ok(())
    }

    /// Uniform draw from a bounded variable's range, rounded to its
    /// precision.
    pub fn random_value(&mut self, name: &str) -> Result<f64> {
        self.variables.random_value(name, &mut self.rng)
    }

    /// Decimal precision of a variable, explicit or inferred from its
    /// bound range.
    pub fn variable_decimals(&self, name: &str) -> Result<u32> {
        self.variables.decimals(name)
    }

    /// Shift a value by a random share of the variable's range without
    /// crossing its bounds.
    pub fn modify_by_random_percent(&mut self, name: &str, value: f64) -> Result<f64> {
        mutation::modify_by_random_percent(
            &self.variables,
            self.rates,
            name,
            value,
            &mut self.rng,
        )
    }

    /// The tree in its JSON-safe wire format.
    pub fn serialize(&self) -> serde_json::Value {
        codec::serialize(&self.tree)
    }

    /// Rebuild a tree from the wire format.
    pub fn deserialize(value: &serde_json::Value) -> Result<Node> {
        codec::deserialize(value)
    }

    /// Breed a new instance from two parents. Parents are read-only;
    /// the offspring takes the basis node's combinator, the spliced
    /// children, and a copy of the first parent's configuration.
    pub fn crossover(
        a: &Expression,
        b: &Expression,
        weights: Option<CrossoverWeights>,
    ) -> Result<Expression> {
        let mut rng = StdRng::from_entropy();
        let (combinator, children) =
            crossover_trees(&a.tree, &b.tree, weights.unwrap_or_default(), &mut rng)?;
        log::debug!("crossover offspring has {} top-level children", children.len());
        Self::from_parts(
            Node::Group {
                combinator,
                children,
            },
            a.variables.clone(),
            a.rates,
            rng,
        )
    }
}

fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config_builds_an_empty_group() {
        let expression = Expression::new(ExpressionConfig::default()).unwrap();
        assert_eq!(expression.node_count(), 1);
        assert!(expression.evaluate(&Payload::new()));
    }

    #[test]
    fn test_leaf_root_is_rejected() {
        let config = ExpressionConfig {
            tree: json!(["eq", 1.0, 1.0]),
            ..Default::default()
        };
        assert!(matches!(
            Expression::new(config),
            Err(GenexprError::InvalidRoot(_))
        ));
    }

    #[test]
    fn test_from_tree_skips_the_wire_format() {
        use crate::types::{Operand, Operator};

        let tree = Node::Group {
            combinator: Combinator::Some,
            children: vec![Node::Leaf {
                operator: Operator::Gt,
                lhs: Operand::Variable("RSI14".to_string()),
                rhs: Operand::Constant(70.0),
            }],
        };
        // The config's own tree field is ignored in favor of the built one.
        let config = ExpressionConfig {
            tree: json!(["every", [["eq", 1.0, 2.0]]]),
            ..Default::default()
        };
        let expression = Expression::from_tree(tree.clone(), config).unwrap();
        assert_eq!(expression.root(), &tree);

        assert!(matches!(
            Expression::from_tree(
                Node::Leaf {
                    operator: Operator::Eq,
                    lhs: Operand::Constant(1.0),
                    rhs: Operand::Constant(1.0),
                },
                ExpressionConfig::default(),
            ),
            Err(GenexprError::InvalidRoot(_))
        ));
    }

    #[test]
    fn test_config_snapshot_round_trips() {
        let config = ExpressionConfig {
            tree: json!(["some", [["gt", { "__wrapped": true, "name": "RSI14" }, 70.0]]]),
            ..Default::default()
        };
        let expression = Expression::new(config).unwrap();
        let rebuilt = Expression::new(expression.config()).unwrap();
        assert_eq!(rebuilt.root(), expression.root());
    }
}
