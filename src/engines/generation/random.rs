use crate::error::{GenexprError, Result};
use crate::types::{Combinator, Node, Operand, Operator};
use crate::variables::VariableSet;
use rand::Rng;

/// Probability of generating a leaf instead of a nested group.
const LEAF_PROBABILITY: f64 = 0.8;

/// Generate a random sub-expression from the configured variables.
///
/// With `force_leaf` the nested-group branch is disabled. The group
/// branch wraps a single forced-leaf child, which caps fresh structures
/// at two nesting levels per call and keeps generation from recursing
/// without bound.
pub fn random_expression<R: Rng>(
    variables: &VariableSet,
    force_leaf: bool,
    rng: &mut R,
) -> Result<Node> {
    if !variables.has_usable() {
        return Err(GenexprError::NoUsableVariables);
    }

    if force_leaf || rng.gen::<f64>() < LEAF_PROBABILITY {
        random_leaf(variables, rng)
    } else {
        let combinator = Combinator::ALL[rng.gen_range(0..Combinator::ALL.len())];
        let child = random_expression(variables, true, rng)?;
        Ok(Node::Group {
            combinator,
            children: vec![child],
        })
    }
}

fn random_leaf<R: Rng>(variables: &VariableSet, rng: &mut R) -> Result<Node> {
    let operator = Operator::ALL[rng.gen_range(0..Operator::ALL.len())];
    let bounded = variables.bounded_names();
    let comparable = variables.comparable_names();

    // One-sided leaf: a bounded variable against a fresh constant drawn
    // from its own range.
    if comparable.is_empty() || (rng.gen_bool(0.5) && !bounded.is_empty()) {
        let name = bounded[rng.gen_range(0..bounded.len())];
        let value = variables.random_value(name, rng)?;
        return Ok(Node::Leaf {
            operator,
            lhs: Operand::Variable(name.to_string()),
            rhs: Operand::Constant(value),
        });
    }

    // Variable against one of its configured comparison partners.
    let name = comparable[rng.gen_range(0..comparable.len())];
    let partners = variables
        .get(name)
        .and_then(|variable| variable.compare.as_deref())
        .filter(|partners| !partners.is_empty())
        .ok_or(GenexprError::NoUsableVariables)?;
    let partner = partners[rng.gen_range(0..partners.len())].clone();
    Ok(Node::Leaf {
        operator,
        lhs: Operand::Variable(name.to_string()),
        rhs: Operand::Variable(partner),
    })
}
