use crate::engines::generation::random::random_expression;
use crate::engines::generation::weights::{weighted_pick, MutationWeights};
use crate::error::{GenexprError, Result};
use crate::types::{Node, Operand};
use crate::variables::{round_to, VariableSet};
use rand::Rng;

/// Percent window for value perturbation, relative to a variable's
/// bound range.
#[derive(Debug, Clone, Copy)]
pub struct MutationRates {
    pub min_percent: f64,
    pub max_percent: f64,
}

impl Default for MutationRates {
    fn default() -> Self {
        Self {
            min_percent: 0.05,
            max_percent: 0.15,
        }
    }
}

/// Retry budget for transiently impossible mutations.
const MAX_MUTATE_ATTEMPTS: usize = 50;

/// Apply one weighted-random mutation primitive to the tree.
///
/// Only `CantMutate` is retried, re-drawing the primitive each attempt
/// since eligible targets can appear after a structural edit. A removal
/// that finds no group with more than one child counts as a successful
/// no-op. Exhausting the budget propagates `CantMutate` as fatal.
pub fn mutate<R: Rng>(
    tree: &mut Node,
    variables: &VariableSet,
    rates: MutationRates,
    weights: MutationWeights,
    rng: &mut R,
) -> Result<()> {
    for _ in 0..MAX_MUTATE_ATTEMPTS {
        let primitive = weighted_pick(&[weights.add, weights.remove, weights.mutate], rng);
        let outcome = match primitive {
            0 => add_random(tree, variables, rng),
            1 => {
                remove_random(tree, rng);
                Ok(())
            }
            _ => perturb_random(tree, variables, rates, rng),
        };
        match outcome {
            Err(GenexprError::CantMutate) => continue,
            other => return other,
        }
    }

    log::warn!(
        "mutation retry budget exhausted after {} attempts",
        MAX_MUTATE_ATTEMPTS
    );
    Err(GenexprError::CantMutate)
}

/// Append a freshly generated node to a uniformly random group.
pub fn add_random<R: Rng>(tree: &mut Node, variables: &VariableSet, rng: &mut R) -> Result<()> {
    let expression = random_expression(variables, false, rng)?;
    let paths = tree.group_paths();
    if paths.is_empty() {
        return Err(GenexprError::InvalidRoot(
            "tree has no group node to extend".to_string(),
        ));
    }
    let path = &paths[rng.gen_range(0..paths.len())];
    if let Some(Node::Group { children, .. }) = tree.get_mut(path) {
        children.push(expression);
    }
    Ok(())
}

/// Remove a random child from a random group holding more than one.
/// Returns whether anything was removed; having no candidate group is
/// not an error.
pub fn remove_random<R: Rng>(tree: &mut Node, rng: &mut R) -> bool {
    let paths = tree.removable_group_paths();
    if paths.is_empty() {
        return false;
    }
    let path = &paths[rng.gen_range(0..paths.len())];
    if let Some(Node::Group { children, .. }) = tree.get_mut(path) {
        let victim = rng.gen_range(0..children.len());
        children.remove(victim);
        return true;
    }
    false
}

/// Re-draw the constant of a uniformly random one-sided leaf within the
/// bound window of its variable. Fails with `CantMutate` when the tree
/// holds no such leaf.
pub fn perturb_random<R: Rng>(
    tree: &mut Node,
    variables: &VariableSet,
    rates: MutationRates,
    rng: &mut R,
) -> Result<()> {
    let paths = tree.one_sided_leaf_paths();
    if paths.is_empty() {
        return Err(GenexprError::CantMutate);
    }
    let path = &paths[rng.gen_range(0..paths.len())];

    let (name, current) = match tree.get(path) {
        Some(Node::Leaf {
            lhs: Operand::Variable(name),
            rhs: Operand::Constant(value),
            ..
        }) => (name.clone(), *value),
        _ => return Err(GenexprError::CantMutate),
    };

    let replacement = modify_by_random_percent(variables, rates, &name, current, rng)?;
    if let Some(Node::Leaf { rhs, .. }) = tree.get_mut(path) {
        *rhs = Operand::Constant(replacement);
    }
    Ok(())
}

/// Shift a value by a random share of its variable's range, never
/// crossing a bound on the chosen side. Degenerate variables
/// (`lower == upper`) pass the value through untouched.
pub fn modify_by_random_percent<R: Rng>(
    variables: &VariableSet,
    rates: MutationRates,
    name: &str,
    value: f64,
    rng: &mut R,
) -> Result<f64> {
    let (lower, upper) = variables.bounds(name)?;
    if lower == upper {
        return Ok(value);
    }

    let percent = rng.gen_range(rates.min_percent..=rates.max_percent);
    let step = (upper - lower) * percent;
    let shifted = if rng.gen_bool(0.5) {
        value + step.min(upper - value)
    } else {
        value - step.min(value - lower)
    };

    let decimals = variables.decimals(name)?;
    // Rounding can step past a bound that is not representable at the
    // variable's precision; the final clamp keeps the postcondition.
    Ok(round_to(shifted, decimals).clamp(lower, upper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VariableConfig;
    use crate::types::{Combinator, Operator};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn bounded_set() -> VariableSet {
        let mut entries = BTreeMap::new();
        entries.insert("RSI14".to_string(), VariableConfig::bounded(0.0, 100.0));
        entries.insert(
            "MACD".to_string(),
            VariableConfig::bounded(-0.004368756239813143, 0.004310827468728018),
        );
        entries.insert("FIXED".to_string(), VariableConfig::bounded(7.0, 7.0));
        VariableSet::new(entries)
    }

    fn one_sided_leaf(name: &str, value: f64) -> Node {
        Node::Leaf {
            operator: Operator::Gt,
            lhs: Operand::Variable(name.to_string()),
            rhs: Operand::Constant(value),
        }
    }

    #[test]
    fn test_perturbation_stays_in_bounds() {
        let variables = bounded_set();
        let rates = MutationRates::default();
        let mut rng = StdRng::seed_from_u64(99);
        for name in ["RSI14", "MACD"] {
            let mut value = variables.random_value(name, &mut rng).unwrap();
            for _ in 0..500 {
                value = modify_by_random_percent(&variables, rates, name, value, &mut rng).unwrap();
                assert_eq!(variables.clamp(name, value).unwrap(), value);
            }
        }
    }

    #[test]
    fn test_degenerate_variable_is_untouched() {
        let variables = bounded_set();
        let mut rng = StdRng::seed_from_u64(1);
        let value =
            modify_by_random_percent(&variables, MutationRates::default(), "FIXED", 7.0, &mut rng)
                .unwrap();
        assert_eq!(value, 7.0);
    }

    #[test]
    fn test_perturb_changes_the_constant() {
        let variables = bounded_set();
        let mut tree = Node::Group {
            combinator: Combinator::Every,
            children: vec![one_sided_leaf("RSI14", 50.0)],
        };
        let mut rng = StdRng::seed_from_u64(4);
        perturb_random(&mut tree, &variables, MutationRates::default(), &mut rng).unwrap();
        match tree.get(&[0]) {
            Some(Node::Leaf {
                rhs: Operand::Constant(value),
                ..
            }) => assert_ne!(*value, 50.0),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_perturb_without_eligible_leaf() {
        let variables = bounded_set();
        let mut tree = Node::empty_group();
        let mut rng = StdRng::seed_from_u64(4);
        assert!(matches!(
            perturb_random(&mut tree, &variables, MutationRates::default(), &mut rng),
            Err(GenexprError::CantMutate)
        ));
    }

    #[test]
    fn test_remove_is_a_noop_on_single_child_groups() {
        let mut tree = Node::Group {
            combinator: Combinator::Every,
            children: vec![one_sided_leaf("RSI14", 50.0)],
        };
        let before = tree.clone();
        let mut rng = StdRng::seed_from_u64(2);
        assert!(!remove_random(&mut tree, &mut rng));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_remove_never_empties_a_group() {
        let mut tree = Node::Group {
            combinator: Combinator::Some,
            children: vec![
                one_sided_leaf("RSI14", 10.0),
                one_sided_leaf("RSI14", 20.0),
                one_sided_leaf("RSI14", 30.0),
            ],
        };
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..10 {
            remove_random(&mut tree, &mut rng);
        }
        match &tree {
            Node::Group { children, .. } => assert_eq!(children.len(), 1),
            node => panic!("root degenerated to {}", node),
        }
    }

    #[test]
    fn test_add_grows_the_tree() {
        let variables = bounded_set();
        let mut tree = Node::empty_group();
        let mut rng = StdRng::seed_from_u64(8);
        for expected in 1..20 {
            add_random(&mut tree, &variables, &mut rng).unwrap();
            assert!(tree.node_count() >= expected);
        }
    }

    #[test]
    fn test_mutate_budget_exhaustion_is_fatal() {
        let variables = bounded_set();
        // Perturb-only weights on a tree without one-sided leaves can
        // never succeed; the retry loop must convert that to a fatal
        // CantMutate instead of spinning forever.
        let weights = MutationWeights {
            add: 0.0,
            remove: 0.0,
            mutate: 1.0,
        };
        let mut tree = Node::empty_group();
        let mut rng = StdRng::seed_from_u64(13);
        assert!(matches!(
            mutate(
                &mut tree,
                &variables,
                MutationRates::default(),
                weights,
                &mut rng
            ),
            Err(GenexprError::CantMutate)
        ));
    }

    #[test]
    fn test_mutate_without_variables_fails_fast() {
        let variables = VariableSet::default();
        let weights = MutationWeights {
            add: 1.0,
            remove: 0.0,
            mutate: 0.0,
        };
        let mut tree = Node::empty_group();
        let mut rng = StdRng::seed_from_u64(21);
        assert!(matches!(
            mutate(
                &mut tree,
                &variables,
                MutationRates::default(),
                weights,
                &mut rng
            ),
            Err(GenexprError::NoUsableVariables)
        ));
    }
}
