use crate::engines::generation::weights::{weighted_pick, CrossoverWeights};
use crate::error::{GenexprError, Result};
use crate::types::{Combinator, Node};
use rand::Rng;

/// Splice the top-level child lists of two parent trees.
///
/// Returns the basis combinator and the recombined child list; callers
/// wrap the result into a fresh instance. Parents are borrowed
/// read-only and cloned internally, so neither is ever touched.
pub fn crossover_trees<R: Rng>(
    a: &Node,
    b: &Node,
    weights: CrossoverWeights,
    rng: &mut R,
) -> Result<(Combinator, Vec<Node>)> {
    let (combinator_a, children_a) = group_parts(a)?;
    let (combinator_b, children_b) = group_parts(b)?;

    let basis = if rng.gen_bool(0.5) {
        combinator_a
    } else {
        combinator_b
    };

    if children_a.len() == 1 && children_b.len() == 1 {
        let choice = weighted_pick(
            &[
                weights.single_expressions_concat,
                weights.single_expressions_random,
            ],
            rng,
        );
        let children = if choice == 0 {
            vec![children_a[0].clone(), children_b[0].clone()]
        } else if rng.gen_bool(0.5) {
            vec![children_a[0].clone()]
        } else {
            vec![children_b[0].clone()]
        };
        return Ok((basis, children));
    }

    // Ties favor the first parent.
    let (longer, shorter) = if children_a.len() >= children_b.len() {
        (children_a, children_b)
    } else {
        (children_b, children_a)
    };

    let point1 = rng.gen_range(0..=longer.len());
    let point2 = rng.gen_range(point1..=longer.len());

    Ok((basis, splice(longer, shorter, point1, point2)))
}

/// Two-point splice: the middle segment is sourced from the shorter
/// list's corresponding index range, which may be empty when the range
/// lies past its end.
fn splice(longer: &[Node], shorter: &[Node], from: usize, to: usize) -> Vec<Node> {
    let mut children = Vec::with_capacity(longer.len());
    children.extend_from_slice(&longer[..from]);
    let mix_from = from.min(shorter.len());
    let mix_to = to.min(shorter.len());
    children.extend_from_slice(&shorter[mix_from..mix_to]);
    children.extend_from_slice(&longer[to..]);
    children
}

fn group_parts(node: &Node) -> Result<(Combinator, &[Node])> {
    match node {
        Node::Group {
            combinator,
            children,
        } => Ok((*combinator, children.as_slice())),
        Node::Leaf { .. } => Err(GenexprError::InvalidRoot(
            "crossover parents must be group nodes".to_string(),
        )),
    }
}
