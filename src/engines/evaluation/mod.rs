use crate::types::{Node, Payload};

/// Reduce a tree to a boolean against a payload.
///
/// Group nodes evaluate every child and fold the results with their
/// combinator; leaves resolve both operands and apply the comparison.
/// Deterministic and side-effect free.
pub fn evaluate(node: &Node, payload: &Payload) -> bool {
    match node {
        Node::Group {
            combinator,
            children,
        } => combinator.apply(children.iter().map(|child| evaluate(child, payload))),
        Node::Leaf { operator, lhs, rhs } => {
            operator.apply(lhs.resolve(payload), rhs.resolve(payload))
        }
    }
}
