use std::collections::HashMap;
use std::fmt;

/// Runtime payload a tree is evaluated against: variable name -> value.
pub type Payload = HashMap<String, f64>;

/// Child indices from the root group down to a node. The root itself is
/// the empty path.
pub type NodePath = Vec<usize>;

/// Logical combinator of a group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// AND over all children, vacuously true on an empty group.
    Every,
    /// OR over any child, vacuously false on an empty group.
    Some,
}

impl Combinator {
    pub const ALL: [Combinator; 2] = [Combinator::Every, Combinator::Some];

    /// Registry name, used as the serialization key.
    pub fn name(&self) -> &'static str {
        match self {
            Combinator::Every => "every",
            Combinator::Some => "some",
        }
    }

    pub fn from_name(name: &str) -> Option<Combinator> {
        match name {
            "every" => Some(Combinator::Every),
            "some" => Some(Combinator::Some),
            _ => None,
        }
    }

    /// Reduce child results to a single boolean.
    pub fn apply<I: IntoIterator<Item = bool>>(&self, results: I) -> bool {
        let mut results = results.into_iter();
        match self {
            Combinator::Every => results.all(|result| result),
            Combinator::Some => results.any(|result| result),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Combinator::Every => "AND",
            Combinator::Some => "OR",
        }
    }
}

/// Comparison operator of a leaf expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::Eq,
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
    ];

    /// Registry name, used as the serialization key.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
        }
    }

    pub fn from_name(name: &str) -> Option<Operator> {
        match name {
            "eq" => Some(Operator::Eq),
            "gt" => Some(Operator::Gt),
            "lt" => Some(Operator::Lt),
            "gte" => Some(Operator::Gte),
            "lte" => Some(Operator::Lte),
            _ => None,
        }
    }

    /// Compare two resolved operand values. Exact float equality is
    /// intentional here: constants survive the codec round trip
    /// bit-for-bit, and comparisons involving NaN are always false.
    pub fn apply(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Operator::Eq => lhs == rhs,
            Operator::Gt => lhs > rhs,
            Operator::Lt => lhs < rhs,
            Operator::Gte => lhs >= rhs,
            Operator::Lte => lhs <= rhs,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
        }
    }
}

/// One side of a leaf expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Constant(f64),
    Variable(String),
}

impl Operand {
    /// Missing payload keys resolve to NaN so every comparison against
    /// them is false, never a crash.
    pub fn resolve(&self, payload: &Payload) -> f64 {
        match self {
            Operand::Constant(value) => *value,
            Operand::Variable(name) => payload.get(name).copied().unwrap_or(f64::NAN),
        }
    }

    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Operand::Variable(name) => Some(name),
            Operand::Constant(_) => None,
        }
    }
}

/// Decision tree node: a logical group over child nodes, or a leaf
/// comparing two operands.
///
/// Invalid shapes are unreachable by construction; untrusted input is
/// rejected at the codec boundary instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group {
        combinator: Combinator,
        children: Vec<Node>,
    },
    Leaf {
        operator: Operator,
        lhs: Operand,
        rhs: Operand,
    },
}

impl Node {
    /// The default tree: an empty AND group.
    pub fn empty_group() -> Node {
        Node::Group {
            combinator: Combinator::Every,
            children: Vec::new(),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Node::Group { .. })
    }

    /// One-sided leaf: variable on the left, finite constant on the
    /// right. The only node kind eligible for value perturbation.
    pub fn is_one_sided_leaf(&self) -> bool {
        matches!(
            self,
            Node::Leaf {
                lhs: Operand::Variable(_),
                rhs: Operand::Constant(value),
                ..
            } if value.is_finite()
        )
    }

    pub fn get(&self, path: &[usize]) -> Option<&Node> {
        let mut node = self;
        for &index in path {
            match node {
                Node::Group { children, .. } => node = children.get(index)?,
                Node::Leaf { .. } => return None,
            }
        }
        Some(node)
    }

    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut node = self;
        for &index in path {
            match node {
                Node::Group { children, .. } => node = children.get_mut(index)?,
                Node::Leaf { .. } => return None,
            }
        }
        Some(node)
    }

    /// Paths of every group node, root included.
    pub fn group_paths(&self) -> Vec<NodePath> {
        self.collect_paths(&|node| node.is_group())
    }

    /// Paths of every group that can lose a child without emptying out.
    pub fn removable_group_paths(&self) -> Vec<NodePath> {
        self.collect_paths(&|node| {
            matches!(node, Node::Group { children, .. } if children.len() > 1)
        })
    }

    /// Paths of every leaf eligible for value perturbation.
    pub fn one_sided_leaf_paths(&self) -> Vec<NodePath> {
        self.collect_paths(&|node| node.is_one_sided_leaf())
    }

    pub fn node_count(&self) -> usize {
        match self {
            Node::Group { children, .. } => {
                1 + children.iter().map(Node::node_count).sum::<usize>()
            }
            Node::Leaf { .. } => 1,
        }
    }

    fn collect_paths(&self, predicate: &dyn Fn(&Node) -> bool) -> Vec<NodePath> {
        let mut paths = Vec::new();
        let mut prefix = Vec::new();
        self.collect_into(predicate, &mut prefix, &mut paths);
        paths
    }

    fn collect_into(
        &self,
        predicate: &dyn Fn(&Node) -> bool,
        prefix: &mut NodePath,
        paths: &mut Vec<NodePath>,
    ) {
        if predicate(self) {
            paths.push(prefix.clone());
        }
        if let Node::Group { children, .. } = self {
            for (index, child) in children.iter().enumerate() {
                prefix.push(index);
                child.collect_into(predicate, prefix, paths);
                prefix.pop();
            }
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(value) => write!(f, "{}", value),
            Operand::Variable(name) => write!(f, "{}", name),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Group {
                combinator,
                children,
            } => {
                write!(f, "(")?;
                for (index, child) in children.iter().enumerate() {
                    if index > 0 {
                        write!(f, " {} ", combinator.symbol())?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Node::Leaf { operator, lhs, rhs } => {
                write!(f, "{} {} {}", lhs, operator.symbol(), rhs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Node {
        Node::Group {
            combinator: Combinator::Every,
            children: vec![
                Node::Leaf {
                    operator: Operator::Gt,
                    lhs: Operand::Variable("RSI14".to_string()),
                    rhs: Operand::Constant(70.0),
                },
                Node::Group {
                    combinator: Combinator::Some,
                    children: vec![Node::Leaf {
                        operator: Operator::Lt,
                        lhs: Operand::Constant(1.0),
                        rhs: Operand::Constant(2.0),
                    }],
                },
            ],
        }
    }

    #[test]
    fn test_path_lookup() {
        let tree = sample_tree();
        assert!(tree.get(&[]).is_some());
        assert!(tree.get(&[0]).unwrap().is_one_sided_leaf());
        assert!(tree.get(&[1]).unwrap().is_group());
        assert!(tree.get(&[1, 0]).is_some());
        assert!(tree.get(&[2]).is_none());
        assert!(tree.get(&[0, 0]).is_none());
    }

    #[test]
    fn test_path_collectors() {
        let tree = sample_tree();
        assert_eq!(tree.group_paths(), vec![vec![], vec![1]]);
        // Only the root has more than one child.
        assert_eq!(tree.removable_group_paths(), vec![Vec::<usize>::new()]);
        // The constant-vs-constant leaf is not one-sided.
        assert_eq!(tree.one_sided_leaf_paths(), vec![vec![0]]);
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn test_combinator_vacuous_results() {
        assert!(Combinator::Every.apply(std::iter::empty()));
        assert!(!Combinator::Some.apply(std::iter::empty()));
    }

    #[test]
    fn test_operator_nan_comparisons() {
        for operator in Operator::ALL {
            assert!(!operator.apply(f64::NAN, 1.0));
        }
    }

    #[test]
    fn test_registry_names_round_trip() {
        for combinator in Combinator::ALL {
            assert_eq!(Combinator::from_name(combinator.name()), Some(combinator));
        }
        for operator in Operator::ALL {
            assert_eq!(Operator::from_name(operator.name()), Some(operator));
        }
    }

    #[test]
    fn test_display_formula() {
        let tree = sample_tree();
        assert_eq!(tree.to_string(), "(RSI14 > 70 AND (1 < 2))");
    }
}
