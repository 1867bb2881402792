use crate::error::{GenexprError, Result};
use crate::types::{Combinator, Node, Operand, Operator};
use serde_json::{json, Value};

/// Convert a live tree into the JSON-safe wire format.
///
/// Groups become `[combinatorName, [children...]]`, leaves
/// `[operatorName, lhs, rhs]`. Variable operands are tagged
/// `{"__wrapped": true, "name": ...}`; constants stay plain numbers.
pub fn serialize(node: &Node) -> Value {
    match node {
        Node::Group {
            combinator,
            children,
        } => {
            let children: Vec<Value> = children.iter().map(serialize).collect();
            json!([combinator.name(), children])
        }
        Node::Leaf { operator, lhs, rhs } => {
            json!([operator.name(), serialize_operand(lhs), serialize_operand(rhs)])
        }
    }
}

fn serialize_operand(operand: &Operand) -> Value {
    match operand {
        Operand::Constant(value) => json!(value),
        Operand::Variable(name) => json!({ "__wrapped": true, "name": name }),
    }
}

/// Rebuild a tree from its wire format.
///
/// Input is untrusted; anything that is not a recognized group, leaf,
/// or operand shape is rejected with `InvalidTreeShape`.
pub fn deserialize(value: &Value) -> Result<Node> {
    let items = value
        .as_array()
        .ok_or_else(|| shape_error("node is not an array", value))?;

    if let Some(name) = items.first().and_then(Value::as_str) {
        if let Some(combinator) = Combinator::from_name(name) {
            if items.len() != 2 {
                return Err(shape_error("group node needs exactly two elements", value));
            }
            let children = items[1]
                .as_array()
                .ok_or_else(|| shape_error("group children must be an array", value))?
                .iter()
                .map(deserialize)
                .collect::<Result<Vec<Node>>>()?;
            return Ok(Node::Group {
                combinator,
                children,
            });
        }
        if let Some(operator) = Operator::from_name(name) {
            if items.len() != 3 {
                return Err(shape_error("leaf node needs exactly three elements", value));
            }
            return Ok(Node::Leaf {
                operator,
                lhs: deserialize_operand(&items[1])?,
                rhs: deserialize_operand(&items[2])?,
            });
        }
    }

    Err(shape_error("unknown combinator or operator", value))
}

fn deserialize_operand(value: &Value) -> Result<Operand> {
    if let Some(number) = value.as_f64() {
        return Ok(Operand::Constant(number));
    }
    if let Some(object) = value.as_object() {
        let wrapped = object
            .get("__wrapped")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if wrapped {
            if let Some(name) = object.get("name").and_then(Value::as_str) {
                return Ok(Operand::Variable(name.to_string()));
            }
        }
        return Err(shape_error(
            "wrapped variable needs __wrapped and name",
            value,
        ));
    }
    Err(shape_error(
        "operand must be a number or a wrapped variable",
        value,
    ))
}

fn shape_error(reason: &str, value: &Value) -> GenexprError {
    GenexprError::InvalidTreeShape(format!("{}: {}", reason, value))
}
