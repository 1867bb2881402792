use crate::error::{GenexprError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// Per-variable generation constraints, keyed by variable name in
/// [`ExpressionConfig::variables`].
///
/// A variable is *bounded* when both bounds are present and *comparable*
/// when `compare` lists at least one other variable name. Random tree
/// generation needs at least one variable that is either.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariableConfig {
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    /// Explicit decimal precision; inferred from the bound range when
    /// omitted.
    pub decimals: Option<u32>,
    /// Names of other variables this one may be compared against.
    pub compare: Option<Vec<String>>,
}

impl VariableConfig {
    pub fn bounded(lower: f64, upper: f64) -> Self {
        Self {
            lower_bound: Some(lower),
            upper_bound: Some(upper),
            ..Default::default()
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.lower_bound.is_some() && self.upper_bound.is_some()
    }

    pub fn is_comparable(&self) -> bool {
        self.compare.as_ref().map_or(false, |names| !names.is_empty())
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        match (self.lower_bound, self.upper_bound) {
            (Some(lower), Some(upper)) => {
                if !lower.is_finite() || !upper.is_finite() {
                    return Err(GenexprError::Configuration(format!(
                        "Variable {} has non-finite bounds",
                        name
                    )));
                }
                if lower > upper {
                    return Err(GenexprError::Configuration(format!(
                        "Variable {} has lowerBound greater than upperBound",
                        name
                    )));
                }
            }
            (None, None) => {}
            _ => {
                return Err(GenexprError::Configuration(format!(
                    "Variable {} must define both bounds or neither",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Construction config for an [`Expression`](crate::Expression).
///
/// Deserializes from the same camelCase JSON shape the wire format uses,
/// so persisted configurations load directly via serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpressionConfig {
    /// Wire-format tree; an empty `every` group when omitted.
    pub tree: serde_json::Value,
    pub variables: BTreeMap<String, VariableConfig>,
    pub mutate_min_percent: f64,
    pub mutate_max_percent: f64,
    /// Reproducible runs when set; entropy otherwise.
    pub seed: Option<u64>,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            tree: json!(["every", []]),
            variables: BTreeMap::new(),
            mutate_min_percent: 0.05,
            mutate_max_percent: 0.15,
            seed: None,
        }
    }
}

impl ExpressionConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, variable) in &self.variables {
            variable.validate(name)?;
        }
        if self.mutate_min_percent < 0.0 {
            return Err(GenexprError::Configuration(
                "mutateMinPercent must not be negative".to_string(),
            ));
        }
        if self.mutate_max_percent < self.mutate_min_percent {
            return Err(GenexprError::Configuration(
                "mutateMaxPercent must not be below mutateMinPercent".to_string(),
            ));
        }
        Ok(())
    }
}
