use crate::config::VariableConfig;
use crate::error::{GenexprError, Result};
use rand::Rng;
use std::collections::BTreeMap;

/// The configured variables of one expression instance.
///
/// Entries live in a `BTreeMap` so name sampling stays reproducible
/// under a seeded generator.
#[derive(Debug, Clone, Default)]
pub struct VariableSet {
    entries: BTreeMap<String, VariableConfig>,
}

impl VariableSet {
    pub fn new(entries: BTreeMap<String, VariableConfig>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &BTreeMap<String, VariableConfig> {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&VariableConfig> {
        self.entries.get(name)
    }

    pub fn bounded_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, variable)| variable.is_bounded())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn comparable_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, variable)| variable.is_comparable())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Whether random generation has anything to work with.
    pub fn has_usable(&self) -> bool {
        self.entries
            .values()
            .any(|variable| variable.is_bounded() || variable.is_comparable())
    }

    pub fn bounds(&self, name: &str) -> Result<(f64, f64)> {
        let variable = self
            .entries
            .get(name)
            .ok_or_else(|| GenexprError::MissingBounds(name.to_string()))?;
        match (variable.lower_bound, variable.upper_bound) {
            (Some(lower), Some(upper)) => Ok((lower, upper)),
            _ => Err(GenexprError::MissingBounds(name.to_string())),
        }
    }

    /// Decimal places for a variable: the explicit `decimals` setting
    /// when present, otherwise inferred from the width of the bound
    /// range. Narrow ranges (price ratios near 1.0) get finer precision
    /// than wide ones (0-100 indicators), keeping perturbation steps
    /// distinguishable without accumulating float noise.
    pub fn decimals(&self, name: &str) -> Result<u32> {
        if let Some(variable) = self.entries.get(name) {
            if let Some(decimals) = variable.decimals {
                return Ok(decimals);
            }
        }
        let (lower, upper) = self.bounds(name)?;
        let scaled = ((upper - lower) * 10_000.0).round().abs() as u64;
        Ok(8u32.saturating_sub(digit_count(scaled)))
    }

    /// Uniform draw from `[lowerBound, upperBound]`, rounded to the
    /// variable's precision and kept inside the bounds.
    pub fn random_value<R: Rng>(&self, name: &str, rng: &mut R) -> Result<f64> {
        let (lower, upper) = self.bounds(name)?;
        let decimals = self.decimals(name)?;
        let value = rng.gen_range(lower..=upper);
        Ok(round_to(value, decimals).clamp(lower, upper))
    }

    pub fn clamp(&self, name: &str, value: f64) -> Result<f64> {
        let (lower, upper) = self.bounds(name)?;
        Ok(value.clamp(lower, upper))
    }
}

fn digit_count(value: u64) -> u32 {
    if value == 0 {
        1
    } else {
        value.ilog10() + 1
    }
}

pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
