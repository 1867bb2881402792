use rand::Rng;

/// Relative odds of each mutation primitive. The defaults keep value
/// perturbation dominant over structural edits.
#[derive(Debug, Clone, Copy)]
pub struct MutationWeights {
    pub add: f64,
    pub remove: f64,
    pub mutate: f64,
}

impl Default for MutationWeights {
    fn default() -> Self {
        Self {
            add: 1.0,
            remove: 1.0,
            mutate: 8.0,
        }
    }
}

/// Relative odds for the single-child crossover case: concatenate both
/// children versus keeping a random one.
#[derive(Debug, Clone, Copy)]
pub struct CrossoverWeights {
    pub single_expressions_concat: f64,
    pub single_expressions_random: f64,
}

impl Default for CrossoverWeights {
    fn default() -> Self {
        Self {
            single_expressions_concat: 1.0,
            single_expressions_random: 1.0,
        }
    }
}

/// Spin a roulette wheel over non-negative weights and return the
/// winning index. All-zero weights fall back to the first slot.
pub fn weighted_pick<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().map(|weight| weight.max(0.0)).sum();
    if total <= 0.0 {
        return 0;
    }

    let mut spin = rng.gen::<f64>() * total;
    for (index, weight) in weights.iter().enumerate() {
        let weight = weight.max(0.0);
        if spin < weight {
            return index;
        }
        spin -= weight;
    }

    weights.len() - 1
}
