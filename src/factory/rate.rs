use std::collections::BTreeMap;

use crate::error::{EngineError, EngineResult};

use super::model::{MachineType, Recipe};

/// Effective crafts/min for `recipe` on `machine`:
///
/// `eff_r = base_speed_m × (1 + speed_mult_m) × 60 / time_s_r`
///
/// Must be strictly positive; a zero or negative effective rate means the
/// recipe can never run and the problem is malformed.
pub fn effective_rate(recipe: &Recipe, machine: &MachineType) -> EngineResult<f64> {
    let eff = machine.base_speed * (1.0 + machine.speed_mult) * 60.0 / recipe.time_s;
    if !(eff > 0.0) {
        return Err(EngineError::MalformedProblem(format!(
            "recipe '{}' on machine '{}' has non-positive effective crafts/min",
            recipe.name, machine.name
        )));
    }
    Ok(eff)
}

/// Output quantities scaled by the machine's productivity multiplier.
/// Inputs are never scaled.
pub fn effective_outputs(recipe: &Recipe, machine: &MachineType) -> BTreeMap<String, f64> {
    recipe
        .outputs
        .iter()
        .map(|(item, qty)| (item.clone(), qty * (1.0 + machine.prod_mult)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(base_speed: f64, speed_mult: f64, prod_mult: f64) -> MachineType {
        MachineType {
            name: "assembler".to_string(),
            base_speed,
            speed_mult,
            prod_mult,
            max_machines: 100,
        }
    }

    fn recipe(time_s: f64) -> Recipe {
        Recipe {
            name: "r".to_string(),
            machine: "assembler".to_string(),
            time_s,
            inputs: BTreeMap::new(),
            outputs: [("x".to_string(), 1.0)].into_iter().collect(),
        }
    }

    #[test]
    fn eff_matches_formula() {
        let m = machine(0.75, 0.5, 0.0);
        let r = recipe(2.0);
        let eff = effective_rate(&r, &m).unwrap();
        assert!((eff - (0.75 * 1.5 * 60.0 / 2.0)).abs() < 1e-12);
    }

    #[test]
    fn zero_time_is_rejected_upstream_but_non_positive_eff_is_malformed() {
        let m = machine(0.0, 0.0, 0.0);
        let r = recipe(1.0);
        assert!(effective_rate(&r, &m).is_err());
    }

    #[test]
    fn productivity_scales_outputs_not_inputs() {
        let m = machine(1.0, 0.0, 1.0);
        let mut r = recipe(1.0);
        r.inputs.insert("y".to_string(), 3.0);
        let outs = effective_outputs(&r, &m);
        assert_eq!(outs["x"], 2.0);
        assert_eq!(r.inputs["y"], 3.0);
    }
}
