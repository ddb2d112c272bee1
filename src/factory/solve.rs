use std::collections::BTreeMap;

use good_lp::ResolutionError;
use log::{debug, info, warn};

use crate::error::{round6, EngineError, EngineResult, EPS_TOL};

use super::classify::{self, ItemClass};
use super::lp;
use super::model::{BottleneckHints, FactoryOutput, Problem};
use super::rate;

/// Number of binary-search iterations when the target rate is infeasible:
/// 40 iterations gives roughly 1e-12 relative precision.
const BINARY_SEARCH_ITERS: u32 = 40;

/// Runs the Factory classifier, rate model, LP builder and solver driver
/// end to end and shapes the result document.
pub fn solve(problem: Problem) -> EngineResult<FactoryOutput> {
    let classification = classify::classify(&problem.recipes, &problem.target_item)?;

    let mut eff = BTreeMap::new();
    let mut effective_outputs = BTreeMap::new();
    for recipe in &problem.recipes {
        let machine = problem.machines.get(&recipe.machine).ok_or_else(|| {
            EngineError::MalformedProblem(format!(
                "recipe '{}' references undeclared machine '{}'",
                recipe.name, recipe.machine
            ))
        })?;
        eff.insert(recipe.name.clone(), rate::effective_rate(recipe, machine)?);
        effective_outputs.insert(recipe.name.clone(), rate::effective_outputs(recipe, machine));
    }

    debug!(
        "solving factory problem: {} recipes, target '{}' @ {}/min",
        problem.recipes.len(),
        problem.target_item,
        problem.target_rate
    );

    match lp::solve_at_rate(
        &problem,
        &classification,
        &eff,
        &effective_outputs,
        problem.target_rate,
    ) {
        Ok(rates) => {
            info!("factory solve: optimal at target rate");
            shape_ok(&problem, &classification, &eff, &effective_outputs, &rates)
        }
        Err(ResolutionError::Infeasible) => {
            warn!("factory solve: infeasible at target rate, searching for max feasible rate");
            search_max_feasible(&problem, &classification, &eff, &effective_outputs)
        }
        Err(other) => Err(EngineError::NumericAnomaly(format!(
            "LP solver error: {other:?}"
        ))),
    }
}

fn shape_ok(
    problem: &Problem,
    classification: &classify::Classification,
    eff: &BTreeMap<String, f64>,
    effective_outputs: &BTreeMap<String, BTreeMap<String, f64>>,
    rates: &BTreeMap<String, f64>,
) -> EngineResult<FactoryOutput> {
    let mut per_recipe_crafts_per_min = BTreeMap::new();
    let mut per_machine_counts: BTreeMap<String, f64> = BTreeMap::new();
    let mut raw_consumption_per_min: BTreeMap<String, f64> = BTreeMap::new();
    let mut byproduct_surplus_per_min: BTreeMap<String, f64> = BTreeMap::new();

    for recipe in &problem.recipes {
        let x_r = rates[&recipe.name].max(0.0);
        per_recipe_crafts_per_min.insert(recipe.name.clone(), round6(x_r));

        let e = eff[&recipe.name];
        let m_r = x_r / e;
        *per_machine_counts
            .entry(recipe.machine.clone())
            .or_insert(0.0) += m_r;

        for (item, qty) in &recipe.inputs {
            if classification.class_of(item) == ItemClass::Raw {
                *raw_consumption_per_min.entry(item.clone()).or_insert(0.0) += qty * x_r;
            }
        }
    }

    for item in classification.raw_items() {
        raw_consumption_per_min.entry(item.clone()).or_insert(0.0);
    }

    for item in classification.all_items() {
        if classification.class_of(&item) != ItemClass::Byproduct {
            continue;
        }
        let produced: f64 = problem
            .recipes
            .iter()
            .filter_map(|r| {
                effective_outputs
                    .get(&r.name)
                    .and_then(|o| o.get(&item))
                    .map(|qty| qty * rates[&r.name].max(0.0))
            })
            .sum();
        let consumed: f64 = problem
            .recipes
            .iter()
            .filter_map(|r| r.inputs.get(&item).map(|qty| qty * rates[&r.name].max(0.0)))
            .sum();
        let surplus = produced - consumed;
        if surplus.abs() > EPS_TOL {
            byproduct_surplus_per_min.insert(item, round6(surplus));
        }
    }

    for v in per_machine_counts.values_mut() {
        *v = round6(*v);
    }
    for v in raw_consumption_per_min.values_mut() {
        *v = round6(*v);
    }

    Ok(FactoryOutput::Ok {
        per_recipe_crafts_per_min,
        per_machine_counts,
        raw_consumption_per_min,
        byproduct_surplus_per_min,
    })
}

/// Binary search over `rate ∈ [0, target_rate]` for the largest feasible
/// target rate, then extracts bottleneck hints at the best feasible
/// solution found.
fn search_max_feasible(
    problem: &Problem,
    classification: &classify::Classification,
    eff: &BTreeMap<String, f64>,
    effective_outputs: &BTreeMap<String, BTreeMap<String, f64>>,
) -> EngineResult<FactoryOutput> {
    let mut low = 0.0_f64;
    let mut high = problem.target_rate;
    let mut best_rates: Option<BTreeMap<String, f64>> = None;

    // rate = 0 is always feasible (all recipes idle) unless supply/machine
    // constraints are themselves malformed, so seed `best_rates` with it.
    match lp::solve_at_rate(problem, classification, eff, effective_outputs, 0.0) {
        Ok(rates) => best_rates = Some(rates),
        Err(ResolutionError::Infeasible) => {}
        Err(other) => {
            return Err(EngineError::NumericAnomaly(format!(
                "LP solver error at rate 0: {other:?}"
            )))
        }
    }

    for _ in 0..BINARY_SEARCH_ITERS {
        let mid = low + (high - low) / 2.0;
        match lp::solve_at_rate(problem, classification, eff, effective_outputs, mid) {
            Ok(rates) => {
                best_rates = Some(rates);
                low = mid;
            }
            Err(ResolutionError::Infeasible) => {
                high = mid;
            }
            Err(other) => {
                return Err(EngineError::NumericAnomaly(format!(
                    "LP solver error during binary search: {other:?}"
                )))
            }
        }
    }

    let best_rates = best_rates.unwrap_or_default();
    let bottleneck_hints = bottleneck_hints(problem, eff, &best_rates);

    Ok(FactoryOutput::Infeasible {
        max_feasible_target_per_min: round6(low),
        bottleneck_hints,
    })
}

/// Raw items within ε of their supply cap, and machine types within ε of
/// their machine-count limit, at the given solution.
fn bottleneck_hints(
    problem: &Problem,
    eff: &BTreeMap<String, f64>,
    rates: &BTreeMap<String, f64>,
) -> BottleneckHints {
    let mut raw_consumption: BTreeMap<String, f64> = BTreeMap::new();
    for recipe in &problem.recipes {
        let x_r = rates.get(&recipe.name).copied().unwrap_or(0.0).max(0.0);
        for (item, qty) in &recipe.inputs {
            if problem.raw_supply_per_min.contains_key(item) {
                *raw_consumption.entry(item.clone()).or_insert(0.0) += qty * x_r;
            }
        }
    }

    let mut raw = Vec::new();
    for (item, cap) in &problem.raw_supply_per_min {
        let used = raw_consumption.get(item).copied().unwrap_or(0.0);
        if *cap - used <= EPS_TOL {
            raw.push(item.clone());
        }
    }

    let mut machine_usage: BTreeMap<String, f64> = BTreeMap::new();
    for recipe in &problem.recipes {
        let x_r = rates.get(&recipe.name).copied().unwrap_or(0.0).max(0.0);
        let e = eff[&recipe.name];
        *machine_usage.entry(recipe.machine.clone()).or_insert(0.0) += x_r / e;
    }

    let mut machines = Vec::new();
    for (id, machine) in &problem.machines {
        let used = machine_usage.get(id).copied().unwrap_or(0.0);
        if machine.max_machines as f64 - used <= EPS_TOL {
            machines.push(id.clone());
        }
    }

    BottleneckHints { raw, machines }
}
