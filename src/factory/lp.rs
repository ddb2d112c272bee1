use std::collections::BTreeMap;

use good_lp::{
    constraint, default_solver, variable, variables, Expression, ResolutionError, Solution,
    SolverModel,
};

use super::classify::{Classification, ItemClass};
use super::model::Problem;

/// Crafts/min per recipe, keyed by recipe name, from a successful solve.
pub type RecipeRates = BTreeMap<String, f64>;

/// Builds and solves the Factory LP at a given target rate.
///
/// `eff` maps recipe name to effective crafts/min; `effective_outputs` maps
/// recipe name to its productivity-scaled output quantities. Both are
/// precomputed by the caller so the binary-search driver can reuse them
/// across many solves without recomputing the rate model each time.
pub fn solve_at_rate(
    problem: &Problem,
    classification: &Classification,
    eff: &BTreeMap<String, f64>,
    effective_outputs: &BTreeMap<String, BTreeMap<String, f64>>,
    target_rate: f64,
) -> Result<RecipeRates, ResolutionError> {
    let mut vars = variables!();
    let mut x = BTreeMap::new();
    for recipe in &problem.recipes {
        let v = vars.add(variable().min(0.0).name(recipe.name.clone()));
        x.insert(recipe.name.clone(), v);
    }

    let mut objective = Expression::from(0.0);
    for recipe in &problem.recipes {
        let e = eff[&recipe.name];
        objective += (1.0 / e) * x[&recipe.name];
    }

    let mut model = vars.minimise(objective).using(default_solver);

    // net_i = Σ effective_output_r[i] * x_r - Σ input_r[i] * x_r
    let mut nets: BTreeMap<String, Expression> = BTreeMap::new();
    for recipe in &problem.recipes {
        let var = x[&recipe.name];
        if let Some(outs) = effective_outputs.get(&recipe.name) {
            for (item, qty) in outs {
                *nets
                    .entry(item.clone())
                    .or_insert_with(|| Expression::from(0.0)) += *qty * var;
            }
        }
        for (item, qty) in &recipe.inputs {
            *nets
                .entry(item.clone())
                .or_insert_with(|| Expression::from(0.0)) -= *qty * var;
        }
    }

    for item in classification.all_items() {
        let net = nets
            .entry(item.clone())
            .or_insert_with(|| Expression::from(0.0))
            .clone();
        match classification.class_of(&item) {
            ItemClass::Target => {
                model.add_constraint(constraint!(net == target_rate));
            }
            ItemClass::Intermediate => {
                model.add_constraint(constraint!(net == 0.0));
            }
            ItemClass::Byproduct => {
                model.add_constraint(constraint!(net >= 0.0));
            }
            ItemClass::Raw => {
                model.add_constraint(constraint!(net.clone() <= 0.0));
                if let Some(cap) = problem.raw_supply_per_min.get(&item) {
                    // consumption = -net <= cap  <=>  net >= -cap
                    model.add_constraint(constraint!(net >= -*cap));
                }
            }
        }
    }

    for (machine_name, machine) in &problem.machines {
        let mut usage = Expression::from(0.0);
        let mut has_recipe = false;
        for recipe in problem.recipes.iter().filter(|r| &r.machine == machine_name) {
            has_recipe = true;
            let e = eff[&recipe.name];
            usage += (1.0 / e) * x[&recipe.name];
        }
        if has_recipe {
            model.add_constraint(constraint!(usage <= machine.max_machines as f64));
        }
    }

    let solution = model.solve()?;
    Ok(x.iter()
        .map(|(name, var)| (name.clone(), solution.value(*var)))
        .collect())
}
