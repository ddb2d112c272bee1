use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Raw `target` object from the input document.
#[derive(Debug, Deserialize)]
pub struct TargetInput {
    pub item: String,
    pub rate_per_min: f64,
}

/// Raw recipe object. `in`/`out` are renamed since `in` is a Rust keyword.
#[derive(Debug, Deserialize)]
pub struct RecipeInput {
    pub name: String,
    pub machine: String,
    pub time_s: f64,
    #[serde(rename = "in", default)]
    pub inputs: BTreeMap<String, f64>,
    #[serde(rename = "out", default)]
    pub outputs: BTreeMap<String, f64>,
}

/// Raw machine-type object, keyed by machine id in the parent map.
#[derive(Debug, Deserialize)]
pub struct MachineInput {
    pub base_speed_crafts_per_min: f64,
    pub speed_mult: f64,
    pub prod_mult: f64,
    pub max_machines: u32,
}

/// Top-level Factory problem document.
#[derive(Debug, Deserialize)]
pub struct FactoryInput {
    pub target: TargetInput,
    pub recipes: Vec<RecipeInput>,
    pub machines: BTreeMap<String, MachineInput>,
    #[serde(default)]
    pub raw_supply_per_min: BTreeMap<String, f64>,
}

/// A recipe after load-time validation. Immutable for the lifetime of a solve.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub name: String,
    pub machine: String,
    pub time_s: f64,
    pub inputs: BTreeMap<String, f64>,
    pub outputs: BTreeMap<String, f64>,
}

/// A machine type after load-time validation.
#[derive(Debug, Clone)]
pub struct MachineType {
    pub name: String,
    pub base_speed: f64,
    pub speed_mult: f64,
    pub prod_mult: f64,
    pub max_machines: u32,
}

/// The fully validated, immutable problem the LP builder and solver work from.
#[derive(Debug)]
pub struct Problem {
    pub target_item: String,
    pub target_rate: f64,
    pub recipes: Vec<Recipe>,
    pub machines: BTreeMap<String, MachineType>,
    pub raw_supply_per_min: BTreeMap<String, f64>,
}

impl Problem {
    /// Validates and lowers the raw input document into a `Problem`.
    ///
    /// Fails with `MalformedProblem` on empty identifiers, negative
    /// quantities, a recipe referencing an undeclared machine type, or a
    /// non-positive crafting time.
    pub fn from_input(input: FactoryInput) -> EngineResult<Problem> {
        if input.target.item.is_empty() {
            return Err(EngineError::MalformedProblem(
                "target.item must not be empty".into(),
            ));
        }

        let mut recipes = Vec::with_capacity(input.recipes.len());
        for r in input.recipes {
            if r.name.is_empty() {
                return Err(EngineError::MalformedProblem(
                    "recipe name must not be empty".into(),
                ));
            }
            if r.time_s <= 0.0 {
                return Err(EngineError::MalformedProblem(format!(
                    "recipe '{}' has non-positive time_s",
                    r.name
                )));
            }
            if !input.machines.contains_key(&r.machine) {
                return Err(EngineError::MalformedProblem(format!(
                    "recipe '{}' references undeclared machine '{}'",
                    r.name, r.machine
                )));
            }
            for (item, qty) in r.inputs.iter().chain(r.outputs.iter()) {
                if item.is_empty() {
                    return Err(EngineError::MalformedProblem(format!(
                        "recipe '{}' references an empty item identifier",
                        r.name
                    )));
                }
                if *qty < 0.0 {
                    return Err(EngineError::MalformedProblem(format!(
                        "recipe '{}' has a negative quantity for item '{}'",
                        r.name, item
                    )));
                }
            }
            recipes.push(Recipe {
                name: r.name,
                machine: r.machine,
                time_s: r.time_s,
                inputs: r.inputs,
                outputs: r.outputs,
            });
        }
        // Fixed, identifier-sorted order regardless of input ordering, so
        // every downstream pass (classification, rate model, LP builder)
        // iterates recipes deterministically.
        recipes.sort_by(|a, b| a.name.cmp(&b.name));

        let mut machines = BTreeMap::new();
        for (id, m) in input.machines {
            if id.is_empty() {
                return Err(EngineError::MalformedProblem(
                    "machine identifier must not be empty".into(),
                ));
            }
            if m.speed_mult < -1.0 {
                return Err(EngineError::MalformedProblem(format!(
                    "machine '{id}' has speed_mult below -1"
                )));
            }
            if m.prod_mult < 0.0 {
                return Err(EngineError::MalformedProblem(format!(
                    "machine '{id}' has negative prod_mult"
                )));
            }
            machines.insert(
                id.clone(),
                MachineType {
                    name: id,
                    base_speed: m.base_speed_crafts_per_min,
                    speed_mult: m.speed_mult,
                    prod_mult: m.prod_mult,
                    max_machines: m.max_machines,
                },
            );
        }

        for (item, cap) in &input.raw_supply_per_min {
            if *cap < 0.0 {
                return Err(EngineError::MalformedProblem(format!(
                    "raw_supply_per_min for '{item}' is negative"
                )));
            }
        }

        Ok(Problem {
            target_item: input.target.item,
            target_rate: input.target.rate_per_min,
            recipes,
            machines,
            raw_supply_per_min: input.raw_supply_per_min,
        })
    }
}

/// Bottleneck hints attached to an infeasibility result.
#[derive(Debug, Serialize, Default)]
pub struct BottleneckHints {
    pub raw: Vec<String>,
    pub machines: Vec<String>,
}

/// Result document emitted on stdout, tagged by `status`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FactoryOutput {
    Ok {
        per_recipe_crafts_per_min: BTreeMap<String, f64>,
        per_machine_counts: BTreeMap<String, f64>,
        raw_consumption_per_min: BTreeMap<String, f64>,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        byproduct_surplus_per_min: BTreeMap<String, f64>,
    },
    Infeasible {
        max_feasible_target_per_min: f64,
        bottleneck_hints: BottleneckHints,
    },
}
