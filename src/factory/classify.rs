use std::collections::BTreeSet;

use crate::error::{EngineError, EngineResult};

use super::model::Recipe;

/// The four disjoint classes an item can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemClass {
    Target,
    Intermediate,
    Byproduct,
    Raw,
}

/// Partition of every item referenced by the problem into its class.
#[derive(Debug)]
pub struct Classification {
    target: String,
    intermediate: BTreeSet<String>,
    byproduct: BTreeSet<String>,
    raw: BTreeSet<String>,
}

impl Classification {
    pub fn class_of(&self, item: &str) -> ItemClass {
        if item == self.target {
            ItemClass::Target
        } else if self.intermediate.contains(item) {
            ItemClass::Intermediate
        } else if self.byproduct.contains(item) {
            ItemClass::Byproduct
        } else {
            // Anything left over (including raw items and items that
            // appear in raw_supply_per_min but are never touched by a
            // recipe) is treated as raw.
            ItemClass::Raw
        }
    }

    /// Every item the problem references, in sorted order.
    pub fn all_items(&self) -> BTreeSet<String> {
        let mut items = BTreeSet::new();
        items.insert(self.target.clone());
        items.extend(self.intermediate.iter().cloned());
        items.extend(self.byproduct.iter().cloned());
        items.extend(self.raw.iter().cloned());
        items
    }

    pub fn raw_items(&self) -> &BTreeSet<String> {
        &self.raw
    }
}

/// Classifies every item produced or consumed by `recipes` relative to
/// `target`. Target membership takes precedence over every other rule.
pub fn classify(recipes: &[Recipe], target: &str) -> EngineResult<Classification> {
    let mut produced: BTreeSet<String> = BTreeSet::new();
    let mut consumed: BTreeSet<String> = BTreeSet::new();

    for r in recipes {
        produced.extend(r.outputs.keys().cloned());
        consumed.extend(r.inputs.keys().cloned());
    }

    if !produced.contains(target) {
        return Err(EngineError::MalformedProblem(format!(
            "target item '{target}' is not produced by any recipe"
        )));
    }

    // raw = (produced ∪ consumed) \ produced == consumed \ produced
    let raw: BTreeSet<String> = consumed.difference(&produced).cloned().collect();

    // byproduct = produced \ consumed \ {target}
    let byproduct: BTreeSet<String> = produced
        .difference(&consumed)
        .filter(|item| item.as_str() != target)
        .cloned()
        .collect();

    // intermediate = (produced ∩ consumed) \ {target}
    let intermediate: BTreeSet<String> = produced
        .intersection(&consumed)
        .filter(|item| item.as_str() != target)
        .cloned()
        .collect();

    Ok(Classification {
        target: target.to_string(),
        intermediate,
        byproduct,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn recipe(name: &str, ins: &[(&str, f64)], outs: &[(&str, f64)]) -> Recipe {
        Recipe {
            name: name.to_string(),
            machine: "m".to_string(),
            time_s: 1.0,
            inputs: ins.iter().map(|(k, v)| (k.to_string(), *v)).collect::<BTreeMap<_, _>>(),
            outputs: outs.iter().map(|(k, v)| (k.to_string(), *v)).collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn simple_chain_classification() {
        let recipes = vec![
            recipe("mine_ore", &[], &[("iron_ore", 1.0)]),
            recipe("smelt", &[("iron_ore", 1.0)], &[("iron_plate", 1.0)]),
            recipe("assemble", &[("iron_plate", 2.0)], &[("green_circuit", 1.0)]),
        ];
        let c = classify(&recipes, "green_circuit").unwrap();
        assert_eq!(c.class_of("green_circuit"), ItemClass::Target);
        assert_eq!(c.class_of("iron_plate"), ItemClass::Intermediate);
        assert_eq!(c.class_of("iron_ore"), ItemClass::Raw);
    }

    #[test]
    fn byproduct_is_produced_but_never_consumed() {
        let recipes = vec![recipe(
            "crack_oil",
            &[("crude_oil", 1.0)],
            &[("petrol", 1.0), ("heavy_oil", 0.2)],
        )];
        let c = classify(&recipes, "petrol").unwrap();
        assert_eq!(c.class_of("heavy_oil"), ItemClass::Byproduct);
        assert_eq!(c.class_of("crude_oil"), ItemClass::Raw);
    }

    #[test]
    fn missing_target_is_malformed() {
        let recipes = vec![recipe("mine_ore", &[], &[("iron_ore", 1.0)])];
        assert!(classify(&recipes, "green_circuit").is_err());
    }
}
