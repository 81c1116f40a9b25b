use serde::{Deserialize, Serialize};

/// Bundled nutrition reference data, compiled into the binary.
const NUTRITION_DATA: &str = include_str!("../../dataset/nutrition_facts.json");

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NutritionFact {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycemic_index: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycemic_load: Option<f64>,
}

/// User-facing snapshot: capitalized name, numeric fields rendered as
/// `"<value> <unit>"` strings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NutritionDisplay {
    pub name: String,
    pub calories: String,
    pub protein: String,
    pub carbohydrates: String,
    pub fat: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycemic_index: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycemic_load: Option<f64>,
}

impl NutritionDisplay {
    pub fn from_fact(fact: &NutritionFact) -> Self {
        Self {
            name: display_name(&fact.name),
            calories: format!("{} kcal", fmt_number(fact.calories)),
            protein: format!("{} gram", fmt_number(fact.protein)),
            carbohydrates: format!("{} gram", fmt_number(fact.carbohydrates)),
            fat: format!("{} gram", fmt_number(fact.fat)),
            glycemic_index: fact.glycemic_index,
            glycemic_load: fact.glycemic_load,
        }
    }
}

/// Read-only in-memory catalog keyed by class label. Loaded once at startup.
pub struct NutritionCatalog {
    entries: Vec<NutritionFact>,
}

impl NutritionCatalog {
    pub fn load() -> Result<Self, serde_json::Error> {
        let entries: Vec<NutritionFact> = serde_json::from_str(NUTRITION_DATA)?;
        Ok(Self { entries })
    }

    /// A label missing from the catalog is not an error; the caller gets
    /// null facts.
    pub fn lookup(&self, label: &str) -> Option<&NutritionFact> {
        self.entries.iter().find(|f| f.name == label)
    }
}

/// `"ayam_goreng"` → `"Ayam goreng"`.
fn display_name(label: &str) -> String {
    let spaced = label.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => spaced,
    }
}

/// Drop the trailing `.0` on whole numbers so "295" renders instead of
/// "295.0".
fn fmt_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
