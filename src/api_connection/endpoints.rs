use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const DEFAULT_USDA_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
pub const DEFAULT_MEALDB_BASE_URL: &str = "https://www.themealdb.com/api/json/v1";
/// TheMealDB's public developer key.
pub const DEFAULT_MEALDB_API_KEY: &str = "1";

/// TheMealDB exposes ingredient/measure pairs as `strIngredient1..20` / `strMeasure1..20`.
pub const MAX_MEAL_INGREDIENTS: usize = 20;

// ---------------------------------------------------------------------------
// FoodData Central
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FoodSearchResponse {
    #[serde(default)]
    pub foods: Vec<FoodRecord>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct FoodRecord {
    #[serde(rename = "fdcId", default)]
    pub fdc_id: Option<u64>,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "dataType", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(rename = "foodNutrients", default)]
    pub food_nutrients: Vec<FoodNutrient>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct FoodNutrient {
    #[serde(rename = "nutrientName", default)]
    pub nutrient_name: String,
    #[serde(rename = "unitName", default, skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl FoodNutrient {
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            nutrient_name: name.to_string(),
            unit_name: None,
            value: Some(value),
        }
    }
}

// ---------------------------------------------------------------------------
// TheMealDB
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MealSearchResponse {
    // `null` when nothing matched
    #[serde(default)]
    pub meals: Option<Vec<MealRecord>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MealRecord {
    #[serde(rename = "idMeal", default)]
    pub id: Option<String>,
    #[serde(rename = "strMeal", default)]
    pub name: String,
    #[serde(rename = "strMealThumb", default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "strSource", default)]
    pub source: Option<String>,
    #[serde(rename = "strCategory", default)]
    pub category: Option<String>,
    #[serde(rename = "strArea", default)]
    pub area: Option<String>,
    #[serde(rename = "strYoutube", default)]
    pub youtube: Option<String>,
    #[serde(rename = "strInstructions", default)]
    pub instructions: Option<String>,
    /// Everything else, including the numbered ingredient and measure slots.
    #[serde(flatten)]
    pub slots: HashMap<String, Value>,
}

impl MealRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Builder used mostly by tests: fills slot `index` (1-based).
    pub fn with_ingredient(mut self, index: usize, ingredient: &str, measure: &str) -> Self {
        self.slots.insert(
            format!("strIngredient{}", index),
            Value::String(ingredient.to_string()),
        );
        self.slots
            .insert(format!("strMeasure{}", index), Value::String(measure.to_string()));
        self
    }

    /// Ingredient name in slot `index` (1-based), if present and non-blank.
    pub fn ingredient(&self, index: usize) -> Option<&str> {
        self.slot_text(&format!("strIngredient{}", index))
            .filter(|s| !s.trim().is_empty())
    }

    /// Raw measure text paired with slot `index` (1-based).
    pub fn measure(&self, index: usize) -> Option<&str> {
        self.slot_text(&format!("strMeasure{}", index))
    }

    /// Non-blank `(index, ingredient, measure)` triples in slot order.
    pub fn ingredient_pairs(&self) -> Vec<(usize, &str, Option<&str>)> {
        (1..=MAX_MEAL_INGREDIENTS)
            .filter_map(|i| self.ingredient(i).map(|name| (i, name, self.measure(i))))
            .collect()
    }

    fn slot_text(&self, key: &str) -> Option<&str> {
        self.slots.get(key).and_then(Value::as_str)
    }
}
