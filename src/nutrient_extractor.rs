use serde::{Deserialize, Serialize};

use crate::api_connection::endpoints::FoodRecord;

pub const ENERGY: &str = "Energy";
pub const PROTEIN: &str = "Protein";
pub const CARBOHYDRATE: &str = "Carbohydrate, by difference";
pub const TOTAL_FAT: &str = "Total lipid (fat)";

/// Reference mass the provider reports nutrients against.
pub const REFERENCE_GRAMS: f64 = 100.0;

/// Calories (kcal) and macronutrients (g) for a given mass of food.
/// Values straight out of [`extract_nutrients`] are per 100 g.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct NutrientProfile {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl NutrientProfile {
    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            calories,
            protein,
            carbs,
            fat,
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
        }
    }

    /// Rescales a per-100 g profile to `grams`.
    pub fn for_grams(&self, grams: f64) -> Self {
        self.scaled(grams / REFERENCE_GRAMS)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Pulls the four tracked nutrients out of a provider record.
///
/// Unrecognized entries are ignored and missing nutrients stay at zero. When
/// a name occurs more than once the last occurrence wins.
pub fn extract_nutrients(record: &FoodRecord) -> NutrientProfile {
    let mut profile = NutrientProfile::default();

    for nutrient in &record.food_nutrients {
        let Some(value) = nutrient.value else {
            continue;
        };
        match nutrient.nutrient_name.as_str() {
            ENERGY => profile.calories = value,
            PROTEIN => profile.protein = value,
            CARBOHYDRATE => profile.carbs = value,
            TOTAL_FAT => profile.fat = value,
            _ => {}
        }
    }

    profile
}
