use serde::{Deserialize, Serialize};

use crate::api_connection::connection::{ApiConnectionError, NutritionProvider};
use crate::nutrient_extractor::{extract_nutrients, NutrientProfile};

/// Result of looking a single food up at a chosen mass.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FoodNutritionResult {
    pub query: String,
    pub matched_food: String,
    pub grams: f64,
    pub per_100g: NutrientProfile,
    pub scaled: NutrientProfile,
}

/// Looks `food_name` up and scales the best match to `grams`.
///
/// Returns [`ApiConnectionError::NotFound`] when the provider has no match.
pub async fn lookup_food(
    provider: &dyn NutritionProvider,
    food_name: &str,
    grams: f64,
) -> Result<FoodNutritionResult, ApiConnectionError> {
    let query = food_name.trim();
    if query.is_empty() {
        return Err(ApiConnectionError::NotFound {
            query: query.to_string(),
        });
    }

    let food = provider.first_food(query).await?;
    let per_100g = extract_nutrients(&food);
    tracing::info!("'{}' matched '{}'", query, food.description);

    Ok(FoodNutritionResult {
        query: query.to_string(),
        matched_food: food.description,
        grams,
        per_100g,
        scaled: per_100g.for_grams(grams),
    })
}
