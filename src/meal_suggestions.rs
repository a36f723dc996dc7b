use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::api_connection::connection::{ApiConnectionError, NutritionProvider, RecipeProvider};
use crate::api_connection::endpoints::MealRecord;
use crate::meal_aggregator::{estimate_meal_nutrition, AggregationOptions, MealEstimate};

/// Meals whose aggregations run at the same time. Each one already fans out
/// its own ingredient lookups.
pub const MEAL_CONCURRENCY: usize = 2;

/// Display metadata for a suggested meal.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MealSuggestion {
    pub name: String,
    pub thumbnail: Option<String>,
    /// Source page, or the video link when the meal has no source.
    pub link: Option<String>,
    pub category: Option<String>,
    pub area: Option<String>,
    pub ingredient_count: usize,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}

impl From<&MealRecord> for MealSuggestion {
    fn from(meal: &MealRecord) -> Self {
        Self {
            name: meal.name.clone(),
            thumbnail: non_blank(&meal.thumbnail),
            link: non_blank(&meal.source).or_else(|| non_blank(&meal.youtube)),
            category: non_blank(&meal.category),
            area: non_blank(&meal.area),
            ingredient_count: meal.ingredient_pairs().len(),
        }
    }
}

/// Searches the recipe provider and keeps at most `limit` meals.
pub async fn find_meals(
    recipes: &dyn RecipeProvider,
    query: &str,
    limit: usize,
) -> Result<Vec<MealRecord>, ApiConnectionError> {
    let mut meals = recipes.search_meals(query.trim()).await?;
    tracing::info!("'{}' matched {} meals", query.trim(), meals.len());
    meals.truncate(limit);
    Ok(meals)
}

/// Aggregates every meal, yielding `(index into meals, estimate)` as each
/// one finishes.
pub fn estimate_meals<'a>(
    nutrition: &'a dyn NutritionProvider,
    meals: &'a [MealRecord],
    options: &'a AggregationOptions,
) -> impl Stream<Item = (usize, MealEstimate)> + 'a {
    stream::iter(meals.iter().enumerate())
        .map(move |(index, meal)| async move {
            (index, estimate_meal_nutrition(nutrition, meal, options).await)
        })
        .buffer_unordered(MEAL_CONCURRENCY)
}
