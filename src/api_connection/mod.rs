pub mod connection;
pub mod endpoints;

pub use connection::{ApiConnectionError, MealDbClient, NutritionProvider, RecipeProvider, UsdaClient};
pub use endpoints::{FoodNutrient, FoodRecord, MealRecord, MAX_MEAL_INGREDIENTS};
