pub mod api_connection;
pub mod cli;
pub mod config;
pub mod food_lookup;
pub mod meal_aggregator;
pub mod meal_suggestions;
pub mod nutrient_extractor;
pub mod quantity_normalizer;
pub mod report;
