//! Plain-text rendering of lookup results for the terminal.

use crate::food_lookup::FoodNutritionResult;
use crate::meal_aggregator::{MealEstimate, MealTotals};
use crate::meal_suggestions::MealSuggestion;
use crate::nutrient_extractor::NutrientProfile;

fn nutrient_lines(calories: f64, protein: f64, carbs: f64, fat: f64) -> String {
    format!(
        "  Calories: {:.2} kcal\n  Protein:  {:.2} g\n  Carbs:    {:.2} g\n  Fat:      {:.2} g",
        calories, protein, carbs, fat
    )
}

pub fn format_profile(profile: &NutrientProfile) -> String {
    nutrient_lines(profile.calories, profile.protein, profile.carbs, profile.fat)
}

pub fn format_totals(totals: &MealTotals) -> String {
    nutrient_lines(totals.calories, totals.protein, totals.carbs, totals.fat)
}

pub fn format_food_result(result: &FoodNutritionResult) -> String {
    format!(
        "{} ({}) per {}g:\n{}\n  (per 100g: {:.2} kcal, {:.2} g protein, {:.2} g carbs, {:.2} g fat)",
        result.query,
        result.matched_food,
        result.grams,
        format_profile(&result.scaled),
        result.per_100g.calories,
        result.per_100g.protein,
        result.per_100g.carbs,
        result.per_100g.fat
    )
}

pub fn format_meal_header(index: usize, meal: &MealSuggestion) -> String {
    let mut out = format!("[{}] {}", index + 1, meal.name);
    let tags: Vec<&str> = [meal.category.as_deref(), meal.area.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !tags.is_empty() {
        out.push_str(&format!(" ({})", tags.join(", ")));
    }
    out.push_str(&format!(" - {} ingredients", meal.ingredient_count));
    if let Some(thumbnail) = &meal.thumbnail {
        out.push_str(&format!("\n  Image:  {}", thumbnail));
    }
    if let Some(link) = &meal.link {
        out.push_str(&format!("\n  Recipe: {}", link));
    }
    out
}

pub fn format_meal_estimate(index: usize, name: &str, estimate: &MealEstimate) -> String {
    let mut out = format!(
        "[{}] {} estimated nutrition ({} of {} ingredients):\n{}",
        index + 1,
        name,
        estimate.contributions.len(),
        estimate.contributions.len() + estimate.failed.len(),
        format_totals(&estimate.totals)
    );
    if !estimate.failed.is_empty() {
        let skipped: Vec<&str> = estimate.failed.iter().map(|f| f.ingredient.as_str()).collect();
        out.push_str(&format!("\n  Skipped: {}", skipped.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meal_aggregator::FailedIngredient;

    #[test]
    fn test_food_result_shows_scaled_values() {
        let result = FoodNutritionResult {
            query: "apple".to_string(),
            matched_food: "Apples, raw".to_string(),
            grams: 150.0,
            per_100g: NutrientProfile::new(52.0, 0.3, 14.0, 0.2),
            scaled: NutrientProfile::new(52.0, 0.3, 14.0, 0.2).for_grams(150.0),
        };
        let text = format_food_result(&result);
        assert!(text.starts_with("apple (Apples, raw) per 150g:"));
        assert!(text.contains("Calories: 78.00 kcal"));
        assert!(text.contains("Protein:  0.45 g"));
        assert!(text.contains("Carbs:    21.00 g"));
        assert!(text.contains("Fat:      0.30 g"));
        assert!(text.ends_with("(per 100g: 52.00 kcal, 0.30 g protein, 14.00 g carbs, 0.20 g fat)"));
    }

    #[test]
    fn test_meal_header_omits_missing_fields() {
        let meal = MealSuggestion {
            name: "Kumpir".to_string(),
            thumbnail: None,
            link: None,
            category: None,
            area: Some("Turkish".to_string()),
            ingredient_count: 7,
        };
        assert_eq!(format_meal_header(0, &meal), "[1] Kumpir (Turkish) - 7 ingredients");
    }

    #[test]
    fn test_meal_estimate_lists_skipped() {
        let estimate = MealEstimate {
            failed: vec![FailedIngredient {
                slot: 2,
                ingredient: "sumac".to_string(),
                reason: "No food found for 'sumac'".to_string(),
            }],
            ..Default::default()
        };
        let text = format_meal_estimate(2, "Fattoush", &estimate);
        assert!(text.starts_with("[3] Fattoush estimated nutrition (0 of 1 ingredients):"));
        assert!(text.ends_with("Skipped: sumac"));
    }
}
