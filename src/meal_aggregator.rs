use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::api_connection::connection::{ApiConnectionError, NutritionProvider};
use crate::api_connection::endpoints::MealRecord;
use crate::config::{ProviderConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_REQUEST_TIMEOUT};
use crate::nutrient_extractor::{extract_nutrients, NutrientProfile, REFERENCE_GRAMS};
use crate::quantity_normalizer::estimate_grams;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationOptions {
    /// Ingredient lookups in flight at once.
    pub max_concurrency: usize,
    /// Applied to each ingredient lookup; expiry counts as a failed lookup.
    pub request_timeout: Duration,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl From<&ProviderConfig> for AggregationOptions {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            request_timeout: config.request_timeout,
        }
    }
}

/// Summed nutrients of every ingredient that could be resolved.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct MealTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MealTotals {
    /// Adds `profile` (per 100 g) scaled by `scale`.
    pub fn add_scaled(&mut self, profile: &NutrientProfile, scale: f64) {
        self.calories += profile.calories * scale;
        self.protein += profile.protein * scale;
        self.carbs += profile.carbs * scale;
        self.fat += profile.fat * scale;
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IngredientContribution {
    pub slot: usize,
    pub ingredient: String,
    pub matched_food: String,
    pub grams: f64,
    pub per_100g: NutrientProfile,
}

impl IngredientContribution {
    pub fn scale(&self) -> f64 {
        self.grams / REFERENCE_GRAMS
    }

    pub fn nutrients(&self) -> NutrientProfile {
        self.per_100g.scaled(self.scale())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FailedIngredient {
    pub slot: usize,
    pub ingredient: String,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct MealEstimate {
    pub totals: MealTotals,
    /// Sorted by slot.
    pub contributions: Vec<IngredientContribution>,
    /// Sorted by slot.
    pub failed: Vec<FailedIngredient>,
}

enum SlotOutcome {
    Resolved(IngredientContribution),
    Failed(FailedIngredient),
}

async fn resolve_slot(
    provider: &dyn NutritionProvider,
    slot: usize,
    ingredient: &str,
    measure: Option<&str>,
    timeout: Duration,
) -> SlotOutcome {
    let query = ingredient.trim();
    let lookup = match tokio::time::timeout(timeout, provider.first_food(query)).await {
        Ok(result) => result,
        Err(_) => Err(ApiConnectionError::Timeout {
            query: query.to_string(),
            timeout,
        }),
    };

    match lookup {
        Ok(food) => {
            SlotOutcome::Resolved(IngredientContribution {
                slot,
                ingredient: query.to_string(),
                per_100g: extract_nutrients(&food),
                matched_food: food.description,
                grams: estimate_grams(measure),
            })
        }
        Err(e) => {
            tracing::warn!("Skipping ingredient {} '{}': {}", slot, query, e);
            SlotOutcome::Failed(FailedIngredient {
                slot,
                ingredient: query.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Estimates a meal's total nutrients from its ingredient/measure slots.
///
/// Each non-blank ingredient is looked up independently; up to
/// `options.max_concurrency` lookups run at once. A lookup that errors, finds
/// nothing or times out contributes zero and is recorded in
/// [`MealEstimate::failed`]. The estimate is returned only after every slot
/// has been processed.
pub async fn estimate_meal_nutrition(
    provider: &dyn NutritionProvider,
    meal: &MealRecord,
    options: &AggregationOptions,
) -> MealEstimate {
    let slots = meal.ingredient_pairs();
    tracing::debug!("Estimating '{}' from {} ingredients", meal.name, slots.len());

    let timeout = options.request_timeout;
    let mut estimate = stream::iter(slots)
        .map(|(slot, ingredient, measure)| resolve_slot(provider, slot, ingredient, measure, timeout))
        .buffer_unordered(options.max_concurrency.max(1))
        .fold(MealEstimate::default(), |mut acc, outcome| async move {
            match outcome {
                SlotOutcome::Resolved(contribution) => {
                    acc.totals.add_scaled(&contribution.per_100g, contribution.scale());
                    acc.contributions.push(contribution);
                }
                SlotOutcome::Failed(failure) => acc.failed.push(failure),
            }
            acc
        })
        .await;

    estimate.contributions.sort_by_key(|c| c.slot);
    estimate.failed.sort_by_key(|f| f.slot);

    tracing::info!(
        "'{}': {:.1} kcal from {} ingredients ({} failed)",
        meal.name,
        estimate.totals.calories,
        estimate.contributions.len(),
        estimate.failed.len()
    );
    estimate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_connection::endpoints::{FoodNutrient, FoodRecord, MAX_MEAL_INGREDIENTS};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeProvider {
        foods: HashMap<String, FoodRecord>,
        failing: HashSet<String>,
        slow: HashSet<String>,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl FakeProvider {
        fn with_food(mut self, name: &str, calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
            self.foods.insert(
                name.to_string(),
                FoodRecord {
                    description: format!("{}, raw", name),
                    food_nutrients: vec![
                        FoodNutrient::new("Energy", calories),
                        FoodNutrient::new("Protein", protein),
                        FoodNutrient::new("Carbohydrate, by difference", carbs),
                        FoodNutrient::new("Total lipid (fat)", fat),
                    ],
                    ..Default::default()
                },
            );
            self
        }

        fn failing_on(mut self, name: &str) -> Self {
            self.failing.insert(name.to_string());
            self
        }

        fn slow_on(mut self, name: &str) -> Self {
            self.slow.insert(name.to_string());
            self
        }
    }

    #[async_trait]
    impl NutritionProvider for FakeProvider {
        async fn search_foods(&self, query: &str) -> Result<Vec<FoodRecord>, ApiConnectionError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.slow.contains(query) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.contains(query) {
                return Err(ApiConnectionError::ApiError {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    error_body: "boom".to_string(),
                });
            }
            Ok(self.foods.get(query).cloned().into_iter().collect())
        }
    }

    fn assert_totals(actual: &MealTotals, expected: &MealTotals) {
        let eps = 1e-6;
        assert!((actual.calories - expected.calories).abs() < eps, "{:?} vs {:?}", actual, expected);
        assert!((actual.protein - expected.protein).abs() < eps, "{:?} vs {:?}", actual, expected);
        assert!((actual.carbs - expected.carbs).abs() < eps, "{:?} vs {:?}", actual, expected);
        assert!((actual.fat - expected.fat).abs() < eps, "{:?} vs {:?}", actual, expected);
    }

    fn twenty_ingredient_meal() -> MealRecord {
        (1..=MAX_MEAL_INGREDIENTS).fold(MealRecord::new("Big Stew"), |meal, i| {
            meal.with_ingredient(i, &format!("food{}", i), "1 cup")
        })
    }

    fn provider_for_twenty() -> FakeProvider {
        (1..=MAX_MEAL_INGREDIENTS).fold(FakeProvider::default(), |p, i| {
            p.with_food(&format!("food{}", i), 100.0, 10.0, 20.0, 5.0)
        })
    }

    #[tokio::test]
    async fn test_blank_slots_give_zero_totals() {
        let mut meal = MealRecord::new("Empty");
        for i in 1..=MAX_MEAL_INGREDIENTS {
            meal = meal.with_ingredient(i, if i % 2 == 0 { "" } else { "   " }, "1 cup");
        }
        let provider = FakeProvider::default();

        let estimate = estimate_meal_nutrition(&provider, &meal, &AggregationOptions::default()).await;

        assert!(estimate.totals.is_zero());
        assert!(estimate.contributions.is_empty());
        assert!(estimate.failed.is_empty());
        assert_eq!(provider.peak_in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scales_each_ingredient_by_its_measure() {
        let meal = MealRecord::new("Toast")
            .with_ingredient(1, "bread", "2 slices")
            .with_ingredient(2, "butter", "1 tbsp")
            .with_ingredient(3, "honey", "");
        let provider = FakeProvider::default()
            .with_food("bread", 265.0, 9.0, 49.0, 3.2)
            .with_food("butter", 717.0, 0.9, 0.1, 81.0)
            .with_food("honey", 304.0, 0.3, 82.0, 0.0);

        let estimate = estimate_meal_nutrition(&provider, &meal, &AggregationOptions::default()).await;

        // bread 60 g, butter 15 g, honey defaults to 100 g
        let expected = MealTotals {
            calories: 265.0 * 0.6 + 717.0 * 0.15 + 304.0,
            protein: 9.0 * 0.6 + 0.9 * 0.15 + 0.3,
            carbs: 49.0 * 0.6 + 0.1 * 0.15 + 82.0,
            fat: 3.2 * 0.6 + 81.0 * 0.15,
        };
        assert_totals(&estimate.totals, &expected);
        let grams: Vec<f64> = estimate.contributions.iter().map(|c| c.grams).collect();
        assert_eq!(grams, vec![60.0, 15.0, 100.0]);
        assert_eq!(estimate.contributions[0].matched_food, "bread, raw");
    }

    #[tokio::test]
    async fn test_one_failed_lookup_does_not_affect_the_rest() {
        let meal = twenty_ingredient_meal();
        let provider = provider_for_twenty().failing_on("food7");

        let estimate = estimate_meal_nutrition(&provider, &meal, &AggregationOptions::default()).await;

        // 19 ingredients at 240 g each
        let expected = MealTotals {
            calories: 19.0 * 240.0,
            protein: 19.0 * 24.0,
            carbs: 19.0 * 48.0,
            fat: 19.0 * 12.0,
        };
        assert_totals(&estimate.totals, &expected);
        assert_eq!(estimate.contributions.len(), 19);
        assert_eq!(estimate.failed.len(), 1);
        assert_eq!(estimate.failed[0].slot, 7);
        assert_eq!(estimate.failed[0].ingredient, "food7");
    }

    #[tokio::test]
    async fn test_not_found_counts_as_failure() {
        let meal = MealRecord::new("Mystery")
            .with_ingredient(1, "unobtainium", "1 cup")
            .with_ingredient(2, "water", "1 cup");
        let provider = FakeProvider::default().with_food("water", 0.0, 0.0, 0.0, 0.0);

        let estimate = estimate_meal_nutrition(&provider, &meal, &AggregationOptions::default()).await;

        assert!(estimate.totals.is_zero());
        assert_eq!(estimate.contributions.len(), 1);
        assert_eq!(estimate.failed.len(), 1);
        assert!(estimate.failed[0].reason.contains("unobtainium"));
    }

    #[tokio::test]
    async fn test_timeout_is_treated_as_failed_lookup() {
        let meal = MealRecord::new("Slow")
            .with_ingredient(1, "rice", "100 g")
            .with_ingredient(2, "saffron", "1 tsp");
        let provider = FakeProvider::default()
            .with_food("rice", 130.0, 2.7, 28.0, 0.3)
            .with_food("saffron", 310.0, 11.0, 65.0, 6.0)
            .slow_on("saffron");
        let options = AggregationOptions {
            max_concurrency: 2,
            request_timeout: Duration::from_millis(200),
        };

        let estimate = estimate_meal_nutrition(&provider, &meal, &options).await;

        assert_totals(
            &estimate.totals,
            &MealTotals {
                calories: 130.0,
                protein: 2.7,
                carbs: 28.0,
                fat: 0.3,
            },
        );
        assert_eq!(estimate.failed.len(), 1);
        assert!(estimate.failed[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let meal = twenty_ingredient_meal();
        let provider = provider_for_twenty();
        let options = AggregationOptions {
            max_concurrency: 3,
            ..Default::default()
        };

        let estimate = estimate_meal_nutrition(&provider, &meal, &options).await;

        assert_eq!(estimate.contributions.len(), 20);
        assert!(provider.peak_in_flight.load(Ordering::SeqCst) <= 3);
        let slots: Vec<usize> = estimate.contributions.iter().map(|c| c.slot).collect();
        assert_eq!(slots, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_contribution_nutrients() {
        let contribution = IngredientContribution {
            slot: 1,
            ingredient: "apple".to_string(),
            matched_food: "Apples, raw".to_string(),
            grams: 150.0,
            per_100g: NutrientProfile::new(52.0, 0.3, 14.0, 0.2),
        };
        assert!((contribution.scale() - 1.5).abs() < 1e-12);
        assert!((contribution.nutrients().calories - 78.0).abs() < 1e-9);
    }

    struct TwoRankedFoods;

    #[async_trait]
    impl NutritionProvider for TwoRankedFoods {
        async fn search_foods(&self, query: &str) -> Result<Vec<FoodRecord>, ApiConnectionError> {
            let ranked = |description: String, calories: f64| FoodRecord {
                description,
                food_nutrients: vec![
                    FoodNutrient::new("Energy", calories),
                    FoodNutrient::new("Protein", calories / 10.0),
                ],
                ..Default::default()
            };
            Ok(vec![
                ranked(format!("{}, raw", query), 100.0),
                ranked(format!("{}, fried", query), 900.0),
            ])
        }
    }

    #[tokio::test]
    async fn test_only_first_ranked_food_contributes() {
        let meal = MealRecord::new("Chips")
            .with_ingredient(1, "potato", "2 pieces")
            .with_ingredient(2, "onion", "1 piece");

        let estimate = estimate_meal_nutrition(&TwoRankedFoods, &meal, &AggregationOptions::default()).await;

        // 100 g + 50 g at 100 kcal / 10 g protein per 100 g
        assert_totals(
            &estimate.totals,
            &MealTotals {
                calories: 150.0,
                protein: 15.0,
                carbs: 0.0,
                fat: 0.0,
            },
        );
        let matched: Vec<&str> = estimate.contributions.iter().map(|c| c.matched_food.as_str()).collect();
        assert_eq!(matched, vec!["potato, raw", "onion, raw"]);
    }
}
