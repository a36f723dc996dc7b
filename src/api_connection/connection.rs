use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use super::endpoints::{FoodRecord, FoodSearchResponse, MealRecord, MealSearchResponse};
use crate::config::ProviderConfig;

/// Only the best-ranked food is ever used.
const FOOD_SEARCH_PAGE_SIZE: u32 = 1;

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("No food found for '{query}'")]
    NotFound { query: String },
    #[error("Lookup for '{query}' timed out after {timeout:?}")]
    Timeout { query: String, timeout: Duration },
}

/// Read-only nutrition data source, ranked by relevance.
#[async_trait]
pub trait NutritionProvider: Send + Sync {
    async fn search_foods(&self, query: &str) -> Result<Vec<FoodRecord>, ApiConnectionError>;

    /// Best match only. An empty result is a `NotFound`.
    async fn first_food(&self, query: &str) -> Result<FoodRecord, ApiConnectionError> {
        self.search_foods(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiConnectionError::NotFound {
                query: query.to_string(),
            })
    }
}

/// Read-only recipe data source.
#[async_trait]
pub trait RecipeProvider: Send + Sync {
    async fn search_meals(&self, query: &str) -> Result<Vec<MealRecord>, ApiConnectionError>;
}

impl From<reqwest::Error> for ApiConnectionError {
    /// Strips the request URL, which carries the FoodData Central key.
    fn from(err: reqwest::Error) -> Self {
        ApiConnectionError::NetworkError(err.without_url())
    }
}

fn build_http_client(timeout: Duration) -> Result<Client, ApiConnectionError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

async fn error_from_response(response: reqwest::Response) -> ApiConnectionError {
    let status = response.status();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    ApiConnectionError::ApiError { status, error_body }
}

/// USDA FoodData Central search client.
#[derive(Debug, Clone)]
pub struct UsdaClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl UsdaClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiConnectionError> {
        if config.usda_api_key.trim().is_empty() {
            return Err(ApiConnectionError::MissingApiKey(
                crate::config::USDA_API_KEY_ENV_VAR.to_string(),
            ));
        }
        Ok(Self {
            client: build_http_client(config.request_timeout)?,
            base_url: config.usda_base_url.trim_end_matches('/').to_string(),
            api_key: config.usda_api_key.clone(),
        })
    }
}

#[async_trait]
impl NutritionProvider for UsdaClient {
    async fn search_foods(&self, query: &str) -> Result<Vec<FoodRecord>, ApiConnectionError> {
        let url = format!("{}/foods/search", self.base_url);
        tracing::debug!("Searching FoodData Central for '{}'", query);

        let page_size = FOOD_SEARCH_PAGE_SIZE.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", query),
                ("pageSize", page_size.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await?;
        let parsed: FoodSearchResponse = serde_json::from_str(&body)?;
        tracing::debug!("'{}' matched {} foods", query, parsed.foods.len());
        Ok(parsed.foods)
    }
}

/// TheMealDB search client.
#[derive(Debug, Clone)]
pub struct MealDbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MealDbClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiConnectionError> {
        Ok(Self {
            client: build_http_client(config.request_timeout)?,
            base_url: config.mealdb_base_url.trim_end_matches('/').to_string(),
            api_key: config.mealdb_api_key.clone(),
        })
    }
}

#[async_trait]
impl RecipeProvider for MealDbClient {
    async fn search_meals(&self, query: &str) -> Result<Vec<MealRecord>, ApiConnectionError> {
        let url = format!("{}/{}/search.php", self.base_url, self.api_key);
        tracing::debug!("Searching TheMealDB for '{}'", query);

        let response = self.client.get(&url).query(&[("s", query)]).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await?;
        let parsed: MealSearchResponse = serde_json::from_str(&body)?;
        Ok(parsed.meals.unwrap_or_default())
    }
}
