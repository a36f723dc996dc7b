//! Provider configuration.
//!
//! Credentials and endpoints are collected once, at startup, and handed to the
//! HTTP clients explicitly. Values come from the process environment (after
//! loading `.env`), or from any key lookup when testing.

use std::env;
use std::time::Duration;

use crate::api_connection::endpoints::{
    DEFAULT_MEALDB_API_KEY, DEFAULT_MEALDB_BASE_URL, DEFAULT_USDA_BASE_URL,
};
use crate::api_connection::ApiConnectionError;

pub const USDA_API_KEY_ENV_VAR: &str = "FDC_API_KEY";
pub const USDA_BASE_URL_ENV_VAR: &str = "FDC_BASE_URL";
pub const MEALDB_API_KEY_ENV_VAR: &str = "MEALDB_API_KEY";
pub const MEALDB_BASE_URL_ENV_VAR: &str = "MEALDB_BASE_URL";
pub const REQUEST_TIMEOUT_ENV_VAR: &str = "REQUEST_TIMEOUT_SECS";
pub const MAX_CONCURRENCY_ENV_VAR: &str = "MAX_CONCURRENT_LOOKUPS";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub usda_api_key: String,
    pub usda_base_url: String,
    pub mealdb_api_key: String,
    pub mealdb_base_url: String,
    pub request_timeout: Duration,
    pub max_concurrency: usize,
}

impl ProviderConfig {
    /// Config pointing at the public endpoints with default limits.
    pub fn new(usda_api_key: impl Into<String>) -> Self {
        Self {
            usda_api_key: usda_api_key.into(),
            usda_base_url: DEFAULT_USDA_BASE_URL.to_string(),
            mealdb_api_key: DEFAULT_MEALDB_API_KEY.to_string(),
            mealdb_base_url: DEFAULT_MEALDB_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn from_env() -> Result<Self, ApiConnectionError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiConnectionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let usda_api_key = non_empty(USDA_API_KEY_ENV_VAR)
            .ok_or_else(|| ApiConnectionError::MissingApiKey(USDA_API_KEY_ENV_VAR.to_string()))?;

        let mut config = Self::new(usda_api_key);

        if let Some(url) = non_empty(USDA_BASE_URL_ENV_VAR) {
            config.usda_base_url = url;
        }
        if let Some(key) = non_empty(MEALDB_API_KEY_ENV_VAR) {
            config.mealdb_api_key = key;
        }
        if let Some(url) = non_empty(MEALDB_BASE_URL_ENV_VAR) {
            config.mealdb_base_url = url;
        }
        if let Some(raw) = non_empty(REQUEST_TIMEOUT_ENV_VAR) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    "Ignoring invalid {}='{}', using {}s",
                    REQUEST_TIMEOUT_ENV_VAR,
                    raw,
                    DEFAULT_REQUEST_TIMEOUT.as_secs()
                ),
            }
        }
        if let Some(raw) = non_empty(MAX_CONCURRENCY_ENV_VAR) {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => config.max_concurrency = n,
                _ => tracing::warn!(
                    "Ignoring invalid {}='{}', using {}",
                    MAX_CONCURRENCY_ENV_VAR,
                    raw,
                    DEFAULT_MAX_CONCURRENCY
                ),
            }
        }

        Ok(config)
    }
}
