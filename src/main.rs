use anyhow::{Context, Result};
use futures::StreamExt;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use meal_nutrition::api_connection::{ApiConnectionError, MealDbClient, UsdaClient};
use meal_nutrition::cli::{parse_args, Cli};
use meal_nutrition::config::ProviderConfig;
use meal_nutrition::food_lookup::lookup_food;
use meal_nutrition::meal_aggregator::AggregationOptions;
use meal_nutrition::meal_suggestions::{estimate_meals, find_meals, MealSuggestion};
use meal_nutrition::report;

const DEFAULT_LOG_DIRECTIVE: &str = "meal_nutrition=info";
const VERBOSE_LOG_DIRECTIVE: &str = "meal_nutrition=debug";

/// `RUST_LOG` wins when set; `--verbose` layers debug for this crate on top.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> Result<EnvFilter> {
    let from_env = rust_log
        .filter(|s| !s.trim().is_empty())
        .map(|s| EnvFilter::try_new(s))
        .transpose()
        .context("Invalid RUST_LOG")?;

    let filter = match (from_env, verbose) {
        (Some(filter), false) => filter,
        (Some(filter), true) => filter.add_directive(VERBOSE_LOG_DIRECTIVE.parse()?),
        (None, true) => EnvFilter::new(VERBOSE_LOG_DIRECTIVE),
        (None, false) => EnvFilter::new(DEFAULT_LOG_DIRECTIVE),
    };
    Ok(filter)
}

fn init_logging(verbose: bool) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref())?)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn apply_overrides(config: &mut ProviderConfig, cli: &Cli) {
    if let Some(n) = cli.concurrency.filter(|n| *n > 0) {
        config.max_concurrency = n;
    }
    if let Some(secs) = cli.timeout_secs.filter(|s| *s > 0) {
        config.request_timeout = Duration::from_secs(secs);
    }
}

async fn suggest_meals(
    cli: &Cli,
    nutrition: &UsdaClient,
    recipes: &MealDbClient,
    options: &AggregationOptions,
) -> Result<()> {
    let meals = find_meals(recipes, &cli.food, cli.meals)
        .await
        .with_context(|| format!("Meal search for '{}' failed", cli.food))?;

    if meals.is_empty() {
        println!("\nNo meals found for '{}'.", cli.food);
        return Ok(());
    }

    println!("\nSuggested meals:");
    let suggestions: Vec<MealSuggestion> = meals.iter().map(MealSuggestion::from).collect();
    for (index, suggestion) in suggestions.iter().enumerate() {
        println!("{}", report::format_meal_header(index, suggestion));
    }

    println!("\nEstimating meal nutrition...");
    let mut estimates = std::pin::pin!(estimate_meals(nutrition, &meals, options));
    while let Some((index, estimate)) = estimates.next().await {
        println!(
            "{}",
            report::format_meal_estimate(index, &suggestions[index].name, &estimate)
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_args();
    init_logging(cli.verbose)?;

    let mut config = ProviderConfig::from_env().context("Failed to load provider configuration")?;
    apply_overrides(&mut config, &cli);

    let nutrition = UsdaClient::new(&config).context("Failed to build FoodData Central client")?;
    let recipes = MealDbClient::new(&config).context("Failed to build TheMealDB client")?;
    let options = AggregationOptions::from(&config);

    match lookup_food(&nutrition, &cli.food, cli.grams).await {
        Ok(result) => println!("{}", report::format_food_result(&result)),
        Err(ApiConnectionError::NotFound { query }) => {
            println!("No nutrition data found for '{}'.", query)
        }
        Err(e) => eprintln!("Nutrition lookup for '{}' failed: {}", cli.food, e),
    }

    if cli.wants_meals() {
        if let Err(e) = suggest_meals(&cli, &nutrition, &recipes, &options).await {
            eprintln!("\n{:#}", e);
        }
    }

    Ok(())
}
