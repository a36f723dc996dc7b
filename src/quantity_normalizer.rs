//! Free-text measure to grams estimation.
//!
//! Recipe measures look like `"1/2 cup"`, `"2 tbsp"` or `"200 grams"`. The
//! tokenizer here reads a leading number (decimal or simple `a/b` fraction),
//! whitespace, then the first alphabetic run as the unit, then converts through a
//! fixed grams-per-unit table. Anything it cannot read is estimated at 100 g.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mass assumed when a measure is missing or unreadable.
pub const DEFAULT_GRAMS: f64 = 100.0;
/// Grams per unit for units the table does not know.
pub const UNKNOWN_UNIT_GRAMS: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasureParseError {
    #[error("measure is empty")]
    Empty,
    #[error("no quantity followed by a unit in '{0}'")]
    NoQuantityOrUnit(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("zero denominator in '{0}'")]
    ZeroDenominator(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub quantity: f64,
    /// Lowercased unit token.
    pub unit: String,
}

impl Measure {
    pub fn grams(&self) -> f64 {
        self.quantity * grams_per_unit(&self.unit).unwrap_or(UNKNOWN_UNIT_GRAMS)
    }
}

/// Grams in one `unit`. Case-sensitive; callers pass the lowercased token.
pub fn grams_per_unit(unit: &str) -> Option<f64> {
    let grams = match unit {
        "cup" => 240.0,
        "tablespoon" | "tbsp" => 15.0,
        "teaspoon" | "tsp" => 5.0,
        "slice" | "slices" => 30.0,
        "piece" | "pieces" => 50.0,
        "oz" | "ounces" => 28.35,
        "pound" | "lb" => 453.592,
        "g" | "gram" | "grams" => 1.0,
        _ => return None,
    };
    Some(grams)
}

pub fn parse_measure(input: &str) -> Result<Measure, MeasureParseError> {
    let normalized = input.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(MeasureParseError::Empty);
    }

    let number_end = normalized
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '/'))
        .unwrap_or(normalized.len());
    let number = &normalized[..number_end];
    let rest = &normalized[number_end..];
    let separated = rest.starts_with(char::is_whitespace);
    let unit: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_lowercase())
        .collect();

    if number.is_empty() || !separated || unit.is_empty() {
        return Err(MeasureParseError::NoQuantityOrUnit(normalized));
    }

    Ok(Measure {
        quantity: parse_quantity(number)?,
        unit,
    })
}

fn parse_quantity(token: &str) -> Result<f64, MeasureParseError> {
    let invalid = || MeasureParseError::InvalidNumber(token.to_string());

    match token.split_once('/') {
        Some((numerator, denominator)) => {
            let numerator: f64 = numerator.parse().map_err(|_| invalid())?;
            let denominator: f64 = denominator.parse().map_err(|_| invalid())?;
            if denominator == 0.0 {
                return Err(MeasureParseError::ZeroDenominator(token.to_string()));
            }
            Ok(numerator / denominator)
        }
        None => token.parse().map_err(|_| invalid()),
    }
}

/// Estimated mass of `measure` in grams, falling back to [`DEFAULT_GRAMS`].
pub fn estimate_grams(measure: Option<&str>) -> f64 {
    match measure.map(parse_measure) {
        Some(Ok(parsed)) => parsed.grams(),
        Some(Err(e)) => {
            tracing::debug!("Using {}g default for measure: {}", DEFAULT_GRAMS, e);
            DEFAULT_GRAMS
        }
        None => DEFAULT_GRAMS,
    }
}
