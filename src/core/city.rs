//! City key normalization.

use crate::error::{InsightsError, Result};

/// Normalize a city name (and optional country code) into a dataset key.
///
/// `"New York", Some("US")` becomes `"new_york_us"`; without a country code
/// the suffix is omitted.
pub fn city_key(city: &str, country_code: Option<&str>) -> Result<String> {
    let name = city.trim().to_lowercase().replace(' ', "_");
    if name.is_empty() {
        return Err(InsightsError::InputValidation("city is required".into()));
    }
    let cc = country_code.unwrap_or("").trim().to_lowercase();
    Ok(if cc.is_empty() {
        name
    } else {
        format!("{name}_{cc}")
    })
}

/// Check that `key` is an already-normalized dataset key and return it trimmed.
///
/// Keys name artifact directories and must stay inside the artifact root:
/// path separators, `..` and a leading dot are rejected, as is anything
/// `city_key` would not produce.
pub fn validate_key(key: &str) -> Result<&str> {
    let key = key.trim();
    if key.is_empty() {
        return Err(InsightsError::InputValidation("city key is required".into()));
    }
    let bad_char = key.chars().any(|c| {
        matches!(c, '/' | '\\') || c.is_whitespace() || c.is_control() || c.is_uppercase()
    });
    if bad_char || key.starts_with('.') || key.contains("..") {
        return Err(InsightsError::InputValidation(format!("malformed city key '{key}'")));
    }
    Ok(key)
}
