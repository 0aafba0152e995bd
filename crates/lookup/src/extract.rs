//! Typed extraction of dimension values from lookup response bodies.
//!
//! Every shape mismatch becomes `MalformedResponse`; nothing here panics on
//! unexpected input.

use engine_core::{CountryProbability, Dimension, DimensionValue, LookupFailure, LookupOutcome};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Extracts the value for `dimension` from a decoded response body.
pub fn extract(dimension: Dimension, body: &Value) -> LookupOutcome<DimensionValue> {
    match dimension {
        Dimension::Age => extract_age(body).map(DimensionValue::Age),
        Dimension::Gender => extract_gender(body).map(DimensionValue::Gender),
        Dimension::Nationality => extract_countries(body).map(DimensionValue::Nationality),
    }
}

/// `{"age": 57.0}` -> 57. Fractions truncate; negatives and values above 255 are rejected.
pub fn extract_age(body: &Value) -> LookupOutcome<u8> {
    let value = field(body, Dimension::Age.response_key())?;
    let age = value
        .as_f64()
        .ok_or_else(|| LookupFailure::malformed(format!("age is not a number: {}", value)))?;

    if !age.is_finite() || age < 0.0 || age > f64::from(u8::MAX) {
        return Err(LookupFailure::malformed(format!(
            "age {} outside 0..=255",
            age
        )));
    }

    Ok(age.trunc() as u8)
}

/// `{"gender": "male"}` -> "male". Any non-empty string passes through verbatim.
pub fn extract_gender(body: &Value) -> LookupOutcome<String> {
    let value = field(body, Dimension::Gender.response_key())?;
    match value.as_str() {
        Some(gender) if !gender.is_empty() => Ok(gender.to_string()),
        Some(_) => Err(LookupFailure::malformed("gender is empty")),
        None => Err(LookupFailure::malformed(format!(
            "gender is not a string: {}",
            value
        ))),
    }
}

/// `{"country": [{"country_id": "US", "probability": 0.2}, ...]}` -> candidates in delivery order.
pub fn extract_countries(body: &Value) -> LookupOutcome<Vec<CountryProbability>> {
    let value = field(body, Dimension::Nationality.response_key())?;
    if !value.is_array() {
        return Err(LookupFailure::malformed(format!(
            "country is not an array: {}",
            value
        )));
    }

    Vec::<CountryProbability>::deserialize(value)
        .map_err(|e| LookupFailure::malformed(format!("invalid country entry: {}", e)))
}

fn field<'a>(body: &'a Value, key: &str) -> LookupOutcome<&'a Value> {
    let object: &Map<String, Value> = body
        .as_object()
        .ok_or_else(|| LookupFailure::malformed("response body is not a JSON object"))?;

    object
        .get(key)
        .ok_or_else(|| LookupFailure::malformed(format!("missing key '{}'", key)))
}
