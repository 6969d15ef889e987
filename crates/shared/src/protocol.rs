//! Wire helpers for the products collection.
//!
//! Backends disagree on whether numeric fields travel as JSON numbers or as
//! strings, so decoding accepts both and normalizes into the domain types.

use serde::{de, Deserialize, Deserializer};

/// Collection path relative to the backend base URL.
pub const PRODUCTS_PATH: [&str; 2] = ["data", "products"];

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(i64),
    Float(f64),
    Text(String),
}

pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn parse_stock(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    raw.parse::<f64>().ok().and_then(integral)
}

fn integral(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Missing, `null` and blank values decode as `0`.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match present(Option::<NumberOrText>::deserialize(deserializer)?) {
        None => Ok(0.0),
        Some(NumberOrText::Int(value)) => Ok(value as f64),
        Some(NumberOrText::Float(value)) => Ok(value),
        Some(NumberOrText::Text(text)) => parse_price(&text)
            .ok_or_else(|| de::Error::custom(format!("expected a number, got '{text}'"))),
    }
}

/// Missing, `null` and blank values decode as `0`.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match present(Option::<NumberOrText>::deserialize(deserializer)?) {
        None => Ok(0),
        Some(NumberOrText::Int(value)) => Ok(value),
        Some(NumberOrText::Float(value)) => integral(value)
            .ok_or_else(|| de::Error::custom(format!("expected a whole number, got {value}"))),
        Some(NumberOrText::Text(text)) => parse_stock(&text)
            .ok_or_else(|| de::Error::custom(format!("expected a whole number, got '{text}'"))),
    }
}

/// Text field that may arrive as a number; `null` decodes as an empty string.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<NumberOrText>::deserialize(deserializer)?
        .map(NumberOrText::into_text)
        .unwrap_or_default())
}

/// Like [`lenient_text`] but `null` is an error.
pub fn id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(NumberOrText::deserialize(deserializer)?.into_text())
}

impl NumberOrText {
    fn into_text(self) -> String {
        match self {
            NumberOrText::Int(value) => value.to_string(),
            NumberOrText::Float(value) => value.to_string(),
            NumberOrText::Text(text) => text,
        }
    }
}

fn present(value: Option<NumberOrText>) -> Option<NumberOrText> {
    value.filter(|value| !matches!(value, NumberOrText::Text(text) if text.trim().is_empty()))
}
