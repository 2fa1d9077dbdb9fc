//! Normalization of untrusted inference output.
//!
//! The inference service is asked for a fixed JSON shape but its output is
//! never trusted: fields go missing, numbers arrive as strings, localized
//! objects arrive as bare strings, and empty-plate responses sometimes
//! carry plausible-looking totals or advice anyway. Everything the rest of
//! the system consumes has passed through [`normalize_raw`], so no
//! defensive coercion is needed downstream.
//!
//! The one hard failure is a payload that is not a JSON object at all —
//! that signals a service-level problem and must surface as an error, not
//! be coerced into an empty-plate success.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{AnalysisResult, FoodItem, ItemStatus, LocalizedText};

/// Raised only for payloads that cannot be treated as an analysis object at
/// all. Structurally incomplete-but-parseable input is repaired, not
/// rejected.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("analysis payload is not valid JSON: {0}")]
    Unparsable(#[from] serde_json::Error),
    #[error("analysis payload is not a JSON object")]
    NotAnObject,
}

/// Parse and normalize a raw response body from the inference service.
///
/// Idempotent: normalizing an already-normalized result changes nothing.
pub fn normalize_raw(raw: &str) -> Result<AnalysisResult, NormalizeError> {
    let value: Value = serde_json::from_str(raw)?;
    let object = value.as_object().ok_or(NormalizeError::NotAnObject)?;
    Ok(normalize_object(object))
}

/// The standardized result for a photo with no analyzable food in it.
///
/// Whatever totals or advice the model produced alongside an empty item
/// list are discarded in favor of this.
pub fn refusal_result() -> AnalysisResult {
    AnalysisResult {
        items: Vec::new(),
        total_calories: 0.0,
        total_protein: 0.0,
        total_carbs: 0.0,
        total_fats: 0.0,
        health_rating: 0.0,
        advice: refusal_advice(),
    }
}

/// The "no edible food detected" advice in every supported language.
pub fn refusal_advice() -> LocalizedText {
    LocalizedText {
        en: "No edible food detected in this photo. Please try another image.".into(),
        bn: "ছবিতে কোনো খাবার শনাক্ত করা যায়নি। অনুগ্রহ করে অন্য একটি ছবি চেষ্টা করুন।".into(),
        hi: "इस तस्वीर में कोई खाने योग्य भोजन नहीं मिला। कृपया दूसरी तस्वीर आज़माएँ।".into(),
        asm: "এই ফটোত কোনো খাদ্য চিনাক্ত কৰিব পৰা নগ'ল। অনুগ্ৰহ কৰি আন এখন ফটো চেষ্টা কৰক।".into(),
    }
}

fn normalize_object(object: &Map<String, Value>) -> AnalysisResult {
    let items: Vec<FoodItem> = object
        .get("items")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(normalize_item).collect())
        .unwrap_or_default();

    // An empty plate zeroes every aggregate and replaces the advice,
    // regardless of what the model claimed.
    if items.is_empty() {
        return refusal_result();
    }

    AnalysisResult {
        items,
        total_calories: coerce_non_negative(object.get("totalCalories")),
        total_protein: coerce_non_negative(object.get("totalProtein")),
        total_carbs: coerce_non_negative(object.get("totalCarbs")),
        total_fats: coerce_non_negative(object.get("totalFats")),
        health_rating: coerce_number(object.get("healthRating")),
        advice: normalize_text(object.get("advice")),
    }
}

// Entries that are not even objects carry no usable nutrition signal.
fn normalize_item(value: &Value) -> Option<FoodItem> {
    let object = value.as_object()?;
    Some(FoodItem {
        name: normalize_text(object.get("name")),
        portion: normalize_text(object.get("portion")),
        calories: coerce_non_negative(object.get("calories")),
        protein: coerce_non_negative(object.get("protein")),
        carbs: coerce_non_negative(object.get("carbs")),
        fats: coerce_non_negative(object.get("fats")),
        notes: normalize_text(object.get("notes")),
        status: object
            .get("status")
            .and_then(Value::as_str)
            .and_then(ItemStatus::parse)
            .unwrap_or_default(),
    })
}

/// Coerce to a finite number; absent, non-numeric, or non-finite → 0.
fn coerce_number(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if number.is_finite() {
        number
    } else {
        0.0
    }
}

fn coerce_non_negative(value: Option<&Value>) -> f64 {
    coerce_number(value).max(0.0)
}

/// Accept either a localized object or a bare string (taken as English),
/// then fill language gaps.
fn normalize_text(value: Option<&Value>) -> LocalizedText {
    let mut text = match value {
        Some(Value::String(s)) => LocalizedText::from_en(s.clone()),
        Some(Value::Object(map)) => LocalizedText {
            en: string_field(map, "en"),
            bn: string_field(map, "bn"),
            hi: string_field(map, "hi"),
            asm: string_field(map, "as"),
        },
        _ => LocalizedText::default(),
    };
    text.fill_gaps();
    text
}

fn string_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}
