//! Inference client abstraction and implementations.
//!
//! Defines the [`InferenceClient`] trait and concrete implementations:
//! - **[`DisabledClient`]** — returns errors; used when inference is not
//!   configured.
//! - **[`GeminiClient`]** — calls the Gemini `generateContent` endpoint
//!   with the meal photo inline and a fixed structured-output schema.
//!
//! # No retry
//!
//! Unlike most remote clients there is deliberately no retry/backoff loop
//! here: rate limits surface immediately as [`InferenceError::RateLimited`]
//! so the caller can decide to cool down. Resubmitting the same photo is
//! the retry mechanism, and the result cache makes a repeat of a
//! successful call free.
//!
//! # Status classification
//!
//! - HTTP 429 → `RateLimited`
//! - HTTP 401/403 → `Configuration` (bad or revoked credentials)
//! - other non-success and network errors → `Transport`
//! - a response envelope with no candidate text → `Malformed`

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::InferenceConfig;

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Errors the inference layer may report. Collapsed into the caller-facing
/// taxonomy by the orchestrator.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference client configuration error: {0}")]
    Configuration(String),
    #[error("inference service rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("inference service transport failure: {0}")]
    Transport(String),
    #[error("inference service returned an unusable response: {0}")]
    Malformed(String),
}

/// A vision-language client that turns a meal photo into the serialized
/// analysis JSON. The returned text is untrusted and must be normalized.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-3-flash-preview"`).
    fn model_name(&self) -> &str;

    /// Analyze one meal photo (JPEG, base64-encoded). Returns the raw
    /// serialized analysis text.
    async fn analyze_meal(&self, image_base64: &str) -> Result<String, InferenceError>;
}

// ============ Disabled Client ============

/// A no-op client that always returns errors.
///
/// Used when `inference.provider = "disabled"` in the configuration.
pub struct DisabledClient;

#[async_trait]
impl InferenceClient for DisabledClient {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn analyze_meal(&self, _image_base64: &str) -> Result<String, InferenceError> {
        Err(InferenceError::Configuration(
            "inference provider is disabled; set [inference] provider in config".to_string(),
        ))
    }
}

// ============ Gemini Client ============

/// Client for the Gemini `generateContent` API.
///
/// The request carries a fixed instruction (a static string, not user
/// input), the photo as inline JPEG data, and a response schema mirroring
/// the analysis shape. Temperature is pinned low so identical photos
/// produce effectively deterministic results, which is what makes the
/// unsynchronized duplicate-miss race harmless.
pub struct GeminiClient {
    model: String,
    api_key: String,
    endpoint: String,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Create a new Gemini client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the API key environment variable named in
    /// config is not set, or if the HTTP client cannot be built.
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            InferenceError::Configuration(format!(
                "{} environment variable not set",
                config.api_key_env
            ))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::Configuration(e.to_string()))?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            endpoint: config
                .url
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            http,
        })
    }
}

const ANALYSIS_PROMPT: &str = "Analyze this photo of an Indian/Bengali meal. \
    Identify every item on the plate (e.g. Rice, Dal, Bhaja, Macher Jhol, Luchi, Mishti). \
    Provide precise nutritional estimation based on standard Bengali household cooking styles. \
    Give every name, portion, note, and the advice in English (en), Bengali (bn), Hindi (hi), \
    and Assamese (as). Classify each item's nutritional soundness as PASS, WARNING, or FAIL. \
    If the photo contains no edible food, return an empty items array.";

/// Structured-output schema for one localized text field.
fn localized_schema(description: &str) -> Value {
    json!({
        "type": "OBJECT",
        "description": description,
        "properties": {
            "en": { "type": "STRING" },
            "bn": { "type": "STRING" },
            "hi": { "type": "STRING" },
            "as": { "type": "STRING" }
        },
        "required": ["en", "bn", "hi", "as"]
    })
}

/// The full response schema sent with every request so the model returns
/// data in a predictable shape.
fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "items": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": localized_schema("Name of the food item (e.g. Luchi, Macher Jhol, Chholar Dal)."),
                        "portion": localized_schema("Estimated portion size (e.g. 2 pieces, 1 bowl)."),
                        "calories": { "type": "NUMBER", "description": "Calories in kcal." },
                        "protein": { "type": "NUMBER", "description": "Protein in grams." },
                        "carbs": { "type": "NUMBER", "description": "Carbohydrates in grams." },
                        "fats": { "type": "NUMBER", "description": "Fats in grams." },
                        "notes": localized_schema("Specific details about ingredients detected (e.g. contains mustard oil)."),
                        "status": { "type": "STRING", "enum": ["PASS", "WARNING", "FAIL"] }
                    },
                    "required": ["name", "portion", "calories", "protein", "carbs", "fats", "notes", "status"]
                }
            },
            "totalCalories": { "type": "NUMBER" },
            "totalProtein": { "type": "NUMBER" },
            "totalCarbs": { "type": "NUMBER" },
            "totalFats": { "type": "NUMBER" },
            "healthRating": { "type": "NUMBER", "description": "A score from 1-10 on how balanced this meal is." },
            "advice": localized_schema("A short, helpful tip for the user regarding this specific meal.")
        },
        "required": ["items", "totalCalories", "totalProtein", "totalCarbs", "totalFats", "healthRating", "advice"]
    })
}

#[async_trait]
impl InferenceClient for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn analyze_meal(&self, image_base64: &str) -> Result<String, InferenceError> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": ANALYSIS_PROMPT },
                    { "inline_data": { "mime_type": "image/jpeg", "data": image_base64 } }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": analysis_schema(),
                "temperature": 0.1
            }
        });

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body_text));
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| InferenceError::Malformed(format!("unreadable response body: {e}")))?;
        extract_candidate_text(&envelope)
    }
}

/// Map a non-success HTTP status to an error kind.
fn classify_status(status: u16, body: &str) -> InferenceError {
    let detail = format!("HTTP {status}: {}", truncate(body, 200));
    match status {
        429 => InferenceError::RateLimited(detail),
        401 | 403 => InferenceError::Configuration(format!(
            "inference service rejected credentials ({detail})"
        )),
        _ => InferenceError::Transport(detail),
    }
}

/// Pull the generated text out of the `generateContent` envelope.
fn extract_candidate_text(envelope: &Value) -> Result<String, InferenceError> {
    envelope
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .and_then(|parts| parts.first())
        .and_then(|part| part.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            InferenceError::Malformed("response envelope has no candidate text".to_string())
        })
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Create the appropriate [`InferenceClient`] based on configuration.
///
/// | Config Value | Client |
/// |-------------|--------|
/// | `"disabled"` | [`DisabledClient`] |
/// | `"gemini"` | [`GeminiClient`] |
pub fn create_client(config: &InferenceConfig) -> Result<Box<dyn InferenceClient>, InferenceError> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledClient)),
        "gemini" => Ok(Box::new(GeminiClient::new(config)?)),
        other => Err(InferenceError::Configuration(format!(
            "unknown inference provider: {other}"
        ))),
    }
}
