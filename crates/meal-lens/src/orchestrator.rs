//! Analysis orchestration: fingerprint, cache lookup, remote inference,
//! normalization.
//!
//! [`AnalysisOrchestrator`] is the single entry point the CLI and HTTP
//! server call. It is constructed from explicit dependencies — a cache, a
//! client, a fingerprint strategy — so a missing API key is a visible
//! construction-time failure, not a hidden module-level side effect.
//!
//! Per-call flow: fingerprint → cache get (a hit returns immediately, no
//! re-normalization) → remote call → normalize → best-effort cache put.
//! There is no internal retry (the user resubmitting the photo is the
//! retry) and no coalescing of concurrent identical misses: both calls go
//! remote, both write the same entry, the second write wins, and the low
//! sampling temperature makes the results effectively identical.

use std::sync::Arc;

use meal_lens_core::cache::ResultCache;
use meal_lens_core::fingerprint::FingerprintStrategy;
use meal_lens_core::models::{AnalysisResult, Language};
use meal_lens_core::normalize;
use thiserror::Error;

use crate::inference::{InferenceClient, InferenceError};

/// The closed caller-facing error taxonomy. The UI branches on
/// [`AnalysisError::code`]; cache failures never appear here.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The inference client is unusable until configuration is corrected.
    #[error("inference client is not configured: {0}")]
    Configuration(String),
    /// The remote service reported quota/rate exhaustion. Retryable after
    /// a cool-down; never auto-retried here.
    #[error("inference service rate limit exhausted")]
    RateLimited,
    /// The remote service returned content that cannot be parsed into the
    /// expected shape at all. Retryable.
    #[error("inference service returned an unusable analysis: {0}")]
    MalformedResponse(String),
    /// Network or service-unavailable conditions. Retryable.
    #[error("could not reach the inference service: {0}")]
    Transport(String),
}

impl AnalysisError {
    /// Stable machine-readable code for UI branching and HTTP payloads.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::Configuration(_) => "configuration_error",
            AnalysisError::RateLimited => "rate_limited",
            AnalysisError::MalformedResponse(_) => "malformed_response",
            AnalysisError::Transport(_) => "transport_error",
        }
    }
}

impl From<InferenceError> for AnalysisError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Configuration(msg) => AnalysisError::Configuration(msg),
            InferenceError::RateLimited(_) => AnalysisError::RateLimited,
            InferenceError::Transport(msg) => AnalysisError::Transport(msg),
            InferenceError::Malformed(msg) => AnalysisError::MalformedResponse(msg),
        }
    }
}

/// The façade coordinating cache, remote call, and normalization.
///
/// Stateless between calls apart from the shared persistent cache; every
/// call is independent and idempotent with respect to the cache.
pub struct AnalysisOrchestrator {
    cache: ResultCache,
    client: Arc<dyn InferenceClient>,
    strategy: FingerprintStrategy,
}

impl AnalysisOrchestrator {
    pub fn new(
        cache: ResultCache,
        client: Arc<dyn InferenceClient>,
        strategy: FingerprintStrategy,
    ) -> Self {
        Self {
            cache,
            client,
            strategy,
        }
    }

    /// Analyze one meal photo (base64-encoded JPEG).
    ///
    /// The returned result carries every supported language; `language`
    /// selects nothing here and exists for the caller's presentation and
    /// for tracing. The cache key is the image fingerprint alone, so the
    /// same photo requested in a different language is still a hit.
    pub async fn analyze(
        &self,
        image_base64: &str,
        language: Language,
    ) -> Result<AnalysisResult, AnalysisError> {
        let fingerprint = self.strategy.compute(image_base64.as_bytes());
        tracing::debug!(%fingerprint, language = language.code(), "analysis requested");

        if let Some(result) = self.cache.get(&fingerprint).await {
            tracing::info!(%fingerprint, "cache hit");
            return Ok(result);
        }

        let raw = self.client.analyze_meal(image_base64).await?;
        let result = normalize::normalize_raw(&raw)
            .map_err(|err| AnalysisError::MalformedResponse(err.to_string()))?;

        self.cache.put(&fingerprint, &result).await;
        tracing::info!(
            %fingerprint,
            items = result.items.len(),
            model = self.client.model_name(),
            "analysis complete"
        );
        Ok(result)
    }
}
