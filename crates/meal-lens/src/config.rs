use anyhow::{Context, Result};
use meal_lens_core::fingerprint::FingerprintStrategy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub hashing: HashingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Storage quota in bytes over stored keys plus values. Unset means
    /// unbounded.
    #[serde(default)]
    pub max_bytes: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InferenceConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Service base URL override, mainly for tests.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl InferenceConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct HashingConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
        }
    }
}

fn default_strategy() -> String {
    "sha256".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl Config {
    /// The validated fingerprint strategy. `load_config` rejects unknown
    /// labels, so this cannot miss after loading.
    pub fn fingerprint_strategy(&self) -> FingerprintStrategy {
        FingerprintStrategy::parse(&self.hashing.strategy).unwrap_or_default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.store.max_bytes == Some(0) {
        anyhow::bail!("store.max_bytes must be > 0 when set");
    }

    if config.inference.timeout_secs == 0 {
        anyhow::bail!("inference.timeout_secs must be > 0");
    }

    match config.inference.provider.as_str() {
        "disabled" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown inference provider: '{}'. Must be disabled or gemini.",
            other
        ),
    }

    if FingerprintStrategy::parse(&config.hashing.strategy).is_none() {
        anyhow::bail!(
            "Unknown hashing strategy: '{}'. Must be sha256 or simple.",
            config.hashing.strategy
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("meal.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(
            &tmp,
            r#"
[store]
path = "./data/meal.sqlite"

[server]
bind = "127.0.0.1:7340"
"#,
        );
        let config = load_config(&path).unwrap();
        assert!(!config.inference.is_enabled());
        assert_eq!(config.inference.model, "gemini-3-flash-preview");
        assert_eq!(config.inference.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.fingerprint_strategy(), FingerprintStrategy::Sha256);
        assert_eq!(config.store.max_bytes, None);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(
            &tmp,
            r#"
[store]
path = "./data/meal.sqlite"

[inference]
provider = "openai"

[server]
bind = "127.0.0.1:7340"
"#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn unknown_hashing_strategy_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(
            &tmp,
            r#"
[store]
path = "./data/meal.sqlite"

[hashing]
strategy = "md5"

[server]
bind = "127.0.0.1:7340"
"#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn zero_quota_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(
            &tmp,
            r#"
[store]
path = "./data/meal.sqlite"
max_bytes = 0

[server]
bind = "127.0.0.1:7340"
"#,
        );
        assert!(load_config(&path).is_err());
    }
}
