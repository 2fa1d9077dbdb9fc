//! # Meal Lens CLI (`meal`)
//!
//! The `meal` binary is the primary interface for Meal Lens. It provides
//! commands for store initialization, meal photo analysis, cache
//! inspection, and starting the HTTP analysis server.
//!
//! ## Usage
//!
//! ```bash
//! meal --config ./config/meal.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `meal init` | Create the SQLite result store |
//! | `meal analyze <image>` | Analyze a meal photo and print the report |
//! | `meal cache stats` | Show the entry count for the current cache namespace |
//! | `meal cache clear` | Delete every entry in the current cache namespace |
//! | `meal serve` | Start the HTTP analysis server |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the store
//! meal init --config ./config/meal.toml
//!
//! # Analyze a photo, report in Bengali
//! meal analyze dinner.jpg --lang bn
//!
//! # Start the HTTP server
//! meal serve --config ./config/meal.toml
//! ```

use anyhow::Context;
use base64::Engine as _;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use meal_lens::config::{self, Config};
use meal_lens::inference::{create_client, InferenceClient};
use meal_lens::orchestrator::{AnalysisError, AnalysisOrchestrator};
use meal_lens::server;
use meal_lens::store_sqlite::SqliteStore;
use meal_lens_core::cache::{namespace_prefix, ResultCache};
use meal_lens_core::models::{AnalysisResult, Language};

/// Meal Lens CLI — meal photo nutrition analysis with content-addressed
/// result caching.
#[derive(Parser)]
#[command(
    name = "meal",
    about = "Meal Lens — meal photo nutrition analysis with content-addressed result caching",
    version,
    long_about = "Meal Lens sends a meal photo to a vision-language model with a fixed \
    structured-output schema, repairs the untrusted response into a well-typed nutrition \
    report, and caches results by image fingerprint so resubmitting the same photo never \
    costs a second model call."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/meal.toml`. Store, inference, hashing, and
    /// server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/meal.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the result store.
    ///
    /// Creates the SQLite database file and the key/value table. This
    /// command is idempotent — running it multiple times is safe.
    Init,

    /// Analyze a meal photo and print the nutrition report.
    ///
    /// Reads the image file, computes its fingerprint, and returns the
    /// cached report if this exact photo has been analyzed before;
    /// otherwise calls the configured inference service.
    Analyze {
        /// Path to the meal photo (JPEG).
        image: PathBuf,

        /// Display language for the report: en, bn, hi, or as.
        #[arg(long, default_value = "en")]
        lang: String,
    },

    /// Inspect or clear the result cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Start the HTTP analysis server.
    ///
    /// Binds to the address configured in `[server].bind` and exposes
    /// `POST /analyze` and `GET /health`.
    Serve,
}

/// Cache management subcommands.
#[derive(Subcommand)]
enum CacheAction {
    /// Show the entry count for the current cache namespace.
    Stats,
    /// Delete every entry in the current cache namespace.
    ///
    /// Only the current schema version's namespace is swept; entries from
    /// older versions are already unreadable and harmless.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            SqliteStore::connect(&cfg.store).await?;
            println!("Store initialized at {}", cfg.store.path.display());
        }
        Commands::Analyze { image, lang } => {
            run_analyze(&cfg, &image, &lang).await?;
        }
        Commands::Cache { action } => {
            let cache = open_cache(&cfg).await?;
            match action {
                CacheAction::Stats => {
                    println!("namespace: {}", namespace_prefix());
                    println!("entries:   {}", cache.entry_count().await);
                }
                CacheAction::Clear => {
                    let evicted = cache.clear().await;
                    println!("cleared {} entries from {}", evicted, namespace_prefix());
                }
            }
        }
        Commands::Serve => {
            let orchestrator = build_orchestrator(&cfg).await?;
            server::run_server(&cfg, orchestrator).await?;
        }
    }

    Ok(())
}

async fn open_cache(cfg: &Config) -> anyhow::Result<ResultCache> {
    let store = SqliteStore::connect(&cfg.store).await?;
    Ok(ResultCache::new(Arc::new(store)))
}

async fn build_orchestrator(cfg: &Config) -> anyhow::Result<Arc<AnalysisOrchestrator>> {
    let cache = open_cache(cfg).await?;
    let client: Arc<dyn InferenceClient> = Arc::from(create_client(&cfg.inference)?);
    Ok(Arc::new(AnalysisOrchestrator::new(
        cache,
        client,
        cfg.fingerprint_strategy(),
    )))
}

async fn run_analyze(cfg: &Config, image: &Path, lang: &str) -> anyhow::Result<()> {
    let language = Language::parse(lang)
        .with_context(|| format!("Unsupported language: '{}'. Use en, bn, hi, or as.", lang))?;

    let bytes = std::fs::read(image)
        .with_context(|| format!("Failed to read image file: {}", image.display()))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

    let orchestrator = build_orchestrator(cfg).await?;

    match orchestrator.analyze(&encoded, language).await {
        Ok(result) => {
            print_report(&result, language);
            Ok(())
        }
        // Distinct messaging per error kind so the user knows whether to
        // fix config, wait, or just try again.
        Err(err @ AnalysisError::Configuration(_)) => Err(anyhow::anyhow!(
            "{err}. Set the API key environment variable named in [inference] api_key_env."
        )),
        Err(err @ AnalysisError::RateLimited) => Err(anyhow::anyhow!(
            "{err}. Wait a little, then resubmit the same photo."
        )),
        Err(err @ AnalysisError::MalformedResponse(_)) => {
            Err(anyhow::anyhow!("{err}. This is usually transient; try again."))
        }
        Err(err @ AnalysisError::Transport(_)) => Err(anyhow::anyhow!(
            "{err}. Check your connection and try again."
        )),
    }
}

fn print_report(result: &AnalysisResult, language: Language) {
    if result.items.is_empty() {
        println!("{}", result.advice.get(language));
        return;
    }

    println!("{:<24} {:<12} {:>8} {:>7} {:>7} {:>6}  STATUS", "ITEM", "PORTION", "KCAL", "PROT g", "CARB g", "FAT g");
    for item in &result.items {
        println!(
            "{:<24} {:<12} {:>8.0} {:>7.1} {:>7.1} {:>6.1}  {}",
            item.name.get(language),
            item.portion.get(language),
            item.calories,
            item.protein,
            item.carbs,
            item.fats,
            item.status.as_str()
        );
        let notes = item.notes.get(language);
        if !notes.is_empty() {
            println!("  {}", notes);
        }
    }
    println!();
    println!(
        "total: {:.0} kcal | protein {:.1} g | carbs {:.1} g | fats {:.1} g",
        result.total_calories, result.total_protein, result.total_carbs, result.total_fats
    );
    println!("health rating: {:.1}/10", result.health_rating);
    println!("advice: {}", result.advice.get(language));
}
