//! # Meal Lens
//!
//! Meal photo nutrition analysis with content-addressed result caching.
//!
//! A photo goes to a vision-language model with a fixed structured-output
//! schema; the untrusted response is normalized into a well-typed report
//! (itemized foods, macros, health rating, localized advice) and cached by
//! image fingerprint so the same photo never costs a second model call.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────────┐   ┌───────────────┐
//! │ CLI/HTTP │──▶│ Orchestrator       │──▶│ Inference      │
//! │ (meal)   │   │ fingerprint→cache  │   │ (Gemini)       │
//! └──────────┘   │ →call→normalize    │   └───────────────┘
//!                └───────┬───────────┘
//!                        ▼
//!                 ┌──────────────┐
//!                 │ ResultCache   │
//!                 │ (SQLite KV)   │
//!                 └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`inference`] | Inference client abstraction and the Gemini client |
//! | [`orchestrator`] | The analysis façade and its error taxonomy |
//! | [`server`] | HTTP analysis server |
//! | [`store_sqlite`] | SQLite-backed persistent store |

pub mod config;
pub mod inference;
pub mod orchestrator;
pub mod server;
pub mod store_sqlite;
