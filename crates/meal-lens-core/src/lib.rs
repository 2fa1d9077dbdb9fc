//! # Meal Lens Core
//!
//! Shared, runtime-agnostic logic for Meal Lens: nutrition data models,
//! image fingerprinting, untrusted-response normalization, the store
//! abstraction, and the content-addressed result cache.
//!
//! This crate contains no tokio runtime, sqlx, HTTP, or filesystem I/O.
//! Everything here is driven by the native `meal-lens` crate, which
//! supplies the persistent store and the remote inference client.

pub mod cache;
pub mod fingerprint;
pub mod models;
pub mod normalize;
pub mod store;
