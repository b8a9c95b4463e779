//! Configuration module for critical CSS generation
//!
//! This module provides the `CriticalConfig` struct and its type-safe builder
//! for configuring generation runs with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{CriticalConfigBuilder, WithSource};
pub use types::{CriticalConfig, Dimension, Source};
