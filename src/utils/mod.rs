//! Configuration utilities

/// TOML configuration (`pokedex.toml`).
pub mod toml_config;
