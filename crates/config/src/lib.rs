//! Configuration loading, schema, and env substitution.
//!
//! Config files: `kartina.toml`, `kartina.yaml`, or `kartina.json`
//! Searched in `./` then `~/.config/kartina/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values, plus
//! `TELEGRAM_TOKEN` / `STABLE_DIFFUSION_API_URL` overrides on top.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{apply_env_overrides, discover_and_load, load_config},
    schema::{KartinaConfig, SdConfig, SupervisorConfig, TelegramConfig},
};
