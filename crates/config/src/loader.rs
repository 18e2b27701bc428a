use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::KartinaConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["kartina.toml", "kartina.yaml", "kartina.yml", "kartina.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<KartinaConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./kartina.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/kartina/kartina.{toml,yaml,yml,json}` (user-global)
///
/// Returns `KartinaConfig::default()` if no config file is found.
pub fn discover_and_load() -> KartinaConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    KartinaConfig::default()
}

/// Apply environment overrides on top of a loaded config.
///
/// `TELEGRAM_TOKEN` and `STABLE_DIFFUSION_API_URL` take precedence over file
/// values, so a bare `.env` deployment works without any config file.
pub fn apply_env_overrides(config: &mut KartinaConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut KartinaConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(token) = lookup("TELEGRAM_TOKEN")
        && !token.is_empty()
    {
        config.telegram.token = Secret::new(token);
    }
    if let Some(url) = lookup("STABLE_DIFFUSION_API_URL")
        && !url.is_empty()
    {
        config.sd.url = url;
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/kartina/
    if let Some(dirs) = directories::ProjectDirs::from("", "", "kartina") {
        let config_dir = dirs.config_dir();
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<KartinaConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
