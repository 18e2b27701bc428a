//! Config schema types (bot account, Stable Diffusion endpoint, supervisor).

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Default Stable Diffusion endpoint when none is configured.
pub const DEFAULT_SD_URL: &str = "https://predator.hopto.org:7777";

/// Negative prompt applied to every generation to steer quality.
pub const DEFAULT_NEGATIVE_PROMPT: &str = "(deformed, distorted, disfigured:1.3), poorly drawn, \
     bad anatomy, wrong anatomy, extra limb, missing limb, floating limbs, \
     (mutated hands and fingers:1.4), disconnected limbs, mutation, mutated, ugly, disgusting, \
     blurry, amputation";

/// Extra negative-prompt terms appended while the adult-content filter is on.
pub const ADULT_FILTER_SUFFIX: &str = ", nsfw, nude, naked, porn, text, error, missing fingers, \
     extra digit, fewer digits, cropped, worst quality, low quality, normal quality, \
     jpeg artifacts, signature, watermark, username";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KartinaConfig {
    pub telegram: TelegramConfig,
    pub sd: SdConfig,
    pub supervisor: SupervisorConfig,
}

/// Telegram bot account and admin allow-list.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Telegram user IDs allowed to run the admin commands.
    pub admins: Vec<u64>,
}

impl TelegramConfig {
    /// Whether a non-empty token has been supplied.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.token.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("admins", &self.admins)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            admins: vec![141_566, 1_972_749],
        }
    }
}

/// Stable Diffusion endpoint and prompt policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SdConfig {
    /// Base URL of the Stable Diffusion web API.
    pub url: String,

    /// Negative prompt applied to every generation.
    pub negative_prompt: String,

    /// Negative prompt used while the adult-content filter is on.
    pub adult_negative_prompt: String,

    /// Initial state of the adult-content filter.
    pub content_filter: bool,
}

impl Default for SdConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SD_URL.into(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.into(),
            adult_negative_prompt: format!("{DEFAULT_NEGATIVE_PROMPT}{ADULT_FILTER_SUFFIX}"),
            content_filter: false,
        }
    }
}

/// Detached-bot supervision settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// File the detached bot's stdout and stderr are appended to.
    pub log_file: String,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            log_file: "kartina.log".into(),
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
