//! Prompt translation: Cyrillic detection and a Google-backed provider.
//!
//! Generation prompts arrive in Russian while the upstream model understands
//! English. [`translate_or_keep`] wraps any [`Translator`] so a provider
//! outage degrades to the untranslated prompt instead of failing the request.

pub mod google;

pub use google::GoogleTranslator;

use {async_trait::async_trait, tracing::warn};

/// Whether any character falls in the Cyrillic Unicode block (U+0400–U+04FF).
#[must_use]
pub fn contains_cyrillic(text: &str) -> bool {
    text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c))
}

/// Abstraction over a text translation service.
///
/// Implemented by [`GoogleTranslator`] and injected into the generation flow
/// at construction time so tests can substitute a canned provider.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` to English.
    async fn translate(&self, text: &str) -> anyhow::Result<String>;
}

/// Translate `text`, keeping the original on any provider failure.
///
/// Never fails and never yields an empty string: an unreachable provider
/// means the prompt goes upstream untranslated. No retry.
pub async fn translate_or_keep(translator: &dyn Translator, text: &str) -> String {
    match translator.translate(text).await {
        Ok(translated) if !translated.is_empty() => translated,
        Ok(_) => {
            warn!("translator returned an empty string, keeping original");
            text.to_string()
        },
        Err(e) => {
            warn!(error = %e, "translation failed, keeping original");
            text.to_string()
        },
    }
}
