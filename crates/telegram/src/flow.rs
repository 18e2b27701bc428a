//! End-to-end handling of one generation request.
//!
//! The flow sends a progress placeholder, translates Cyrillic prompts,
//! checks that the backend is up, generates the image and answers with
//! exactly one final message. The placeholder is removed afterwards on
//! every path, including failures.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use {
    kartina_sd::ImageBackend,
    kartina_translate::{Translator, contains_cyrillic, translate_or_keep},
};

use crate::outbound::ChatOutbound;

pub(crate) const PLACEHOLDER_TEXT: &str = "⏳ Генерирую картинку...";
pub(crate) const UPSTREAM_DOWN_TEXT: &str =
    "Извините, API Stable Diffusion в данный момент недоступен. Пожалуйста, попробуйте позже.";
pub(crate) const GENERATION_FAILED_TEXT: &str =
    "Извините, не удалось сгенерировать изображение. Пожалуйста, попробуйте другой запрос.";
pub(crate) const INTERNAL_ERROR_TEXT: &str =
    "Произошла ошибка при обработке вашего запроса. Пожалуйста, попробуйте позже.";
pub(crate) const CAPTION_PREFIX: &str = "Сгенерировано по запросу: ";

/// Orchestrates prompt → translation → generation → reply for one chat.
pub struct GenerationFlow {
    outbound: Arc<dyn ChatOutbound>,
    translator: Arc<dyn Translator>,
    backend: Arc<dyn ImageBackend>,
}

impl GenerationFlow {
    #[must_use]
    pub fn new(
        outbound: Arc<dyn ChatOutbound>,
        translator: Arc<dyn Translator>,
        backend: Arc<dyn ImageBackend>,
    ) -> Self {
        Self {
            outbound,
            translator,
            backend,
        }
    }

    /// Handle one prompt end to end.
    ///
    /// Never returns an error: every failure is reported to the chat and
    /// logged here, so the polling loop keeps running regardless.
    pub async fn run(&self, chat_id: i64, prompt: &str) {
        let placeholder = match self.outbound.send_text(chat_id, PLACEHOLDER_TEXT).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(chat_id, error = %e, "failed to send placeholder, continuing without it");
                None
            },
        };

        if let Err(e) = self.attempt(chat_id, prompt).await {
            error!(chat_id, error = %e, "generation flow failed");
            if let Err(send_err) = self.outbound.send_text(chat_id, INTERNAL_ERROR_TEXT).await {
                warn!(chat_id, error = %send_err, "failed to send error notice");
            }
        }

        // The placeholder comes down exactly once, whatever happened above.
        if let Some(message_id) = placeholder
            && let Err(e) = self.outbound.delete_message(chat_id, message_id).await
        {
            warn!(
                chat_id,
                message_id = message_id.0,
                error = %e,
                "failed to delete placeholder"
            );
        }
    }

    async fn attempt(&self, chat_id: i64, prompt: &str) -> anyhow::Result<()> {
        let prompt = if contains_cyrillic(prompt) {
            let translated = translate_or_keep(self.translator.as_ref(), prompt).await;
            info!(chat_id, prompt = %translated, "prompt translated to english");
            translated
        } else {
            debug!(chat_id, "prompt already in english, no translation needed");
            prompt.to_string()
        };

        if !self.backend.is_reachable().await {
            info!(chat_id, "backend unreachable, skipping generation");
            self.outbound.send_text(chat_id, UPSTREAM_DOWN_TEXT).await?;
            return Ok(());
        }

        match self.backend.generate(&prompt).await {
            Ok(image) => {
                let caption = format!("{CAPTION_PREFIX}{prompt}");
                self.outbound.send_photo(chat_id, image, &caption).await?;
                info!(chat_id, "generated image delivered");
            },
            Err(failure) => {
                warn!(chat_id, error = %failure, "image generation failed");
                self.outbound
                    .send_text(chat_id, GENERATION_FAILED_TEXT)
                    .await?;
            },
        }
        Ok(())
    }
}
