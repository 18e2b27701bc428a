//! Inbound message routing: slash commands and generation prompts.
//!
//! Text that is not a command goes straight into the generation flow. Known
//! commands are answered here; mutating ones are gated on the admin list.
//! Unknown commands and commands addressed to other bots are dropped quietly
//! so the bot never treats them as prompts.

use std::sync::Arc;

use {
    teloxide::types::{MediaKind, Message, MessageKind},
    tracing::{debug, info, warn},
};

use crate::{access::is_admin, state::BotState};

// ── User-facing texts ──

const NO_PERMISSION_TEXT: &str = "У вас нет прав для выполнения этой команды.";
const SET_SERVER_USAGE_TEXT: &str = "Использование: /set_sd_server <url>";
const FILTER_ENABLED_TEXT: &str = "Фильтрация контента для взрослых включена.";
const FILTER_DISABLED_TEXT: &str = "Фильтрация контента для взрослых выключена.";

const START_TEXT: &str = "Привет! Я бот для генерации изображений с помощью Stable Diffusion. \
     Просто отправь мне описание того, что ты хочешь увидеть на картинке, \
     и я сгенерирую его для тебя!\n\n\
     Доступные команды:\n\
     /help - Получить справку по использованию бота";

const START_ADMIN_SUFFIX: &str = "\n\nКоманды администратора:\n\
     /filter_status - Проверить статус фильтрации контента\n\
     /enable_filter - Включить фильтрацию контента для взрослых\n\
     /disable_filter - Выключить фильтрацию контента для взрослых\n\
     /set_sd_server <url> - Изменить адрес Stable Diffusion API\n\
     /get_sd_server - Показать текущий адрес Stable Diffusion API";

const HELP_TEXT: &str =
    "Отправь мне текстовое описание изображения, которое ты хочешь сгенерировать. \
     Если твой запрос на русском, я автоматически переведу его на английский. \
     Затем я использую Stable Diffusion для создания изображения на основе твоего описания.";

/// Route one inbound message from the polling loop.
pub async fn handle_message(state: Arc<BotState>, msg: Message) -> anyhow::Result<()> {
    let Some(text) = extract_text(&msg) else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };

    let chat_id = msg.chat.id.0;
    let user_id = msg.from.as_ref().map(|u| u.id.0).unwrap_or_default();
    let username = msg
        .from
        .as_ref()
        .and_then(|u| u.username.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    if text.trim_start().starts_with('/') {
        match parse_command(&text, state.bot_username.as_deref()) {
            Some((command, args)) => {
                return dispatch_command(&state, chat_id, user_id, &command, args).await;
            },
            None => {
                debug!(chat_id, text = %text, "ignoring command addressed to another bot");
                return Ok(());
            },
        }
    }

    info!(chat_id, user_id, username = %username, prompt = %text, "generation request received");
    state.flow.run(chat_id, &text).await;
    Ok(())
}

async fn dispatch_command(
    state: &BotState,
    chat_id: i64,
    user_id: u64,
    command: &str,
    args: &str,
) -> anyhow::Result<()> {
    info!(chat_id, user_id, command, "command received");
    match command {
        "start" => {
            let mut text = START_TEXT.to_string();
            if is_admin(&state.admins, user_id) {
                text.push_str(START_ADMIN_SUFFIX);
            }
            state.outbound.send_text(chat_id, &text).await?;
        },
        "help" => {
            state.outbound.send_text(chat_id, HELP_TEXT).await?;
        },
        "filter_status" => {
            let status = if state.policy.is_enabled() {
                "Включена"
            } else {
                "Выключена"
            };
            state
                .outbound
                .send_text(
                    chat_id,
                    &format!("Фильтрация контента для взрослых: {status}"),
                )
                .await?;
        },
        "enable_filter" => {
            if !require_admin(state, chat_id, user_id, command).await? {
                return Ok(());
            }
            state.policy.set_enabled(true);
            info!(user_id, "content filter enabled");
            state
                .outbound
                .send_text(chat_id, FILTER_ENABLED_TEXT)
                .await?;
        },
        "disable_filter" => {
            if !require_admin(state, chat_id, user_id, command).await? {
                return Ok(());
            }
            state.policy.set_enabled(false);
            info!(user_id, "content filter disabled");
            state
                .outbound
                .send_text(chat_id, FILTER_DISABLED_TEXT)
                .await?;
        },
        "set_sd_server" => {
            if !require_admin(state, chat_id, user_id, command).await? {
                return Ok(());
            }
            // Exactly one argument; anything else is a usage error.
            let mut parts = args.split_whitespace();
            let (Some(url), None) = (parts.next(), parts.next()) else {
                state
                    .outbound
                    .send_text(chat_id, SET_SERVER_USAGE_TEXT)
                    .await?;
                return Ok(());
            };
            state.endpoint.set_url(url);
            info!(user_id, url, "backend re-pointed");
            state
                .outbound
                .send_text(
                    chat_id,
                    &format!("Адрес Stable Diffusion API изменён на: {url}"),
                )
                .await?;
        },
        "get_sd_server" => {
            let url = state.endpoint.url();
            state
                .outbound
                .send_text(
                    chat_id,
                    &format!("Текущий адрес Stable Diffusion API: {url}"),
                )
                .await?;
        },
        _ => {
            debug!(chat_id, command, "ignoring unknown command");
        },
    }
    Ok(())
}

/// Send the denial notice unless `user_id` is on the admin list.
async fn require_admin(
    state: &BotState,
    chat_id: i64,
    user_id: u64,
    command: &str,
) -> anyhow::Result<bool> {
    if is_admin(&state.admins, user_id) {
        return Ok(true);
    }
    warn!(chat_id, user_id, command, "admin command denied");
    state.outbound.send_text(chat_id, NO_PERMISSION_TEXT).await?;
    Ok(false)
}

/// Split `/command@bot args` into the lowercased command name and its
/// argument rest.
///
/// `None` means the text is not a command for this bot: malformed, or the
/// `@bot` suffix names someone else.
fn parse_command<'a>(text: &'a str, bot_username: Option<&str>) -> Option<(String, &'a str)> {
    let rest = text.trim().strip_prefix('/')?;
    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = match head.split_once('@') {
        Some((name, target)) => {
            let ours = bot_username.is_some_and(|me| target.eq_ignore_ascii_case(me));
            if !ours {
                return None;
            }
            name
        },
        None => head,
    };
    if name.is_empty() {
        return None;
    }
    Some((name.to_ascii_lowercase(), args))
}

/// Plain message text; captions and other media never become prompts.
fn extract_text(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.clone()),
            _ => None,
        },
        _ => None,
    }
}
