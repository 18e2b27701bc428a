//! Bot startup and the long-polling loop.

use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {
    kartina_config::KartinaConfig,
    kartina_sd::{ContentPolicy, EndpointState, ImageBackend, SdClient},
    kartina_translate::{GoogleTranslator, Translator},
};

use crate::{
    flow::GenerationFlow,
    handlers,
    outbound::{ChatOutbound, TelegramOutbound},
    state::BotState,
};

/// Start the bot and poll until interrupted.
///
/// Returns an error when the token is missing, the credentials are rejected,
/// or another instance is already polling with the same token.
pub async fn run_bot(config: KartinaConfig) -> anyhow::Result<()> {
    run_bot_with_api_url(config, None).await
}

async fn run_bot_with_api_url(
    config: KartinaConfig,
    api_url: Option<url::Url>,
) -> anyhow::Result<()> {
    if !config.telegram.is_configured() {
        anyhow::bail!("telegram token is not configured (set TELEGRAM_TOKEN or telegram.token)");
    }

    // Client timeout above the long-polling timeout (30s) so the HTTP client
    // doesn't abort the request before Telegram responds.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    let mut bot = Bot::with_client(config.telegram.token.expose_secret(), client);
    if let Some(url) = api_url {
        bot = bot.set_api_url(url);
    }

    // Verify credentials and learn the username for /command@bot matching.
    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    // Register slash commands for autocomplete in Telegram clients.
    let commands = vec![
        BotCommand::new("start", "Начало работы"),
        BotCommand::new("help", "Справка по использованию"),
        BotCommand::new("filter_status", "Статус фильтрации контента"),
        BotCommand::new("enable_filter", "Включить фильтрацию (админ)"),
        BotCommand::new("disable_filter", "Выключить фильтрацию (админ)"),
        BotCommand::new("set_sd_server", "Изменить адрес API (админ)"),
        BotCommand::new("get_sd_server", "Текущий адрес API"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    let policy = Arc::new(ContentPolicy::new(
        config.sd.negative_prompt.clone(),
        config.sd.adult_negative_prompt.clone(),
        config.sd.content_filter,
    ));
    let endpoint = Arc::new(EndpointState::new(config.sd.url.clone()));
    let backend: Arc<dyn ImageBackend> =
        Arc::new(SdClient::new(Arc::clone(&endpoint), Arc::clone(&policy))?);
    let translator: Arc<dyn Translator> = Arc::new(GoogleTranslator::new());
    let outbound: Arc<dyn ChatOutbound> = Arc::new(TelegramOutbound::new(bot.clone()));

    info!(
        username = ?bot_username,
        endpoint = %endpoint.url(),
        content_filter = policy.is_enabled(),
        "telegram bot connected (webhook cleared)"
    );

    // Warn early, but start anyway: the backend may come up later or be
    // re-pointed with /set_sd_server.
    if !backend.is_reachable().await {
        warn!(
            endpoint = %endpoint.url(),
            "Stable Diffusion API is unreachable, generation will fail until it recovers"
        );
    }

    let state = Arc::new(BotState {
        bot_username,
        admins: config.telegram.admins.clone(),
        policy,
        endpoint,
        outbound: Arc::clone(&outbound),
        flow: GenerationFlow::new(outbound, translator, backend),
    });

    let cancel = CancellationToken::new();
    spawn_interrupt_watcher(cancel.clone());

    poll_updates(bot, state, cancel).await
}

async fn poll_updates(
    bot: Bot,
    state: Arc<BotState>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    info!("starting telegram manual polling loop");
    let mut offset: i32 = 0;

    loop {
        if cancel.is_cancelled() {
            info!("telegram polling stopped");
            return Ok(());
        }

        let result = bot
            .get_updates()
            .offset(offset)
            .timeout(30)
            .allowed_updates(vec![AllowedUpdate::Message])
            .await;

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    match update.kind {
                        UpdateKind::Message(msg) => {
                            debug!(chat_id = msg.chat.id.0, "received telegram message");
                            let state = Arc::clone(&state);
                            tokio::spawn(async move {
                                if let Err(e) = handlers::handle_message(state, msg).await {
                                    error!(error = %e, "error handling telegram message");
                                }
                            });
                        },
                        other => {
                            debug!("ignoring non-message update: {other:?}");
                        },
                    }
                }
            },
            Err(e) => {
                if is_conflict(&e) {
                    error!("another instance is polling with this token, shutting down");
                    anyhow::bail!("another bot instance is already running with this token");
                }
                warn!(error = %e, "telegram getUpdates failed");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            },
        }
    }
}

/// Another process is long-polling with the same token.
fn is_conflict(error: &RequestError) -> bool {
    matches!(
        error,
        RequestError::Api(ApiError::TerminatedByOtherGetUpdates)
    )
}

fn spawn_interrupt_watcher(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, finishing current poll before exit");
            cancel.cancel();
        }
    });
}
