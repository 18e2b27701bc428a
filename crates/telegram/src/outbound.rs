//! Outbound side of the bot: text notices, generated photos and placeholder
//! cleanup, behind a trait so the flow and command handlers can be tested
//! without a live Telegram API.

use {
    anyhow::Result,
    async_trait::async_trait,
    teloxide::{
        prelude::*,
        types::{ChatId, InputFile, MessageId},
    },
    tracing::info,
};

/// Everything the bot sends back into a chat.
#[async_trait]
pub trait ChatOutbound: Send + Sync {
    /// Send plain text and return the id of the new message.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageId>;

    /// Send image bytes as a photo with a caption.
    async fn send_photo(&self, chat_id: i64, image: Vec<u8>, caption: &str) -> Result<()>;

    /// Delete an earlier message, e.g. the progress placeholder.
    async fn delete_message(&self, chat_id: i64, message_id: MessageId) -> Result<()>;
}

/// Outbound sender backed by a real bot.
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatOutbound for TelegramOutbound {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<MessageId> {
        let message = self.bot.send_message(ChatId(chat_id), text).await?;
        info!(chat_id, text_len = text.len(), "telegram outbound text sent");
        Ok(message.id)
    }

    async fn send_photo(&self, chat_id: i64, image: Vec<u8>, caption: &str) -> Result<()> {
        let bytes = image.len();
        let input = InputFile::memory(image).file_name("kartina.png");
        self.bot
            .send_photo(ChatId(chat_id), input)
            .caption(caption)
            .await?;
        info!(
            chat_id,
            bytes,
            caption_len = caption.len(),
            "telegram outbound photo sent"
        );
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: MessageId) -> Result<()> {
        self.bot.delete_message(ChatId(chat_id), message_id).await?;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::{Arc, Mutex},
    };

    use {
        axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
        serde::{Deserialize, Serialize},
        tokio::sync::oneshot,
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum TelegramApiMethod {
        SendMessage,
        SendPhoto,
        DeleteMessage,
        Other(String),
    }

    impl TelegramApiMethod {
        fn from_path(path: &str) -> Self {
            let method = path.rsplit('/').next().unwrap_or_default();
            match method {
                "SendMessage" => Self::SendMessage,
                "SendPhoto" => Self::SendPhoto,
                "DeleteMessage" => Self::DeleteMessage,
                _ => Self::Other(method.to_string()),
            }
        }
    }

    #[derive(Debug, Clone)]
    enum CapturedTelegramRequest {
        SendMessage(SendMessageRequest),
        DeleteMessage(DeleteMessageRequest),
        Other {
            method: TelegramApiMethod,
            raw_body: String,
        },
    }

    #[derive(Debug, Clone, Deserialize)]
    struct SendMessageRequest {
        chat_id: i64,
        text: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct DeleteMessageRequest {
        chat_id: i64,
        message_id: i32,
    }

    #[derive(Debug, Serialize)]
    struct TelegramApiResponse {
        ok: bool,
        result: TelegramApiResult,
    }

    #[derive(Debug, Serialize)]
    #[serde(untagged)]
    enum TelegramApiResult {
        Message(TelegramMessageResult),
        Bool(bool),
    }

    #[derive(Debug, Serialize)]
    struct TelegramChat {
        id: i64,
        #[serde(rename = "type")]
        chat_type: String,
    }

    #[derive(Debug, Serialize)]
    struct TelegramMessageResult {
        message_id: i64,
        date: i64,
        chat: TelegramChat,
        text: String,
    }

    #[derive(Clone)]
    struct MockTelegramApi {
        requests: Arc<Mutex<Vec<CapturedTelegramRequest>>>,
    }

    async fn telegram_api_handler(
        State(state): State<MockTelegramApi>,
        uri: Uri,
        body: Bytes,
    ) -> Json<TelegramApiResponse> {
        let method = TelegramApiMethod::from_path(uri.path());
        let raw_body = String::from_utf8_lossy(&body).to_string();

        let captured = match method.clone() {
            TelegramApiMethod::SendMessage => {
                match serde_json::from_slice::<SendMessageRequest>(&body) {
                    Ok(req) => CapturedTelegramRequest::SendMessage(req),
                    Err(_) => CapturedTelegramRequest::Other { method, raw_body },
                }
            },
            TelegramApiMethod::DeleteMessage => {
                match serde_json::from_slice::<DeleteMessageRequest>(&body) {
                    Ok(req) => CapturedTelegramRequest::DeleteMessage(req),
                    Err(_) => CapturedTelegramRequest::Other { method, raw_body },
                }
            },
            _ => CapturedTelegramRequest::Other { method, raw_body },
        };

        state.requests.lock().expect("lock requests").push(captured);

        match TelegramApiMethod::from_path(uri.path()) {
            TelegramApiMethod::SendMessage | TelegramApiMethod::SendPhoto => {
                Json(TelegramApiResponse {
                    ok: true,
                    result: TelegramApiResult::Message(TelegramMessageResult {
                        message_id: 77,
                        date: 0,
                        chat: TelegramChat {
                            id: 42,
                            chat_type: "private".to_string(),
                        },
                        text: "ok".to_string(),
                    }),
                })
            },
            TelegramApiMethod::DeleteMessage | TelegramApiMethod::Other(_) => {
                Json(TelegramApiResponse {
                    ok: true,
                    result: TelegramApiResult::Bool(true),
                })
            },
        }
    }

    struct MockApi {
        outbound: TelegramOutbound,
        requests: Arc<Mutex<Vec<CapturedTelegramRequest>>>,
        shutdown: oneshot::Sender<()>,
        server: tokio::task::JoinHandle<()>,
    }

    async fn spawn_mock_api() -> MockApi {
        let requests = Arc::new(Mutex::new(Vec::<CapturedTelegramRequest>::new()));
        let mock_api = MockTelegramApi {
            requests: Arc::clone(&requests),
        };
        let app = Router::new()
            .route("/{*path}", post(telegram_api_handler))
            .with_state(mock_api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let api_url = url::Url::parse(&format!("http://{addr}/")).expect("parse api url");
        let bot = Bot::new("test-token").set_api_url(api_url);

        MockApi {
            outbound: TelegramOutbound::new(bot),
            requests,
            shutdown,
            server,
        }
    }

    impl MockApi {
        async fn stop(self) {
            let _ = self.shutdown.send(());
            self.server.await.expect("server join");
        }
    }

    #[tokio::test]
    async fn send_text_returns_the_new_message_id() {
        let api = spawn_mock_api().await;

        let id = api
            .outbound
            .send_text(42, "привет")
            .await
            .expect("send text");
        assert_eq!(id, MessageId(77));

        {
            let requests = api.requests.lock().expect("requests lock");
            assert!(
                requests.iter().any(|request| {
                    if let CapturedTelegramRequest::SendMessage(body) = request {
                        body.chat_id == 42 && body.text == "привет"
                    } else {
                        false
                    }
                }),
                "expected SendMessage with the given text, requests={requests:?}"
            );
        }

        api.stop().await;
    }

    #[tokio::test]
    async fn send_photo_carries_caption_and_filename() {
        let api = spawn_mock_api().await;

        api.outbound
            .send_photo(42, vec![0x89, b'P', b'N', b'G'], "Сгенерировано по запросу: a cat")
            .await
            .expect("send photo");

        {
            let requests = api.requests.lock().expect("requests lock");
            // Photo uploads go out as multipart, so the capture lands in Other.
            assert!(
                requests.iter().any(|request| {
                    if let CapturedTelegramRequest::Other { method, raw_body } = request {
                        *method == TelegramApiMethod::SendPhoto
                            && raw_body.contains("Сгенерировано по запросу: a cat")
                            && raw_body.contains("kartina.png")
                    } else {
                        false
                    }
                }),
                "expected multipart SendPhoto with caption, requests={requests:?}"
            );
        }

        api.stop().await;
    }

    #[tokio::test]
    async fn delete_message_targets_the_given_id() {
        let api = spawn_mock_api().await;

        api.outbound
            .delete_message(42, MessageId(77))
            .await
            .expect("delete message");

        {
            let requests = api.requests.lock().expect("requests lock");
            assert!(
                requests.iter().any(|request| {
                    if let CapturedTelegramRequest::DeleteMessage(body) = request {
                        body.chat_id == 42 && body.message_id == 77
                    } else {
                        false
                    }
                }),
                "expected DeleteMessage for id 77, requests={requests:?}"
            );
        }

        api.stop().await;
    }
}
