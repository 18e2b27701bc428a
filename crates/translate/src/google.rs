//! Google translate via the free `gtx` web endpoint.
//!
//! No API key: the endpoint answers the nested-array JSON the translate web
//! client consumes. Long inputs come back split into segments, which are
//! concatenated in order.

use {
    anyhow::{Context, Result, anyhow},
    async_trait::async_trait,
    reqwest::Client,
    tracing::debug,
};

use crate::Translator;

/// Public translate endpoint used by the web client.
const API_BASE: &str = "https://translate.googleapis.com";

/// Russian-to-English translator backed by the free Google endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: Client,
    base_url: String,
}

impl Default for GoogleTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Point the provider at a different host. Used by tests.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let url = format!(
            "{}/translate_a/single?client=gtx&sl=ru&tl=en&dt=t&q={}",
            self.base_url,
            urlencoding::encode(text)
        );

        let response = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .context("failed to reach translation endpoint")?;

        if !response.status().is_success() {
            return Err(anyhow!("translation request failed: {}", response.status()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .context("failed to parse translation response")?;

        let translated = collect_segments(&body);
        if translated.is_empty() {
            return Err(anyhow!("translation response carried no segments"));
        }

        debug!(original = text, translated = %translated, "translated prompt");
        Ok(translated)
    }
}

/// Concatenate the translated segments of a `gtx` response.
///
/// Shape: `[[["<translated>", "<original>", ...], ...], "ru", ...]`.
fn collect_segments(body: &serde_json::Value) -> String {
    let Some(segments) = body.get(0).and_then(|v| v.as_array()) else {
        return String::new();
    };
    segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|v| v.as_str()))
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    #[tokio::test]
    async fn translates_single_segment() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/translate_a/single")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("client".into(), "gtx".into()),
                Matcher::UrlEncoded("sl".into(), "ru".into()),
                Matcher::UrlEncoded("tl".into(), "en".into()),
                Matcher::UrlEncoded("q".into(), "нарисуй кота".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[[["draw a cat","нарисуй кота",null,null,10]],null,"ru"]"#)
            .create_async()
            .await;

        let translator = GoogleTranslator::with_base_url(server.url());
        let out = translator.translate("нарисуй кота").await.unwrap();
        assert_eq!(out, "draw a cat");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn concatenates_segments_in_order() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[[["a red fox ","рыжая лиса "],["in the snow","в снегу"]],null,"ru"]"#)
            .create_async()
            .await;

        let translator = GoogleTranslator::with_base_url(server.url());
        let out = translator.translate("рыжая лиса в снегу").await.unwrap();
        assert_eq!(out, "a red fox in the snow");
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let translator = GoogleTranslator::with_base_url(server.url());
        let err = translator.translate("кот").await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn garbage_body_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .with_body("<html>captcha</html>")
            .create_async()
            .await;

        let translator = GoogleTranslator::with_base_url(server.url());
        let err = translator.translate("кот").await.unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[tokio::test]
    async fn empty_segment_list_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .with_body(r#"[[],null,"ru"]"#)
            .create_async()
            .await;

        let translator = GoogleTranslator::with_base_url(server.url());
        let err = translator.translate("кот").await.unwrap_err();
        assert!(err.to_string().contains("no segments"));
    }

    #[test]
    fn collect_segments_handles_odd_shapes() {
        assert_eq!(collect_segments(&serde_json::json!(null)), "");
        assert_eq!(collect_segments(&serde_json::json!([])), "");
        assert_eq!(collect_segments(&serde_json::json!([[[42]]])), "");
        assert_eq!(
            collect_segments(&serde_json::json!([[["hi", "привет"]]])),
            "hi"
        );
    }
}
