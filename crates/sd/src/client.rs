//! Stable Diffusion web API client: reachability probe and txt2img.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    base64::Engine,
    reqwest::Client,
    serde::{Deserialize, Serialize},
    tracing::{error, info, warn},
};

use crate::{endpoint::EndpointState, policy::ContentPolicy};

/// Budget for the reachability probe.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Budget for one generation. Diffusion on modest hardware is slow.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(180);

/// Why a generation attempt produced no image.
#[derive(Debug, thiserror::Error)]
pub enum GenerationFailure {
    /// Upstream answered with a non-200 status.
    #[error("upstream returned HTTP {status}")]
    Http { status: u16 },
    /// A 200 response without a usable `images` entry.
    #[error("upstream response carried no image")]
    NoImage,
    /// `images[0]` was not valid base64.
    #[error("image payload failed to decode")]
    Decode(#[from] base64::DecodeError),
    /// The generation window elapsed.
    #[error("upstream timed out")]
    Timeout,
    /// TCP- or TLS-level connection failure.
    #[error("could not connect to upstream")]
    Connect,
    /// Any other transport or body error.
    #[error("generation request failed: {0}")]
    Other(#[source] reqwest::Error),
}

impl From<reqwest::Error> for GenerationFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect
        } else {
            Self::Other(e)
        }
    }
}

/// Abstraction over the image generation upstream.
///
/// The generation flow depends on this seam so tests can run against a
/// scripted backend.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Cheap probe of the configured endpoint. Never errors, only answers.
    async fn is_reachable(&self) -> bool;

    /// Generate one image for `prompt`, honouring the active content policy.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationFailure>;
}

/// HTTP client for the Stable Diffusion web API.
#[derive(Debug, Clone)]
pub struct SdClient {
    client: Client,
    endpoint: Arc<EndpointState>,
    policy: Arc<ContentPolicy>,
}

impl SdClient {
    /// Build a client bound to the given endpoint and policy handles.
    ///
    /// Certificate validation is disabled: the stock deployment sits behind a
    /// self-signed certificate on a dynamic-DNS host.
    pub fn new(endpoint: Arc<EndpointState>, policy: Arc<ContentPolicy>) -> anyhow::Result<Self> {
        let client = Client::builder().danger_accept_invalid_certs(true).build()?;
        Ok(Self {
            client,
            endpoint,
            policy,
        })
    }
}

#[async_trait]
impl ImageBackend for SdClient {
    async fn is_reachable(&self) -> bool {
        let Some(origin) = self.endpoint.origin() else {
            warn!(url = %self.endpoint.url(), "configured endpoint is not a valid URL");
            return false;
        };
        match self.client.get(&origin).timeout(HEALTH_TIMEOUT).send().await {
            Ok(resp) => {
                let ok = resp.status().as_u16() < 400;
                if !ok {
                    warn!(status = %resp.status(), "health probe answered with an error status");
                }
                ok
            },
            Err(e) => {
                warn!(error = %e, origin = %origin, "upstream unreachable");
                false
            },
        }
    }

    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationFailure> {
        let filtered = self.policy.is_enabled();
        let body = Txt2ImgRequest::new(prompt, self.policy.negative_prompt());
        let url = format!("{}/sdapi/v1/txt2img", self.endpoint.url());

        info!(
            prompt = %truncate_chars(prompt, 50),
            filtered,
            "sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(GENERATE_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %text, "upstream rejected the request");
            return Err(GenerationFailure::Http {
                status: status.as_u16(),
            });
        }

        let result: Txt2ImgResponse = response.json().await?;

        let Some(image_b64) = result.images.into_iter().next() else {
            let reason = result.error.unwrap_or_else(|| "unknown error".into());
            error!(error = %reason, "upstream answered without an image");
            return Err(GenerationFailure::NoImage);
        };

        let bytes = base64::engine::general_purpose::STANDARD.decode(image_b64)?;
        info!(bytes = bytes.len(), "image decoded");
        Ok(bytes)
    }
}

/// First `max_chars` characters of `text`, safe for multi-byte prompts.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ── API types ───────────────────────────────────────────────────────────────

/// `POST /sdapi/v1/txt2img` body. Everything except the prompts is fixed.
#[derive(Debug, Clone, Serialize)]
struct Txt2ImgRequest {
    prompt: String,
    width: u32,
    height: u32,
    num_outputs: u32,
    num_inference_steps: u32,
    guidance_scale: f32,
    scheduler: String,
    negative_prompt: String,
}

impl Txt2ImgRequest {
    fn new(prompt: &str, negative_prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            width: 512,
            height: 512,
            num_outputs: 1,
            num_inference_steps: 20,
            guidance_scale: 7.5,
            scheduler: "DPMSolverMultistep".to_string(),
            negative_prompt: negative_prompt.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}
