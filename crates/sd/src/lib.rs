//! Stable Diffusion upstream: content policy, endpoint state, HTTP client.
//!
//! The client targets the web API's `POST /sdapi/v1/txt2img` route with a
//! fixed parameter set; only the prompts vary per request. Endpoint and
//! filter state are shared handles so admin commands can retarget a running
//! bot.

pub mod client;
pub mod endpoint;
pub mod policy;

pub use {
    client::{GenerationFailure, ImageBackend, SdClient},
    endpoint::EndpointState,
    policy::ContentPolicy,
};
