use std::sync::RwLock;

/// Mutable Stable Diffusion endpoint shared between handlers and the client.
///
/// Writes are rare (admin `/set_sd_server`); concurrent updates resolve to
/// last-writer-wins. The value lives only as long as the process.
#[derive(Debug)]
pub struct EndpointState {
    url: RwLock<String>,
}

impl EndpointState {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: RwLock::new(url.into()),
        }
    }

    /// Current base URL as configured (may include a path).
    #[must_use]
    pub fn url(&self) -> String {
        self.url.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_url(&self, url: impl Into<String>) {
        *self.url.write().unwrap_or_else(|e| e.into_inner()) = url.into();
    }

    /// Scheme + authority of the current URL with any path dropped.
    ///
    /// The health probe hits the bare origin rather than the API path.
    /// `None` when the configured value does not parse as an absolute URL.
    #[must_use]
    pub fn origin(&self) -> Option<String> {
        let parsed = url::Url::parse(&self.url()).ok()?;
        if !parsed.has_host() {
            return None;
        }
        Some(parsed.origin().ascii_serialization())
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_url_replaces_value() {
        let state = EndpointState::new("https://a.example:7777");
        state.set_url("http://b.example:7860");
        assert_eq!(state.url(), "http://b.example:7860");
    }

    #[test]
    fn origin_drops_the_path() {
        let state = EndpointState::new("https://sd.example:7777/api/v2/");
        assert_eq!(state.origin().unwrap(), "https://sd.example:7777");
    }

    #[test]
    fn origin_keeps_explicit_port() {
        let state = EndpointState::new("https://predator.hopto.org:7777");
        assert_eq!(state.origin().unwrap(), "https://predator.hopto.org:7777");
    }

    #[test]
    fn origin_rejects_garbage() {
        assert!(EndpointState::new("not a url").origin().is_none());
        assert!(EndpointState::new("").origin().is_none());
    }
}
