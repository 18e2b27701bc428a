use std::sync::atomic::{AtomicBool, Ordering};

/// Adult-content filter switch plus the negative prompt for each profile.
///
/// Shared between the command handlers (admin toggles) and the generation
/// client (reads at request-construction time). A toggle only affects
/// requests built after it; in-flight generations keep the prompt they were
/// built with.
pub struct ContentPolicy {
    enabled: AtomicBool,
    base: String,
    adult: String,
}

impl ContentPolicy {
    #[must_use]
    pub fn new(base: impl Into<String>, adult: impl Into<String>, enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            base: base.into(),
            adult: adult.into(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Idempotent; gating to admins happens at the command layer.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Negative prompt of the active profile.
    #[must_use]
    pub fn negative_prompt(&self) -> &str {
        if self.is_enabled() { &self.adult } else { &self.base }
    }
}

impl std::fmt::Debug for ContentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentPolicy")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}
