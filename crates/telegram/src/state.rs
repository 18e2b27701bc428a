//! Shared runtime state for the bot process.

use std::sync::Arc;

use kartina_sd::{ContentPolicy, EndpointState};

use crate::{flow::GenerationFlow, outbound::ChatOutbound};

/// Everything the message handlers need, shared across spawned tasks.
pub struct BotState {
    /// Username reported by `getMe`, used to match `/command@bot` forms.
    pub bot_username: Option<String>,
    /// User ids allowed to run mutating commands.
    pub admins: Vec<u64>,
    /// Negative-prompt profile switch, flipped by the filter commands.
    pub policy: Arc<ContentPolicy>,
    /// Current backend address, re-pointable via `/set_sd_server`.
    pub endpoint: Arc<EndpointState>,
    /// Chat-side effects (texts, photos, deletions).
    pub outbound: Arc<dyn ChatOutbound>,
    /// Per-prompt generation pipeline.
    pub flow: GenerationFlow,
}
