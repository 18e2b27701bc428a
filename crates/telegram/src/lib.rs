//! Telegram front end for kartina.
//!
//! Receives prompts over long polling with the teloxide library, drives the
//! generation flow against the Stable Diffusion backend and replies with a
//! photo or a user-facing error notice. Admin commands toggle the content
//! filter and repoint the backend at runtime.

pub mod access;
pub mod bot;
pub mod flow;
pub mod handlers;
pub mod outbound;
pub mod state;

pub use {bot::run_bot, flow::GenerationFlow, outbound::TelegramOutbound, state::BotState};
