//! recast - a single-operator Telegram bot for video re-captioning,
//! thumbnail swaps and roster broadcasts.
//!
//! The operator sends a batch of videos, a replacement thumbnail and an
//! optional caption find/replace pair; the bot re-delivers every video with
//! the edits applied. `/broadcast` fans one payload out to every known
//! active user and reclassifies the unreachable ones.
//!
//! # Architecture
//!
//! - [`telegram`] wraps the Bot API over plain HTTP (reqwest + serde).
//! - [`delivery`] is the narrow adapter trait the core consumes, so the
//!   edit workflow and the dispatcher are testable against a mock.
//! - [`session`] / [`editor`] hold the per-operator edit state machine.
//! - [`broadcast`] iterates the roster and classifies per-recipient failures.
//! - [`roster`] persists known users as a JSON file.
//! - [`health`] exposes the liveness probe for orchestration.

pub mod broadcast;
pub mod core;
pub mod delivery;
pub mod editor;
pub mod errors;
pub mod health;
pub mod roster;
pub mod router;
pub mod session;
pub mod telegram;

/// Configure structured logging. Honors `RUST_LOG`, defaulting to `info`.
///
/// Call once at startup, before any other work.
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
