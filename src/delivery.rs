//! Delivery adapter boundary.
//!
//! The edit workflow and the broadcast dispatcher talk to the messaging
//! platform only through the [`Delivery`] trait, so both can be exercised
//! against a recording mock in tests.

use async_trait::async_trait;

use crate::errors::DeliveryError;

/// Handle to a previously sent message, used to edit it in place.
pub type MessageRef = i64;

#[async_trait]
pub trait Delivery: Send + Sync {
    async fn send_text(&self, recipient: i64, text: &str) -> Result<MessageRef, DeliveryError>;

    /// Like [`Delivery::send_text`] but rendered with HTML entities
    /// (used for the `/users` listing with its `tg://user` links).
    async fn send_text_html(&self, recipient: i64, text: &str)
    -> Result<MessageRef, DeliveryError>;

    async fn edit_text(
        &self,
        recipient: i64,
        message: MessageRef,
        text: &str,
    ) -> Result<(), DeliveryError>;

    async fn send_photo(
        &self,
        recipient: i64,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError>;

    #[allow(clippy::too_many_arguments)]
    async fn send_video(
        &self,
        recipient: i64,
        file_id: &str,
        caption: Option<&str>,
        thumbnail: Option<&[u8]>,
        duration: u32,
        width: u32,
        height: u32,
    ) -> Result<(), DeliveryError>;

    async fn send_document(
        &self,
        recipient: i64,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError>;

    /// Resolve an opaque media reference to its raw bytes.
    async fn download_bytes(&self, file_id: &str) -> Result<Vec<u8>, DeliveryError>;
}

/// How a failed broadcast send should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFailure {
    /// The recipient blocked the bot, deactivated their account, or no longer
    /// exists; their roster status must be flipped to blocked.
    RecipientGone,
    /// Anything else: message undelivered, roster untouched, no retry.
    Transient,
}

/// Classify a failed send by the platform's reason string.
///
/// Substring matching on the platform's error wording is placeholder policy,
/// not a guaranteed contract; keep replacements confined to this function.
pub fn classify_send_failure(error: &DeliveryError) -> SendFailure {
    let reason = error.reason().to_lowercase();
    if reason.contains("blocked") || reason.contains("deactivated") || reason.contains("not found")
    {
        SendFailure::RecipientGone
    } else {
        SendFailure::Transient
    }
}
