//! Broadcast dispatcher: one payload, one pass over every active roster
//! entry, one status message edited from "in progress" to the final counts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{error, info};

use crate::core::models::{User, UserStatus};
use crate::delivery::{Delivery, SendFailure, classify_send_failure};
use crate::errors::DeliveryError;
use crate::roster::RosterStore;
use crate::telegram::types::Message;

/// What the operator handed us to broadcast. Extracted once from the inbound
/// message; the original file ids are re-sent untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    Video {
        file_id: String,
        caption: Option<String>,
        duration: u32,
        width: u32,
        height: u32,
    },
    Document {
        file_id: String,
        caption: Option<String>,
    },
}

impl Payload {
    /// Text wins over media; photos use their highest-resolution variant.
    pub fn from_message(message: &Message) -> Option<Self> {
        if let Some(text) = &message.text {
            return Some(Payload::Text(text.clone()));
        }
        if let Some(photo) = message.largest_photo() {
            return Some(Payload::Photo {
                file_id: photo.file_id.clone(),
                caption: message.caption.clone(),
            });
        }
        if let Some(video) = &message.video {
            return Some(Payload::Video {
                file_id: video.file_id.clone(),
                caption: message.caption.clone(),
                duration: video.duration,
                width: video.width,
                height: video.height,
            });
        }
        if let Some(document) = &message.document {
            return Some(Payload::Document {
                file_id: document.file_id.clone(),
                caption: message.caption.clone(),
            });
        }
        None
    }
}

/// Counters for one broadcast pass. `sent + blocked + failed` always equals
/// the number of active users when the pass started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub sent: u32,
    pub blocked: u32,
    pub failed: u32,
}

async fn deliver_to(
    delivery: &dyn Delivery,
    recipient: i64,
    payload: &Payload,
) -> Result<(), DeliveryError> {
    match payload {
        Payload::Text(text) => delivery
            .send_text(recipient, &format!("📢 Broadcast:\n\n{}", text))
            .await
            .map(|_| ()),
        Payload::Photo { file_id, caption } => {
            delivery
                .send_photo(recipient, file_id, caption.as_deref())
                .await
        }
        Payload::Video {
            file_id,
            caption,
            duration,
            width,
            height,
        } => {
            delivery
                .send_video(
                    recipient,
                    file_id,
                    caption.as_deref(),
                    None,
                    *duration,
                    *width,
                    *height,
                )
                .await
        }
        Payload::Document { file_id, caption } => {
            delivery
                .send_document(recipient, file_id, caption.as_deref())
                .await
        }
    }
}

/// Deliver the payload to each recipient in turn and classify every outcome.
/// Returns the counters plus the ids that must be reclassified as blocked.
pub async fn run_pass(
    delivery: &dyn Delivery,
    recipients: &[i64],
    payload: &Payload,
) -> (Outcome, Vec<i64>) {
    let mut outcome = Outcome::default();
    let mut gone = Vec::new();

    for &recipient in recipients {
        match deliver_to(delivery, recipient, payload).await {
            Ok(()) => outcome.sent += 1,
            Err(e) => match classify_send_failure(&e) {
                SendFailure::RecipientGone => {
                    info!("Recipient {} unreachable, marking blocked: {}", recipient, e);
                    outcome.blocked += 1;
                    gone.push(recipient);
                }
                SendFailure::Transient => {
                    error!("Broadcast to {} failed: {}", recipient, e);
                    outcome.failed += 1;
                }
            },
        }
    }

    (outcome, gone)
}

/// Run a full broadcast pass: status message, sequential delivery over a
/// snapshot of the active roster, durable reclassification, final counts.
pub async fn broadcast(
    delivery: Arc<dyn Delivery>,
    roster: Arc<Mutex<HashMap<i64, User>>>,
    store: RosterStore,
    operator: i64,
    payload: Payload,
) -> Outcome {
    let status = match delivery.send_text(operator, "📡 Broadcasting...").await {
        Ok(message) => Some(message),
        Err(e) => {
            error!("Failed to send broadcast status: {}", e);
            None
        }
    };

    let recipients: Vec<i64> = {
        let users = roster.lock().unwrap();
        users
            .values()
            .filter(|u| u.is_active())
            .map(|u| u.id)
            .collect()
    };

    let (outcome, gone) = run_pass(delivery.as_ref(), &recipients, &payload).await;

    {
        let mut users = roster.lock().unwrap();
        for id in gone {
            if let Some(user) = users.get_mut(&id) {
                user.status = UserStatus::Blocked;
            }
        }
        store.save(&users);
    }

    let summary = format!(
        "✅ Broadcast Complete!\n\n\
         ✓ Sent: {}\n\
         🚫 Blocked: {}\n\
         ✗ Failed: {}",
        outcome.sent, outcome.blocked, outcome.failed
    );
    match status {
        Some(message) => {
            if let Err(e) = delivery.edit_text(operator, message, &summary).await {
                error!("Failed to finalize broadcast status: {}", e);
            }
        }
        None => {
            let _ = delivery.send_text(operator, &summary).await;
        }
    }

    info!(
        "Broadcast finished: sent={} blocked={} failed={}",
        outcome.sent, outcome.blocked, outcome.failed
    );
    outcome
}
