//! Edit workflow: event wiring around the session state machine, and the
//! render pass that re-delivers the edited videos.

use std::sync::{Arc, Mutex};

use tracing::{debug, error, info};

use crate::core::models::VideoItem;
use crate::delivery::{Delivery, MessageRef};
use crate::errors::DeliveryError;
use crate::session::{EditSession, EditStage, RenderJob, SessionStore};

pub struct Editor {
    delivery: Arc<dyn Delivery>,
    sessions: Arc<Mutex<SessionStore>>,
}

impl Editor {
    pub fn new(delivery: Arc<dyn Delivery>, sessions: Arc<Mutex<SessionStore>>) -> Self {
        Self { delivery, sessions }
    }

    /// A video from the operator: start a session or grow the current batch.
    pub async fn on_video(&self, operator: i64, video: VideoItem) {
        let reply = {
            let mut store = self.sessions.lock().unwrap();
            match store.get_mut(operator) {
                None => {
                    store.insert(EditSession::new(operator, video));
                    collect_menu(1)
                }
                Some(session) => match session.append_video(video) {
                    Ok(count) => collect_menu(count),
                    Err(stage) => {
                        debug!("Video rejected in stage {:?}", stage);
                        "⚠️ An edit is already in progress.\n\
                         Finish it or use /cancel before sending new videos."
                            .to_string()
                    }
                },
            }
        };
        self.reply(operator, &reply).await;
    }

    /// A photo from the operator: the replacement thumbnail, when one is due.
    pub async fn on_photo(&self, operator: i64, thumb_file_id: String) {
        let reply = {
            let mut store = self.sessions.lock().unwrap();
            match store.get_mut(operator) {
                Some(session) => match session.set_thumbnail(thumb_file_id) {
                    Ok(()) => "✅ Thumbnail saved!\n\n\
                               Do you want to replace any text in captions?\n\
                               • Type 'yes' to replace text\n\
                               • Type 'no' to skip and process videos"
                        .to_string(),
                    Err(EditStage::CollectingVideos) => {
                        "⚠️ Type 'done' first, then send the thumbnail photo.".to_string()
                    }
                    Err(stage) => {
                        debug!("Photo rejected in stage {:?}", stage);
                        "⚠️ Thumbnail already saved. Answer 'yes' or 'no', \
                         or send the requested text."
                            .to_string()
                    }
                },
                None => "❌ Send videos first, then thumbnail!".to_string(),
            }
        };
        self.reply(operator, &reply).await;
    }

    /// A plain text message from the operator. Returns the render job when
    /// the text completes the workflow; the caller spawns the render pass.
    pub async fn on_text(&self, operator: i64, text: &str) -> Option<RenderJob> {
        // Keywords match case-insensitively on trimmed text; find/replace
        // inputs are stored verbatim.
        let keyword = text.trim().to_lowercase();

        let (reply, job) = {
            let mut store = self.sessions.lock().unwrap();
            let stage = store.get_mut(operator).map(|s| s.stage());
            match stage {
                None => {
                    if keyword == "done" {
                        (Some("❌ No videos to process!".to_string()), None)
                    } else {
                        debug!("Dropping text with no active session");
                        (None, None)
                    }
                }
                Some(EditStage::CollectingVideos) => {
                    if keyword == "done" {
                        match store.get_mut(operator).map(|s| s.finish_collecting()) {
                            Some(Ok(count)) => (
                                Some(format!(
                                    "✅ {} video(s) ready!\n\n\
                                     Now send a photo for the thumbnail.\n\
                                     (This will be applied to all videos)",
                                    count
                                )),
                                None,
                            ),
                            _ => (Some("❌ No videos to process!".to_string()), None),
                        }
                    } else {
                        (
                            Some(
                                "⚠️ Send more videos, or type 'done' when ready to edit."
                                    .to_string(),
                            ),
                            None,
                        )
                    }
                }
                Some(EditStage::AwaitingThumbnail) => (
                    Some("⚠️ Send a photo to use as the thumbnail.".to_string()),
                    None,
                ),
                Some(EditStage::AwaitingReplaceDecision) => {
                    if keyword == "yes" {
                        if let Some(session) = store.get_mut(operator) {
                            let _ = session.request_replace();
                        }
                        (
                            Some(
                                "🔍 Find & Replace\n\n\
                                 Send the text you want to FIND in captions:"
                                    .to_string(),
                            ),
                            None,
                        )
                    } else if keyword == "no" {
                        let job = store.remove(operator).map(EditSession::into_render_job);
                        (None, job)
                    } else {
                        (
                            Some(
                                "⚠️ Type 'yes' to replace caption text, \
                                 or 'no' to process the videos."
                                    .to_string(),
                            ),
                            None,
                        )
                    }
                }
                Some(EditStage::AwaitingFindText) => {
                    if let Some(session) = store.get_mut(operator) {
                        let _ = session.set_find_text(text.to_string());
                    }
                    (
                        Some(format!(
                            "✅ Will find: '{}'\n\n\
                             Now send the text to REPLACE it with:",
                            text
                        )),
                        None,
                    )
                }
                Some(EditStage::AwaitingReplaceText) => {
                    if let Some(session) = store.get_mut(operator) {
                        let _ = session.set_replace_text(text.to_string());
                    }
                    let job = store.remove(operator).map(EditSession::into_render_job);
                    (
                        Some(format!(
                            "✅ Will replace with: '{}'\n\nProcessing videos...",
                            text
                        )),
                        job,
                    )
                }
            }
        };

        if let Some(reply) = &reply {
            self.reply(operator, reply).await;
        }
        job
    }

    /// Destroy the operator's session, if any. The caller confirms.
    pub fn cancel(&self, operator: i64) -> bool {
        self.sessions.lock().unwrap().remove(operator).is_some()
    }

    async fn reply(&self, operator: i64, text: &str) {
        if let Err(e) = self.delivery.send_text(operator, text).await {
            error!("Failed to reply to operator: {}", e);
        }
    }
}

fn collect_menu(count: usize) -> String {
    format!(
        "📹 Video {} received!\n\n\
         Options:\n\
         1️⃣ Send more videos for bulk edit\n\
         2️⃣ Type 'done' when ready to edit\n\n\
         Current videos: {}",
        count, count
    )
}

/// Literal, case-sensitive, non-overlapping caption substitution. Applied
/// only when both texts are present and the caption is non-empty.
pub fn apply_caption_edit(caption: &str, find: Option<&str>, replace: Option<&str>) -> String {
    match (find, replace) {
        (Some(find), Some(replace)) if !caption.is_empty() && !find.is_empty() => {
            caption.replace(find, replace)
        }
        _ => caption.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderReport {
    pub processed: usize,
    pub delivered: usize,
}

/// Re-deliver every video in arrival order with the edits applied.
///
/// The operator watches one status message move from "processing" to the
/// final summary; it is edited after every item. Per-item failures
/// (thumbnail download or send) are logged and never abort the batch.
pub async fn run_render(
    delivery: Arc<dyn Delivery>,
    operator: i64,
    job: RenderJob,
) -> RenderReport {
    let total = job.videos.len();
    let status: Option<MessageRef> = match delivery
        .send_text(operator, &format!("⏳ Processing {} video(s)...", total))
        .await
    {
        Ok(message) => Some(message),
        Err(e) => {
            error!("Failed to send processing status: {}", e);
            None
        }
    };

    let mut delivered = 0usize;
    for (idx, item) in job.videos.iter().enumerate() {
        let caption = apply_caption_edit(
            &item.caption,
            job.find_text.as_deref(),
            job.replace_text.as_deref(),
        );

        let attempt = deliver_item(delivery.as_ref(), operator, item, &caption, &job).await;
        match attempt {
            Ok(()) => delivered += 1,
            Err(e) => error!("Error processing video {}/{}: {}", idx + 1, total, e),
        }

        if let Some(message) = status {
            let progress = format!(
                "⏳ Processing: {}/{}\n✅ Completed: {}",
                idx + 1,
                total,
                delivered
            );
            if let Err(e) = delivery.edit_text(operator, message, &progress).await {
                debug!("Failed to update progress message: {}", e);
            }
        }
    }

    let summary = format!(
        "✅ All Done!\n\n\
         Processed: {}/{} videos\n\
         {}\n\
         {}",
        delivered,
        total,
        if job.thumbnail.is_some() {
            "🖼️ Thumbnail: Changed"
        } else {
            "📝 Thumbnail: Original"
        },
        if job.find_text.is_some() {
            "✏️ Caption: Modified"
        } else {
            "📝 Caption: Original"
        },
    );
    match status {
        Some(message) => {
            if let Err(e) = delivery.edit_text(operator, message, &summary).await {
                error!("Failed to finalize status message: {}", e);
            }
        }
        None => {
            let _ = delivery.send_text(operator, &summary).await;
        }
    }

    info!("Render pass finished: {}/{} delivered", delivered, total);
    RenderReport {
        processed: total,
        delivered,
    }
}

async fn deliver_item(
    delivery: &dyn Delivery,
    operator: i64,
    item: &VideoItem,
    caption: &str,
    job: &RenderJob,
) -> Result<(), DeliveryError> {
    // The thumbnail is resolved per item so a bad download only costs the
    // item it happened on.
    let thumb_bytes = match &job.thumbnail {
        Some(file_id) => Some(delivery.download_bytes(file_id).await?),
        None => None,
    };

    delivery
        .send_video(
            operator,
            &item.file_id,
            Some(caption),
            thumb_bytes.as_deref(),
            item.duration,
            item.width,
            item.height,
        )
        .await
}
