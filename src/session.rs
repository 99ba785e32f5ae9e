//! Edit session state machine.
//!
//! Tracks one in-progress video edit workflow from the first received video
//! to the render hand-off. State is pure (no I/O) so every transition can be
//! checked in isolation; the editor layer owns the replies.

use std::collections::HashMap;

use crate::core::models::VideoItem;

/// Workflow stage of an edit session.
///
/// There is no explicit initial or terminal stage: a session only exists
/// between the first video and the render hand-off (or cancellation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStage {
    /// Accumulating videos until the operator types `done`
    CollectingVideos,
    /// Waiting for the replacement thumbnail photo
    AwaitingThumbnail,
    /// Waiting for the yes/no caption-replacement decision
    AwaitingReplaceDecision,
    /// Waiting for the text to find in captions
    AwaitingFindText,
    /// Waiting for the text to substitute in
    AwaitingReplaceText,
}

/// Everything the render pass needs, detached from the session store so an
/// in-flight pass is unreachable by `/cancel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub videos: Vec<VideoItem>,
    pub thumbnail: Option<String>,
    pub find_text: Option<String>,
    pub replace_text: Option<String>,
}

#[derive(Debug)]
pub struct EditSession {
    pub owner: i64,
    stage: EditStage,
    videos: Vec<VideoItem>,
    thumbnail: Option<String>,
    find_text: Option<String>,
    replace_text: Option<String>,
}

impl EditSession {
    /// A session comes into existence with its first video.
    pub fn new(owner: i64, first_video: VideoItem) -> Self {
        Self {
            owner,
            stage: EditStage::CollectingVideos,
            videos: vec![first_video],
            thumbnail: None,
            find_text: None,
            replace_text: None,
        }
    }

    pub fn stage(&self) -> EditStage {
        self.stage
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    /// Append another video. Only legal while still collecting.
    pub fn append_video(&mut self, video: VideoItem) -> Result<usize, EditStage> {
        if self.stage != EditStage::CollectingVideos {
            return Err(self.stage);
        }
        self.videos.push(video);
        Ok(self.videos.len())
    }

    /// `done`: stop collecting and wait for the thumbnail. Requires at least
    /// one video (always true by construction, but guarded anyway).
    pub fn finish_collecting(&mut self) -> Result<usize, EditStage> {
        if self.stage != EditStage::CollectingVideos || self.videos.is_empty() {
            return Err(self.stage);
        }
        self.stage = EditStage::AwaitingThumbnail;
        Ok(self.videos.len())
    }

    /// Store the replacement thumbnail and move to the replace decision.
    pub fn set_thumbnail(&mut self, file_id: String) -> Result<(), EditStage> {
        if self.stage != EditStage::AwaitingThumbnail {
            return Err(self.stage);
        }
        self.thumbnail = Some(file_id);
        self.stage = EditStage::AwaitingReplaceDecision;
        Ok(())
    }

    /// `yes`: the operator wants a caption find/replace.
    pub fn request_replace(&mut self) -> Result<(), EditStage> {
        if self.stage != EditStage::AwaitingReplaceDecision {
            return Err(self.stage);
        }
        self.stage = EditStage::AwaitingFindText;
        Ok(())
    }

    /// Store the find text verbatim and wait for the replacement.
    pub fn set_find_text(&mut self, text: String) -> Result<(), EditStage> {
        if self.stage != EditStage::AwaitingFindText {
            return Err(self.stage);
        }
        self.find_text = Some(text);
        self.stage = EditStage::AwaitingReplaceText;
        Ok(())
    }

    /// Store the replacement text verbatim; the session is now renderable.
    pub fn set_replace_text(&mut self, text: String) -> Result<(), EditStage> {
        if self.stage != EditStage::AwaitingReplaceText {
            return Err(self.stage);
        }
        self.replace_text = Some(text);
        Ok(())
    }

    /// Consume the session into the owned payload for the render pass.
    pub fn into_render_job(self) -> RenderJob {
        RenderJob {
            videos: self.videos,
            thumbnail: self.thumbnail,
            find_text: self.find_text,
            replace_text: self.replace_text,
        }
    }
}

/// In-memory sessions, at most one per owner. Lifetime is bounded by a single
/// edit workflow; nothing here survives a restart.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<i64, EditSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_mut(&mut self, owner: i64) -> Option<&mut EditSession> {
        self.sessions.get_mut(&owner)
    }

    pub fn insert(&mut self, session: EditSession) {
        self.sessions.insert(session.owner, session);
    }

    pub fn remove(&mut self, owner: i64) -> Option<EditSession> {
        self.sessions.remove(&owner)
    }
}
