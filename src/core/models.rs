use serde::{Deserialize, Serialize};

/// Reachability of a roster user. Flipped to `Blocked` when a broadcast send
/// fails with a recipient-gone signal; never flipped back automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Blocked,
}

/// A known recipient, persisted in the roster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: Option<String>,
    pub status: UserStatus,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// One video queued for editing. Immutable once appended; the list keeps
/// arrival order through the whole render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoItem {
    pub file_id: String,
    pub caption: String,
    pub duration: u32,
    pub width: u32,
    pub height: u32,
}
