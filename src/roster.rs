//! Roster persistence.
//!
//! The roster file is a JSON object keyed by stringified user id, rewritten
//! wholesale on every mutation. Load never fails: an absent or unreadable
//! file is an empty roster. Save is best-effort: a failure is logged and
//! swallowed so it can never crash a broadcast pass.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::{error, info};

use crate::core::models::{User, UserStatus};

#[derive(Debug, Clone)]
pub struct RosterStore {
    path: PathBuf,
}

impl RosterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> HashMap<i64, User> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No roster file at {:?}, starting empty", self.path);
                return HashMap::new();
            }
            Err(e) => {
                error!("Failed to read roster file {:?}: {}", self.path, e);
                return HashMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(users) => users,
            Err(e) => {
                error!("Roster file {:?} is not valid JSON: {}", self.path, e);
                HashMap::new()
            }
        }
    }

    pub fn save(&self, users: &HashMap<i64, User>) {
        let serialized = match serde_json::to_string_pretty(users) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to serialize roster: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, serialized) {
            error!("Failed to write roster file {:?}: {}", self.path, e);
        }
    }
}

/// Insert a newly seen non-operator and persist immediately. Known users are
/// left untouched, including their blocked status.
pub fn register_user(
    users: &mut HashMap<i64, User>,
    store: &RosterStore,
    id: i64,
    name: String,
    username: Option<String>,
) {
    if users.contains_key(&id) {
        return;
    }
    info!("Registering new user {} ({})", id, name);
    users.insert(
        id,
        User {
            id,
            name,
            username,
            status: UserStatus::Active,
        },
    );
    store.save(users);
}
