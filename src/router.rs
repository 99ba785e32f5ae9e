//! Inbound update routing: command dispatch, the single-operator
//! authorization gate, and hand-off to the editor and broadcast dispatcher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, error};

use crate::broadcast::{self, Payload};
use crate::core::config::OperatorAuth;
use crate::core::models::{User, VideoItem};
use crate::delivery::Delivery;
use crate::editor::{self, Editor};
use crate::roster::{self, RosterStore};
use crate::session::SessionStore;
use crate::telegram::types as tg;

const OWNER_PANEL: &str = "🎬 Video Editor Bot - Owner Panel\n\n\
                           📹 Video Features:\n\
                           • Send video(s) to edit\n\
                           • Change thumbnails (single/bulk)\n\
                           • Replace text in captions\n\n\
                           📢 Commands:\n\
                           /broadcast - Broadcast message\n\
                           /users - List all users\n\
                           /stats - View statistics\n\
                           /cancel - Cancel current operation\n\n\
                           Just send videos to start editing!";

const WELCOME: &str = "🎬 Welcome to Video Editor Bot!\n\n\
                       This bot is currently in owner-only mode.\n\
                       Contact the admin for access.";

pub struct Bot {
    auth: OperatorAuth,
    delivery: Arc<dyn Delivery>,
    editor: Editor,
    roster: Arc<Mutex<HashMap<i64, User>>>,
    roster_store: RosterStore,
    broadcast_armed: AtomicBool,
}

impl Bot {
    pub fn new(
        auth: OperatorAuth,
        delivery: Arc<dyn Delivery>,
        roster: Arc<Mutex<HashMap<i64, User>>>,
        roster_store: RosterStore,
    ) -> Self {
        let editor = Editor::new(delivery.clone(), Arc::new(Mutex::new(SessionStore::new())));
        Self {
            auth,
            delivery,
            editor,
            roster,
            roster_store,
            broadcast_armed: AtomicBool::new(false),
        }
    }

    /// Route one inbound update. Commands first, then a pending broadcast
    /// payload, then the edit workflow events.
    pub async fn handle_update(&self, update: tg::Update) {
        let Some(message) = update.message else {
            return;
        };
        let Some(sender) = message.sender_id() else {
            return;
        };

        if let Some(command) = parse_command(message.text.as_deref()) {
            self.handle_command(&command, sender, &message).await;
            return;
        }

        if self.auth.is_operator(sender) && self.broadcast_armed.load(Ordering::SeqCst) {
            self.capture_broadcast_payload(sender, &message).await;
            return;
        }

        if let Some(video) = &message.video {
            if !self.auth.is_operator(sender) {
                self.send(sender, "⛔ This bot is for owner only!").await;
                return;
            }
            let item = VideoItem {
                file_id: video.file_id.clone(),
                caption: message.caption.clone().unwrap_or_default(),
                duration: video.duration,
                width: video.width,
                height: video.height,
            };
            self.editor.on_video(sender, item).await;
            return;
        }

        if let Some(photo) = message.largest_photo() {
            if !self.auth.is_operator(sender) {
                self.send(sender, "⛔ This bot is for owner only!").await;
                return;
            }
            self.editor.on_photo(sender, photo.file_id.clone()).await;
            return;
        }

        if let Some(text) = message.text.as_deref() {
            if !self.auth.is_operator(sender) {
                debug!("Dropping text from non-operator {}", sender);
                return;
            }
            if let Some(job) = self.editor.on_text(sender, text).await {
                let delivery = self.delivery.clone();
                tokio::spawn(async move {
                    editor::run_render(delivery, sender, job).await;
                });
            }
        }
    }

    async fn handle_command(&self, command: &str, sender: i64, message: &tg::Message) {
        match command {
            "start" => self.cmd_start(sender, message).await,
            "cancel" => self.cmd_cancel(sender).await,
            "stats" => self.cmd_stats(sender).await,
            "users" => self.cmd_users(sender).await,
            "broadcast" => self.cmd_broadcast(sender).await,
            _ => debug!("Ignoring unknown command /{}", command),
        }
    }

    async fn cmd_start(&self, sender: i64, message: &tg::Message) {
        if self.auth.is_operator(sender) {
            self.send(sender, OWNER_PANEL).await;
            return;
        }
        if let Some(from) = &message.from {
            let mut users = self.roster.lock().unwrap();
            roster::register_user(
                &mut users,
                &self.roster_store,
                sender,
                from.full_name(),
                from.username.clone(),
            );
        }
        self.send(sender, WELCOME).await;
    }

    async fn cmd_cancel(&self, sender: i64) {
        if !self.auth.is_operator(sender) {
            debug!("Dropping /cancel from non-operator {}", sender);
            return;
        }
        self.editor.cancel(sender);
        self.broadcast_armed.store(false, Ordering::SeqCst);
        self.send(sender, "❌ Operation cancelled!").await;
    }

    async fn cmd_stats(&self, sender: i64) {
        if !self.auth.is_operator(sender) {
            return;
        }
        let (total, active, blocked) = {
            let users = self.roster.lock().unwrap();
            let active = users.values().filter(|u| u.is_active()).count();
            (users.len(), active, users.len() - active)
        };
        self.send(
            sender,
            &format!(
                "📊 Bot Statistics\n\n\
                 👥 Total Users: {}\n\
                 ✅ Active: {}\n\
                 🚫 Blocked: {}",
                total, active, blocked
            ),
        )
        .await;
    }

    async fn cmd_users(&self, sender: i64) {
        if !self.auth.is_operator(sender) {
            return;
        }
        let listing = {
            let users = self.roster.lock().unwrap();
            if users.is_empty() {
                None
            } else {
                let mut msg = String::from("👥 All Users:\n\n");
                for user in users.values() {
                    let marker = if user.is_active() { "✅" } else { "🚫" };
                    msg.push_str(&format!(
                        "{} <a href=\"tg://user?id={}\">{}</a> (ID: {})\n",
                        marker,
                        user.id,
                        html_escape(&user.name),
                        user.id
                    ));
                }
                Some(msg)
            }
        };
        match listing {
            Some(msg) => {
                if let Err(e) = self.delivery.send_text_html(sender, &msg).await {
                    error!("Failed to send user listing: {}", e);
                }
            }
            None => self.send(sender, "📭 No users yet!").await,
        }
    }

    async fn cmd_broadcast(&self, sender: i64) {
        if !self.auth.is_operator(sender) {
            self.send(sender, "⛔ Owner only!").await;
            return;
        }
        self.broadcast_armed.store(true, Ordering::SeqCst);
        self.send(
            sender,
            "📢 Broadcast Mode\n\n\
             Send me the message/video to broadcast to all users.\n\n\
             Use /cancel to exit.",
        )
        .await;
    }

    async fn capture_broadcast_payload(&self, sender: i64, message: &tg::Message) {
        match Payload::from_message(message) {
            Some(payload) => {
                self.broadcast_armed.store(false, Ordering::SeqCst);
                let delivery = self.delivery.clone();
                let roster = self.roster.clone();
                let store = self.roster_store.clone();
                tokio::spawn(async move {
                    broadcast::broadcast(delivery, roster, store, sender, payload).await;
                });
            }
            None => {
                self.send(
                    sender,
                    "⚠️ I can't broadcast that. Send text, a photo, a video, or a document.",
                )
                .await;
            }
        }
    }

    async fn send(&self, recipient: i64, text: &str) {
        if let Err(e) = self.delivery.send_text(recipient, text).await {
            error!("Failed to send message to {}: {}", recipient, e);
        }
    }
}

/// Extract a command name from message text: `/stats@MyBot extra` → `stats`.
fn parse_command(text: Option<&str>) -> Option<String> {
    let first = text?.trim().split_whitespace().next()?;
    let command = first.strip_prefix('/')?;
    if command.is_empty() {
        return None;
    }
    Some(
        command
            .split('@')
            .next()
            .unwrap_or(command)
            .to_lowercase(),
    )
}

fn html_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
