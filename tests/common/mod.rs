//! Recording mock of the delivery adapter shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;

use recast::delivery::{Delivery, MessageRef};
use recast::errors::DeliveryError;

/// One attempted platform operation, in call order. Failed attempts are
/// recorded too, so tests can count retries (there must be none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Text {
        recipient: i64,
        text: String,
    },
    Edit {
        recipient: i64,
        message: MessageRef,
        text: String,
    },
    Photo {
        recipient: i64,
        file_id: String,
        caption: Option<String>,
    },
    Video {
        recipient: i64,
        file_id: String,
        caption: Option<String>,
        thumbnail: Option<Vec<u8>>,
        duration: u32,
        width: u32,
        height: u32,
    },
    Document {
        recipient: i64,
        file_id: String,
        caption: Option<String>,
    },
}

#[derive(Default)]
pub struct RecordingDelivery {
    pub log: Mutex<Vec<Attempt>>,
    next_message_id: AtomicI64,
    /// Recipients whose every send fails with the mapped reason.
    pub send_failures: Mutex<HashMap<i64, String>>,
    /// Video file ids whose send fails with the mapped reason.
    pub video_failures: Mutex<HashMap<String, String>>,
    /// File ids whose download fails.
    pub download_failures: Mutex<HashSet<String>>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sends_to(&self, recipient: i64, reason: &str) {
        self.send_failures
            .lock()
            .unwrap()
            .insert(recipient, reason.to_string());
    }

    pub fn fail_video(&self, file_id: &str, reason: &str) {
        self.video_failures
            .lock()
            .unwrap()
            .insert(file_id.to_string(), reason.to_string());
    }

    pub fn fail_download(&self, file_id: &str) {
        self.download_failures
            .lock()
            .unwrap()
            .insert(file_id.to_string());
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.log.lock().unwrap().clone()
    }

    pub fn texts_to(&self, recipient: i64) -> Vec<String> {
        self.attempts()
            .into_iter()
            .filter_map(|a| match a {
                Attempt::Text {
                    recipient: r, text, ..
                } if r == recipient => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<(MessageRef, String)> {
        self.attempts()
            .into_iter()
            .filter_map(|a| match a {
                Attempt::Edit { message, text, .. } => Some((message, text)),
                _ => None,
            })
            .collect()
    }

    pub fn videos(&self) -> Vec<Attempt> {
        self.attempts()
            .into_iter()
            .filter(|a| matches!(a, Attempt::Video { .. }))
            .collect()
    }

    fn fail_for(&self, recipient: i64) -> Option<DeliveryError> {
        self.send_failures
            .lock()
            .unwrap()
            .get(&recipient)
            .map(|reason| DeliveryError::Api(reason.clone()))
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send_text(&self, recipient: i64, text: &str) -> Result<MessageRef, DeliveryError> {
        self.log.lock().unwrap().push(Attempt::Text {
            recipient,
            text: text.to_string(),
        });
        if let Some(err) = self.fail_for(recipient) {
            return Err(err);
        }
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn send_text_html(
        &self,
        recipient: i64,
        text: &str,
    ) -> Result<MessageRef, DeliveryError> {
        self.send_text(recipient, text).await
    }

    async fn edit_text(
        &self,
        recipient: i64,
        message: MessageRef,
        text: &str,
    ) -> Result<(), DeliveryError> {
        self.log.lock().unwrap().push(Attempt::Edit {
            recipient,
            message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_photo(
        &self,
        recipient: i64,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError> {
        self.log.lock().unwrap().push(Attempt::Photo {
            recipient,
            file_id: file_id.to_string(),
            caption: caption.map(str::to_string),
        });
        match self.fail_for(recipient) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn send_video(
        &self,
        recipient: i64,
        file_id: &str,
        caption: Option<&str>,
        thumbnail: Option<&[u8]>,
        duration: u32,
        width: u32,
        height: u32,
    ) -> Result<(), DeliveryError> {
        self.log.lock().unwrap().push(Attempt::Video {
            recipient,
            file_id: file_id.to_string(),
            caption: caption.map(str::to_string),
            thumbnail: thumbnail.map(<[u8]>::to_vec),
            duration,
            width,
            height,
        });
        if let Some(reason) = self.video_failures.lock().unwrap().get(file_id) {
            return Err(DeliveryError::Api(reason.clone()));
        }
        match self.fail_for(recipient) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn send_document(
        &self,
        recipient: i64,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError> {
        self.log.lock().unwrap().push(Attempt::Document {
            recipient,
            file_id: file_id.to_string(),
            caption: caption.map(str::to_string),
        });
        match self.fail_for(recipient) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn download_bytes(&self, file_id: &str) -> Result<Vec<u8>, DeliveryError> {
        if self.download_failures.lock().unwrap().contains(file_id) {
            return Err(DeliveryError::Api(format!(
                "Bad Request: invalid file id {}",
                file_id
            )));
        }
        Ok(format!("bytes-of-{}", file_id).into_bytes())
    }
}
