//! Telegram Bot API client.
//!
//! Every call POSTs JSON (or multipart, for thumbnail uploads) to the Bot API
//! and decodes the standard `{ok, result, description}` envelope. Only the
//! long-poll transport is retried; delivery sends surface their first failure
//! so the broadcast dispatcher can classify it.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_retry::strategy::jitter;
use tokio_retry::{Retry, strategy::ExponentialBackoff};

use crate::delivery::{Delivery, MessageRef};
use crate::errors::DeliveryError;
use crate::telegram::types::{File, Message, Update};

/// Long polls wait up to 30s server-side; the client timeout leaves headroom
/// on top of that.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(90))
        .build()
        .expect("Failed to create HTTP client")
});

/// Standard Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

pub struct TelegramClient {
    token: String,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self { token }
    }

    fn method_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("https://api.telegram.org/file/bot{}/{}", self.token, file_path)
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, DeliveryError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, DeliveryError>> + Send,
        T: Send,
    {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(5);

        Retry::spawn(strategy, operation).await
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
    ) -> Result<T, DeliveryError> {
        let response = HTTP_CLIENT
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await?;

        Self::decode(method, response).await
    }

    /// Error responses still carry the JSON envelope, so decode it regardless
    /// of the HTTP status and prefer the API's own description.
    async fn decode<T: serde::de::DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T, DeliveryError> {
        let status = response.status();
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| DeliveryError::Api(format!("{}: HTTP {}: {}", method, status, e)))?;

        if envelope.ok {
            envelope
                .result
                .ok_or_else(|| DeliveryError::Api(format!("{}: missing result payload", method)))
        } else {
            Err(DeliveryError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| format!("{}: HTTP {}", method, status)),
            ))
        }
    }

    /// Fetch the next batch of updates, long polling for up to `timeout_secs`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, DeliveryError> {
        self.with_retry(|| async {
            self.call(
                "getUpdates",
                &json!({
                    "offset": offset,
                    "timeout": timeout_secs,
                    "allowed_updates": ["message"],
                }),
            )
            .await
        })
        .await
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        html: bool,
    ) -> Result<Message, DeliveryError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if html {
            payload["parse_mode"] = json!("HTML");
        }
        self.call("sendMessage", &payload).await
    }
}

#[async_trait]
impl Delivery for TelegramClient {
    async fn send_text(&self, recipient: i64, text: &str) -> Result<MessageRef, DeliveryError> {
        let message = self.send_message(recipient, text, false).await?;
        Ok(message.message_id)
    }

    async fn send_text_html(
        &self,
        recipient: i64,
        text: &str,
    ) -> Result<MessageRef, DeliveryError> {
        let message = self.send_message(recipient, text, true).await?;
        Ok(message.message_id)
    }

    async fn edit_text(
        &self,
        recipient: i64,
        message: MessageRef,
        text: &str,
    ) -> Result<(), DeliveryError> {
        self.call::<Value>(
            "editMessageText",
            &json!({
                "chat_id": recipient,
                "message_id": message,
                "text": text,
            }),
        )
        .await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        recipient: i64,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let mut payload = json!({
            "chat_id": recipient,
            "photo": file_id,
        });
        if let Some(caption) = caption {
            payload["caption"] = json!(caption);
        }
        self.call::<Value>("sendPhoto", &payload).await?;
        Ok(())
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
        // A replacement thumbnail has to travel as a multipart upload; plain
        // file_id re-sends go over JSON.
        let Some(thumb_bytes) = thumbnail else {
            let mut payload = json!({
                "chat_id": recipient,
                "video": file_id,
                "duration": duration,
                "width": width,
                "height": height,
            });
            if let Some(caption) = caption {
                payload["caption"] = json!(caption);
            }
            self.call::<Value>("sendVideo", &payload).await?;
            return Ok(());
        };

        let mut form = Form::new()
            .text("chat_id", recipient.to_string())
            .text("video", file_id.to_string())
            .text("duration", duration.to_string())
            .text("width", width.to_string())
            .text("height", height.to_string())
            .part(
                "thumbnail",
                Part::bytes(thumb_bytes.to_vec()).file_name("thumb.jpg"),
            );
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }

        let response = HTTP_CLIENT
            .post(self.method_url("sendVideo"))
            .multipart(form)
            .send()
            .await?;
        Self::decode::<Value>("sendVideo", response).await?;
        Ok(())
    }

    async fn send_document(
        &self,
        recipient: i64,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let mut payload = json!({
            "chat_id": recipient,
            "document": file_id,
        });
        if let Some(caption) = caption {
            payload["caption"] = json!(caption);
        }
        self.call::<Value>("sendDocument", &payload).await?;
        Ok(())
    }

    async fn download_bytes(&self, file_id: &str) -> Result<Vec<u8>, DeliveryError> {
        let file: File = self.call("getFile", &json!({ "file_id": file_id })).await?;
        let file_path = file
            .file_path
            .ok_or_else(|| DeliveryError::Api("getFile: no file_path in result".to_string()))?;

        let response = HTTP_CLIENT.get(self.file_url(&file_path)).send().await?;
        if !response.status().is_success() {
            return Err(DeliveryError::Api(format!(
                "file download failed with status {}",
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
