use thiserror::Error;

/// Failure of a single Telegram send/download operation.
///
/// The variant payload is the human-readable reason the platform gave us;
/// broadcast classification inspects it (see [`crate::delivery::classify_send_failure`]).
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("Failed to send HTTP request: {0}")]
    Http(String),
}

impl DeliveryError {
    /// The reason string used for blocked/deactivated classification.
    pub fn reason(&self) -> &str {
        match self {
            DeliveryError::Api(msg) | DeliveryError::Http(msg) => msg,
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(error: reqwest::Error) -> Self {
        DeliveryError::Http(error.to_string())
    }
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Missing or invalid configuration: {0}")]
    Config(String),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Roster persistence failed: {0}")]
    Persistence(String),
}
