use std::env;

use crate::errors::BotError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bot_token: String,
    pub owner_id: i64,
    pub port: u16,
    pub users_file: String,
}

impl AppConfig {
    /// Read configuration from the environment.
    ///
    /// `BOT_TOKEN` and `OWNER_ID` are required; their absence is fatal and the
    /// process must not start without them.
    pub fn from_env() -> Result<Self, BotError> {
        let bot_token =
            env::var("BOT_TOKEN").map_err(|e| BotError::Config(format!("BOT_TOKEN: {}", e)))?;
        let owner_id = env::var("OWNER_ID")
            .map_err(|e| BotError::Config(format!("OWNER_ID: {}", e)))?
            .parse::<i64>()
            .map_err(|e| BotError::Config(format!("OWNER_ID: {}", e)))?;
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| BotError::Config(format!("PORT: {}", e)))?,
            Err(_) => 10000,
        };
        let users_file = env::var("USERS_FILE").unwrap_or_else(|_| "users.json".to_string());

        Ok(Self {
            bot_token,
            owner_id,
            port,
            users_file,
        })
    }
}

/// Owner-scope authorization predicate, injected once at startup and consulted
/// wherever an action requires operator scope.
#[derive(Debug, Clone, Copy)]
pub struct OperatorAuth {
    owner_id: i64,
}

impl OperatorAuth {
    pub fn new(owner_id: i64) -> Self {
        Self { owner_id }
    }

    pub fn is_operator(&self, user_id: i64) -> bool {
        user_id == self.owner_id
    }
}
