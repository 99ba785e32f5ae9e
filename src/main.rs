use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{error, info};

use recast::core::config::{AppConfig, OperatorAuth};
use recast::core::models::User;
use recast::delivery::Delivery;
use recast::roster::RosterStore;
use recast::router::Bot;
use recast::telegram::TelegramClient;
use recast::{health, setup_logging};

/// Server-side long-poll window for getUpdates.
const POLL_TIMEOUT_SECS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();

    let config = AppConfig::from_env().inspect_err(|e| {
        error!("{}", e);
    })?;

    let client = Arc::new(TelegramClient::new(config.bot_token.clone()));
    let delivery: Arc<dyn Delivery> = client.clone();

    let roster_store = RosterStore::new(&config.users_file);
    let users: HashMap<i64, User> = roster_store.load();
    info!("👥 {} users loaded", users.len());

    let bot = Arc::new(Bot::new(
        OperatorAuth::new(config.owner_id),
        delivery,
        Arc::new(Mutex::new(users)),
        roster_store,
    ));

    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(port).await {
            error!("Health endpoint failed: {}", e);
        }
    });

    info!("🎬 Video Editor Bot started!");
    run_polling(client, bot).await
}

/// Fetch and dispatch updates forever. Updates are handled strictly in
/// arrival order on this task; only render and broadcast passes are spawned.
async fn run_polling(client: Arc<TelegramClient>, bot: Arc<Bot>) -> anyhow::Result<()> {
    let mut offset = 0i64;
    loop {
        let updates = match client.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => updates,
            Err(e) => {
                error!("getUpdates failed: {}", e);
                tokio::time::sleep(Duration::from_secs(2)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            bot.handle_update(update).await;
        }
    }
}
