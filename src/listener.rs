use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commands::CommandProcessor;
use crate::telegram::{Message, TelegramClient};

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Receives chat messages and answers them through the command processor.
pub struct Listener {
    client: Arc<TelegramClient>,
    processor: CommandProcessor,
    long_poll: Duration,
}

impl Listener {
    pub fn new(client: Arc<TelegramClient>, processor: CommandProcessor, long_poll: Duration) -> Self {
        Self {
            client,
            processor,
            long_poll,
        }
    }

    pub async fn run(&self, cancel: CancellationToken) {
        info!("Command listener started");
        let mut offset = 0;

        loop {
            let updates = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.client.get_updates(offset, self.long_poll) => result,
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Some(message) = update.message {
                            self.answer(message).await;
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to receive updates");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        info!("Command listener stopped");
    }

    async fn answer(&self, message: Message) {
        let Some(text) = message.text else {
            return;
        };

        let sender = message
            .from
            .as_ref()
            .and_then(|u| u.username.as_deref())
            .unwrap_or("no-username");
        debug!(sender, chat = message.chat.id, "Command received");

        let reply = self.processor.handle(&text);
        let chat_id = message.chat.id.to_string();

        if let Err(e) = self.client.send_message(&chat_id, &reply, None).await {
            warn!(chat = message.chat.id, error = %e, "Failed to send reply");
        }
    }
}
