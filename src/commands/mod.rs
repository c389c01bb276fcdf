//! Operator commands received over chat.
//!
//! Grammar, whitespace separated, with an optional leading `/` and
//! `@botname` suffix on the command word:
//!
//! ```text
//! add <address>
//! add <name> <address>
//! remove <name>
//! list
//! help | start | stop
//! ```

use std::sync::Arc;

use url::Url;

use crate::app::{RelayError, Result};
use crate::config::format_interval;
use crate::domain::Feed;
use crate::store::FeedStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        name: Option<String>,
        address: String,
    },
    Remove {
        name: String,
    },
    List,
    Help,
}

impl Command {
    pub fn parse(text: &str) -> Result<Self> {
        let mut tokens = text.split_whitespace();
        let word = tokens.next().unwrap_or_default();
        let args: Vec<&str> = tokens.collect();

        let name = word.strip_prefix('/').unwrap_or(word);
        let name = name.split('@').next().unwrap_or_default().to_lowercase();

        match name.as_str() {
            "add" => match args.as_slice() {
                [address] => Ok(Command::Add {
                    name: None,
                    address: validate_address(address)?,
                }),
                [name, address] => Ok(Command::Add {
                    name: Some((*name).to_string()),
                    address: validate_address(address)?,
                }),
                _ => Err(RelayError::InvalidArguments(
                    "usage: /add [name] <url>".into(),
                )),
            },
            "remove" => match args.as_slice() {
                [name] => Ok(Command::Remove {
                    name: (*name).to_string(),
                }),
                _ => Err(RelayError::InvalidArguments("usage: /remove <name>".into())),
            },
            "list" => Ok(Command::List),
            "help" | "start" | "stop" => Ok(Command::Help),
            _ => Err(RelayError::UnknownCommand(word.to_string())),
        }
    }
}

fn validate_address(address: &str) -> Result<String> {
    let url = Url::parse(address).map_err(|e| RelayError::InvalidAddress(format!("{} ({})", address, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(address.to_string()),
        other => Err(RelayError::InvalidAddress(format!(
            "{} (unsupported scheme {})",
            address, other
        ))),
    }
}

/// Applies commands to the feed store and builds the reply text.
pub struct CommandProcessor {
    store: Arc<FeedStore>,
    chat_id: String,
    delay_secs: u64,
}

impl CommandProcessor {
    pub fn new(store: Arc<FeedStore>, chat_id: impl Into<String>, delay_secs: u64) -> Self {
        Self {
            store,
            chat_id: chat_id.into(),
            delay_secs,
        }
    }

    /// Handle one inbound message and return the reply.
    ///
    /// Mutations are persisted before this returns a success reply.
    pub fn handle(&self, text: &str) -> String {
        let command = match Command::parse(text) {
            Ok(command) => command,
            Err(RelayError::UnknownCommand(_)) => return "Invalid command, type /help".into(),
            Err(RelayError::InvalidArguments(_)) => return "Invalid arguments".into(),
            Err(e) => return e.to_string(),
        };

        match self.execute(command) {
            Ok(reply) => reply,
            Err(e) => self.error_reply(e),
        }
    }

    fn execute(&self, command: Command) -> Result<String> {
        match command {
            Command::Add { name, address } => {
                let feed = match name {
                    Some(name) => Feed::named(name, address),
                    None => Feed::new(address),
                };
                let reply = format!("Feed added : {}\n{}", feed.identifier, feed.address);
                let identifier = feed.identifier.clone();

                self.store.add(feed)?;
                tracing::info!(feed = %identifier, "Feed added");
                Ok(reply)
            }
            Command::Remove { name } => {
                let feed = self.store.remove(&name)?;
                tracing::info!(feed = %feed.identifier, "Feed removed");
                Ok(format!("Feed removed : {}\n{}", feed.identifier, feed.address))
            }
            Command::List => {
                let feeds = self.store.list()?;
                if feeds.is_empty() {
                    return Ok("No feeds".into());
                }

                let mut text = String::from("Feeds :");
                for feed in feeds {
                    text.push_str(&format!("\n{} : {}", feed.identifier, feed.address));
                }
                Ok(text)
            }
            Command::Help => Ok(self.help()),
        }
    }

    fn error_reply(&self, error: RelayError) -> String {
        match error {
            RelayError::FeedNotFound(_) => "Feed not found".into(),
            RelayError::DuplicateFeed(id) => format!("Feed already exists : {}", id),
            other => {
                tracing::error!(error = %other, "Command failed");
                format!("Failed to save feeds: {}", other)
            }
        }
    }

    pub fn help(&self) -> String {
        [
            "/add <url> : add a feed with a generated name".to_string(),
            "/add <name> <url> : add a feed".to_string(),
            "/remove <name> : remove a feed".to_string(),
            "/list : list all feeds".to_string(),
            "/help : show this message".to_string(),
            format!("Chat Id : {}", self.chat_id),
            format!("Delay : {}", format_interval(self.delay_secs)),
        ]
        .join("\n")
    }
}
