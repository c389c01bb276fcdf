//! Runtime configuration.
//!
//! Every setting can be given as a command-line flag or an environment
//! variable. `main` loads a `.env` file first, so a deployment can keep
//! `BOT_TOKEN`, `CHAT_ID` and `DELAY` there.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::app::{RelayError, Result};
use crate::fetcher::http_fetcher::DEFAULT_FETCH_TIMEOUT;
use crate::fetcher::parallel::DEFAULT_WORKERS;
use crate::telegram::{DEFAULT_API_URL, DEFAULT_SEND_TIMEOUT};

pub const DEFAULT_DATA_FILE: &str = "Data/database.json";

#[derive(Parser, Debug, Clone)]
#[command(name = "rss-relay")]
#[command(about = "Forward new RSS items to a Telegram chat", long_about = None)]
pub struct Config {
    /// Telegram bot token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Chat that receives notifications (numeric id or @channel)
    #[arg(long, env = "CHAT_ID")]
    pub chat_id: String,

    /// Delay between poll cycles (e.g. "60", "90s", "5m", "1h")
    #[arg(long, env = "DELAY", default_value = "60", value_parser = parse_interval)]
    pub delay: u64,

    /// Location of the feed snapshot
    #[arg(long, env = "DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    /// Feed fetch timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT", default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs())]
    pub fetch_timeout: u64,

    /// Message send timeout in seconds
    #[arg(long, env = "SEND_TIMEOUT", default_value_t = DEFAULT_SEND_TIMEOUT.as_secs())]
    pub send_timeout: u64,

    /// Number of feeds fetched in parallel
    #[arg(short, long, env = "WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Telegram Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Server-side long poll for incoming commands, in seconds
    #[arg(long, env = "LONG_POLL", default_value_t = 30)]
    pub long_poll: u64,
}

impl Config {
    /// Reject settings clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            return Err(RelayError::Config("BOT_TOKEN is empty".into()));
        }
        if self.chat_id.trim().is_empty() {
            return Err(RelayError::Config("CHAT_ID is empty".into()));
        }
        if self.delay == 0 {
            return Err(RelayError::Config("DELAY must be at least one second".into()));
        }
        if self.workers == 0 {
            return Err(RelayError::Config("WORKERS must be at least 1".into()));
        }
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout)
    }

    pub fn long_poll(&self) -> Duration {
        Duration::from_secs(self.long_poll)
    }
}

/// Parse interval string like "60", "90s", "30m", "6h", "1d" into seconds
pub fn parse_interval(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim().to_lowercase();
    let scaled = |value: &str, unit: &str, factor: u64| -> std::result::Result<u64, String> {
        value
            .parse::<u64>()
            .map_err(|_| format!("Invalid {}: {}", unit, value))?
            .checked_mul(factor)
            .ok_or_else(|| format!("Interval too large: {}", s))
    };

    if let Some(hours) = s.strip_suffix('h') {
        scaled(hours, "hours", 3600)
    } else if let Some(minutes) = s.strip_suffix('m') {
        scaled(minutes, "minutes", 60)
    } else if let Some(days) = s.strip_suffix('d') {
        scaled(days, "days", 86400)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>()
            .map_err(|_| format!("Invalid seconds: {}", secs))
    } else {
        s.parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use seconds or a form like '90s', '5m', '1h'", s))
    }
}

/// Format interval for display
pub fn format_interval(secs: u64) -> String {
    if secs >= 86400 && secs % 86400 == 0 {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
