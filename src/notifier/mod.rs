use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use html_escape::{decode_html_entities, encode_text};
use regex::Regex;

use crate::app::Result;
use crate::domain::Item;
use crate::telegram::{ParseMode, TelegramClient};

/// Telegram rejects longer messages, counted after entity parsing.
pub const MAX_MESSAGE_CHARS: usize = 4096;

pub const MAX_TITLE_CHARS: usize = 256;
pub const MAX_DESCRIPTION_CHARS: usize = 3000;
pub const MAX_LINK_CHARS: usize = 512;

const _: () = assert!(MAX_TITLE_CHARS + MAX_DESCRIPTION_CHARS + MAX_LINK_CHARS + 8 <= MAX_MESSAGE_CHARS);

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<.*?>").expect("tag pattern is valid"));

#[async_trait]
pub trait Notifier {
    async fn deliver(&self, item: &Item) -> Result<()>;
}

/// Remove markup tags and decode entities, leaving plain text.
///
/// This is a pattern pass, not an HTML parser.
pub fn strip_html(input: &str) -> String {
    let without_tags = TAG.replace_all(input, "");
    decode_html_entities(&without_tags).trim().to_string()
}

fn truncate(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text,
    }
}

/// Render an item as Telegram HTML: bold title, then description, then link.
pub fn render(item: &Item) -> String {
    let title = truncate(strip_html(&item.title), MAX_TITLE_CHARS);
    let description = truncate(strip_html(&item.description), MAX_DESCRIPTION_CHARS);
    let link = truncate(strip_html(&item.link), MAX_LINK_CHARS);

    format!(
        "<b>{}</b>\n{}\n{}",
        encode_text(&title),
        encode_text(&description),
        encode_text(&link)
    )
}

/// Posts items to a single chat.
pub struct ChatNotifier {
    client: Arc<TelegramClient>,
    chat_id: String,
}

impl ChatNotifier {
    pub fn new(client: Arc<TelegramClient>, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl Notifier for ChatNotifier {
    async fn deliver(&self, item: &Item) -> Result<()> {
        self.client
            .send_message(&self.chat_id, &render(item), Some(ParseMode::Html))
            .await?;
        Ok(())
    }
}
