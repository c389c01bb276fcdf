//! # rss-relay
//!
//! Watches a set of RSS feeds and forwards newly published items to a
//! single Telegram chat. The watched set is managed at runtime by chat
//! commands.
//!
//! ## Architecture
//!
//! ```text
//!            ┌──────────── Poller (every DELAY) ────────────┐
//!            │                                               │
//! Store ──▶ Fetcher ──▶ Normalizer ──▶ Detector ──▶ Notifier ──▶ Store.flush
//!   ▲
//!   └── CommandProcessor ◀── Listener ◀── Telegram getUpdates
//! ```
//!
//! The poller and the listener run as two tokio tasks sharing one
//! [`FeedStore`](store::FeedStore).
//!
//! ## Commands
//!
//! ```text
//! /add [name] <url>
//! /remove <name>
//! /list
//! /help
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// fetcher, normalizer and notifier.
pub mod app;

/// Chat command grammar and the processor that applies commands to the store.
pub mod commands;

/// Configuration from flags and environment (`BOT_TOKEN`, `CHAT_ID`, `DELAY`, ...).
pub mod config;

/// Pure new-item detection against a feed's watermark.
pub mod detector;

/// Core domain models.
///
/// - [`Feed`](domain::Feed): a watched feed and its delivery watermark
/// - [`Item`](domain::Item): one fetched entry
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::ParallelFetcher): Concurrent fetching with semaphore
pub mod fetcher;

/// Long-polls the chat for commands and sends replies.
pub mod listener;

/// Feed parsing into [`Item`](domain::Item)s.
pub mod normalizer;

/// Message rendering and delivery to the notification chat.
pub mod notifier;

/// The poll loop.
pub mod scheduler;

/// Feed registry and snapshot persistence.
///
/// - [`FeedStore`](store::FeedStore): in-memory registry behind one mutex
/// - [`Persistence`](store::Persistence): load/save trait
/// - [`JsonSnapshot`](store::JsonSnapshot): atomic JSON file implementation
pub mod store;

/// Telegram Bot API client.
pub mod telegram;
