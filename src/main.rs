use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rss_relay::app::AppContext;
use rss_relay::commands::CommandProcessor;
use rss_relay::config::{format_interval, Config};
use rss_relay::listener::Listener;
use rss_relay::scheduler::Poller;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // A missing .env file is fine; the environment may already be set
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::try_parse() {
        Ok(config) => config,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Ok(ExitCode::from(2));
        }
    };

    let ctx = match AppContext::new(&config) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %e, "Startup failed");
            return Ok(ExitCode::FAILURE);
        }
    };

    match ctx.telegram.get_me().await {
        Ok(me) => info!(
            "Start receiving updates for {}",
            me.username.as_deref().unwrap_or("No username")
        ),
        Err(e) => warn!(error = %e, "Could not reach Telegram, continuing"),
    }

    info!(
        feeds = ctx.store.len()?,
        chat = %config.chat_id,
        delay = %format_interval(config.delay),
        "rss-relay started"
    );

    let cancel = CancellationToken::new();

    let poller = Poller::new(&ctx, config.delay());
    let poller_cancel = cancel.clone();
    let poller_handle = tokio::spawn(async move { poller.run(poller_cancel).await });

    let processor = CommandProcessor::new(ctx.store.clone(), config.chat_id.clone(), config.delay);
    let listener = Listener::new(ctx.telegram.clone(), processor, config.long_poll());
    let listener_cancel = cancel.clone();
    let listener_handle = tokio::spawn(async move { listener.run(listener_cancel).await });

    shutdown_signal().await;
    info!("Shutting down...");
    cancel.cancel();

    let (poller_result, listener_result) = tokio::join!(poller_handle, listener_handle);
    poller_result?;
    listener_result?;

    ctx.store.flush()?;
    info!("rss-relay stopped");

    Ok(ExitCode::SUCCESS)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {},
                    _ = sigint.recv() => {},
                }
            }
            _ => {
                warn!("Failed to install signal handlers, falling back to Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
