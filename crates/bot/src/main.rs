//! SLH Shop Telegram bot.
//!
//! Long-polls the Bot API and drives the shop API on behalf of chat users.
//!
//! # Architecture
//!
//! - `getUpdates` long polling, one update at a time
//! - Shop API over HTTP (`API_BASE`)
//! - Per-chat memory in a `moka` cache

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slh_shop_bot::api_client::ShopApiClient;
use slh_shop_bot::config::BotConfig;
use slh_shop_bot::conversation::Conversations;
use slh_shop_bot::handlers::Handler;
use slh_shop_bot::poller;
use slh_shop_bot::telegram::TelegramClient;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &BotConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "slh_shop_bot=info".into());

    // JSON lines for log shippers, text otherwise
    let is_json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = is_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let telegram = TelegramClient::with_base_url(config.token.clone(), &config.telegram_api_base);

    // Deep links need the bot's public username
    let me = match telegram.get_me().await {
        Ok(me) => me,
        Err(e) => {
            tracing::error!(error = %e, "Failed to identify bot with Telegram");
            return ExitCode::FAILURE;
        }
    };
    let Some(bot_username) = me.username else {
        tracing::error!("Bot account has no username");
        return ExitCode::FAILURE;
    };

    tracing::info!(
        bot = %bot_username,
        api_base = %config.api_base,
        locale = ?config.locale,
        "Bot starting"
    );

    let handler = Handler::new(
        ShopApiClient::new(&config.api_base),
        Conversations::default(),
        config.locale,
        bot_username,
    );

    poller::run(&telegram, &handler, config.poll_timeout, shutdown_signal()).await;
    ExitCode::SUCCESS
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
