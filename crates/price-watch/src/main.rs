mod console;
mod session;

use std::io;
use std::sync::Arc;

use notification_service::{EmailConfig, NotificationDispatcher};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use watchlist::{CheckCycleOrchestrator, RetryPolicy, WatchlistStore};
use yahoo_client::{PriceFetcher, YahooClient};

use console::{ConsoleInput, ConsoleSurface};
use session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "price_watch=info,watchlist=info,notification_service=info,yahoo_client=info".into()
    });

    // Logs go to stderr so they never interleave with the console surface.
    if json_logging {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }

    tracing::info!("Starting Price Watch");

    let surface = Arc::new(ConsoleSurface::stdout());

    let email_config = EmailConfig::from_env();
    if let Err(e) = &email_config {
        tracing::info!("Email notifications disabled: {}", e);
    }
    let dispatcher = NotificationDispatcher::from_config(surface.clone(), email_config);

    let retry = RetryPolicy::from_env();
    let orchestrator = CheckCycleOrchestrator::new(
        PriceFetcher::new(Arc::new(YahooClient::new())),
        dispatcher,
        surface.clone(),
    )
    .with_retry(retry);

    let seed_defaults = std::env::var("PRICE_WATCH_SEED_DEFAULTS")
        .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
        .unwrap_or(true);
    let store = if seed_defaults {
        WatchlistStore::with_defaults()
    } else {
        WatchlistStore::new()
    };

    let input = ConsoleInput::new(io::stdin().lock());
    let mut session = Session::new(surface, input, store, orchestrator);
    session.run().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
