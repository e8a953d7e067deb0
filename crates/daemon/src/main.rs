//! Weather Alert Importer - Main Entry Point
//!
//! Bootstraps the importer from replayed messages, runs one immediate import,
//! then keeps importing on a fixed interval until shutdown.

mod settings;

use channel::{AlertChannel, MqttChannel};
use feed_client::FeedClient;
use importer::{AlertFilter, AlertImporter, FeedSource};
use settings::Settings;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Weather Alert Importer v{} ===", env!("CARGO_PKG_VERSION"));

    let (settings, raw) = Settings::load()?;
    let filter = AlertFilter::from_settings(&raw);

    let feed = FeedClient::new((&settings.feed).into())?;
    let channel = MqttChannel::connect((&settings.mqtt).into()).await?;
    let mut importer = AlertImporter::bootstrap(channel, filter).await?;
    info!(
        "Bootstrap complete, {} alerts known, last import {}",
        importer.known_count(),
        importer.last_import()
    );

    run_cycle(&mut importer, &feed).await;

    let interval = Duration::from_secs(settings.schedule.interval_secs);
    info!("Setting schedule to run every {} seconds", interval.as_secs());
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the startup import already ran.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => run_cycle(&mut importer, &feed).await,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}

/// Run one cycle, logging instead of propagating so the schedule survives a
/// bad feed document.
async fn run_cycle<C, S>(importer: &mut AlertImporter<C>, feed: &S)
where
    C: AlertChannel,
    S: FeedSource,
{
    match importer.import_most_recent(feed).await {
        Ok(report) if report.skipped_stale => {}
        Ok(report) => info!(
            "Cycle done: {} published, {} ended prematurely, {} considered",
            report.published, report.premature, report.total
        ),
        Err(e) => error!("Import cycle failed: {}", e),
    }
}
