use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use departure_board::config::{BoardConfig, ConfigError};
use departure_board::engine::Controller;
use departure_board::feed::{AtFeedClient, FeedConfig};
use departure_board::render::ConsoleRenderer;
use departure_board::stops::{StopDirectory, StopSearchClient, StopSearchConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so they never interleave with the board on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "departure board failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ConfigError> {
    let config = BoardConfig::from_env()?;

    let (directory, feed) = match config.api_key() {
        None => {
            info!("AT_API_KEY not set, running in simulation mode");
            (StopDirectory::Simulated, None)
        }
        Some(key) => {
            let mut stops_config = StopSearchConfig::new(key).with_timeout(config.fetch_timeout_secs);
            if let Some(url) = &config.stops_url {
                stops_config = stops_config.with_base_url(url);
            }
            let mut feed_config = FeedConfig::new(key).with_timeout(config.fetch_timeout_secs);
            if let Some(url) = &config.feed_url {
                feed_config = feed_config.with_url(url);
            }
            (
                StopDirectory::Live(StopSearchClient::new(stops_config)?),
                Some(AtFeedClient::new(feed_config)?),
            )
        }
    };

    info!(boards = config.locations.len(), "resolving stops");
    let stops = directory.resolve_all(&config.locations).await?;
    for stop in &stops {
        info!(%stop, "board ready");
    }

    if !config.simulation_fallback && feed.is_some() {
        warn!("simulated fallback disabled, failing boards will show stale data");
    }

    let renderer = ConsoleRenderer::stdout()
        .with_cadence(config.refresh_interval(), config.rotation_interval());
    let controller = Controller::new(stops, &config, feed, renderer)?;

    info!("press Ctrl+C to exit");
    controller
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl+C");
            }
        })
        .await;

    Ok(())
}
