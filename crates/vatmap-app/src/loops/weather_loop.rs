//! Weather radar polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use vatmap_feed::FeedClient;

use crate::overlays::WeatherOverlay;
use crate::renderer::SharedRenderer;
use crate::state::AppState;

/// Poll the radar frame timestamps and redraw the weather layer when
/// a newer frame appears.
pub async fn run_weather_loop(
    state: Arc<AppState>,
    renderer: SharedRenderer,
    client: Arc<FeedClient>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut overlay = WeatherOverlay::new();
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        match client.fetch_weather_timestamps().await {
            Ok(timestamps) => {
                if let Some(&latest) = timestamps.last() {
                    state.set_weather_timestamp(latest);
                }
                if let Ok(mut renderer) = renderer.lock() {
                    overlay.update(&timestamps, &mut *renderer);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "weather poll failed, keeping last frame");
            }
        }
    }
    tracing::debug!("weather loop stopped");
}
