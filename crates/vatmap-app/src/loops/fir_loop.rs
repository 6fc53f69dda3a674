//! Online FIR polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use vatmap_feed::FeedClient;

use crate::overlays::FirOverlay;
use crate::renderer::SharedRenderer;
use crate::state::AppState;

/// Poll the FIR feed and diff it onto the map: newly online FIRs are
/// drawn, offline ones removed, unchanged ones untouched.
pub async fn run_fir_loop(
    state: Arc<AppState>,
    renderer: SharedRenderer,
    client: Arc<FeedClient>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut overlay = FirOverlay::new();
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

        match client.fetch_firs().await {
            Ok(firs) => {
                state.replace_firs(firs.clone());
                if let Ok(mut renderer) = renderer.lock() {
                    overlay.sync(&firs, &mut *renderer);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "FIR poll failed, keeping drawn regions");
            }
        }
    }
    tracing::debug!("FIR loop stopped");
}
