//! Entity feed polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use vatmap_core::normalize_snapshot;
use vatmap_feed::FeedClient;

use crate::overlays;
use crate::renderer::SharedRenderer;
use crate::state::AppState;

/// Poll the entity feed and apply each snapshot as a whole-set
/// replacement. Fetch failures keep the last snapshot on screen; an
/// empty payload raises the "no data" flag instead.
pub async fn run_entity_loop(
    state: Arc<AppState>,
    renderer: SharedRenderer,
    client: Arc<FeedClient>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
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

        let ticket = state.begin_fetch();
        match client.fetch_entity_feed().await {
            Ok(snapshot) => {
                let entities = normalize_snapshot(&snapshot.flights, &snapshot.controllers);
                let outcome = state.apply_entity_snapshot(ticket, entities);
                if !outcome.applied {
                    continue;
                }
                state.set_no_data(false);
                if outcome.selection_cleared {
                    if let Ok(mut renderer) = renderer.lock() {
                        overlays::remove_route(&mut *renderer);
                    }
                }
            }
            Err(err) if err.is_empty_payload() => {
                state.set_no_data(true);
                tracing::warn!("entity feed returned no data");
            }
            Err(err) => {
                tracing::warn!(error = %err, "entity feed poll failed, keeping last snapshot");
            }
        }
    }
    tracing::debug!("entity loop stopped");
}
