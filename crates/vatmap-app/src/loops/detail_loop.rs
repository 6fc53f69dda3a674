//! Selected-entity detail polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use vatmap_core::is_still_active;
use vatmap_feed::FeedClient;

use crate::overlays;
use crate::renderer::SharedRenderer;
use crate::state::AppState;

/// While an entity with a detail id is selected, keep its detail
/// record and completed-route trail fresh. The trail's last point is
/// snapped to the entity's live feed position.
pub async fn run_detail_loop(
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

        let Some(selection) = state.selection() else {
            continue;
        };
        let Some(id) = selection.detail_id else {
            continue;
        };

        match client.fetch_entity_detail(id).await {
            Ok(detail) => {
                state.details().insert(detail.clone());
                // The selection may have changed while the fetch was in
                // flight; never draw a route for a stale selection.
                if state.selection().map(|s| s.detail_id) != Some(Some(id)) {
                    continue;
                }
                let live = {
                    let entities = state.entities();
                    is_still_active(&selection.identity, &entities).map(|e| e.coordinates)
                };
                if let Ok(mut renderer) = renderer.lock() {
                    overlays::draw_completed_route(&mut *renderer, &detail, live);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, id, "detail poll failed");
            }
        }
    }
    tracing::debug!("detail loop stopped");
}
