//! Refresh pipeline tests: raw feed records in, features and overlay
//! effects out, no network involved.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use vatmap_app::{overlays, AppState, RecordingRenderer};
use vatmap_core::{normalize_snapshot, ClusterConfig, Feature, SelectionState, Viewport};

fn flight(callsign: &str, lat: f64, lng: f64) -> serde_json::Value {
    json!({ "callsign": callsign, "latitude": lat, "longitude": lng })
}

fn wide_viewport(zoom: f64) -> Viewport {
    Viewport {
        center: (0.0, 0.0),
        zoom,
        bounds: None,
    }
}

#[test]
fn raw_records_flow_through_to_features() {
    let state = AppState::new(ClusterConfig::default());
    state.set_viewport(wide_viewport(2.0));

    let flights = vec![
        flight("AAL1", 0.0, 0.0),
        flight("AAL2", 0.001, 0.001),
        flight("BAW9", 50.0, 50.0),
        // Malformed record, dropped by normalization.
        json!({ "callsign": "BAD1", "latitude": "north", "longitude": 0.0 }),
    ];
    let controllers = vec![json!({ "callsign": "EGLL_TWR", "latitude": 51.5, "longitude": -0.5 })];

    let entities = normalize_snapshot(&flights, &controllers);
    assert_eq!(entities.len(), 4);

    let ticket = state.begin_fetch();
    assert!(state.apply_entity_snapshot(ticket, entities).applied);

    let features = state.features();
    let total: usize = features.iter().map(Feature::count).sum();
    assert_eq!(total, 4);
    assert!(features.iter().any(|f| f.count() > 1));
}

#[test]
fn disappearing_selection_tears_down_route_overlay_once() {
    let state = Arc::new(AppState::new(ClusterConfig::default()));
    let renderer = Arc::new(Mutex::new(RecordingRenderer::new()));
    let hook_calls = Arc::new(AtomicUsize::new(0));

    {
        let renderer = Arc::clone(&renderer);
        let hook_calls = Arc::clone(&hook_calls);
        state.set_on_deselect(move |_| {
            hook_calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut renderer) = renderer.lock() {
                overlays::remove_route(&mut *renderer);
            }
        });
    }

    let entities = normalize_snapshot(&[flight("DAL123", 33.9, -118.4)], &[]);
    let ticket = state.begin_fetch();
    state.apply_entity_snapshot(ticket, entities);
    state.select(SelectionState {
        identity: "DAL123".to_string(),
        detail_id: Some(7),
    });

    // A route is on screen for the selection.
    {
        let detail = serde_json::from_value(json!({
            "id": 7,
            "callsign": "DAL123",
            "data_points": [{ "latitude": 33.0, "longitude": -119.0 }]
        }))
        .unwrap();
        let mut renderer = renderer.lock().unwrap();
        overlays::draw_completed_route(&mut *renderer, &detail, Some((-118.4, 33.9)));
        assert!(renderer.has_layer("route-completed"));
    }

    // The flight disconnects; the next two refreshes do not contain it.
    for _ in 0..2 {
        let ticket = state.begin_fetch();
        state.apply_entity_snapshot(ticket, normalize_snapshot(&[flight("AAL1", 0.0, 0.0)], &[]));
    }

    assert_eq!(hook_calls.load(Ordering::SeqCst), 1);
    assert!(state.selection().is_none());
    assert!(!renderer.lock().unwrap().has_layer("route-completed"));
}
