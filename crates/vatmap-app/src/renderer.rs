//! Renderer port.
//!
//! The runtime never talks to a map engine directly. Overlay code
//! emits idempotent layer upserts and removals against this trait, so
//! the same state machine drives a real map bridge in the shell and a
//! recording double in tests.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;

/// Abstract layer sink. `upsert_layer` with an id that already exists
/// replaces that layer's content; `remove_layer` on an unknown id is a
/// no-op.
pub trait RendererPort: Send {
    fn upsert_layer(&mut self, id: &str, spec: LayerSpec);
    fn remove_layer(&mut self, id: &str);
}

/// Renderer shared between the polling loops and the shell.
pub type SharedRenderer = Arc<Mutex<dyn RendererPort>>;

/// One waypoint on a planned route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteWaypoint {
    /// `[lng, lat]`, anti-meridian corrected by the overlay code.
    pub coordinates: [f64; 2],
    pub ident: String,
}

/// What a layer shows. Styling lives in the shell; this carries only
/// geometry and display payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerSpec {
    FirFill {
        ring: Vec<[f64; 2]>,
        name: String,
        prefix: String,
        members: Value,
    },
    FirOutline {
        /// Closed ring: first point repeated at the end.
        ring: Vec<[f64; 2]>,
    },
    RouteLine {
        coordinates: Vec<[f64; 2]>,
    },
    RouteIdents {
        points: Vec<RouteWaypoint>,
    },
    RoutePoints {
        points: Vec<RouteWaypoint>,
    },
    CompletedRoute {
        coordinates: Vec<[f64; 2]>,
    },
    WeatherRadar {
        timestamp: i64,
    },
}

/// Renderer that only logs layer operations. Lets the runtime be
/// exercised headless, without a map engine attached.
#[derive(Debug, Default)]
pub struct LoggingRenderer;

impl RendererPort for LoggingRenderer {
    fn upsert_layer(&mut self, id: &str, _spec: LayerSpec) {
        tracing::debug!(id, "layer upserted");
    }

    fn remove_layer(&mut self, id: &str) {
        tracing::debug!(id, "layer removed");
    }
}

/// In-memory renderer that records every call, for tests.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub layers: std::collections::BTreeMap<String, LayerSpec>,
    pub removals: Vec<String>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_layer(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }
}

impl RendererPort for RecordingRenderer {
    fn upsert_layer(&mut self, id: &str, spec: LayerSpec) {
        self.layers.insert(id.to_string(), spec);
    }

    fn remove_layer(&mut self, id: &str) {
        self.layers.remove(id);
        self.removals.push(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_existing_layer() {
        let mut renderer = RecordingRenderer::new();
        renderer.upsert_layer("weatherLayer", LayerSpec::WeatherRadar { timestamp: 1 });
        renderer.upsert_layer("weatherLayer", LayerSpec::WeatherRadar { timestamp: 2 });
        assert_eq!(
            renderer.layers.get("weatherLayer"),
            Some(&LayerSpec::WeatherRadar { timestamp: 2 })
        );
    }

    #[test]
    fn remove_unknown_layer_is_noop() {
        let mut renderer = RecordingRenderer::new();
        renderer.remove_layer("route");
        assert!(renderer.layers.is_empty());
        assert_eq!(renderer.removals, vec!["route"]);
    }
}
