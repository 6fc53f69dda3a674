//! Map overlays: FIR regions, routes, weather radar.
//!
//! Each overlay is a small state machine that diffs its inputs against
//! what it last drew and emits the minimal layer churn through the
//! renderer port.

use std::collections::HashSet;

use vatmap_core::correct_antimeridian;
use vatmap_feed::{EntityDetail, FirMap};

use crate::renderer::{LayerSpec, RendererPort, RouteWaypoint};

/// Layer ids owned by the route overlay, removed together on
/// deselect.
pub const ROUTE_LAYER_IDS: [&str; 4] = ["route", "route-idents", "route-points", "route-completed"];

/// Keeps FIR layers in sync with the online set. New FIRs are drawn
/// once; FIRs that go offline have their layers removed. FIRs that
/// stay online are left untouched.
#[derive(Debug, Default)]
pub struct FirOverlay {
    rendered: HashSet<String>,
}

impl FirOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(&mut self, firs: &FirMap, renderer: &mut dyn RendererPort) {
        let online: HashSet<&str> = firs
            .values()
            .map(|region| region.fir.icao.as_str())
            .collect();

        for region in firs.values() {
            let icao = &region.fir.icao;
            if self.rendered.contains(icao) {
                continue;
            }
            let ring = region.outer_ring();
            if ring.is_empty() {
                continue;
            }
            let mut outline = ring.clone();
            if let Some(first) = outline.first().copied() {
                outline.push(first);
            }
            renderer.upsert_layer(
                &format!("FIR-{icao}"),
                LayerSpec::FirFill {
                    ring,
                    name: region.fir.name.clone(),
                    prefix: region.fir.prefix.clone(),
                    members: region.members.clone(),
                },
            );
            renderer.upsert_layer(&format!("FIR-{icao}-LINE"), LayerSpec::FirOutline { ring: outline });
            self.rendered.insert(icao.clone());
            tracing::debug!(%icao, "FIR drawn");
        }

        let offline: Vec<String> = self
            .rendered
            .iter()
            .filter(|icao| !online.contains(icao.as_str()))
            .cloned()
            .collect();
        for icao in offline {
            renderer.remove_layer(&format!("FIR-{icao}"));
            renderer.remove_layer(&format!("FIR-{icao}-LINE"));
            self.rendered.remove(&icao);
            tracing::debug!(%icao, "FIR removed");
        }
    }
}

/// Draw the planned route polyline and its waypoint markers.
pub fn draw_planned_route(renderer: &mut dyn RendererPort, waypoints: &[RouteWaypoint]) {
    if waypoints.is_empty() {
        return;
    }
    let mut coordinates: Vec<[f64; 2]> = waypoints.iter().map(|w| w.coordinates).collect();
    correct_antimeridian(&mut coordinates);

    renderer.upsert_layer("route", LayerSpec::RouteLine { coordinates });
    renderer.upsert_layer(
        "route-idents",
        LayerSpec::RouteIdents {
            points: waypoints.to_vec(),
        },
    );
    renderer.upsert_layer(
        "route-points",
        LayerSpec::RoutePoints {
            points: waypoints.to_vec(),
        },
    );
}

/// Draw the flown portion of the route. The last point is snapped to
/// the entity's live map position so the trail ends exactly at the
/// icon even when the detail record lags the feed.
pub fn draw_completed_route(
    renderer: &mut dyn RendererPort,
    detail: &EntityDetail,
    live_position: Option<(f64, f64)>,
) {
    let mut coordinates: Vec<[f64; 2]> = detail
        .data_points
        .iter()
        .map(|point| [point.longitude, point.latitude])
        .collect();
    if coordinates.is_empty() {
        return;
    }
    correct_antimeridian(&mut coordinates);
    if let Some((lng, lat)) = live_position {
        coordinates.pop();
        coordinates.push([lng, lat]);
    }
    renderer.upsert_layer("route-completed", LayerSpec::CompletedRoute { coordinates });
}

/// Remove every route layer. Safe when none are drawn.
pub fn remove_route(renderer: &mut dyn RendererPort) {
    for id in ROUTE_LAYER_IDS {
        renderer.remove_layer(id);
    }
}

/// Redraws the radar frame only when a newer timestamp appears, so
/// unchanged polls cause no layer churn.
#[derive(Debug, Default)]
pub struct WeatherOverlay {
    last_timestamp: Option<i64>,
}

impl WeatherOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// `timestamps` come oldest first; only the latest frame is shown.
    pub fn update(&mut self, timestamps: &[i64], renderer: &mut dyn RendererPort) {
        let Some(&latest) = timestamps.last() else {
            return;
        };
        if self.last_timestamp == Some(latest) {
            return;
        }
        renderer.upsert_layer("weatherLayer", LayerSpec::WeatherRadar { timestamp: latest });
        self.last_timestamp = Some(latest);
        tracing::debug!(timestamp = latest, "weather radar frame updated");
    }
}
