//! Wire types for the proxy contracts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One full-state snapshot of the entity feed. Records stay raw JSON
/// here; `vatmap-core`'s normalizer owns shape detection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EntitySnapshot {
    #[serde(default, alias = "active_flights")]
    pub flights: Vec<Value>,
    #[serde(default)]
    pub controllers: Vec<Value>,
    /// Flights filed but not yet airborne; shown in airport panels,
    /// never clustered.
    #[serde(default)]
    pub departures: Vec<Value>,
}

impl EntitySnapshot {
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty() && self.controllers.is_empty() && self.departures.is_empty()
    }
}

/// Online FIR payload: polygon boundary plus the controllers staffing
/// it. Rendered as an overlay, never clustered.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FirRegion {
    /// Boundary rings of `[lng, lat]` pairs; the feed quotes some
    /// coordinates as strings.
    #[serde(default)]
    pub bounds: Vec<Vec<[Value; 2]>>,
    /// Staffing roster, opaque display payload.
    #[serde(default)]
    pub members: Value,
    pub fir: FirInfo,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FirInfo {
    pub icao: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub prefix: String,
}

impl FirRegion {
    /// First boundary ring as numeric `[lng, lat]` points, string
    /// coordinates parsed, unparseable points skipped.
    pub fn outer_ring(&self) -> Vec<[f64; 2]> {
        let Some(ring) = self.bounds.first() else {
            return Vec::new();
        };
        ring.iter()
            .filter_map(|[lng, lat]| Some([coordinate(lng)?, coordinate(lat)?]))
            .collect()
    }
}

fn coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Map of FIR key to region, as served by the proxy.
pub type FirMap = HashMap<String, FirRegion>;

/// Full detail record for one selected entity; populates the
/// inspection panel and route overlay.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityDetail {
    pub id: i64,
    pub callsign: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub current_latitude: f64,
    #[serde(default)]
    pub current_longitude: f64,
    #[serde(default)]
    pub current_altitude: Option<i64>,
    #[serde(default)]
    pub current_heading: Option<f64>,
    #[serde(default)]
    pub current_ground_speed: Option<f64>,
    #[serde(default)]
    pub planned_aircraft: Option<String>,
    #[serde(default)]
    pub planned_route: Option<String>,
    #[serde(default)]
    pub planned_dep_airport: Option<AirportRef>,
    #[serde(default)]
    pub planned_dest_airport: Option<AirportRef>,
    /// Positions already flown, oldest first; drawn as the completed
    /// route line.
    #[serde(default)]
    pub data_points: Vec<RoutePoint>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AirportRef {
    pub icao: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_accepts_active_flights_alias() {
        let snapshot: EntitySnapshot = serde_json::from_value(json!({
            "active_flights": [{ "callsign": "AAL1" }],
            "departures": []
        }))
        .unwrap();
        assert_eq!(snapshot.flights.len(), 1);
        assert!(snapshot.controllers.is_empty());
    }

    #[test]
    fn fir_outer_ring_parses_string_coordinates() {
        let region: FirRegion = serde_json::from_value(json!({
            "bounds": [[["-10.5", "51.2"], [2.0, 51.9], ["bad", 0.0]]],
            "members": {},
            "fir": { "icao": "EGTT", "name": "London", "prefix": "LON" }
        }))
        .unwrap();
        assert_eq!(region.outer_ring(), vec![[-10.5, 51.2], [2.0, 51.9]]);
    }

    #[test]
    fn fir_without_bounds_yields_empty_ring() {
        let region: FirRegion = serde_json::from_value(json!({
            "fir": { "icao": "EGTT" }
        }))
        .unwrap();
        assert!(region.outer_ring().is_empty());
    }

    #[test]
    fn entity_detail_tolerates_missing_optionals() {
        let detail: EntityDetail = serde_json::from_value(json!({
            "id": 42,
            "callsign": "DAL123",
            "current_latitude": 33.7,
            "current_longitude": -117.8,
            "data_points": [{ "latitude": 33.0, "longitude": -118.0 }]
        }))
        .unwrap();
        assert_eq!(detail.id, 42);
        assert_eq!(detail.data_points.len(), 1);
        assert!(detail.planned_dep_airport.is_none());
    }
}
