//! Core data model for the map client.

use serde::{Deserialize, Serialize};

/// A geolocated point of interest from the live feed.
///
/// Entities are immutable: every feed refresh produces a brand-new
/// set, and an identity missing from the latest set is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Callsign, trimmed; unique within one refresh cycle and stable
    /// across cycles while the real-world object stays active.
    pub identity: String,
    pub kind: EntityKind,
    /// (longitude, latitude), WGS84 degrees. Always finite and in
    /// range; the normalizer drops anything else.
    pub coordinates: (f64, f64),
    pub attributes: EntityAttributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Flight,
    Controller,
}

/// Kind-specific display payload. Opaque to the clustering engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityAttributes {
    /// Upstream numeric record id, used for detail fetches.
    #[serde(default)]
    pub feed_id: Option<i64>,
    /// Pilot or controller name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub altitude_ft: Option<i64>,
    #[serde(default)]
    pub heading_deg: Option<f64>,
    #[serde(default)]
    pub groundspeed_kt: Option<f64>,
    /// Filed aircraft type string (e.g. "B738/L").
    #[serde(default)]
    pub aircraft: Option<String>,
    #[serde(default)]
    pub departure_icao: Option<String>,
    #[serde(default)]
    pub destination_icao: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub transponder: Option<String>,
}

/// A `[west, south, east, north]` view box in degrees.
///
/// `west > east` means the box crosses the anti-meridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if lat < self.south || lat > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            lon >= self.west || lon <= self.east
        } else {
            lon >= self.west && lon <= self.east
        }
    }
}

/// The map's current view state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// (longitude, latitude) of the view center.
    pub center: (f64, f64),
    /// Continuous zoom; queries clamp it to an integer tier.
    pub zoom: f64,
    /// `None` until the map has reported its first bounds.
    pub bounds: Option<Bounds>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: (0.0, 0.0),
            zoom: 1.0,
            bounds: None,
        }
    }
}
