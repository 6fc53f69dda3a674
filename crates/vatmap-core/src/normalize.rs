//! Feed-record normalization.
//!
//! The live feed has been observed in three shapes: a legacy
//! colon-delimited format pre-parsed to flat objects with a nested
//! `location` block, a "vatsim-data" JSON shape with flat
//! `latitude`/`longitude`, and a "stats" shape with
//! `current_latitude`/`current_longitude`. Each record is probed for
//! its shape and mapped through an adapter table of candidate field
//! names, first present wins.
//!
//! Normalization never fails a batch: records with a missing or
//! non-numeric coordinate, an out-of-range coordinate, or an empty
//! callsign are dropped one by one.

use std::collections::HashSet;

use serde_json::Value;

use crate::models::{Entity, EntityAttributes, EntityKind};

/// Feed shape, detected per record by a structural probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedShape {
    Legacy,
    VatsimData,
    Stats,
}

/// Coordinate field names for one feed shape. Dotted entries descend
/// into nested objects.
struct CoordinateAdapter {
    latitude: &'static [&'static str],
    longitude: &'static [&'static str],
}

const LEGACY_COORDS: CoordinateAdapter = CoordinateAdapter {
    latitude: &["location.latitude"],
    longitude: &["location.longitude"],
};

const VATSIM_COORDS: CoordinateAdapter = CoordinateAdapter {
    latitude: &["latitude"],
    longitude: &["longitude"],
};

const STATS_COORDS: CoordinateAdapter = CoordinateAdapter {
    latitude: &["current_latitude"],
    longitude: &["current_longitude"],
};

// Display attributes share one candidate table across shapes.
const ALTITUDE: &[&str] = &["altitude", "current_altitude"];
const HEADING: &[&str] = &["heading", "current_heading"];
const GROUNDSPEED: &[&str] = &["groundspeed", "current_ground_speed", "ground_speed"];
const AIRCRAFT: &[&str] = &["planned_aircraft", "aircraft_type"];
const DEPARTURE: &[&str] = &["planned_depairport", "planned_dep_airport__icao"];
const DESTINATION: &[&str] = &["planned_destairport", "planned_dest_airport__icao"];
const NAME: &[&str] = &["name", "real_name"];
const FREQUENCY: &[&str] = &["frequency"];
const TRANSPONDER: &[&str] = &["transponder"];
const FEED_ID: &[&str] = &["id"];

fn detect_shape(record: &Value) -> Option<FeedShape> {
    if record.get("current_latitude").is_some() {
        Some(FeedShape::Stats)
    } else if record.get("latitude").is_some() {
        Some(FeedShape::VatsimData)
    } else if record.get("location").map_or(false, Value::is_object) {
        Some(FeedShape::Legacy)
    } else {
        None
    }
}

fn coordinate_adapter(shape: FeedShape) -> &'static CoordinateAdapter {
    match shape {
        FeedShape::Legacy => &LEGACY_COORDS,
        FeedShape::VatsimData => &VATSIM_COORDS,
        FeedShape::Stats => &STATS_COORDS,
    }
}

/// Normalize one batch of raw records into entities of `kind`.
///
/// Pure and infallible: malformed records are dropped, the rest come
/// through with finite in-range coordinates and a non-empty identity.
pub fn normalize(records: &[Value], kind: EntityKind) -> Vec<Entity> {
    records
        .iter()
        .filter_map(|record| normalize_record(record, kind))
        .collect()
}

/// Normalize a full feed snapshot (flights plus controllers) into one
/// entity set with unique identities; the first record wins a
/// duplicate callsign.
pub fn normalize_snapshot(flights: &[Value], controllers: &[Value]) -> Vec<Entity> {
    let mut seen = HashSet::new();
    normalize(flights, EntityKind::Flight)
        .into_iter()
        .chain(normalize(controllers, EntityKind::Controller))
        .filter(|entity| seen.insert(entity.identity.clone()))
        .collect()
}

fn normalize_record(record: &Value, default_kind: EntityKind) -> Option<Entity> {
    let shape = detect_shape(record)?;
    let coords = coordinate_adapter(shape);

    let identity = string_field(record, &["callsign"])?;
    let lat = numeric_field(record, coords.latitude)?;
    let lon = numeric_field(record, coords.longitude)?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }

    // The legacy shape mixes controllers into the flights array and
    // flags them explicitly.
    let kind = if record.get("isController").and_then(Value::as_bool) == Some(true) {
        EntityKind::Controller
    } else {
        default_kind
    };

    let attributes = EntityAttributes {
        feed_id: numeric_field(record, FEED_ID).map(|id| id as i64),
        name: string_field(record, NAME),
        altitude_ft: numeric_field(record, ALTITUDE).map(|a| a as i64),
        heading_deg: numeric_field(record, HEADING),
        groundspeed_kt: numeric_field(record, GROUNDSPEED),
        aircraft: string_field(record, AIRCRAFT),
        departure_icao: string_field(record, DEPARTURE),
        destination_icao: string_field(record, DESTINATION),
        frequency: string_field(record, FREQUENCY),
        transponder: string_field(record, TRANSPONDER),
    };

    Some(Entity {
        identity,
        kind,
        coordinates: (lon, lat),
        attributes,
    })
}

/// Resolve a possibly dotted path inside a record.
fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn first_present<'a>(record: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .find_map(|candidate| lookup(record, candidate))
}

/// A finite number, given either as a JSON number or a numeric string
/// (the legacy feed quotes everything).
fn numeric_field(record: &Value, candidates: &[&str]) -> Option<f64> {
    let value = first_present(record, candidates)?;
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn string_field(record: &Value, candidates: &[&str]) -> Option<String> {
    let value = first_present(record, candidates)?.as_str()?.trim();
    (!value.is_empty()).then(|| value.to_string())
}
