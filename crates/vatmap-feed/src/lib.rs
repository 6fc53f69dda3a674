//! Feed client for the flight-map data proxy.
//!
//! The proxy owns API keys and wire formats for the upstream traffic,
//! FIR, and weather services; this crate only speaks the small
//! request/response contracts the map core consumes.

pub mod client;
pub mod error;
pub mod types;

pub use client::FeedClient;
pub use error::FeedError;
pub use types::{AirportRef, EntityDetail, EntitySnapshot, FirInfo, FirMap, FirRegion, RoutePoint};
