//! Application runtime for the flight map.
//!
//! Ties the pure clustering core and the feed client into a live map:
//! polling loops replace whole entity snapshots on a fixed cadence,
//! the viewport aggregator publishes the feature list for the current
//! camera, overlays diff FIR, route, and weather layers through the
//! renderer port, and camera moves flow through a single transition
//! slot.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod logging;
pub mod loops;
pub mod overlays;
pub mod renderer;
pub mod scheduler;
pub mod state;
pub mod transition;

pub use aggregator::ViewportAggregator;
pub use cache::DetailCache;
pub use config::Config;
pub use renderer::{
    LayerSpec, LoggingRenderer, RecordingRenderer, RendererPort, RouteWaypoint, SharedRenderer,
};
pub use scheduler::Scheduler;
pub use state::{AirportTraffic, AppState, RefreshOutcome};
pub use transition::{Easing, FlyTo, TransitionSlot};
