//! Spatial clustering and viewport-aggregation core for the live
//! flight map.
//!
//! Pure logic only: no I/O, no async. The feed client and the polling
//! runtime live in sibling crates.

pub mod cluster;
pub mod geo;
pub mod models;
pub mod normalize;
pub mod selection;

pub use cluster::{ClusterConfig, ClusterId, ClusterIndex, Feature};
pub use geo::{correct_antimeridian, project, unproject};
pub use models::{Bounds, Entity, EntityAttributes, EntityKind, Viewport};
pub use normalize::{normalize, normalize_snapshot};
pub use selection::{is_in_cluster, is_still_active, SelectionState};
