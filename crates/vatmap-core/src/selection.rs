//! Selection consistency across feed refreshes.
//!
//! The feed is a full-state snapshot, so "has this flight landed or
//! gone offline" is answered purely by looking the selected identity
//! up in the latest entity set. There is no separate liveness timeout.

use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterId, ClusterIndex};
use crate::models::Entity;

/// The currently inspected entity.
///
/// Created when the user selects a flight or controller; cleared on
/// deselect, escape, or when the identity disappears from a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    /// Callsign of the selected entity.
    pub identity: String,
    /// Upstream detail-record id, when the feed provided one.
    pub detail_id: Option<i64>,
}

impl SelectionState {
    pub fn new(identity: impl Into<String>, detail_id: Option<i64>) -> Self {
        Self {
            identity: identity.into(),
            detail_id,
        }
    }
}

/// Exact-identity liveness check against the latest entity set.
///
/// `None` means the entity is gone and the caller must clear the
/// selection and any selection-dependent overlays.
pub fn is_still_active<'a>(identity: &str, latest: &'a [Entity]) -> Option<&'a Entity> {
    latest.iter().find(|entity| entity.identity == identity)
}

/// Whether the cluster currently contains the selected entity as a
/// leaf, directly or nested. Stale cluster ids answer `false`.
pub fn is_in_cluster(identity: &str, index: &ClusterIndex, cluster: ClusterId) -> bool {
    index
        .leaves(cluster, None)
        .iter()
        .any(|entity| entity.identity == identity)
}
