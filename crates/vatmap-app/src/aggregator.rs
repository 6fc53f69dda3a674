//! Viewport aggregation.
//!
//! Owns the spatial index and the published feature list. Entity
//! replacement and viewport movement both re-query, so consumers
//! always read features consistent with the current entity set and
//! camera.

use vatmap_core::{ClusterConfig, ClusterId, ClusterIndex, Entity, Feature, Viewport};

use crate::transition::{FlyTo, MAX_EXPANSION_ZOOM};

pub struct ViewportAggregator {
    config: ClusterConfig,
    viewport: Viewport,
    index: ClusterIndex,
    features: Vec<Feature>,
}

impl ViewportAggregator {
    pub fn new(config: ClusterConfig) -> Self {
        let index = ClusterIndex::build(Vec::new(), config);
        let mut aggregator = Self {
            config,
            viewport: Viewport::default(),
            index,
            features: Vec::new(),
        };
        aggregator.requery();
        aggregator
    }

    /// Swap in a fresh entity set. Rebuilds the index and re-queries
    /// before returning, so stale features are never observable.
    pub fn replace_entities(&mut self, entities: Vec<Entity>) {
        self.index = ClusterIndex::build(entities, self.config);
        self.requery();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.viewport == viewport {
            return;
        }
        self.viewport = viewport;
        self.requery();
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn index(&self) -> &ClusterIndex {
        &self.index
    }

    /// Resolve a cluster click into a camera flight. `None` when the
    /// id is stale, i.e. from a feature list predating the last
    /// rebuild; the click is then ignored rather than flying somewhere
    /// wrong.
    pub fn click_cluster(&self, id: ClusterId) -> Option<FlyTo> {
        let center = self.features.iter().find_map(|feature| match feature {
            Feature::Cluster {
                id: fid,
                coordinates,
                ..
            } if *fid == id => Some(*coordinates),
            _ => None,
        })?;
        let expansion = self.index.expansion_zoom(id)?;
        let zoom = f64::from(expansion.min(MAX_EXPANSION_ZOOM));
        Some(FlyTo::cluster_expansion(center, zoom))
    }

    fn requery(&mut self) {
        self.features = self
            .index
            .query(self.viewport.bounds.as_ref(), self.viewport.zoom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vatmap_core::{EntityAttributes, EntityKind};

    fn entity(identity: &str, lng: f64, lat: f64) -> Entity {
        Entity {
            identity: identity.to_string(),
            kind: EntityKind::Flight,
            coordinates: (lng, lat),
            attributes: EntityAttributes::default(),
        }
    }

    fn close_pair_and_outlier() -> Vec<Entity> {
        vec![
            entity("AAL1", 0.0, 0.0),
            entity("AAL2", 0.001, 0.001),
            entity("BAW9", 50.0, 50.0),
        ]
    }

    #[test]
    fn replace_entities_recomputes_features() {
        let mut aggregator = ViewportAggregator::new(ClusterConfig::default());
        assert!(aggregator.features().is_empty());

        aggregator.replace_entities(close_pair_and_outlier());
        aggregator.set_viewport(Viewport {
            center: (0.0, 0.0),
            zoom: 2.0,
            bounds: None,
        });
        assert_eq!(aggregator.features().len(), 2);
    }

    #[test]
    fn cluster_click_yields_clamped_expansion_flight() {
        let mut aggregator = ViewportAggregator::new(ClusterConfig::default());
        aggregator.replace_entities(close_pair_and_outlier());
        aggregator.set_viewport(Viewport {
            center: (0.0, 0.0),
            zoom: 2.0,
            bounds: None,
        });

        let id = aggregator
            .features()
            .iter()
            .find_map(Feature::cluster_id)
            .expect("expected a cluster at zoom 2");
        let fly = aggregator.click_cluster(id).expect("click should resolve");
        assert!(fly.zoom > 2.0);
        assert!(fly.zoom <= f64::from(MAX_EXPANSION_ZOOM));
    }

    #[test]
    fn stale_cluster_id_is_ignored() {
        let mut aggregator = ViewportAggregator::new(ClusterConfig::default());
        aggregator.replace_entities(close_pair_and_outlier());
        aggregator.set_viewport(Viewport {
            center: (0.0, 0.0),
            zoom: 2.0,
            bounds: None,
        });
        let id = aggregator
            .features()
            .iter()
            .find_map(Feature::cluster_id)
            .expect("expected a cluster at zoom 2");

        // Entity set shrinks; the old cluster id no longer resolves.
        aggregator.replace_entities(vec![entity("BAW9", 50.0, 50.0)]);
        assert!(aggregator.click_cluster(id).is_none());
    }
}
