//! Hierarchical cluster index for map display.
//!
//! Greedy radius-based merging per discrete zoom level, computed from
//! max zoom down to min zoom over unit web-mercator coordinates. Two
//! nodes merge at a zoom when their on-screen distance at that zoom is
//! within the configured pixel radius; merged clusters take the
//! member-count-weighted centroid.
//!
//! The index is immutable per entity-set snapshot: it is rebuilt
//! wholesale on every refresh, never patched. Entities are sorted by
//! identity before building, so the same set yields the same
//! partition regardless of input order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geo::{project, unproject};
use crate::models::{Bounds, Entity};

/// Tunable clustering parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Merge radius in screen pixels at `extent`-sized tiles.
    pub radius_px: f64,
    /// Tile extent the pixel radius is measured against.
    pub extent: f64,
    /// Lowest zoom level clusters are generated for.
    pub min_zoom: u8,
    /// Highest zoom level at which merging still happens; above it
    /// every entity is returned as its own leaf.
    pub max_zoom: u8,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius_px: 75.0,
            extent: 512.0,
            min_zoom: 0,
            max_zoom: 10,
        }
    }
}

/// Opaque id for a cluster feature. Only meaningful to the index that
/// issued it; a rebuilt index treats old ids as stale and answers
/// with safe defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterId(u64);

impl ClusterId {
    fn new(zoom: u8, node: usize) -> Self {
        Self((u64::from(zoom) << 32) | node as u64)
    }

    fn zoom(self) -> u8 {
        (self.0 >> 32) as u8
    }

    fn node(self) -> usize {
        (self.0 & 0xffff_ffff) as usize
    }
}

/// One query result: an aggregated cluster or a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feature {
    Cluster {
        id: ClusterId,
        /// Weighted centroid, (longitude, latitude).
        coordinates: (f64, f64),
        /// Number of entities absorbed into this cluster.
        count: usize,
        /// Minimum zoom at which the cluster splits apart.
        expansion_zoom: u8,
    },
    Leaf(Entity),
}

impl Feature {
    pub fn coordinates(&self) -> (f64, f64) {
        match self {
            Feature::Cluster { coordinates, .. } => *coordinates,
            Feature::Leaf(entity) => entity.coordinates,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Feature::Cluster { count, .. } => *count,
            Feature::Leaf(_) => 1,
        }
    }

    pub fn cluster_id(&self) -> Option<ClusterId> {
        match self {
            Feature::Cluster { id, .. } => Some(*id),
            Feature::Leaf(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    x: f64,
    y: f64,
    count: usize,
    origin: NodeOrigin,
}

#[derive(Debug, Clone)]
enum NodeOrigin {
    /// A single entity, by index into the sorted entity set.
    Leaf(usize),
    /// Merged from these nodes of the next-deeper level.
    Merged(Vec<usize>),
    /// The same group as this node of the next-deeper level,
    /// unmerged at this level.
    Carried(usize),
}

/// Immutable spatial index over one entity-set snapshot.
#[derive(Debug, Clone)]
pub struct ClusterIndex {
    config: ClusterConfig,
    entities: Vec<Entity>,
    /// `levels[z]` holds the clustered nodes for zoom `z`; the final
    /// slot (`max_zoom + 1`) holds the unclustered leaves.
    levels: Vec<Vec<Node>>,
}

impl Default for ClusterIndex {
    fn default() -> Self {
        Self::build(Vec::new(), ClusterConfig::default())
    }
}

impl ClusterIndex {
    /// Build the full per-zoom hierarchy for one entity set.
    ///
    /// Duplicate identities keep the first occurrence. An empty input
    /// produces a valid empty index.
    pub fn build(mut entities: Vec<Entity>, config: ClusterConfig) -> Self {
        entities.sort_by(|a, b| a.identity.cmp(&b.identity));
        entities.dedup_by(|a, b| a.identity == b.identity);

        let leaf_level = entities
            .iter()
            .enumerate()
            .map(|(i, entity)| {
                let (x, y) = project(entity.coordinates.0, entity.coordinates.1);
                Node {
                    x,
                    y,
                    count: 1,
                    origin: NodeOrigin::Leaf(i),
                }
            })
            .collect::<Vec<_>>();

        let mut levels = vec![Vec::new(); usize::from(config.max_zoom) + 2];
        levels[usize::from(config.max_zoom) + 1] = leaf_level;

        for zoom in (config.min_zoom..=config.max_zoom).rev() {
            let radius = merge_radius(&config, zoom);
            levels[usize::from(zoom)] = merge_level(&levels[usize::from(zoom) + 1], radius);
        }

        Self {
            config,
            entities,
            levels,
        }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// The deduplicated, identity-sorted entity set behind the index.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Clusters and leaves visible at `zoom` inside `bounds`.
    ///
    /// The zoom is floored to its integer tier and clamped to the
    /// indexed range; bounds are padded by one merge radius so
    /// features do not pop at the view edge. `None` bounds returns
    /// the whole level.
    pub fn query(&self, bounds: Option<&Bounds>, zoom: f64) -> Vec<Feature> {
        if self.entities.is_empty() {
            return Vec::new();
        }

        let tier = self.clamp_zoom(zoom);
        let level = &self.levels[usize::from(tier)];
        let pad = merge_radius(&self.config, tier.min(self.config.max_zoom));

        match bounds {
            None => level
                .iter()
                .enumerate()
                .map(|(i, node)| self.feature(tier, i, node))
                .collect(),
            Some(bounds) => {
                let ranges = projected_ranges(bounds, pad);
                level
                    .iter()
                    .enumerate()
                    .filter(|(_, node)| ranges.iter().any(|r| r.contains(node.x, node.y)))
                    .map(|(i, node)| self.feature(tier, i, node))
                    .collect()
            }
        }
    }

    /// Minimum zoom at which the cluster first splits into more than
    /// one feature. `None` for stale or unknown ids.
    pub fn expansion_zoom(&self, id: ClusterId) -> Option<u8> {
        self.cluster_node(id)?;
        Some(self.split_zoom(id.zoom(), id.node()))
    }

    /// Up to `limit` entities belonging to the cluster, child clusters
    /// expanded recursively. Stale or unknown ids yield no leaves.
    pub fn leaves(&self, id: ClusterId, limit: Option<usize>) -> Vec<&Entity> {
        if self.cluster_node(id).is_none() {
            return Vec::new();
        }

        let cap = limit.unwrap_or(usize::MAX);
        let mut out = Vec::new();
        let mut stack = vec![(id.zoom(), id.node())];

        while let Some((zoom, idx)) = stack.pop() {
            if out.len() >= cap {
                break;
            }
            match &self.levels[usize::from(zoom)][idx].origin {
                NodeOrigin::Leaf(entity) => out.push(&self.entities[*entity]),
                NodeOrigin::Carried(child) => stack.push((zoom + 1, *child)),
                NodeOrigin::Merged(children) => {
                    for &child in children.iter().rev() {
                        stack.push((zoom + 1, child));
                    }
                }
            }
        }

        out
    }

    fn clamp_zoom(&self, zoom: f64) -> u8 {
        let min = f64::from(self.config.min_zoom);
        let max = f64::from(self.config.max_zoom) + 1.0;
        if !zoom.is_finite() {
            return self.config.min_zoom;
        }
        zoom.floor().clamp(min, max) as u8
    }

    /// Look up a node only if it is a live cluster (count > 1) at a
    /// valid position, so ids from a discarded index degrade safely.
    fn cluster_node(&self, id: ClusterId) -> Option<&Node> {
        let node = self.levels.get(usize::from(id.zoom()))?.get(id.node())?;
        (node.count > 1).then_some(node)
    }

    fn feature(&self, zoom: u8, idx: usize, node: &Node) -> Feature {
        if node.count > 1 {
            Feature::Cluster {
                id: ClusterId::new(zoom, idx),
                coordinates: unproject(node.x, node.y),
                count: node.count,
                expansion_zoom: self.split_zoom(zoom, idx),
            }
        } else {
            Feature::Leaf(self.leaf_entity(zoom, idx).clone())
        }
    }

    /// Follow a single-member node down to its entity.
    fn leaf_entity(&self, mut zoom: u8, mut idx: usize) -> &Entity {
        loop {
            match &self.levels[usize::from(zoom)][idx].origin {
                NodeOrigin::Leaf(entity) => return &self.entities[*entity],
                NodeOrigin::Carried(child) => {
                    zoom += 1;
                    idx = *child;
                }
                // A merged node always has count > 1; descend anyway
                // rather than panic if one ever shows up here.
                NodeOrigin::Merged(children) => {
                    zoom += 1;
                    idx = children[0];
                }
            }
        }
    }

    /// Walk the carried chain down to the level the cluster was formed
    /// at; its children become visible one level deeper.
    fn split_zoom(&self, mut zoom: u8, mut idx: usize) -> u8 {
        loop {
            match &self.levels[usize::from(zoom)][idx].origin {
                NodeOrigin::Carried(child) => {
                    zoom += 1;
                    idx = *child;
                }
                _ => return (zoom + 1).min(self.config.max_zoom + 1),
            }
        }
    }
}

fn merge_radius(config: &ClusterConfig, zoom: u8) -> f64 {
    config.radius_px / (config.extent * f64::powi(2.0, i32::from(zoom)))
}

/// Cluster one level's nodes into the next-shallower level.
///
/// Nodes are visited in index order; each unassigned node absorbs all
/// unassigned neighbors within `radius`. Candidate neighbors come from
/// a uniform grid bucket and are sorted before the distance test, so
/// the outcome never depends on hash-map iteration order.
fn merge_level(prev: &[Node], radius: f64) -> Vec<Node> {
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, node) in prev.iter().enumerate() {
        grid.entry(grid_cell(node.x, node.y, radius)).or_default().push(i);
    }

    let mut assigned = vec![false; prev.len()];
    let mut next = Vec::new();

    for i in 0..prev.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;

        let node = &prev[i];
        let mut members = vec![i];
        for j in neighbor_candidates(&grid, node.x, node.y, radius) {
            if assigned[j] {
                continue;
            }
            let other = &prev[j];
            let dx = other.x - node.x;
            let dy = other.y - node.y;
            if dx * dx + dy * dy <= radius * radius {
                assigned[j] = true;
                members.push(j);
            }
        }

        if members.len() == 1 {
            next.push(Node {
                x: node.x,
                y: node.y,
                count: node.count,
                origin: NodeOrigin::Carried(i),
            });
        } else {
            let total: usize = members.iter().map(|&m| prev[m].count).sum();
            let weight = total as f64;
            let x = members.iter().map(|&m| prev[m].x * prev[m].count as f64).sum::<f64>() / weight;
            let y = members.iter().map(|&m| prev[m].y * prev[m].count as f64).sum::<f64>() / weight;
            next.push(Node {
                x,
                y,
                count: total,
                origin: NodeOrigin::Merged(members),
            });
        }
    }

    next
}

fn grid_cell(x: f64, y: f64, radius: f64) -> (i64, i64) {
    ((x / radius).floor() as i64, (y / radius).floor() as i64)
}

fn neighbor_candidates(
    grid: &HashMap<(i64, i64), Vec<usize>>,
    x: f64,
    y: f64,
    radius: f64,
) -> Vec<usize> {
    let (cx, cy) = grid_cell(x, y, radius);
    let mut out = Vec::new();
    for gx in (cx - 1)..=(cx + 1) {
        for gy in (cy - 1)..=(cy + 1) {
            if let Some(bucket) = grid.get(&(gx, gy)) {
                out.extend_from_slice(bucket);
            }
        }
    }
    out.sort_unstable();
    out
}

/// A bounds query in projected space; boxes crossing the
/// anti-meridian are split into two ranges.
struct ProjectedRange {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl ProjectedRange {
    fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

fn projected_ranges(bounds: &Bounds, pad: f64) -> Vec<ProjectedRange> {
    // North edge maps to the smaller y.
    let (_, min_y) = project(0.0, bounds.north);
    let (_, max_y) = project(0.0, bounds.south);
    let (min_y, max_y) = (min_y - pad, max_y + pad);

    let range = |west: f64, east: f64| {
        let (min_x, _) = project(west, 0.0);
        let (max_x, _) = project(east, 0.0);
        ProjectedRange {
            min_x: min_x - pad,
            min_y,
            max_x: max_x + pad,
            max_y,
        }
    };

    if bounds.crosses_antimeridian() {
        vec![range(bounds.west, 180.0), range(-180.0, bounds.east)]
    } else if bounds.east - bounds.west >= 360.0 {
        vec![range(-180.0, 180.0)]
    } else {
        vec![range(bounds.west, bounds.east)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityAttributes, EntityKind};

    fn flight(identity: &str, lon: f64, lat: f64) -> Entity {
        Entity {
            identity: identity.to_string(),
            kind: EntityKind::Flight,
            coordinates: (lon, lat),
            attributes: EntityAttributes::default(),
        }
    }

    fn identities(features: &[Feature], index: &ClusterIndex) -> Vec<String> {
        let mut out = Vec::new();
        for feature in features {
            match feature {
                Feature::Leaf(entity) => out.push(entity.identity.clone()),
                Feature::Cluster { id, .. } => {
                    out.extend(index.leaves(*id, None).iter().map(|e| e.identity.clone()));
                }
            }
        }
        out.sort();
        out
    }

    #[test]
    fn empty_input_builds_valid_empty_index() {
        let index = ClusterIndex::build(Vec::new(), ClusterConfig::default());
        assert!(index.is_empty());
        assert!(index.query(None, 3.0).is_empty());
        assert!(index.leaves(ClusterId::new(2, 0), None).is_empty());
        assert_eq!(index.expansion_zoom(ClusterId::new(2, 0)), None);
    }

    #[test]
    fn two_close_entities_merge_and_far_one_stays_leaf() {
        let entities = vec![
            flight("AAL1", 0.0, 0.0),
            flight("AAL2", 0.001, 0.001),
            flight("BAW9", 50.0, 50.0),
        ];
        let index = ClusterIndex::build(entities, ClusterConfig::default());

        let features = index.query(None, 2.0);
        assert_eq!(features.len(), 2);

        let cluster = features
            .iter()
            .find(|f| f.count() == 2)
            .expect("expected a 2-member cluster at zoom 2");
        let leaves = index.leaves(cluster.cluster_id().unwrap(), None);
        let mut names: Vec<_> = leaves.iter().map(|e| e.identity.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, ["AAL1", "AAL2"]);

        let standalone = features.iter().find(|f| f.count() == 1).unwrap();
        match standalone {
            Feature::Leaf(entity) => assert_eq!(entity.identity, "BAW9"),
            Feature::Cluster { .. } => panic!("expected a leaf"),
        }

        // Above max zoom everything is unclustered.
        let features = index.query(None, 18.0);
        assert_eq!(features.len(), 3);
        assert!(features.iter().all(|f| f.count() == 1));
    }

    #[test]
    fn query_is_deterministic_regardless_of_input_order() {
        let forward = vec![
            flight("AAL1", 0.0, 0.0),
            flight("AAL2", 0.001, 0.001),
            flight("BAW9", 50.0, 50.0),
            flight("DAL3", -0.002, 0.0005),
            flight("UAL7", 50.001, 49.999),
        ];
        let mut backward = forward.clone();
        backward.reverse();
        backward.rotate_left(2);

        let a = ClusterIndex::build(forward, ClusterConfig::default());
        let b = ClusterIndex::build(backward, ClusterConfig::default());

        for zoom in 0..=11 {
            assert_eq!(
                a.query(None, f64::from(zoom)),
                b.query(None, f64::from(zoom)),
                "zoom {zoom}"
            );
        }
        assert_eq!(a.query(None, 2.0), a.query(None, 2.0));
    }

    #[test]
    fn leaves_partition_the_entity_set_at_every_zoom() {
        let entities = vec![
            flight("AAL1", 0.0, 0.0),
            flight("AAL2", 0.001, 0.001),
            flight("BAW9", 50.0, 50.0),
            flight("DAL3", -120.0, 34.0),
            flight("DAL4", -120.3, 34.2),
            flight("JBU5", -120.1, 33.9),
            flight("QFA8", 151.2, -33.9),
        ];
        let expected: Vec<String> = {
            let mut ids: Vec<_> = entities.iter().map(|e| e.identity.clone()).collect();
            ids.sort();
            ids
        };
        let index = ClusterIndex::build(entities, ClusterConfig::default());

        for zoom in 0..=11 {
            let features = index.query(None, f64::from(zoom));
            assert_eq!(identities(&features, &index), expected, "zoom {zoom}");
        }
    }

    #[test]
    fn expansion_zoom_splits_the_cluster() {
        let entities = vec![
            flight("AAL1", 10.0, 10.0),
            flight("AAL2", 12.0, 11.0),
            flight("AAL3", 11.0, 9.5),
        ];
        let index = ClusterIndex::build(entities, ClusterConfig::default());

        let features = index.query(None, 0.0);
        assert_eq!(features.len(), 1);
        let id = features[0].cluster_id().expect("one top-level cluster");

        let expansion = index.expansion_zoom(id).unwrap();
        assert!(expansion > 0, "expansion zoom must exceed observed zoom");

        let split = index.query(None, f64::from(expansion));
        assert!(
            split.len() > 1,
            "querying at expansion zoom must yield more features"
        );
    }

    #[test]
    fn cluster_feature_reports_weighted_centroid_and_expansion() {
        let entities = vec![flight("AAL1", 10.0, 0.0), flight("AAL2", 11.0, 0.0)];
        let index = ClusterIndex::build(entities, ClusterConfig::default());

        match &index.query(None, 0.0)[0] {
            Feature::Cluster {
                coordinates,
                count,
                expansion_zoom,
                ..
            } => {
                assert_eq!(*count, 2);
                assert!((coordinates.0 - 10.5).abs() < 1e-9);
                assert!(coordinates.1.abs() < 1e-9);
                assert!(*expansion_zoom >= 1);
            }
            Feature::Leaf(_) => panic!("expected a cluster"),
        }
    }

    #[test]
    fn stale_cluster_id_degrades_to_safe_defaults() {
        let index = ClusterIndex::build(
            vec![
                flight("AAL1", 0.0, 0.0),
                flight("AAL2", 0.001, 0.001),
                flight("BAW9", 50.0, 50.0),
            ],
            ClusterConfig::default(),
        );
        let id = index.query(None, 2.0)[0]
            .cluster_id()
            .or_else(|| index.query(None, 2.0)[1].cluster_id())
            .expect("a cluster id");

        // Rebuild with a smaller set; the old id must not resolve.
        let rebuilt = ClusterIndex::build(vec![flight("UAL7", 5.0, 5.0)], ClusterConfig::default());
        assert!(rebuilt.leaves(id, None).is_empty());
        assert_eq!(rebuilt.expansion_zoom(id), None);

        // A leaf position is not a cluster id either.
        let leaf_id = ClusterId::new(11, 0);
        assert!(index.leaves(leaf_id, None).is_empty());
        assert_eq!(index.expansion_zoom(leaf_id), None);
    }

    #[test]
    fn bounded_query_filters_and_pads() {
        let entities = vec![
            flight("AAL1", 0.0, 0.0),
            flight("BAW9", 50.0, 50.0),
            flight("QFA8", 151.2, -33.9),
        ];
        let index = ClusterIndex::build(entities, ClusterConfig::default());

        let bounds = Bounds::new(-10.0, -10.0, 10.0, 10.0);
        let features = index.query(Some(&bounds), 8.0);
        assert_eq!(features.len(), 1);
        assert_eq!(identities(&features, &index), ["AAL1"]);
    }

    #[test]
    fn bounded_query_spans_the_antimeridian() {
        let entities = vec![
            flight("ANZ1", 175.0, -37.0),
            flight("ANZ2", -175.0, -37.0),
            flight("AAL1", 0.0, 0.0),
        ];
        let index = ClusterIndex::build(entities, ClusterConfig::default());

        let bounds = Bounds::new(170.0, -45.0, -170.0, -30.0);
        let features = index.query(Some(&bounds), 8.0);
        assert_eq!(identities(&features, &index), ["ANZ1", "ANZ2"]);
    }

    #[test]
    fn null_bounds_returns_the_full_top_level_set() {
        let entities = vec![flight("AAL1", 0.0, 0.0), flight("QFA8", 151.2, -33.9)];
        let index = ClusterIndex::build(entities, ClusterConfig::default());
        assert_eq!(index.query(None, 0.0).len(), index.query(None, 0.4).len());
        assert_eq!(identities(&index.query(None, 1.0), &index), ["AAL1", "QFA8"]);
    }

    #[test]
    fn leaves_respects_limit() {
        let entities = vec![
            flight("AAL1", 0.0, 0.0),
            flight("AAL2", 0.001, 0.001),
            flight("AAL3", 0.002, 0.0),
        ];
        let index = ClusterIndex::build(entities, ClusterConfig::default());
        let id = index.query(None, 0.0)[0].cluster_id().unwrap();

        assert_eq!(index.leaves(id, Some(2)).len(), 2);
        assert_eq!(index.leaves(id, None).len(), 3);
    }

    #[test]
    fn duplicate_identities_keep_first_record() {
        let entities = vec![flight("AAL1", 0.0, 0.0), flight("AAL1", 50.0, 50.0)];
        let index = ClusterIndex::build(entities, ClusterConfig::default());
        assert_eq!(index.entities().len(), 1);
        assert_eq!(index.entities()[0].coordinates, (0.0, 0.0));
    }
}
