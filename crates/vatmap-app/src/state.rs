//! Shared application state.
//!
//! One `AppState` is shared by the polling loops and the shell. Entity
//! refreshes apply in a fixed order: entity set, then spatial index
//! and feature re-query, then selection revalidation. Readers never
//! observe features computed from an older entity set than the one
//! published.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use vatmap_core::{
    is_in_cluster, is_still_active, ClusterConfig, ClusterId, Entity, EntityKind, Feature,
    SelectionState, Viewport,
};
use vatmap_feed::{FirMap, FirRegion};

use crate::aggregator::ViewportAggregator;
use crate::cache::DetailCache;
use crate::transition::FlyTo;

type DeselectHook = Box<dyn Fn(&str) + Send + Sync>;

/// What applying one entity snapshot did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// False when a newer snapshot was already applied; the payload
    /// was discarded.
    pub applied: bool,
    /// True when the selected entity left the feed and the selection
    /// was cleared. Raised at most once per disappearance.
    pub selection_cleared: bool,
}

pub struct AppState {
    entities: RwLock<Arc<Vec<Entity>>>,
    aggregator: Mutex<ViewportAggregator>,
    firs: DashMap<String, FirRegion>,
    details: DetailCache,
    weather_timestamp: Mutex<Option<i64>>,
    selection: Mutex<Option<SelectionState>>,
    selected_airport: Mutex<Option<String>>,
    on_deselect: Mutex<Option<DeselectHook>>,
    last_refresh: Mutex<Option<DateTime<Utc>>>,
    no_data: AtomicBool,
    fetch_ticket: AtomicU64,
    // Written only while holding the aggregator lock.
    applied_ticket: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AppState {
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            entities: RwLock::new(Arc::new(Vec::new())),
            aggregator: Mutex::new(ViewportAggregator::new(config)),
            firs: DashMap::new(),
            details: DetailCache::default(),
            weather_timestamp: Mutex::new(None),
            selection: Mutex::new(None),
            selected_airport: Mutex::new(None),
            on_deselect: Mutex::new(None),
            last_refresh: Mutex::new(None),
            no_data: AtomicBool::new(false),
            fetch_ticket: AtomicU64::new(0),
            applied_ticket: AtomicU64::new(0),
        }
    }

    /// Take a ticket before starting a fetch. Tickets order concurrent
    /// refreshes: a snapshot only applies if no later ticket already
    /// has.
    pub fn begin_fetch(&self) -> u64 {
        self.fetch_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a normalized entity snapshot fetched under `ticket`.
    pub fn apply_entity_snapshot(&self, ticket: u64, entities: Vec<Entity>) -> RefreshOutcome {
        let mut aggregator = lock(&self.aggregator);
        if ticket <= self.applied_ticket.load(Ordering::SeqCst) {
            tracing::debug!(ticket, "stale entity snapshot discarded");
            return RefreshOutcome {
                applied: false,
                selection_cleared: false,
            };
        }
        self.applied_ticket.store(ticket, Ordering::SeqCst);

        let shared = Arc::new(entities);
        *self
            .entities
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&shared);
        aggregator.replace_entities(shared.as_ref().clone());
        drop(aggregator);

        *lock(&self.last_refresh) = Some(Utc::now());
        let selection_cleared = self.revalidate_selection(&shared);
        RefreshOutcome {
            applied: true,
            selection_cleared,
        }
    }

    fn revalidate_selection(&self, latest: &[Entity]) -> bool {
        let mut selection = lock(&self.selection);
        let Some(active) = selection.as_ref() else {
            return false;
        };
        if is_still_active(&active.identity, latest).is_some() {
            return false;
        }
        let identity = active.identity.clone();
        *selection = None;
        drop(selection);

        tracing::info!(%identity, "selected entity left the feed, selection cleared");
        if let Some(hook) = lock(&self.on_deselect).as_ref() {
            hook(&identity);
        }
        true
    }

    /// Install the hook fired when a refresh clears the selection.
    pub fn set_on_deselect(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *lock(&self.on_deselect) = Some(Box::new(hook));
    }

    pub fn entities(&self) -> Arc<Vec<Entity>> {
        Arc::clone(&self.entities.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        lock(&self.aggregator).set_viewport(viewport);
    }

    pub fn viewport(&self) -> Viewport {
        lock(&self.aggregator).viewport().clone()
    }

    pub fn features(&self) -> Vec<Feature> {
        lock(&self.aggregator).features().to_vec()
    }

    pub fn click_cluster(&self, id: ClusterId) -> Option<FlyTo> {
        lock(&self.aggregator).click_cluster(id)
    }

    /// Select an entity; returns the flight to its live position, or
    /// `None` when it is not in the current feed.
    pub fn select(&self, selection: SelectionState) -> Option<FlyTo> {
        let target = {
            let entities = self.entities();
            is_still_active(&selection.identity, &entities).map(|entity| entity.coordinates)
        };
        tracing::debug!(identity = %selection.identity, "entity selected");
        *lock(&self.selection) = Some(selection);
        target.map(FlyTo::flight)
    }

    pub fn selection(&self) -> Option<SelectionState> {
        lock(&self.selection).clone()
    }

    /// User-initiated deselect. Does not fire the deselect hook; the
    /// caller owns its own overlay teardown.
    pub fn deselect(&self) -> bool {
        lock(&self.selection).take().is_some()
    }

    /// The cluster currently absorbing the selected entity, for
    /// highlight. `None` when nothing is selected or the entity shows
    /// as its own leaf.
    pub fn selection_cluster(&self) -> Option<ClusterId> {
        let selection = self.selection()?;
        let aggregator = lock(&self.aggregator);
        aggregator
            .features()
            .iter()
            .filter_map(Feature::cluster_id)
            .find(|id| is_in_cluster(&selection.identity, aggregator.index(), *id))
    }

    pub fn select_airport(&self, icao: impl Into<String>, position: (f64, f64)) -> FlyTo {
        *lock(&self.selected_airport) = Some(icao.into());
        FlyTo::airport(position)
    }

    pub fn selected_airport(&self) -> Option<String> {
        lock(&self.selected_airport).clone()
    }

    pub fn clear_airport(&self) -> bool {
        lock(&self.selected_airport).take().is_some()
    }

    /// Escape clears both the entity and the airport selection.
    pub fn escape(&self) -> bool {
        let had_entity = self.deselect();
        let had_airport = self.clear_airport();
        had_entity || had_airport
    }

    /// Flights departing from and arriving at an airport, for its
    /// traffic panel.
    pub fn airport_traffic(&self, icao: &str) -> AirportTraffic {
        let entities = self.entities();
        let mut traffic = AirportTraffic::default();
        for entity in entities.iter() {
            if entity.kind != EntityKind::Flight {
                continue;
            }
            let attrs = &entity.attributes;
            if field_matches(attrs.departure_icao.as_deref(), icao) {
                traffic.departures.push(entity.clone());
            }
            if field_matches(attrs.destination_icao.as_deref(), icao) {
                traffic.arrivals.push(entity.clone());
            }
        }
        traffic
    }

    pub fn replace_firs(&self, firs: FirMap) {
        self.firs.clear();
        for (key, region) in firs {
            self.firs.insert(key, region);
        }
    }

    pub fn firs(&self) -> FirMap {
        self.firs
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn details(&self) -> &DetailCache {
        &self.details
    }

    pub fn set_weather_timestamp(&self, timestamp: i64) {
        *lock(&self.weather_timestamp) = Some(timestamp);
    }

    pub fn weather_timestamp(&self) -> Option<i64> {
        *lock(&self.weather_timestamp)
    }

    pub fn set_no_data(&self, no_data: bool) {
        self.no_data.store(no_data, Ordering::SeqCst);
    }

    pub fn no_data(&self) -> bool {
        self.no_data.load(Ordering::SeqCst)
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *lock(&self.last_refresh)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AirportTraffic {
    pub departures: Vec<Entity>,
    pub arrivals: Vec<Entity>,
}

fn field_matches(field: Option<&str>, icao: &str) -> bool {
    field.is_some_and(|value| value.eq_ignore_ascii_case(icao))
}
