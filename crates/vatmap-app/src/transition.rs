//! Camera transitions.
//!
//! Every programmatic camera move is a [`FlyTo`]: target, duration,
//! easing. The runtime holds at most one active transition; starting a
//! new one supersedes the old mid-flight with no snap back.

use std::time::Duration;

use vatmap_core::Viewport;

/// Cluster expansion flights are short.
pub const CLUSTER_EXPANSION_MS: u64 = 500;
/// Selection flights are long enough to read.
pub const SELECTION_MS: u64 = 2000;
/// Zoom when flying to a selected flight.
pub const FLIGHT_SELECT_ZOOM: f64 = 5.0;
/// Zoom when flying to a selected airport.
pub const AIRPORT_SELECT_ZOOM: f64 = 12.0;
/// Longitude offset when centering an airport, so the detail panel
/// does not cover it.
pub const AIRPORT_LNG_OFFSET: f64 = 0.095;
/// Expansion zoom targets never exceed this.
pub const MAX_EXPANSION_ZOOM: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    QuadInOut,
}

impl Easing {
    /// Map linear progress in `[0, 1]` to eased progress.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// A camera flight request.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyTo {
    /// Target `(lng, lat)`.
    pub center: (f64, f64),
    pub zoom: f64,
    pub duration: Duration,
    pub easing: Easing,
}

impl FlyTo {
    /// Fly into a clicked cluster. `zoom` is the cluster's expansion
    /// zoom, already clamped by the caller.
    pub fn cluster_expansion(center: (f64, f64), zoom: f64) -> Self {
        Self {
            center,
            zoom: zoom.min(f64::from(MAX_EXPANSION_ZOOM)),
            duration: Duration::from_millis(CLUSTER_EXPANSION_MS),
            easing: Easing::QuadInOut,
        }
    }

    /// Fly to a selected flight.
    pub fn flight(center: (f64, f64)) -> Self {
        Self {
            center,
            zoom: FLIGHT_SELECT_ZOOM,
            duration: Duration::from_millis(SELECTION_MS),
            easing: Easing::QuadInOut,
        }
    }

    /// Fly to a selected airport, nudged east so the panel leaves it
    /// visible.
    pub fn airport(center: (f64, f64)) -> Self {
        Self {
            center: (center.0 + AIRPORT_LNG_OFFSET, center.1),
            zoom: AIRPORT_SELECT_ZOOM,
            duration: Duration::from_millis(SELECTION_MS),
            easing: Easing::QuadInOut,
        }
    }
}

/// The single in-flight transition, if any. `begin` on an occupied
/// slot supersedes: the new flight starts from wherever the camera is
/// now.
#[derive(Debug, Default)]
pub struct TransitionSlot {
    active: Option<ActiveTransition>,
}

#[derive(Debug)]
struct ActiveTransition {
    from: Viewport,
    fly: FlyTo,
}

impl TransitionSlot {
    pub fn begin(&mut self, from: Viewport, fly: FlyTo) {
        self.active = Some(ActiveTransition { from, fly });
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn target(&self) -> Option<&FlyTo> {
        self.active.as_ref().map(|t| &t.fly)
    }

    /// Camera position `elapsed` into the flight. Returns `None` when
    /// idle; clears the slot once the flight completes and returns the
    /// exact target as the final sample.
    pub fn sample(&mut self, elapsed: Duration) -> Option<Viewport> {
        let active = self.active.as_ref()?;
        let total = active.fly.duration.as_secs_f64();
        let t = if total <= 0.0 {
            1.0
        } else {
            (elapsed.as_secs_f64() / total).min(1.0)
        };
        let eased = active.fly.easing.apply(t);

        let (fx, fy) = active.from.center;
        let (tx, ty) = active.fly.center;
        let viewport = Viewport {
            center: (fx + (tx - fx) * eased, fy + (ty - fy) * eased),
            zoom: active.from.zoom + (active.fly.zoom - active.from.zoom) * eased,
            bounds: active.from.bounds,
        };

        if t >= 1.0 {
            self.active = None;
        }
        Some(viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(center: (f64, f64), zoom: f64) -> Viewport {
        Viewport {
            center,
            zoom,
            bounds: None,
        }
    }

    #[test]
    fn quad_in_out_endpoints_and_midpoint() {
        assert_eq!(Easing::QuadInOut.apply(0.0), 0.0);
        assert_eq!(Easing::QuadInOut.apply(0.5), 0.5);
        assert_eq!(Easing::QuadInOut.apply(1.0), 1.0);
        assert!(Easing::QuadInOut.apply(0.25) < 0.25);
        assert!(Easing::QuadInOut.apply(0.75) > 0.75);
    }

    #[test]
    fn sample_reaches_exact_target_and_clears() {
        let mut slot = TransitionSlot::default();
        slot.begin(viewport((0.0, 0.0), 2.0), FlyTo::flight((10.0, 20.0)));

        let end = slot.sample(Duration::from_millis(SELECTION_MS)).unwrap();
        assert_eq!(end.center, (10.0, 20.0));
        assert_eq!(end.zoom, FLIGHT_SELECT_ZOOM);
        assert!(!slot.is_active());
        assert!(slot.sample(Duration::ZERO).is_none());
    }

    #[test]
    fn begin_supersedes_active_flight() {
        let mut slot = TransitionSlot::default();
        slot.begin(viewport((0.0, 0.0), 2.0), FlyTo::flight((10.0, 20.0)));

        // Halfway through, a new request takes over from the current
        // camera position.
        let mid = slot.sample(Duration::from_millis(SELECTION_MS / 2)).unwrap();
        slot.begin(mid.clone(), FlyTo::cluster_expansion((-30.0, 40.0), 6.0));

        let start = slot.sample(Duration::ZERO).unwrap();
        assert_eq!(start.center, mid.center);
        let end = slot
            .sample(Duration::from_millis(CLUSTER_EXPANSION_MS))
            .unwrap();
        assert_eq!(end.center, (-30.0, 40.0));
        assert_eq!(end.zoom, 6.0);
    }

    #[test]
    fn expansion_zoom_is_clamped() {
        let fly = FlyTo::cluster_expansion((0.0, 0.0), 37.0);
        assert_eq!(fly.zoom, f64::from(MAX_EXPANSION_ZOOM));
    }

    #[test]
    fn airport_target_is_offset() {
        let fly = FlyTo::airport((-118.4, 33.9));
        assert_eq!(fly.center, (-118.4 + AIRPORT_LNG_OFFSET, 33.9));
        assert_eq!(fly.zoom, AIRPORT_SELECT_ZOOM);
    }
}
