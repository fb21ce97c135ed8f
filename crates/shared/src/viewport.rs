//! Map viewport values and the map-side halves of the selection protocol:
//! applying viewport requests in order, and owning the map instance's
//! mount/fault/recreate lifecycle.

use serde::{Deserialize, Serialize};

use crate::models::LatLng;

/// Zoom level of the default whole-world view.
pub const WORLD_ZOOM: u8 = 2;

/// Zoom level used when focusing a single selected profile.
pub const CLOSE_UP_ZOOM: u8 = 10;

pub const WORLD_CENTER: LatLng = LatLng { lat: 20.0, lng: 0.0 };

pub const WORLD_VIEW: Viewport = Viewport {
    center: WORLD_CENTER,
    zoom: WORLD_ZOOM,
};

/// Faults tolerated before the map instance is recreated automatically.
pub const MAX_CONTAINED_FAULTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: u8,
}

impl Viewport {
    pub fn close_up(center: LatLng) -> Self {
        Viewport {
            center,
            zoom: CLOSE_UP_ZOOM,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        WORLD_VIEW
    }
}

/// What the selection controller asks the map to show.
///
/// `target == None` means "fall back to the world view". `revision` is
/// monotonic across all requests issued by one controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRequest {
    pub target: Option<Viewport>,
    pub revision: u64,
}

impl ViewportRequest {
    pub fn resolve(&self) -> Viewport {
        self.target.unwrap_or(WORLD_VIEW)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApplyOutcome {
    /// The map should pan/zoom to this viewport.
    Moved(Viewport),
    /// Already showing the requested viewport.
    Unchanged,
    /// An older request arriving after a newer one; dropped.
    Stale,
}

/// Tracks what the rendered map currently shows and filters incoming
/// requests down to the moves that actually need to happen.
///
/// Only a newer revision may move the map: re-sending an already applied
/// revision is a no-op even after the user panned away, and requests are
/// never applied out of revision order.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportApplier {
    current: Viewport,
    last_revision: Option<u64>,
    // Set by `reset`: the next request may re-apply the last revision
    reapply: bool,
}

impl Default for ViewportApplier {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportApplier {
    pub fn new() -> Self {
        ViewportApplier {
            current: WORLD_VIEW,
            last_revision: None,
            reapply: false,
        }
    }

    pub fn current(&self) -> Viewport {
        self.current
    }

    pub fn last_revision(&self) -> Option<u64> {
        self.last_revision
    }

    pub fn apply(&mut self, request: &ViewportRequest) -> ApplyOutcome {
        if let Some(last) = self.last_revision {
            if request.revision < last {
                return ApplyOutcome::Stale;
            }
            if request.revision == last && !self.reapply {
                return ApplyOutcome::Unchanged;
            }
        }
        self.last_revision = Some(request.revision);
        self.reapply = false;

        let next = request.resolve();
        if next == self.current {
            ApplyOutcome::Unchanged
        } else {
            self.current = next;
            ApplyOutcome::Moved(next)
        }
    }

    /// Record a pan/zoom made directly by the user so that re-selecting the
    /// same profile moves the map back.
    pub fn user_moved(&mut self, viewport: Viewport) {
        self.current = viewport;
    }

    /// A freshly created map instance starts at the world view. Revision
    /// ordering survives the reset.
    pub fn reset(&mut self) {
        self.current = WORLD_VIEW;
        self.reapply = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultAction {
    /// Keep the instance; the boundary shows its fallback with a retry action.
    Contained,
    /// Throw the instance away and build a new one.
    Recreate,
}

/// Owning lifecycle of the rendered map instance.
///
/// The frontend keys the map subtree on [`MapLifecycle::generation`], so
/// bumping the generation destroys the old instance and mounts a new one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapLifecycle {
    generation: u64,
    mounted: bool,
    faulted: bool,
    fault_count: u32,
    data_revision: u64,
}

impl MapLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub fn fault_count(&self) -> u32 {
        self.fault_count
    }

    pub fn mount(&mut self) {
        self.mounted = true;
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    pub fn report_fault(&mut self) -> FaultAction {
        self.fault_count += 1;
        if self.fault_count > MAX_CONTAINED_FAULTS {
            self.recreate();
            FaultAction::Recreate
        } else {
            self.faulted = true;
            FaultAction::Contained
        }
    }

    /// Manual retry from the boundary's fallback.
    pub fn retry(&mut self) {
        self.recreate();
    }

    /// The profile set changed. Clears fault state; a faulted instance is
    /// rebuilt so the new data gets a fresh attempt.
    pub fn data_changed(&mut self, data_revision: u64) {
        if data_revision == self.data_revision {
            return;
        }
        self.data_revision = data_revision;
        if self.faulted {
            self.recreate();
        } else {
            self.fault_count = 0;
        }
    }

    fn recreate(&mut self) {
        self.generation += 1;
        self.mounted = false;
        self.faulted = false;
        self.fault_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(target: Option<Viewport>, revision: u64) -> ViewportRequest {
        ViewportRequest { target, revision }
    }

    fn toronto() -> Viewport {
        Viewport::close_up(LatLng::new(43.6532, -79.3832))
    }

    fn london() -> Viewport {
        Viewport::close_up(LatLng::new(51.5074, -0.1278))
    }

    #[test]
    fn test_none_target_resolves_to_world_view() {
        assert_eq!(request(None, 0).resolve(), WORLD_VIEW);
        assert_eq!(WORLD_VIEW.zoom, 2);
        assert_eq!(WORLD_VIEW.center, LatLng::new(20.0, 0.0));
    }

    #[test]
    fn test_apply_moves_then_is_idempotent() {
        let mut applier = ViewportApplier::new();
        let req = request(Some(toronto()), 1);
        assert_eq!(applier.apply(&req), ApplyOutcome::Moved(toronto()));
        assert_eq!(applier.apply(&req), ApplyOutcome::Unchanged);
        assert_eq!(applier.current(), toronto());
    }

    #[test]
    fn test_world_view_request_on_fresh_map_is_unchanged() {
        let mut applier = ViewportApplier::new();
        assert_eq!(applier.apply(&request(None, 0)), ApplyOutcome::Unchanged);
    }

    #[test]
    fn test_out_of_order_requests_are_dropped() {
        let mut applier = ViewportApplier::new();
        let older = request(Some(toronto()), 1);
        let newer = request(Some(london()), 2);
        assert_eq!(applier.apply(&newer), ApplyOutcome::Moved(london()));
        assert_eq!(applier.apply(&older), ApplyOutcome::Stale);
        assert_eq!(applier.current(), london());
    }

    #[test]
    fn test_rapid_requests_settle_on_latest() {
        let mut applier = ViewportApplier::new();
        let targets = [toronto(), london(), toronto(), london()];
        for (i, t) in targets.iter().enumerate() {
            applier.apply(&request(Some(*t), i as u64 + 1));
        }
        assert_eq!(applier.current(), london());
    }

    #[test]
    fn test_user_move_makes_reselect_move_again() {
        let mut applier = ViewportApplier::new();
        applier.apply(&request(Some(toronto()), 1));
        applier.user_moved(WORLD_VIEW);
        assert_eq!(
            applier.apply(&request(Some(toronto()), 2)),
            ApplyOutcome::Moved(toronto())
        );
    }

    #[test]
    fn test_resent_revision_does_not_undo_user_move() {
        let mut applier = ViewportApplier::new();
        let req = request(Some(toronto()), 1);
        assert_eq!(applier.apply(&req), ApplyOutcome::Moved(toronto()));

        let panned = Viewport {
            center: LatLng::new(0.0, 0.0),
            zoom: 5,
        };
        applier.user_moved(panned);
        assert_eq!(applier.apply(&req), ApplyOutcome::Unchanged);
        assert_eq!(applier.current(), panned);
        assert_eq!(applier.last_revision(), Some(1));
    }

    #[test]
    fn test_reset_allows_reapplying_current_request() {
        let mut applier = ViewportApplier::new();
        let req = request(Some(toronto()), 4);
        applier.apply(&req);
        applier.reset();
        assert_eq!(applier.apply(&req), ApplyOutcome::Moved(toronto()));
        assert_eq!(applier.apply(&request(None, 3)), ApplyOutcome::Stale);
    }

    #[test]
    fn test_faults_are_contained_until_threshold() {
        let mut lifecycle = MapLifecycle::new();
        lifecycle.mount();
        for _ in 0..MAX_CONTAINED_FAULTS {
            assert_eq!(lifecycle.report_fault(), FaultAction::Contained);
            assert!(lifecycle.is_faulted());
        }
        assert_eq!(lifecycle.generation(), 0);
        assert_eq!(lifecycle.report_fault(), FaultAction::Recreate);
        assert_eq!(lifecycle.generation(), 1);
        assert!(!lifecycle.is_faulted());
        assert!(!lifecycle.is_mounted());
        assert_eq!(lifecycle.fault_count(), 0);
    }

    #[test]
    fn test_retry_recreates_instance() {
        let mut lifecycle = MapLifecycle::new();
        lifecycle.mount();
        lifecycle.report_fault();
        lifecycle.retry();
        assert_eq!(lifecycle.generation(), 1);
        assert!(!lifecycle.is_faulted());
    }

    #[test]
    fn test_data_change_resets_fault_state() {
        let mut lifecycle = MapLifecycle::new();
        lifecycle.mount();
        lifecycle.report_fault();
        lifecycle.data_changed(1);
        assert!(!lifecycle.is_faulted());
        assert_eq!(lifecycle.generation(), 1);

        // Same data revision again: nothing happens
        lifecycle.mount();
        lifecycle.data_changed(1);
        assert_eq!(lifecycle.generation(), 1);
        assert!(lifecycle.is_mounted());
    }

    #[test]
    fn test_data_change_on_healthy_map_keeps_instance() {
        let mut lifecycle = MapLifecycle::new();
        lifecycle.mount();
        lifecycle.data_changed(7);
        assert_eq!(lifecycle.generation(), 0);
        assert!(lifecycle.is_mounted());
    }
}
