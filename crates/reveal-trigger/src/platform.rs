//! Intersection platform seam
//!
//! The host side of `IntersectionObserver`: something that can watch
//! nodes under a given configuration and hands back batches of entries.

use reveal_dom::{DOMRect, NodeId};

use crate::WatcherKey;

/// Handle for one platform watcher. Ids must not be reused for the
/// lifetime of a platform, so stale batches can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherId(pub u64);

/// Intersection observer entry
#[derive(Debug, Clone)]
pub struct IntersectionEntry {
    pub target: NodeId,
    pub bounding_client_rect: DOMRect,
    pub intersection_rect: DOMRect,
    pub root_bounds: Option<DOMRect>,
    pub intersection_ratio: f64,
    pub is_intersecting: bool,
    pub time: f64,
}

impl IntersectionEntry {
    /// Shorthand for tests and hosts that only know the ratio
    pub fn with_ratio(target: NodeId, ratio: f64) -> Self {
        Self {
            target,
            bounding_client_rect: DOMRect::default(),
            intersection_rect: DOMRect::default(),
            root_bounds: None,
            intersection_ratio: ratio,
            is_intersecting: ratio > 0.0,
            time: 0.0,
        }
    }
}

/// Entries reported together for one watcher, in platform order
#[derive(Debug, Clone)]
pub struct IntersectionBatch {
    pub watcher: WatcherId,
    pub entries: Vec<IntersectionEntry>,
}

/// Viewport-intersection facility consumed by the trigger.
pub trait IntersectionPlatform {
    /// Whether intersection observation is available at all.
    /// When false the trigger fails open.
    fn supports_intersection(&self) -> bool;

    fn create_watcher(&mut self, key: &WatcherKey) -> WatcherId;

    fn observe(&mut self, watcher: WatcherId, target: NodeId);

    fn unobserve(&mut self, watcher: WatcherId, target: NodeId);

    /// Stop watching everything under `watcher` and drop its queued entries
    fn disconnect(&mut self, watcher: WatcherId);

    /// Drain notification batches produced since the last call
    fn take_batches(&mut self) -> Vec<IntersectionBatch>;
}

/// A platform without intersection support
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIntersection;

impl IntersectionPlatform for NoIntersection {
    fn supports_intersection(&self) -> bool {
        false
    }

    fn create_watcher(&mut self, _key: &WatcherKey) -> WatcherId {
        WatcherId(0)
    }

    fn observe(&mut self, _watcher: WatcherId, _target: NodeId) {}

    fn unobserve(&mut self, _watcher: WatcherId, _target: NodeId) {}

    fn disconnect(&mut self, _watcher: WatcherId) {}

    fn take_batches(&mut self) -> Vec<IntersectionBatch> {
        Vec::new()
    }
}
