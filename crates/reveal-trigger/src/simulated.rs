//! Geometry-driven intersection platform
//!
//! Computes intersections from laid-out rects each time the host calls
//! [`SimulatedPlatform::update`], the way a browser would once per frame.

use reveal_dom::{DOMRect, Document, NodeId};

use crate::{IntersectionBatch, IntersectionEntry, IntersectionPlatform, WatcherId, WatcherKey};

/// Where the platform reads geometry from
pub trait LayoutSource {
    /// Visible viewport in document coordinates
    fn viewport_rect(&self) -> DOMRect;

    /// Border box of a node in document coordinates, if laid out
    fn node_rect(&self, node: NodeId) -> Option<DOMRect>;
}

impl LayoutSource for Document {
    fn viewport_rect(&self) -> DOMRect {
        self.viewport().rect()
    }

    fn node_rect(&self, node: NodeId) -> Option<DOMRect> {
        self.layout(node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LastSeen {
    ratio: f64,
    intersecting: bool,
}

#[derive(Debug)]
struct Watcher {
    id: WatcherId,
    key: WatcherKey,
    /// Observed nodes in observe order, with the last reported state
    observed: Vec<(NodeId, Option<LastSeen>)>,
}

impl Watcher {
    fn check_intersections(&mut self, layout: &impl LayoutSource, time: f64) -> Vec<IntersectionEntry> {
        let root = match self.key.root {
            Some(node) => match layout.node_rect(node) {
                Some(rect) => rect,
                None => return Vec::new(),
            },
            None => layout.viewport_rect(),
        };
        let bounds = self.key.root_margin.apply(root);
        let threshold = self.key.threshold.value();

        let mut entries = Vec::new();
        for (node, last) in &mut self.observed {
            let Some(rect) = layout.node_rect(*node) else {
                continue;
            };

            let intersection = rect.intersection(&bounds);
            let ratio = match intersection {
                Some(i) if rect.area() > 0.0 => (i.area() / rect.area()).min(1.0),
                // Zero-area targets are either fully in or fully out
                Some(_) => 1.0,
                None => 0.0,
            };
            let seen = LastSeen {
                ratio,
                intersecting: intersection.is_some(),
            };

            let should_notify = match *last {
                Some(prev) => {
                    prev.intersecting != seen.intersecting
                        || (prev.ratio < threshold && ratio >= threshold)
                        || (prev.ratio >= threshold && ratio < threshold)
                }
                None => true,
            };

            if should_notify {
                *last = Some(seen);
                entries.push(IntersectionEntry {
                    target: *node,
                    bounding_client_rect: rect,
                    intersection_rect: intersection.unwrap_or_default(),
                    root_bounds: Some(bounds),
                    intersection_ratio: ratio,
                    is_intersecting: seen.intersecting,
                    time,
                });
            }
        }
        entries
    }
}

/// Intersection platform backed by a [`LayoutSource`]
#[derive(Debug, Default)]
pub struct SimulatedPlatform {
    next_id: u64,
    watchers: Vec<Watcher>,
    pending: Vec<IntersectionBatch>,
}

impl SimulatedPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every watcher against the current layout and queue
    /// entries for nodes whose state changed.
    pub fn update(&mut self, layout: &impl LayoutSource, time: f64) {
        for watcher in &mut self.watchers {
            let entries = watcher.check_intersections(layout, time);
            if !entries.is_empty() {
                tracing::trace!("watcher {:?} queued {} entries", watcher.id, entries.len());
                self.pending.push(IntersectionBatch {
                    watcher: watcher.id,
                    entries,
                });
            }
        }
    }

    /// Queue a hand-made batch, as if the platform had produced it
    pub fn push_batch(&mut self, batch: IntersectionBatch) {
        self.pending.push(batch);
    }

    /// Number of live watchers
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    /// Whether `target` is observed by `watcher`
    pub fn is_observing(&self, watcher: WatcherId, target: NodeId) -> bool {
        self.watcher(watcher)
            .is_some_and(|w| w.observed.iter().any(|(n, _)| *n == target))
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn watcher(&self, id: WatcherId) -> Option<&Watcher> {
        self.watchers.iter().find(|w| w.id == id)
    }

    fn watcher_mut(&mut self, id: WatcherId) -> Option<&mut Watcher> {
        self.watchers.iter_mut().find(|w| w.id == id)
    }
}

impl IntersectionPlatform for SimulatedPlatform {
    fn supports_intersection(&self) -> bool {
        true
    }

    fn create_watcher(&mut self, key: &WatcherKey) -> WatcherId {
        self.next_id += 1;
        let id = WatcherId(self.next_id);
        tracing::debug!(
            "creating watcher {:?} (threshold {}, margin {})",
            id,
            key.threshold.value(),
            key.root_margin
        );
        self.watchers.push(Watcher {
            id,
            key: *key,
            observed: Vec::new(),
        });
        id
    }

    fn observe(&mut self, watcher: WatcherId, target: NodeId) {
        if let Some(w) = self.watcher_mut(watcher) {
            if !w.observed.iter().any(|(n, _)| *n == target) {
                w.observed.push((target, None));
            }
        }
    }

    fn unobserve(&mut self, watcher: WatcherId, target: NodeId) {
        if let Some(w) = self.watcher_mut(watcher) {
            w.observed.retain(|(n, _)| *n != target);
        }
    }

    fn disconnect(&mut self, watcher: WatcherId) {
        self.watchers.retain(|w| w.id != watcher);
        self.pending.retain(|b| b.watcher != watcher);
    }

    fn take_batches(&mut self) -> Vec<IntersectionBatch> {
        std::mem::take(&mut self.pending)
    }
}
