//! Visibility trigger
//!
//! Each registered node is `Pending` until a delivered entry reports it
//! intersecting at or above the watcher threshold; it is then detached
//! and its callback runs once. There is no way back to `Pending`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use reveal_dom::NodeId;

use crate::{IntersectionBatch, IntersectionPlatform, Threshold, TriggerOptions, WatcherId, WatcherKey};

/// Callback run when a node first becomes visible. `C` is the host
/// context (usually the document) the callback mutates.
pub type OnVisible<C> = Box<dyn FnMut(&mut C, NodeId)>;

/// Handle returned by [`VisibilityTrigger::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

struct Registration<C> {
    watcher: WatcherId,
    pending: HashSet<NodeId>,
    on_visible: OnVisible<C>,
}

struct WatcherSlot {
    threshold: Threshold,
    /// Registrations still pending on each observed node
    targets: HashMap<NodeId, Vec<RegistrationId>>,
}

/// One-shot visibility callbacks over an [`IntersectionPlatform`].
///
/// Watchers are shared per [`WatcherKey`]: registering twice with the
/// same threshold, margin and root reuses one platform watcher.
pub struct VisibilityTrigger<P: IntersectionPlatform, C> {
    platform: P,
    watchers: HashMap<WatcherKey, WatcherId>,
    slots: HashMap<WatcherId, WatcherSlot>,
    registrations: HashMap<RegistrationId, Registration<C>>,
    next_registration: u64,
}

impl<P: IntersectionPlatform, C> VisibilityTrigger<P, C> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            watchers: HashMap::new(),
            slots: HashMap::new(),
            registrations: HashMap::new(),
            next_registration: 0,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Watch `elements` and call `on_visible` once per node the first
    /// time it is visible enough.
    ///
    /// An empty element list or an invalid threshold registers nothing.
    /// Without platform support every node fires immediately, inside
    /// this call, so gated content is never left hidden.
    pub fn register<I, F>(&mut self, ctx: &mut C, elements: I, options: &TriggerOptions, on_visible: F) -> RegistrationId
    where
        I: IntoIterator<Item = NodeId>,
        F: FnMut(&mut C, NodeId) + 'static,
    {
        self.next_registration += 1;
        let id = RegistrationId(self.next_registration);

        let mut seen = HashSet::new();
        let nodes: Vec<NodeId> = elements.into_iter().filter(|n| seen.insert(*n)).collect();
        if nodes.is_empty() {
            tracing::debug!("registration {:?} has no elements", id);
            return id;
        }

        let key = match options.key() {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!("ignoring registration of {} element(s): {}", nodes.len(), err);
                return id;
            }
        };

        let mut on_visible: OnVisible<C> = Box::new(on_visible);

        if !self.platform.supports_intersection() {
            tracing::warn!(
                "intersection observation unavailable, revealing {} element(s) immediately",
                nodes.len()
            );
            for node in nodes {
                invoke(&mut on_visible, ctx, node);
            }
            return id;
        }

        let watcher = match self.watchers.get(&key) {
            Some(&watcher) => watcher,
            None => {
                let watcher = self.platform.create_watcher(&key);
                self.watchers.insert(key, watcher);
                watcher
            }
        };
        let slot = self.slots.entry(watcher).or_insert_with(|| WatcherSlot {
            threshold: key.threshold,
            targets: HashMap::new(),
        });

        for &node in &nodes {
            let regs = slot.targets.entry(node).or_default();
            if regs.is_empty() {
                self.platform.observe(watcher, node);
            }
            regs.push(id);
        }

        tracing::debug!(
            "registration {:?}: {} element(s) on watcher {:?}",
            id,
            nodes.len(),
            watcher
        );
        self.registrations.insert(
            id,
            Registration {
                watcher,
                pending: nodes.into_iter().collect(),
                on_visible,
            },
        );
        id
    }

    /// Detach every pending node of one registration. Other
    /// registrations on the same watcher are unaffected.
    pub fn unregister(&mut self, id: RegistrationId) -> bool {
        let Some(reg) = self.registrations.remove(&id) else {
            return false;
        };
        if let Some(slot) = self.slots.get_mut(&reg.watcher) {
            for node in reg.pending {
                let Some(regs) = slot.targets.get_mut(&node) else {
                    continue;
                };
                regs.retain(|r| *r != id);
                if regs.is_empty() {
                    slot.targets.remove(&node);
                    self.platform.unobserve(reg.watcher, node);
                }
            }
        }
        tracing::debug!("unregistered {:?}", id);
        true
    }

    /// Stop all monitoring. Pending nodes never fire, even if batches
    /// are delivered afterwards.
    pub fn teardown(&mut self) {
        if self.watchers.is_empty() && self.registrations.is_empty() {
            return;
        }
        tracing::debug!(
            "teardown: {} watcher(s), {} registration(s) dropped",
            self.watchers.len(),
            self.registrations.len()
        );
        for (_, watcher) in self.watchers.drain() {
            self.platform.disconnect(watcher);
        }
        self.slots.clear();
        self.registrations.clear();
    }

    /// Process one notification batch. Returns how many callbacks ran.
    pub fn deliver(&mut self, ctx: &mut C, batch: IntersectionBatch) -> usize {
        let watcher = batch.watcher;
        let Some(slot) = self.slots.get_mut(&watcher) else {
            tracing::trace!("dropping batch for unknown watcher {:?}", watcher);
            return 0;
        };
        let threshold = slot.threshold.value();

        let mut fired = 0;
        for entry in batch.entries {
            if !entry.is_intersecting || entry.intersection_ratio < threshold {
                continue;
            }
            // Already fired, unregistered, or never ours
            let Some(regs) = slot.targets.remove(&entry.target) else {
                continue;
            };
            self.platform.unobserve(watcher, entry.target);

            for reg_id in regs {
                let Some(reg) = self.registrations.get_mut(&reg_id) else {
                    continue;
                };
                reg.pending.remove(&entry.target);
                invoke(&mut reg.on_visible, ctx, entry.target);
                fired += 1;
                if reg.pending.is_empty() {
                    self.registrations.remove(&reg_id);
                }
            }
        }
        fired
    }

    /// Deliver everything the platform has queued. Returns how many
    /// callbacks ran.
    pub fn flush(&mut self, ctx: &mut C) -> usize {
        let batches = self.platform.take_batches();
        batches.into_iter().map(|batch| self.deliver(ctx, batch)).sum()
    }

    /// Is `node` still waiting on any registration?
    pub fn is_pending(&self, node: NodeId) -> bool {
        self.slots.values().any(|s| s.targets.contains_key(&node))
    }

    /// Pending (registration, node) pairs
    pub fn pending_count(&self) -> usize {
        self.registrations.values().map(|r| r.pending.len()).sum()
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    /// Registrations with at least one pending node
    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }
}

impl<P: IntersectionPlatform, C> Drop for VisibilityTrigger<P, C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<P: IntersectionPlatform, C> fmt::Debug for VisibilityTrigger<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityTrigger")
            .field("watchers", &self.watchers.len())
            .field("registrations", &self.registrations.len())
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Run one callback, containing a panic so the rest of the batch still runs
fn invoke<C>(on_visible: &mut OnVisible<C>, ctx: &mut C, node: NodeId) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| on_visible(ctx, node))) {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!("visibility callback for {} panicked: {}", node, reason);
    }
}
