//! reveal trigger - one-shot visibility triggers
//!
//! Watches elements against a viewport (or scroll container) and runs a
//! callback exactly once per element, the first time enough of it is
//! visible. Intersection itself is computed by an [`IntersectionPlatform`];
//! the trigger only owns the bookkeeping.
//!
//! ```
//! use reveal_dom::{Document, DOMRect};
//! use reveal_trigger::{SimulatedPlatform, TriggerOptions, VisibilityTrigger};
//!
//! let mut doc = Document::new("https://example.com/");
//! let body = doc.body();
//! let card = doc.append_element(body, "div", "card");
//! doc.set_layout(card, DOMRect::from_xywh(0.0, 100.0, 300.0, 200.0));
//!
//! let mut trigger = VisibilityTrigger::new(SimulatedPlatform::new());
//! trigger.register(&mut doc, [card], &TriggerOptions::default(), |doc: &mut Document, node| {
//!     if let Some(classes) = doc.class_list_mut(node) {
//!         classes.add("visible");
//!     }
//! });
//!
//! trigger.platform_mut().update(&doc, 0.0);
//! trigger.flush(&mut doc);
//! assert!(doc.has_class(card, "visible"));
//! ```

mod options;
mod platform;
mod simulated;
mod trigger;

pub use options::{Length, RootMargin, Threshold, TriggerOptions, WatcherKey};
pub use platform::{IntersectionBatch, IntersectionEntry, IntersectionPlatform, NoIntersection, WatcherId};
pub use simulated::{LayoutSource, SimulatedPlatform};
pub use trigger::{OnVisible, RegistrationId, VisibilityTrigger};

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TriggerError {
    #[error("threshold {0} is outside [0, 1]")]
    InvalidThreshold(f64),
    #[error("invalid root margin `{0}`")]
    InvalidRootMargin(String),
}
