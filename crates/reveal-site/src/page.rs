//! Page - the context visibility callbacks run against

use reveal_dom::Document;

use crate::CountUps;

/// A loaded page: the document plus per-page animation state
#[derive(Debug)]
pub struct Page {
    pub document: Document,
    pub count_ups: CountUps,
    /// `prefers-reduced-motion: reduce`
    pub reduce_motion: bool,
}

impl Page {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            count_ups: CountUps::default(),
            reduce_motion: false,
        }
    }

    /// Advance running animations by `dt_ms`
    pub fn tick(&mut self, dt_ms: f64) {
        self.count_ups.tick(&mut self.document, dt_ms);
    }
}
