//! Site manager - page initialization and the per-frame loop

use reveal_trigger::{IntersectionPlatform, NoIntersection, RegistrationId, SimulatedPlatform, VisibilityTrigger};
use url::Url;

use crate::presets::{count_up_numbers, lazy_load_images, reveal_on_scroll};
use crate::{Page, SiteConfig, SiteError};

/// Owns the trigger for one page and everything registered on it
#[derive(Debug)]
pub struct SiteManager<P: IntersectionPlatform> {
    config: SiteConfig,
    trigger: VisibilityTrigger<P, Page>,
    registrations: Vec<RegistrationId>,
    clock_ms: f64,
}

impl<P: IntersectionPlatform> SiteManager<P> {
    /// Register every configured behaviour on `page`.
    ///
    /// Under reduced motion, reveals and count-ups are applied right
    /// away instead of waiting for visibility; lazy images still wait.
    /// A rule with a bad selector or bad trigger options is skipped with
    /// a warning and the remaining rules still apply. Only an unusable
    /// base URL fails initialization.
    pub fn init(page: &mut Page, config: SiteConfig, platform: P) -> Result<Self, SiteError> {
        let base_text = config.base_url.as_deref().unwrap_or(page.document.url()).to_string();
        let base = Url::parse(&base_text).map_err(|source| SiteError::Url {
            url: base_text.clone(),
            source,
        })?;

        page.reduce_motion = config.reduce_motion;
        if config.reduce_motion {
            let root = page.document.document_element();
            if let Some(classes) = page.document.class_list_mut(root) {
                classes.add("reduce-motion");
            }
        }

        let mut trigger = VisibilityTrigger::new(platform);
        let mut registrations = Vec::new();

        if config.reduce_motion {
            let mut immediate = VisibilityTrigger::<NoIntersection, Page>::new(NoIntersection);
            for rule in &config.reveal {
                skip_on_error(&rule.selector, reveal_on_scroll(&mut immediate, page, rule));
            }
            for rule in &config.count_up {
                skip_on_error(&rule.selector, count_up_numbers(&mut immediate, page, rule));
            }
        } else {
            for rule in &config.reveal {
                registrations.extend(skip_on_error(&rule.selector, reveal_on_scroll(&mut trigger, page, rule)));
            }
            for rule in &config.count_up {
                registrations.extend(skip_on_error(&rule.selector, count_up_numbers(&mut trigger, page, rule)));
            }
        }
        if let Some(rule) = &config.lazy_images {
            registrations.extend(skip_on_error(
                &rule.selector,
                lazy_load_images(&mut trigger, page, rule, &base),
            ));
        }

        tracing::info!(
            "site initialized: {} registration(s), {} element(s) pending on {} watcher(s)",
            registrations.len(),
            trigger.pending_count(),
            trigger.watcher_count()
        );

        Ok(Self {
            config,
            trigger,
            registrations,
            clock_ms: 0.0,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn trigger(&self) -> &VisibilityTrigger<P, Page> {
        &self.trigger
    }

    pub fn trigger_mut(&mut self) -> &mut VisibilityTrigger<P, Page> {
        &mut self.trigger
    }

    pub fn registrations(&self) -> &[RegistrationId] {
        &self.registrations
    }

    /// Deliver queued notifications and advance animations.
    /// Returns how many callbacks ran.
    pub fn pump(&mut self, page: &mut Page, dt_ms: f64) -> usize {
        self.clock_ms += dt_ms;
        let fired = self.trigger.flush(page);
        page.tick(dt_ms);
        fired
    }

    /// True once nothing is waiting on visibility and no animation runs
    pub fn is_settled(&self, page: &Page) -> bool {
        self.trigger.pending_count() == 0 && page.count_ups.is_empty()
    }

    /// Stop watching; anything not yet revealed stays as it is
    pub fn shutdown(&mut self) {
        self.trigger.teardown();
        self.registrations.clear();
    }
}

fn skip_on_error(selector: &str, registered: Result<RegistrationId, SiteError>) -> Option<RegistrationId> {
    match registered {
        Ok(id) => Some(id),
        Err(err) => {
            tracing::warn!("skipping rule `{}`: {}", selector, err);
            None
        }
    }
}

impl SiteManager<SimulatedPlatform> {
    /// One simulated frame: scroll, recompute intersections, deliver,
    /// animate. Returns how many callbacks ran.
    pub fn frame(&mut self, page: &mut Page, scroll_y: f64, dt_ms: f64) -> usize {
        page.document.scroll_to(scroll_y);
        let now = self.clock_ms + dt_ms;
        self.trigger.platform_mut().update(&page.document, now);
        let fired = self.pump(page, dt_ms);
        if fired > 0 {
            tracing::debug!(
                "frame at scroll {:.0}: {} callback(s), {} pending",
                page.document.viewport().scroll_y,
                fired,
                self.trigger.pending_count()
            );
        }
        fired
    }
}
