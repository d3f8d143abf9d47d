//! Page behaviours built on the visibility trigger
//!
//! Each preset queries the document once, prepares the initial state
//! and registers a one-shot callback. They are generic over the
//! platform so the same code runs under a real observer, the
//! simulated one, or fail-open.

use reveal_dom::NodeId;
use reveal_trigger::{IntersectionPlatform, RegistrationId, VisibilityTrigger};
use url::Url;

use crate::config::{CountUpRule, LazyImageRule, RevealEffect, RevealRule, trigger_options};
use crate::countup::parse_target;
use crate::{Page, SiteError};

impl RevealEffect {
    /// Hidden state applied at load
    pub fn prepare(&self, page: &mut Page, node: NodeId) {
        match self {
            RevealEffect::AddClass { initial, .. } => {
                if let (Some(initial), Some(classes)) = (initial, page.document.class_list_mut(node)) {
                    classes.add(initial);
                }
            }
            RevealEffect::SetStyle { initial, .. } => {
                for (property, value) in initial {
                    page.document.set_style(node, property, value);
                }
            }
        }
    }

    /// Visible state applied once
    pub fn apply(&self, page: &mut Page, node: NodeId) {
        match self {
            RevealEffect::AddClass { class, .. } => {
                if let Some(classes) = page.document.class_list_mut(node) {
                    classes.add(class);
                }
            }
            RevealEffect::SetStyle { visible, .. } => {
                for (property, value) in visible {
                    page.document.set_style(node, property, value);
                }
            }
        }
    }
}

/// Reveal-on-scroll: hide every match now, show each on first sight
pub fn reveal_on_scroll<P: IntersectionPlatform>(
    trigger: &mut VisibilityTrigger<P, Page>,
    page: &mut Page,
    rule: &RevealRule,
) -> Result<RegistrationId, SiteError> {
    let options = trigger_options(rule.threshold, &rule.root_margin)?;
    let targets = page.document.query_selector_all(&rule.selector, None)?;
    for &node in &targets {
        rule.effect.prepare(page, node);
    }
    tracing::debug!("reveal `{}`: {} element(s)", rule.selector, targets.len());

    let effect = rule.effect.clone();
    Ok(trigger.register(page, targets, &options, move |page: &mut Page, node| {
        effect.apply(page, node);
    }))
}

/// Swap the deferred source into `src` once the image is near the viewport.
///
/// Each image is handled once. An image whose source attribute is missing
/// or unresolvable at that moment is left untouched and is not watched
/// again, so a source added afterwards is never loaded.
pub fn lazy_load_images<P: IntersectionPlatform>(
    trigger: &mut VisibilityTrigger<P, Page>,
    page: &mut Page,
    rule: &LazyImageRule,
    base: &Url,
) -> Result<RegistrationId, SiteError> {
    let options = trigger_options(rule.threshold, &rule.root_margin)?;
    let images = page.document.query_selector_all(&rule.selector, None)?;
    tracing::debug!("lazy images `{}`: {} element(s)", rule.selector, images.len());

    let rule = rule.clone();
    let base = base.clone();
    Ok(trigger.register(page, images, &options, move |page: &mut Page, img| {
        load_image(page, img, &rule, &base);
    }))
}

fn load_image(page: &mut Page, img: NodeId, rule: &LazyImageRule, base: &Url) {
    let Some(source) = page.document.get_attribute(img, &rule.source_attribute) else {
        tracing::debug!("image {} has no {}", img, rule.source_attribute);
        return;
    };
    let resolved = match base.join(&source) {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!("cannot resolve image source `{}` for {}: {}", source, img, err);
            return;
        }
    };
    page.document.set_attribute(img, "src", resolved.as_str());
    if let Some(classes) = page.document.class_list_mut(img) {
        classes.add(&rule.loaded_class);
    }
    tracing::debug!("loaded image {} from {}", img, resolved);
}

/// Count numbers up from zero once they are in view. Elements without a
/// numeric target are left alone.
pub fn count_up_numbers<P: IntersectionPlatform>(
    trigger: &mut VisibilityTrigger<P, Page>,
    page: &mut Page,
    rule: &CountUpRule,
) -> Result<RegistrationId, SiteError> {
    let options = trigger_options(rule.threshold, &rule.root_margin)?;
    let candidates = page.document.query_selector_all(&rule.selector, None)?;

    let mut targets = Vec::with_capacity(candidates.len());
    for node in candidates {
        let attr = page.document.get_attribute(node, &rule.target_attribute);
        match attr.as_deref().and_then(parse_target) {
            Some((_, decimals)) => {
                page.document.set_text_content(node, &format!("{:.*}", decimals, 0.0));
                targets.push(node);
            }
            None => tracing::warn!("{} has no numeric {}; skipping count-up", node, rule.target_attribute),
        }
    }
    tracing::debug!("count-up `{}`: {} element(s)", rule.selector, targets.len());

    let attribute = rule.target_attribute.clone();
    let duration_ms = rule.duration_ms as f64;
    Ok(trigger.register(page, targets, &options, move |page: &mut Page, node| {
        let Some((target, decimals)) = page
            .document
            .get_attribute(node, &attribute)
            .as_deref()
            .and_then(parse_target)
        else {
            return;
        };
        let duration = if page.reduce_motion { 0.0 } else { duration_ms };
        page.count_ups.start(&mut page.document, node, target, decimals, duration);
    }))
}
