//! Site configuration
//!
//! Which selectors get which one-shot effect, loaded from TOML. Every
//! field has a default, so an empty file reproduces the stock page
//! script.

use std::collections::BTreeMap;
use std::path::Path;

use reveal_trigger::{RootMargin, Threshold, TriggerOptions};
use serde::Deserialize;

use crate::SiteError;

fn default_threshold() -> f64 {
    Threshold::DEFAULT.value()
}

fn default_root_margin() -> String {
    "0px".to_string()
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Base for resolving lazy image sources; the document URL if unset
    pub base_url: Option<String>,
    /// Apply reveal effects and count-ups immediately
    pub reduce_motion: bool,
    pub reveal: Vec<RevealRule>,
    pub lazy_images: Option<LazyImageRule>,
    pub count_up: Vec<CountUpRule>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            reduce_motion: false,
            reveal: vec![RevealRule::default()],
            lazy_images: Some(LazyImageRule::default()),
            count_up: vec![CountUpRule::default()],
        }
    }
}

impl SiteConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, SiteError> {
        let config: SiteConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SiteError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SiteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(
            "loaded {} reveal rule(s), {} count-up rule(s) from {}",
            config.reveal.len(),
            config.count_up.len(),
            path.display()
        );
        Ok(config)
    }

    /// Check every rule's selector and trigger options up front
    pub fn validate(&self) -> Result<(), SiteError> {
        for rule in &self.reveal {
            reveal_dom::SelectorList::parse(&rule.selector)?;
            trigger_options(rule.threshold, &rule.root_margin)?;
        }
        if let Some(rule) = &self.lazy_images {
            reveal_dom::SelectorList::parse(&rule.selector)?;
            trigger_options(rule.threshold, &rule.root_margin)?;
        }
        for rule in &self.count_up {
            reveal_dom::SelectorList::parse(&rule.selector)?;
            trigger_options(rule.threshold, &rule.root_margin)?;
        }
        if let Some(base) = &self.base_url {
            url::Url::parse(base).map_err(|source| SiteError::Url {
                url: base.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Strict conversion of raw rule fields into trigger options
pub fn trigger_options(threshold: f64, root_margin: &str) -> Result<TriggerOptions, SiteError> {
    let threshold = Threshold::new(threshold)?;
    let root_margin = RootMargin::parse(root_margin)?;
    Ok(TriggerOptions::default()
        .with_threshold(threshold.value())
        .with_root_margin(root_margin))
}

/// What happens to an element the first time it is seen
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RevealEffect {
    /// Add `initial` at load, add `class` when visible
    AddClass {
        #[serde(default)]
        initial: Option<String>,
        class: String,
    },
    /// Inline styles at load and when visible
    SetStyle {
        #[serde(default)]
        initial: BTreeMap<String, String>,
        visible: BTreeMap<String, String>,
    },
}

impl Default for RevealEffect {
    fn default() -> Self {
        RevealEffect::AddClass {
            initial: Some("fade-in".to_string()),
            class: "visible".to_string(),
        }
    }
}

/// Reveal-on-scroll rule
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevealRule {
    pub selector: String,
    pub threshold: f64,
    pub root_margin: String,
    pub effect: RevealEffect,
}

impl Default for RevealRule {
    fn default() -> Self {
        Self {
            selector: ".service-card, .testimonial, .about-content, .instagram-item".to_string(),
            threshold: default_threshold(),
            root_margin: default_root_margin(),
            effect: RevealEffect::default(),
        }
    }
}

/// Lazy image loading rule
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LazyImageRule {
    pub selector: String,
    /// Attribute holding the deferred source
    pub source_attribute: String,
    pub loaded_class: String,
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for LazyImageRule {
    fn default() -> Self {
        Self {
            selector: "img[data-src]".to_string(),
            source_attribute: "data-src".to_string(),
            loaded_class: "loaded".to_string(),
            threshold: default_threshold(),
            root_margin: default_root_margin(),
        }
    }
}

/// Count-up number rule (pricing cards)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CountUpRule {
    pub selector: String,
    /// Attribute holding the final number
    pub target_attribute: String,
    pub duration_ms: u64,
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for CountUpRule {
    fn default() -> Self {
        Self {
            selector: ".pricing-card [data-target]".to_string(),
            target_attribute: "data-target".to_string(),
            duration_ms: 1500,
            threshold: 0.5,
            root_margin: default_root_margin(),
        }
    }
}
