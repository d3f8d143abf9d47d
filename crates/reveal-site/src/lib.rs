//! reveal site - page initializer
//!
//! Wires brochure-page behaviours onto the visibility trigger:
//! scroll reveals (class or inline style), lazy image loading and
//! count-up numbers, all configured from a [`SiteConfig`].

mod config;
mod countup;
mod page;
mod presets;
mod site;

use std::path::PathBuf;

pub use config::{CountUpRule, LazyImageRule, RevealEffect, RevealRule, SiteConfig, trigger_options};
pub use countup::{CountUp, CountUps};
pub use page::Page;
pub use presets::{count_up_numbers, lazy_load_images, reveal_on_scroll};
pub use site::SiteManager;

/// Site initialization errors
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid site config: {0}")]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    Trigger(#[from] reveal_trigger::TriggerError),
    #[error(transparent)]
    Selector(#[from] reveal_dom::SelectorError),
    #[error("invalid base url `{url}`: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
