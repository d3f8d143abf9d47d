//! reveal-sim - scroll a sample brochure page and log what gets revealed
//!
//! Usage: `reveal-sim [site.toml]`. Set `RUST_LOG=debug` for per-frame detail.

use anyhow::Context;
use reveal_dom::{DOMRect, Document, NodeId};
use reveal_site::{Page, SiteConfig, SiteManager};
use reveal_trigger::SimulatedPlatform;
use tracing_subscriber::EnvFilter;

const VIEWPORT_WIDTH: f64 = 1280.0;
const VIEWPORT_HEIGHT: f64 = 720.0;
const SCROLL_STEP: f64 = 90.0;
const FRAME_MS: f64 = 16.0;

/// Stack blocks vertically, each `height` tall, starting at `y`
fn stack(doc: &mut Document, parent: NodeId, y: &mut f64, height: f64, blocks: &[(&str, &str)]) -> Vec<NodeId> {
    blocks
        .iter()
        .map(|(tag, classes)| {
            let node = doc.append_element(parent, tag, classes);
            doc.set_layout(node, DOMRect::from_xywh(0.0, *y, VIEWPORT_WIDTH, height));
            *y += height;
            node
        })
        .collect()
}

fn sample_page() -> Document {
    let mut doc = Document::new("https://atelier.example/");
    doc.viewport_mut().width = VIEWPORT_WIDTH;
    doc.viewport_mut().height = VIEWPORT_HEIGHT;
    let body = doc.body();
    let mut y = 0.0;

    stack(&mut doc, body, &mut y, 640.0, &[("header", "hero")]);
    stack(
        &mut doc,
        body,
        &mut y,
        360.0,
        &[("div", "service-card"), ("div", "service-card"), ("div", "service-card")],
    );
    stack(&mut doc, body, &mut y, 480.0, &[("section", "about-content")]);

    let images = stack(&mut doc, body, &mut y, 420.0, &[("img", ""), ("img", ""), ("img", "")]);
    for (i, img) in images.into_iter().enumerate() {
        doc.set_attribute(img, "data-src", &format!("img/gallery-{}.jpg", i + 1));
    }

    let cards = stack(
        &mut doc,
        body,
        &mut y,
        300.0,
        &[("div", "pricing-card"), ("div", "pricing-card"), ("div", "pricing-card")],
    );
    for (card, amount) in cards.into_iter().zip(["29", "59", "99.90"]) {
        let price = doc.append_element(card, "span", "price");
        doc.set_attribute(price, "data-target", amount);
        if let Some(rect) = doc.layout(card) {
            doc.set_layout(price, DOMRect::from_xywh(rect.x, rect.y + 100.0, 200.0, 60.0));
        }
    }

    stack(&mut doc, body, &mut y, 280.0, &[("blockquote", "testimonial"), ("blockquote", "testimonial")]);
    stack(
        &mut doc,
        body,
        &mut y,
        240.0,
        &[("div", "instagram-item"), ("div", "instagram-item"), ("div", "instagram-item")],
    );
    stack(&mut doc, body, &mut y, 200.0, &[("footer", "")]);

    doc
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SiteConfig::load(&path).with_context(|| format!("loading site config {path}"))?,
        None => SiteConfig::default(),
    };

    let mut page = Page::new(sample_page());
    let mut site = SiteManager::init(&mut page, config, SimulatedPlatform::new())
        .context("initializing page behaviours")?;

    let max_scroll = page.document.viewport().scroll_height - VIEWPORT_HEIGHT;
    let mut scroll_y = 0.0;
    let mut frames = 0u32;
    let mut total = 0;

    loop {
        let fired = site.frame(&mut page, scroll_y, FRAME_MS);
        if fired > 0 {
            tracing::info!("scroll {:>5.0}px: revealed {} element(s)", scroll_y, fired);
        }
        total += fired;
        frames += 1;

        if scroll_y >= max_scroll && page.count_ups.is_empty() {
            break;
        }
        scroll_y = (scroll_y + SCROLL_STEP).min(max_scroll.max(0.0));
    }

    for price in page.document.query_selector_all(".price", None)? {
        tracing::info!("price {} settled at {}", price, page.document.text_content(price));
    }
    tracing::info!(
        "done after {} frames: {} callback(s), {} still pending",
        frames,
        total,
        site.trigger().pending_count()
    );

    site.shutdown();
    Ok(())
}
