//! Page lifecycle tests - config → initialization → scrolling

use reveal_dom::{DOMRect, Document, NodeId};
use reveal_site::{Page, RevealEffect, RevealRule, SiteConfig, SiteManager};
use reveal_trigger::{NoIntersection, SimulatedPlatform};

struct Fixture {
    page: Page,
    cards: Vec<NodeId>,
    image: NodeId,
    price: NodeId,
}

/// Cards every 500px, an image at 2200px, a price at 2700px;
/// 600px viewport over 3000px of content.
fn fixture() -> Fixture {
    let mut doc = Document::new("https://example.com/fr/");
    doc.viewport_mut().height = 600.0;
    let body = doc.body();

    let cards: Vec<NodeId> = (0..4)
        .map(|i| {
            let card = doc.append_element(body, "div", "service-card");
            doc.set_layout(card, DOMRect::from_xywh(0.0, 500.0 * i as f64, 400.0, 300.0));
            card
        })
        .collect();

    let image = doc.append_element(body, "img", "");
    doc.set_attribute(image, "data-src", "../img/team.webp");
    doc.set_layout(image, DOMRect::from_xywh(0.0, 2200.0, 400.0, 400.0));

    let pricing = doc.append_element(body, "div", "pricing-card");
    let price = doc.append_element(pricing, "span", "price");
    doc.set_attribute(price, "data-target", "90");
    doc.set_layout(pricing, DOMRect::from_xywh(0.0, 2600.0, 400.0, 400.0));
    doc.set_layout(price, DOMRect::from_xywh(0.0, 2700.0, 100.0, 50.0));

    Fixture {
        page: Page::new(doc),
        cards,
        image,
        price,
    }
}

fn visible(page: &Page, node: NodeId) -> bool {
    page.document.has_class(node, "visible")
}

#[test]
fn test_scroll_reveals_progressively() {
    let Fixture { mut page, cards, image, price } = fixture();
    let mut site = SiteManager::init(&mut page, SiteConfig::default(), SimulatedPlatform::new()).unwrap();

    // nothing happens before the first frame
    assert!(!visible(&page, cards[0]));
    assert!(page.document.has_class(cards[0], "fade-in"));
    assert_eq!(page.document.text_content(price), "0");

    site.frame(&mut page, 0.0, 16.0);
    assert!(visible(&page, cards[0]));
    assert!(visible(&page, cards[1]));
    assert!(!visible(&page, cards[2]));

    site.frame(&mut page, 1200.0, 16.0);
    assert!(visible(&page, cards[2]));
    assert!(visible(&page, cards[3]));
    assert_eq!(page.document.get_attribute(image, "src"), None);

    site.frame(&mut page, 2400.0, 16.0);
    assert_eq!(
        page.document.get_attribute(image, "src").as_deref(),
        Some("https://example.com/img/team.webp")
    );
    assert!(page.document.has_class(image, "loaded"));
    assert!(page.count_ups.is_running(price));

    for _ in 0..100 {
        site.frame(&mut page, 2400.0, 16.0);
    }
    assert_eq!(page.document.text_content(price), "90");
    assert!(site.is_settled(&page));
}

#[test]
fn test_scrolling_back_and_forth_fires_once() {
    let Fixture { mut page, cards, .. } = fixture();
    let mut site = SiteManager::init(&mut page, SiteConfig::default(), SimulatedPlatform::new()).unwrap();

    let mut fired = 0;
    for scroll in [0.0, 1200.0, 0.0, 1200.0, 0.0, 2400.0, 0.0] {
        fired += site.frame(&mut page, scroll, 16.0);
    }
    // 4 cards, 1 image, 1 price: each exactly once
    assert_eq!(fired, 6);
    assert!(cards.iter().all(|&c| visible(&page, c)));

    // a removed class is not re-added: the element is done
    page.document.class_list_mut(cards[0]).unwrap().remove("visible");
    site.frame(&mut page, 500.0, 16.0);
    site.frame(&mut page, 0.0, 16.0);
    assert!(!visible(&page, cards[0]));
}

#[test]
fn test_fail_open_reveals_everything_at_init() {
    let Fixture { mut page, cards, image, price } = fixture();
    let mut site = SiteManager::init(&mut page, SiteConfig::default(), NoIntersection).unwrap();

    assert!(cards.iter().all(|&c| visible(&page, c)));
    assert!(page.document.has_class(image, "loaded"));
    assert!(page.count_ups.is_running(price));
    assert_eq!(site.trigger().pending_count(), 0);

    site.pump(&mut page, 5000.0);
    assert_eq!(page.document.text_content(price), "90");
}

#[test]
fn test_shutdown_stops_pending_reveals() {
    let Fixture { mut page, cards, image, .. } = fixture();
    let mut site = SiteManager::init(&mut page, SiteConfig::default(), SimulatedPlatform::new()).unwrap();
    site.frame(&mut page, 0.0, 16.0);

    site.shutdown();
    assert!(site.registrations().is_empty());
    assert_eq!(site.trigger().watcher_count(), 0);

    let fired = site.frame(&mut page, 2400.0, 16.0);
    assert_eq!(fired, 0);
    assert!(visible(&page, cards[0]));
    assert!(!visible(&page, cards[3]));
    assert_eq!(page.document.get_attribute(image, "src"), None);
}

#[test]
fn test_rules_with_equal_options_share_a_watcher() {
    let Fixture { mut page, .. } = fixture();
    let config = SiteConfig {
        reveal: vec![
            RevealRule::default(),
            RevealRule {
                selector: ".pricing-card".into(),
                effect: RevealEffect::AddClass {
                    initial: None,
                    class: "shown".into(),
                },
                ..RevealRule::default()
            },
        ],
        count_up: Vec::new(),
        ..SiteConfig::default()
    };
    let site = SiteManager::init(&mut page, config, SimulatedPlatform::new()).unwrap();

    // both reveal rules and the lazy image rule use 0.1 / 0px
    assert_eq!(site.registrations().len(), 3);
    assert_eq!(site.trigger().watcher_count(), 1);
    assert_eq!(site.trigger().platform().watcher_count(), 1);
}

#[test]
fn test_reduced_motion_applies_effects_immediately() {
    let Fixture { mut page, cards, image, price } = fixture();
    let config = SiteConfig::from_toml_str("reduce_motion = true").unwrap();
    let mut site = SiteManager::init(&mut page, config, SimulatedPlatform::new()).unwrap();

    let root = page.document.document_element();
    assert!(page.document.has_class(root, "reduce-motion"));
    assert!(cards.iter().all(|&c| visible(&page, c)));
    assert_eq!(page.document.text_content(price), "90");

    // lazy loading still waits for the image to come into view
    assert_eq!(site.trigger().pending_count(), 1);
    site.frame(&mut page, 2000.0, 16.0);
    assert!(page.document.has_class(image, "loaded"));
}

#[test]
fn test_invalid_config_is_rejected_at_init() {
    let Fixture { mut page, .. } = fixture();
    let config = SiteConfig {
        base_url: Some("::nope".into()),
        ..SiteConfig::default()
    };
    assert!(SiteManager::init(&mut page, config, SimulatedPlatform::new()).is_err());
}

#[test]
fn test_bad_rule_is_skipped_and_the_rest_still_apply() {
    let Fixture { mut page, cards, image, .. } = fixture();
    let config = SiteConfig {
        reveal: vec![
            RevealRule {
                selector: ".service-card".into(),
                threshold: 1.5,
                effect: RevealEffect::AddClass {
                    initial: Some("hidden".into()),
                    class: "never".into(),
                },
                ..RevealRule::default()
            },
            RevealRule::default(),
        ],
        count_up: Vec::new(),
        ..SiteConfig::default()
    };
    let mut site = SiteManager::init(&mut page, config, SimulatedPlatform::new()).unwrap();

    // the bad rule left no trace; the default reveal and lazy images are live
    assert_eq!(site.registrations().len(), 2);
    assert!(!page.document.has_class(cards[0], "hidden"));

    site.frame(&mut page, 0.0, 16.0);
    assert!(visible(&page, cards[0]));
    assert!(!page.document.has_class(cards[0], "never"));

    site.frame(&mut page, 2400.0, 16.0);
    assert!(page.document.has_class(image, "loaded"));
}
