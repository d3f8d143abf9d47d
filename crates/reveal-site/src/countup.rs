//! Count-up numbers
//!
//! Pricing and stat figures that tick from 0 to their `data-target`
//! once scrolled into view. Progress is linear in elapsed time and the
//! text keeps the target's number of decimal places.

use reveal_dom::{Document, NodeId};

/// Parse a target like `"49"` or `"9.90"` into (value, decimal places).
/// An exponent shifts the decimal places: `"1.5e3"` has none, `"15e-1"` one.
pub fn parse_target(text: &str) -> Option<(f64, usize)> {
    let text = text.trim();
    let value = text.parse::<f64>().ok().filter(|v| v.is_finite())?;
    let (mantissa, exponent) = match text.split_once(['e', 'E']) {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i64>().ok()?),
        None => (text, 0),
    };
    let fraction = mantissa.split_once('.').map(|(_, frac)| frac.len()).unwrap_or(0) as i64;
    let decimals = fraction.saturating_sub(exponent).max(0) as usize;
    Some((value, decimals))
}

/// One running animation
#[derive(Debug, Clone, PartialEq)]
pub struct CountUp {
    pub node: NodeId,
    pub target: f64,
    pub decimals: usize,
    pub elapsed_ms: f64,
    pub duration_ms: f64,
}

impl CountUp {
    pub fn progress(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        }
    }

    pub fn value(&self) -> f64 {
        self.target * self.progress()
    }

    pub fn is_done(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn text(&self) -> String {
        format!("{:.*}", self.decimals, self.value())
    }
}

/// Running count-ups for one page
#[derive(Debug, Default)]
pub struct CountUps {
    running: Vec<CountUp>,
}

impl CountUps {
    /// Start animating `node`. A node already animating is left alone.
    pub fn start(&mut self, doc: &mut Document, node: NodeId, target: f64, decimals: usize, duration_ms: f64) {
        if self.is_running(node) {
            return;
        }
        let anim = CountUp {
            node,
            target,
            decimals,
            elapsed_ms: 0.0,
            duration_ms,
        };
        doc.set_text_content(node, &anim.text());
        if anim.is_done() {
            return;
        }
        tracing::trace!("count-up started on {} toward {}", node, target);
        self.running.push(anim);
    }

    /// Advance every animation and drop the finished ones
    pub fn tick(&mut self, doc: &mut Document, dt_ms: f64) {
        for anim in &mut self.running {
            anim.elapsed_ms += dt_ms.max(0.0);
            doc.set_text_content(anim.node, &anim.text());
        }
        self.running.retain(|a| !a.is_done());
    }

    pub fn is_running(&self, node: NodeId) -> bool {
        self.running.iter().any(|a| a.node == node)
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }
}
