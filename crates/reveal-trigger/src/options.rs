//! Trigger configuration: threshold, root margin and the watcher key.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use reveal_dom::{DOMRect, NodeId};

use crate::TriggerError;

/// Minimum visible fraction of an element, in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    /// 10% of the element in view
    pub const DEFAULT: Threshold = Threshold(0.1);

    pub fn new(value: f64) -> Result<Self, TriggerError> {
        if !(0.0..=1.0).contains(&value) {
            // NaN fails the range check too
            return Err(TriggerError::InvalidThreshold(value));
        }
        // -0.0 and 0.0 must share a key
        Ok(Threshold(value + 0.0))
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// Construction rules out NaN, so bitwise equality is total.
impl Eq for Threshold {}

impl Hash for Threshold {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// One root margin component
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f64),
    /// Percentage of the root box along the same axis
    Percent(f64),
}

impl Length {
    fn resolve(self, basis: f64) -> f64 {
        match self {
            Length::Px(px) => px,
            Length::Percent(pct) => basis * pct / 100.0,
        }
    }

    fn parse(token: &str) -> Option<Length> {
        let number = |s: &str| s.parse::<f64>().ok().filter(|v| v.is_finite());
        if let Some(px) = token.strip_suffix("px") {
            number(px).map(Length::Px)
        } else if let Some(pct) = token.strip_suffix('%') {
            number(pct).map(Length::Percent)
        } else {
            number(token).filter(|v| *v == 0.0).map(|_| Length::Px(0.0))
        }
    }

    fn key_bits(self) -> (u8, u64) {
        match self {
            Length::Px(v) => (0, (v + 0.0).to_bits()),
            Length::Percent(v) => (1, (v + 0.0).to_bits()),
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(v) => write!(f, "{v}px"),
            Length::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// Offsets applied to the root box before testing intersection,
/// in CSS margin order (top, right, bottom, left). Positive values
/// grow the box so elements trigger before they are on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl RootMargin {
    pub const ZERO: RootMargin = RootMargin::uniform(Length::Px(0.0));

    pub const fn uniform(len: Length) -> Self {
        Self {
            top: len,
            right: len,
            bottom: len,
            left: len,
        }
    }

    /// Parse CSS margin shorthand with one to four `px`/`%` values
    pub fn parse(s: &str) -> Result<Self, TriggerError> {
        let err = || TriggerError::InvalidRootMargin(s.to_string());
        let parts = s
            .split_whitespace()
            .map(Length::parse)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(err)?;

        let (top, right, bottom, left) = match parts.as_slice() {
            [a] => (*a, *a, *a, *a),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            _ => return Err(err()),
        };
        Ok(Self { top, right, bottom, left })
    }

    /// Expand `root` by this margin
    pub fn apply(&self, root: DOMRect) -> DOMRect {
        root.outset(
            self.top.resolve(root.height),
            self.right.resolve(root.width),
            self.bottom.resolve(root.height),
            self.left.resolve(root.width),
        )
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for RootMargin {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

// Parsing rejects non-finite lengths, so bitwise equality is total.
impl Eq for RootMargin {}

impl Hash for RootMargin {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for len in [self.top, self.right, self.bottom, self.left] {
            len.key_bits().hash(state);
        }
    }
}

/// Options for one `register` call.
///
/// `threshold` is kept raw so that out-of-range values can be turned
/// into a no-op registration instead of an error.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerOptions {
    pub threshold: f64,
    pub root_margin: RootMargin,
    /// Scroll container to test against; `None` = the viewport
    pub root: Option<NodeId>,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self {
            threshold: Threshold::DEFAULT.value(),
            root_margin: RootMargin::ZERO,
            root: None,
        }
    }
}

impl TriggerOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_root_margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }

    pub fn with_root(mut self, root: NodeId) -> Self {
        self.root = Some(root);
        self
    }

    /// Validate into the key identifying a shared watcher
    pub fn key(&self) -> Result<WatcherKey, TriggerError> {
        Ok(WatcherKey {
            threshold: Threshold::new(self.threshold)?,
            root_margin: self.root_margin,
            root: self.root,
        })
    }
}

/// Identity of one underlying platform watcher. Registrations with
/// equal keys share a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherKey {
    pub threshold: Threshold,
    pub root_margin: RootMargin,
    pub root: Option<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_threshold_range() {
        assert!(Threshold::new(0.0).is_ok());
        assert!(Threshold::new(1.0).is_ok());
        assert_eq!(Threshold::new(1.5), Err(TriggerError::InvalidThreshold(1.5)));
        assert!(Threshold::new(-0.1).is_err());
        assert!(Threshold::new(f64::NAN).is_err());
        assert_eq!(Threshold::new(-0.0).unwrap(), Threshold::new(0.0).unwrap());
    }

    #[test]
    fn test_root_margin_shorthand() {
        let one = RootMargin::parse("50px").unwrap();
        assert_eq!(one, RootMargin::uniform(Length::Px(50.0)));

        let two = RootMargin::parse("10px 5%").unwrap();
        assert_eq!(two.top, Length::Px(10.0));
        assert_eq!(two.left, Length::Percent(5.0));

        let three = RootMargin::parse("1px 2px 3px").unwrap();
        assert_eq!((three.bottom, three.left), (Length::Px(3.0), Length::Px(2.0)));

        assert_eq!(RootMargin::parse("0").unwrap(), RootMargin::ZERO);
        assert_eq!("0px".parse::<RootMargin>().unwrap(), RootMargin::ZERO);
    }

    #[test]
    fn test_root_margin_rejects_garbage() {
        for bad in ["", "10", "10em", "1px 2px 3px 4px 5px", "NaNpx", "infpx"] {
            assert!(RootMargin::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_root_margin_apply() {
        let root = DOMRect::from_xywh(0.0, 200.0, 1000.0, 500.0);
        let margin = RootMargin::parse("10% -50px").unwrap();
        assert_eq!(margin.apply(root), DOMRect::from_xywh(50.0, 150.0, 900.0, 600.0));
    }

    #[test]
    fn test_equal_options_share_a_key() {
        let a = TriggerOptions::default().key().unwrap();
        let b = TriggerOptions::default()
            .with_root_margin(RootMargin::parse("0px 0px").unwrap())
            .key()
            .unwrap();
        let c = TriggerOptions::default().with_threshold(0.5).key().unwrap();

        let keys: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(keys.len(), 2);
    }
}
