//! Geometry APIs
//!
//! DOMRect and the scrollable viewport. All rects are in document
//! coordinates; the viewport maps them to what is on screen.

/// DOMRect - rectangle geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DOMRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DOMRect {
    /// Create with dimensions
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Top edge (same as y)
    pub fn top(&self) -> f64 {
        self.y
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Left edge (same as x)
    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Check if point is inside
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Check if rects intersect. Touching edges count, so zero-area
    /// rects lying on the boundary still intersect.
    pub fn intersects(&self, other: &DOMRect) -> bool {
        !(self.right() < other.x
            || self.x > other.right()
            || self.bottom() < other.y
            || self.y > other.bottom())
    }

    /// Get intersection rect
    pub fn intersection(&self, other: &DOMRect) -> Option<DOMRect> {
        if !self.intersects(other) {
            return None;
        }

        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        Some(DOMRect::from_xywh(x, y, right - x, bottom - y))
    }

    /// Grow each edge outward by the given amounts (negative shrinks).
    /// A rect shrunk past zero collapses to zero size.
    pub fn outset(&self, top: f64, right: f64, bottom: f64, left: f64) -> DOMRect {
        DOMRect::from_xywh(
            self.x - left,
            self.y - top,
            (self.width + left + right).max(0.0),
            (self.height + top + bottom).max(0.0),
        )
    }
}

/// The visible window onto the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
    /// Total scrollable content size
    pub scroll_width: f64,
    pub scroll_height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
            scroll_width: width,
            scroll_height: height,
        }
    }

    /// Visible region in document coordinates
    pub fn rect(&self) -> DOMRect {
        DOMRect::from_xywh(self.scroll_x, self.scroll_y, self.width, self.height)
    }

    /// Scroll to position, clamped to the content size
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.scroll_x = x.min(self.scroll_width - self.width).max(0.0);
        self.scroll_y = y.min(self.scroll_height - self.height).max(0.0);
    }

    /// Scroll by amount
    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.scroll_to(self.scroll_x + dx, self.scroll_y + dy);
    }
}
