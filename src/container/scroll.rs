//! Scroll coordination
//!
//! Turns raw scroll events into the two pieces of view state the pane cares
//! about: whether to offer the scroll-to-bottom affordance, and whether the
//! user has scrolled at all since mount.

use serde::{Deserialize, Serialize};

/// Geometry reported with a scroll event
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollMetrics {
    /// Current scroll offset. In inverted panes 0 is the newest message.
    pub offset: f64,
    /// Total extent of the scrollable content
    pub content_extent: f64,
    /// Extent of the visible viewport
    pub viewport_extent: f64,
}

impl ScrollMetrics {
    pub fn new(offset: f64, content_extent: f64, viewport_extent: f64) -> Self {
        Self {
            offset,
            content_extent,
            viewport_extent,
        }
    }

    /// How far the content can scroll at most
    pub fn scrollable_extent(&self) -> f64 {
        self.content_extent - self.viewport_extent
    }
}

/// Derived state after a scroll event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollOutcome {
    pub show_scroll_to_bottom: bool,
    pub has_scrolled: bool,
}

/// Tracks scroll-derived view state for one mounted pane
#[derive(Debug, Clone, Default)]
pub struct ScrollCoordinator {
    show_scroll_to_bottom: bool,
    has_scrolled: bool,
}

impl ScrollCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one scroll event
    ///
    /// Inverted: the affordance shows once the offset passes `threshold`.
    /// Otherwise it shows while the offset is under `threshold`, but only if
    /// there is more than `threshold` worth of content to scroll through.
    pub fn on_scroll(
        &mut self,
        metrics: ScrollMetrics,
        inverted: bool,
        threshold: f64,
    ) -> ScrollOutcome {
        self.show_scroll_to_bottom = if inverted {
            metrics.offset > threshold
        } else {
            metrics.offset < threshold && metrics.scrollable_extent() > threshold
        };
        self.has_scrolled = true;

        tracing::trace!(
            offset = metrics.offset,
            inverted,
            show = self.show_scroll_to_bottom,
            "scroll event"
        );

        self.outcome()
    }

    pub fn show_scroll_to_bottom(&self) -> bool {
        self.show_scroll_to_bottom
    }

    pub fn has_scrolled(&self) -> bool {
        self.has_scrolled
    }

    pub fn outcome(&self) -> ScrollOutcome {
        ScrollOutcome {
            show_scroll_to_bottom: self.show_scroll_to_bottom,
            has_scrolled: self.has_scrolled,
        }
    }
}
