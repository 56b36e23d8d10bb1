//! Line-based list engine for the terminal
//!
//! Content is a column of lines; the offset counts lines away from the anchor
//! edge. In an inverted pane the anchor is the bottom (newest message), so
//! offset 0 shows the newest lines and the "end" of the content is the top.

use crate::container::{EndReachedSignal, ListEngine, ScrollMetrics};

/// Which end-reached shape this engine reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndReachedMode {
    /// Report the remaining distance with every signal
    #[default]
    WithDistance,
    /// Report bare signals
    NoDistance,
}

/// Fraction of the viewport that counts as "near the end"
const END_REACHED_THRESHOLD: f64 = 0.1;

/// Scroll physics for a column of terminal lines
#[derive(Debug, Clone, Default)]
pub struct TerminalList {
    total_lines: usize,
    viewport: usize,
    offset: usize,
    mode: EndReachedMode,
    /// Set while inside the end zone so each visit signals once
    in_end_zone: bool,
}

impl TerminalList {
    pub fn new(mode: EndReachedMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Update content and viewport sizes. Returns true if either changed.
    pub fn set_layout(&mut self, total_lines: usize, viewport: u16) -> bool {
        let viewport = viewport as usize;
        let changed = self.total_lines != total_lines || self.viewport != viewport;
        self.total_lines = total_lines;
        self.viewport = viewport;
        self.offset = self.offset.min(self.max_offset());
        changed
    }

    pub fn max_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.viewport)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    /// Move away from (positive) or toward (negative) the anchor edge.
    /// Returns the new metrics if the offset actually moved.
    pub fn scroll_by(&mut self, delta: isize) -> Option<ScrollMetrics> {
        let target = if delta.is_negative() {
            self.offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.offset.saturating_add(delta as usize)
        }
        .min(self.max_offset());

        if target == self.offset {
            return None;
        }
        self.offset = target;
        Some(self.metrics())
    }

    /// Keep the same content on screen after `added` lines were inserted
    /// before the current window (non-inverted prepend)
    pub fn shift_for_prepend(&mut self, added: usize) {
        self.offset = (self.offset + added).min(self.max_offset());
    }

    pub fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics::new(
            self.offset as f64,
            self.total_lines as f64,
            self.viewport as f64,
        )
    }

    pub fn distance_from_end(&self) -> f64 {
        (self.max_offset() - self.offset) as f64
    }

    /// Emit an end-reached signal when entering the end zone
    pub fn poll_end_reached(&mut self) -> Option<EndReachedSignal> {
        let zone = (self.viewport as f64 * END_REACHED_THRESHOLD).max(1.0);
        let distance = self.distance_from_end();
        let inside = self.total_lines > 0 && distance <= zone;

        let entered = inside && !self.in_end_zone;
        self.in_end_zone = inside;
        if !entered {
            return None;
        }
        Some(match self.mode {
            EndReachedMode::WithDistance => EndReachedSignal::WithDistance(distance),
            EndReachedMode::NoDistance => EndReachedSignal::NoDistance,
        })
    }

    /// Forget the end-zone latch, e.g. after new content arrived at the end
    pub fn rearm_end_reached(&mut self) {
        self.in_end_zone = false;
    }
}

impl ListEngine for TerminalList {
    fn scroll_to_offset(&mut self, offset: f64, _animated: bool) {
        let offset = if offset.is_finite() && offset > 0.0 {
            offset as usize
        } else {
            0
        };
        self.offset = offset.min(self.max_offset());
    }

    fn scroll_to_end(&mut self, _animated: bool) {
        self.offset = self.max_offset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(total: usize, viewport: u16) -> TerminalList {
        let mut list = TerminalList::new(EndReachedMode::WithDistance);
        list.set_layout(total, viewport);
        list
    }

    #[test]
    fn test_scroll_clamps() {
        let mut l = list(50, 20);
        assert_eq!(l.scroll_by(100).unwrap().offset, 30.0);
        assert!(l.scroll_by(1).is_none());
        assert_eq!(l.scroll_by(-100).unwrap().offset, 0.0);
        assert!(l.scroll_by(-1).is_none());
    }

    #[test]
    fn test_metrics() {
        let mut l = list(50, 20);
        l.scroll_by(5);
        assert_eq!(l.metrics(), ScrollMetrics::new(5.0, 50.0, 20.0));
    }

    #[test]
    fn test_commands() {
        let mut l = list(50, 20);
        l.scroll_to_end(false);
        assert_eq!(l.offset(), 30);
        l.scroll_to_offset(0.0, true);
        assert_eq!(l.offset(), 0);
        l.scroll_to_offset(1e9, true);
        assert_eq!(l.offset(), 30);
    }

    #[test]
    fn test_layout_shrink_clamps_offset() {
        let mut l = list(50, 20);
        l.scroll_to_end(false);
        assert!(l.set_layout(25, 20));
        assert_eq!(l.offset(), 5);
        assert!(!l.set_layout(25, 20));
    }

    #[test]
    fn test_end_reached_signals_once_per_visit() {
        let mut l = list(50, 20);
        assert_eq!(l.poll_end_reached(), None);

        l.scroll_by(29);
        assert_eq!(l.poll_end_reached(), Some(EndReachedSignal::WithDistance(1.0)));
        l.scroll_by(1);
        assert_eq!(l.poll_end_reached(), None);

        l.scroll_by(-10);
        assert_eq!(l.poll_end_reached(), None);
        l.scroll_by(10);
        assert_eq!(l.poll_end_reached(), Some(EndReachedSignal::WithDistance(0.0)));
    }

    #[test]
    fn test_short_content_is_at_end() {
        let mut l = TerminalList::new(EndReachedMode::NoDistance);
        l.set_layout(5, 20);
        assert_eq!(l.poll_end_reached(), Some(EndReachedSignal::NoDistance));
    }

    #[test]
    fn test_shift_for_prepend() {
        let mut l = list(50, 20);
        l.scroll_by(3);
        l.set_layout(60, 20);
        l.shift_for_prepend(10);
        assert_eq!(l.offset(), 13);
    }
}
