//! Initial scroll-to-end for non-inverted panes
//!
//! A non-inverted pane starts at the top of the content, so once the engine
//! has laid out a new collection we scroll to the newest message. The engine
//! gives no reliable "rows measured" signal, so the scroll waits a delay
//! proportional to the message count. Under-estimating produces a visible
//! jump; that is a known limitation of the heuristic.

use super::scheduler::{Scheduler, TimerId};
use super::PaneTask;
use crate::config::SettleConfig;

/// Schedules at most one scroll-to-end per collection change
#[derive(Debug)]
pub struct LayoutSettler {
    settle: SettleConfig,
    /// Bumped on every collection change
    generation: u64,
    /// Generation that already got its scroll scheduled
    settled_generation: u64,
    pending: Option<TimerId>,
}

impl LayoutSettler {
    pub fn new(settle: SettleConfig) -> Self {
        // generation 1 vs settled 0: the initial data counts as a change
        Self {
            settle,
            generation: 1,
            settled_generation: 0,
            pending: None,
        }
    }

    /// Record that the message collection changed
    pub fn collection_changed(&mut self) {
        self.generation += 1;
    }

    /// Handle the engine's layout-settled callback
    ///
    /// Returns the timer scheduled, if any.
    pub fn on_layout(
        &mut self,
        inverted: bool,
        message_count: usize,
        scheduler: &mut Scheduler<PaneTask>,
    ) -> Option<TimerId> {
        if self.settled_generation == self.generation {
            return None;
        }
        self.settled_generation = self.generation;

        if inverted || message_count == 0 {
            return None;
        }

        if let Some(previous) = self.pending.take() {
            scheduler.cancel(previous);
        }
        let delay = self.settle.delay_for(message_count);
        let id = scheduler.schedule(delay, PaneTask::SettleScroll);
        self.pending = Some(id);
        tracing::debug!(
            delay_ms = delay.as_millis() as u64,
            message_count,
            "layout settled, scheduling scroll to end"
        );
        Some(id)
    }

    /// Called when the settle timer fires. True if it is the current one.
    pub fn on_elapsed(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn pending(&self) -> Option<TimerId> {
        self.pending
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
    }
}
