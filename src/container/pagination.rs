//! Earlier-page pagination on end-reached signals
//!
//! Engines report "near the end" in one of two shapes: a bare signal, or one
//! carrying the distance left to the end. Distance-carrying signals are
//! evaluated and fired on the spot. Bare signals arrive in bursts, so they
//! go through a trailing debounce: each qualifying signal restarts the
//! window and only the last one fires.

use std::fmt;
use std::time::Duration;

use super::scheduler::{Scheduler, TimerId};
use super::PaneTask;

/// End-reached notification from the list engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EndReachedSignal {
    /// The engine only says the end was reached
    NoDistance,
    /// The engine reports how far the viewport is from the end
    WithDistance(f64),
}

/// Everything outside the trigger that gates a page load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaginationInputs {
    pub infinite_scroll: bool,
    pub has_scrolled: bool,
    pub load_earlier: bool,
    pub has_callback: bool,
    pub is_loading_earlier: bool,
    pub host_allows: bool,
}

/// Why a signal did not load a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    InfiniteScrollDisabled,
    HostDisabled,
    LoadEarlierDisabled,
    NoCallback,
    AlreadyLoading,
    /// No scroll yet and no positive distance: the mount-time spurious signal
    NotScrolled,
    TooFarFromEnd(f64),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InfiniteScrollDisabled => f.write_str("infinite scroll disabled"),
            SkipReason::HostDisabled => f.write_str("host disables end-reached pagination"),
            SkipReason::LoadEarlierDisabled => f.write_str("load earlier disabled"),
            SkipReason::NoCallback => f.write_str("no load-earlier callback"),
            SkipReason::AlreadyLoading => f.write_str("load already in flight"),
            SkipReason::NotScrolled => f.write_str("user has not scrolled"),
            SkipReason::TooFarFromEnd(d) => write!(f, "distance {} beyond threshold", d),
        }
    }
}

/// Outcome of feeding a signal to the trigger
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerDecision {
    /// Invoke the load-earlier callback now
    Fire,
    /// A debounce window was (re)started
    Debounced(TimerId),
    Skipped(SkipReason),
}

/// Decides when an end-reached signal becomes a load-earlier call
#[derive(Debug)]
pub struct PaginationTrigger {
    proximity_threshold: f64,
    debounce_window: Duration,
    pending: Option<TimerId>,
}

impl PaginationTrigger {
    pub fn new(proximity_threshold: f64, debounce_window: Duration) -> Self {
        Self {
            proximity_threshold,
            debounce_window,
            pending: None,
        }
    }

    /// Check every gate for `signal` without touching any state
    pub fn evaluate(
        &self,
        signal: EndReachedSignal,
        inputs: &PaginationInputs,
    ) -> Result<(), SkipReason> {
        if !inputs.infinite_scroll {
            return Err(SkipReason::InfiniteScrollDisabled);
        }
        if !inputs.host_allows {
            return Err(SkipReason::HostDisabled);
        }
        if !inputs.load_earlier {
            return Err(SkipReason::LoadEarlierDisabled);
        }
        if !inputs.has_callback {
            return Err(SkipReason::NoCallback);
        }
        if inputs.is_loading_earlier {
            return Err(SkipReason::AlreadyLoading);
        }
        match signal {
            EndReachedSignal::NoDistance => {
                if !inputs.has_scrolled {
                    return Err(SkipReason::NotScrolled);
                }
            }
            EndReachedSignal::WithDistance(distance) => {
                // distance == 0 is the engine's mount-time firing, not a real one
                if !(inputs.has_scrolled || distance > 0.0) {
                    return Err(SkipReason::NotScrolled);
                }
                if distance > self.proximity_threshold {
                    return Err(SkipReason::TooFarFromEnd(distance));
                }
            }
        }
        Ok(())
    }

    /// Feed an end-reached signal
    pub fn on_end_reached(
        &mut self,
        signal: EndReachedSignal,
        inputs: &PaginationInputs,
        scheduler: &mut Scheduler<PaneTask>,
    ) -> TriggerDecision {
        if let Err(reason) = self.evaluate(signal, inputs) {
            if reason != SkipReason::InfiniteScrollDisabled {
                tracing::debug!(?signal, %reason, "end reached, not paginating");
            }
            return TriggerDecision::Skipped(reason);
        }

        match signal {
            EndReachedSignal::WithDistance(_) => TriggerDecision::Fire,
            EndReachedSignal::NoDistance => {
                if let Some(previous) = self.pending.take() {
                    scheduler.cancel(previous);
                }
                let id = scheduler.schedule(self.debounce_window, PaneTask::LoadEarlier);
                self.pending = Some(id);
                tracing::trace!(
                    window_ms = self.debounce_window.as_millis() as u64,
                    "end reached, debouncing"
                );
                TriggerDecision::Debounced(id)
            }
        }
    }

    /// Called when a debounce timer fires. Gates are checked again since the
    /// caller may have started a load during the window.
    pub fn on_debounce_elapsed(
        &mut self,
        id: TimerId,
        inputs: &PaginationInputs,
    ) -> TriggerDecision {
        if self.pending != Some(id) {
            return TriggerDecision::Skipped(SkipReason::AlreadyLoading);
        }
        self.pending = None;
        match self.evaluate(EndReachedSignal::NoDistance, inputs) {
            Ok(()) => TriggerDecision::Fire,
            Err(reason) => {
                tracing::debug!(%reason, "debounce elapsed, not paginating");
                TriggerDecision::Skipped(reason)
            }
        }
    }

    pub fn pending(&self) -> Option<TimerId> {
        self.pending
    }

    /// Forget the pending debounce (its timer is cancelled by the owner)
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }
}
