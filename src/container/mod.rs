//! Message container
//!
//! `MessageContainer` is the orchestration layer of a chat pane. The host's
//! list engine forwards its callbacks here (scroll, end-reached,
//! layout-settled, per-row render) and the container answers with derived
//! view state, row contexts and the occasional scroll command.
//!
//! One container is one mounted pane. Dropping or unmounting it cancels every
//! pending timer; building a new one is a remount and starts from fresh
//! scroll and pagination state.

pub mod engine;
pub mod pagination;
pub mod row_context;
pub mod scheduler;
pub mod scroll;
pub mod settle;

use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PaneConfig;
use crate::core::{ConfigError, Message, Reply, User};

pub use engine::{ListEngine, ScrollCommand};
pub use pagination::{
    EndReachedSignal, PaginationInputs, PaginationTrigger, SkipReason, TriggerDecision,
};
pub use row_context::{row_key, Alignment, RowContext, RowContextBuilder};
pub use scheduler::{Clock, ManualClock, Scheduler, SystemClock, TimerId};
pub use scroll::{ScrollCoordinator, ScrollMetrics, ScrollOutcome};
pub use settle::LayoutSettler;

/// Work the container schedules for later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneTask {
    /// Debounced load-earlier check
    LoadEarlier,
    /// Scroll to the end after layout settles
    SettleScroll,
}

/// Callback invoked when an earlier page should be loaded
pub type LoadEarlierFn = Box<dyn FnMut()>;
/// Callback invoked with the replies the user picked
pub type QuickReplyFn = Box<dyn FnMut(&[Reply])>;

/// Pagination-related view state of a mounted pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaginationState {
    pub has_scrolled: bool,
    pub is_loading_earlier: bool,
}

/// Non-row content placed at either end of the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    /// The load-earlier control
    LoadEarlier { is_loading: bool },
    /// The footer; `typing` says whether to show the typing indicator
    Footer { typing: bool },
}

/// Result of a render pass
///
/// `leading` sits before row 0 in data order and `trailing` after the last
/// row. For an inverted pane data order runs bottom-up on screen, so the
/// footer leads and the load-earlier control trails.
#[derive(Debug, Clone)]
pub struct PaneView<'a> {
    pub rows: Vec<RowContext<'a>>,
    pub leading: Option<Decoration>,
    pub trailing: Option<Decoration>,
    pub is_empty: bool,
    pub show_scroll_to_bottom: bool,
    pub align_top: bool,
    pub inverted: bool,
}

/// Builder for [`MessageContainer`]
pub struct MessageContainerBuilder<E: ListEngine> {
    config: PaneConfig,
    engine: E,
    clock: Arc<dyn Clock>,
    messages: Vec<Message>,
    viewer: Option<User>,
    on_load_earlier: Option<LoadEarlierFn>,
    on_quick_reply: Option<QuickReplyFn>,
}

impl<E: ListEngine> MessageContainerBuilder<E> {
    /// Use a specific clock (tests use `ManualClock`)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn viewer(mut self, viewer: User) -> Self {
        self.viewer = Some(viewer);
        self
    }

    pub fn on_load_earlier(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_load_earlier = Some(Box::new(callback));
        self
    }

    pub fn on_quick_reply(mut self, callback: impl FnMut(&[Reply]) + 'static) -> Self {
        self.on_quick_reply = Some(Box::new(callback));
        self
    }

    /// Validate the config and mount the pane
    pub fn build(self) -> Result<MessageContainer<E>, ConfigError> {
        self.config.validate()?;

        let pagination = PaginationTrigger::new(
            self.config.pagination.proximity_threshold,
            self.config.pagination.debounce_window(),
        );
        let settler = LayoutSettler::new(self.config.settle.clone());

        tracing::debug!(
            inverted = self.config.inverted,
            messages = self.messages.len(),
            "mounting message container"
        );

        Ok(MessageContainer {
            is_typing: self.config.is_typing,
            load_earlier: self.config.load_earlier,
            is_loading_earlier: false,
            config: self.config,
            engine: self.engine,
            messages: self.messages,
            viewer: self.viewer,
            scroll: ScrollCoordinator::new(),
            pagination,
            settler,
            scheduler: Scheduler::new(self.clock),
            on_load_earlier: self.on_load_earlier,
            on_quick_reply: self.on_quick_reply,
            mounted: true,
        })
    }
}

/// Scroll, pagination and row-context coordination for one chat pane
pub struct MessageContainer<E: ListEngine> {
    config: PaneConfig,
    engine: E,
    messages: Vec<Message>,
    viewer: Option<User>,
    is_typing: bool,
    load_earlier: bool,
    is_loading_earlier: bool,
    scroll: ScrollCoordinator,
    pagination: PaginationTrigger,
    settler: LayoutSettler,
    scheduler: Scheduler<PaneTask>,
    on_load_earlier: Option<LoadEarlierFn>,
    on_quick_reply: Option<QuickReplyFn>,
    mounted: bool,
}

impl<E: ListEngine + fmt::Debug> fmt::Debug for MessageContainer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageContainer")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .field("messages", &self.messages.len())
            .field("viewer", &self.viewer)
            .field("is_typing", &self.is_typing)
            .field("load_earlier", &self.load_earlier)
            .field("is_loading_earlier", &self.is_loading_earlier)
            .field("scroll", &self.scroll)
            .field("scheduler", &self.scheduler)
            .field("mounted", &self.mounted)
            .finish()
    }
}

impl<E: ListEngine> MessageContainer<E> {
    /// Start building a container over `engine`
    pub fn builder(config: PaneConfig, engine: E) -> MessageContainerBuilder<E> {
        MessageContainerBuilder {
            config,
            engine,
            clock: Arc::new(SystemClock),
            messages: Vec::new(),
            viewer: None,
            on_load_earlier: None,
            on_quick_reply: None,
        }
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    /// Replace the message collection
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        if self.messages != messages {
            self.messages = messages;
            self.settler.collection_changed();
        }
    }

    pub fn set_viewer(&mut self, viewer: Option<User>) {
        self.viewer = viewer;
    }

    pub fn set_typing(&mut self, is_typing: bool) {
        self.is_typing = is_typing;
    }

    pub fn set_load_earlier(&mut self, load_earlier: bool) {
        self.load_earlier = load_earlier;
    }

    /// The caller's in-flight flag for earlier-page loads
    pub fn set_loading_earlier(&mut self, is_loading: bool) {
        self.is_loading_earlier = is_loading;
    }

    pub fn set_on_load_earlier(&mut self, callback: Option<LoadEarlierFn>) {
        self.on_load_earlier = callback;
    }

    pub fn set_on_quick_reply(&mut self, callback: Option<QuickReplyFn>) {
        self.on_quick_reply = callback;
    }

    // ------------------------------------------------------------------
    // Engine callbacks
    // ------------------------------------------------------------------

    /// Scroll event from the engine
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> ScrollOutcome {
        if !self.mounted {
            return self.scroll.outcome();
        }
        self.scroll.on_scroll(
            metrics,
            self.config.inverted,
            self.config.scroll_to_bottom_offset,
        )
    }

    /// End-reached signal from the engine
    pub fn on_end_reached(&mut self, signal: EndReachedSignal) -> TriggerDecision {
        if !self.mounted {
            return TriggerDecision::Skipped(SkipReason::HostDisabled);
        }
        let inputs = self.pagination_inputs();
        let decision = self
            .pagination
            .on_end_reached(signal, &inputs, &mut self.scheduler);
        if decision == TriggerDecision::Fire {
            self.invoke_load_earlier();
        }
        decision
    }

    /// Layout-settled callback from the engine
    pub fn on_layout(&mut self) -> Option<TimerId> {
        if !self.mounted {
            return None;
        }
        self.settler
            .on_layout(self.config.inverted, self.messages.len(), &mut self.scheduler)
    }

    /// Run timers that are due. Returns how many fired.
    ///
    /// Hosts call this from their event loop.
    pub fn tick(&mut self) -> usize {
        if !self.mounted {
            return 0;
        }
        let due = self.scheduler.take_due();
        let fired = due.len();
        for (id, task) in due {
            match task {
                PaneTask::LoadEarlier => {
                    let inputs = self.pagination_inputs();
                    if self.pagination.on_debounce_elapsed(id, &inputs) == TriggerDecision::Fire {
                        self.invoke_load_earlier();
                    }
                }
                PaneTask::SettleScroll => {
                    if self.settler.on_elapsed(id) {
                        self.scroll_to_bottom(false);
                    }
                }
            }
        }
        fired
    }

    /// Time until the next timer is due, for sizing the host's poll timeout
    pub fn next_timer_in(&self) -> Option<Duration> {
        if !self.mounted {
            return None;
        }
        self.scheduler.next_deadline_in()
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn scroll_to(&mut self, offset: f64, animated: bool) {
        if self.mounted {
            self.engine.scroll_to_offset(offset, animated);
        }
    }

    /// Scroll to the newest message
    pub fn scroll_to_bottom(&mut self, animated: bool) {
        if !self.mounted {
            return;
        }
        if self.config.inverted {
            self.engine.scroll_to_offset(0.0, animated);
        } else {
            self.engine.scroll_to_end(animated);
        }
    }

    /// The user activated the scroll-to-bottom affordance
    pub fn press_scroll_to_bottom(&mut self) {
        self.scroll_to_bottom(true);
    }

    /// The user activated the load-earlier control. Returns true if the
    /// caller's load callback ran.
    pub fn press_load_earlier(&mut self) -> bool {
        if !self.mounted || !self.load_earlier || self.is_loading_earlier {
            return false;
        }
        if self.on_load_earlier.is_none() {
            return false;
        }
        self.invoke_load_earlier();
        true
    }

    /// Pass selected quick replies through to the caller
    pub fn quick_reply(&mut self, replies: &[Reply]) {
        if !self.mounted {
            return;
        }
        if let Some(callback) = self.on_quick_reply.as_mut() {
            callback(replies);
        }
    }

    /// Tear the pane down. Pending timers are cancelled and every handler
    /// becomes a no-op.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        let cancelled = self.scheduler.cancel_all();
        self.pagination.clear_pending();
        self.settler.clear_pending();
        self.mounted = false;
        tracing::debug!(cancelled, "message container unmounted");
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Context for the row at `index`, as requested by the engine
    pub fn render_row(&self, index: usize) -> Option<RowContext<'_>> {
        self.row_builder().build(index)
    }

    /// Full render pass over the collection
    pub fn render(&self) -> PaneView<'_> {
        self.render_range(0..self.messages.len())
    }

    /// Render pass restricted to the rows the engine has on screen
    pub fn render_range(&self, range: Range<usize>) -> PaneView<'_> {
        let footer = Decoration::Footer {
            typing: self.is_typing && self.config.host.typing_indicator,
        };
        let load_earlier = self.load_earlier.then_some(Decoration::LoadEarlier {
            is_loading: self.is_loading_earlier,
        });
        let (leading, trailing) = if self.config.inverted {
            (Some(footer), load_earlier)
        } else {
            (load_earlier, Some(footer))
        };

        PaneView {
            rows: self.row_builder().build_range(range),
            leading,
            trailing,
            is_empty: self.messages.is_empty(),
            show_scroll_to_bottom: self.show_scroll_to_bottom(),
            align_top: self.config.align_top,
            inverted: self.config.inverted,
        }
    }

    fn row_builder(&self) -> RowContextBuilder<'_> {
        RowContextBuilder::new(&self.messages, self.viewer.as_ref(), self.config.inverted)
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Affordance enabled and the user is away from the newest message
    pub fn show_scroll_to_bottom(&self) -> bool {
        self.config.scroll_to_bottom && self.scroll.show_scroll_to_bottom()
    }

    pub fn pagination_state(&self) -> PaginationState {
        PaginationState {
            has_scrolled: self.scroll.has_scrolled(),
            is_loading_earlier: self.is_loading_earlier,
        }
    }

    pub fn config(&self) -> &PaneConfig {
        &self.config
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn viewer(&self) -> Option<&User> {
        self.viewer.as_ref()
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    pub fn load_earlier(&self) -> bool {
        self.load_earlier
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending_count()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    fn pagination_inputs(&self) -> PaginationInputs {
        PaginationInputs {
            infinite_scroll: self.config.infinite_scroll,
            has_scrolled: self.scroll.has_scrolled(),
            load_earlier: self.load_earlier,
            has_callback: self.on_load_earlier.is_some(),
            is_loading_earlier: self.is_loading_earlier,
            host_allows: self.config.host.end_reached_pagination,
        }
    }

    fn invoke_load_earlier(&mut self) {
        if let Some(callback) = self.on_load_earlier.as_mut() {
            tracing::debug!("loading earlier messages");
            callback();
        }
    }
}

impl<E: ListEngine> Drop for MessageContainer<E> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn msg(id: i64, sender: &str) -> Message {
        Message {
            created_at: None,
            ..Message::new(id, User::new(sender), format!("m{}", id))
        }
    }

    fn container(config: PaneConfig) -> (ManualClock, MessageContainer<Vec<ScrollCommand>>) {
        let clock = ManualClock::new();
        let container = MessageContainer::builder(config, Vec::new())
            .clock(Arc::new(clock.clone()))
            .messages(vec![msg(2, "me"), msg(1, "you")])
            .viewer(User::new("me"))
            .build()
            .unwrap();
        (clock, container)
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let config = PaneConfig {
            scroll_to_bottom_offset: -1.0,
            ..PaneConfig::default()
        };
        let err = MessageContainer::builder(config, Vec::<ScrollCommand>::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThreshold { .. }));
    }

    #[test]
    fn test_affordance_requires_config_flag() {
        let (_, mut c) = container(PaneConfig::default());
        c.on_scroll(ScrollMetrics::new(500.0, 2000.0, 400.0));
        assert!(!c.show_scroll_to_bottom());

        let (_, mut c) = container(PaneConfig {
            scroll_to_bottom: true,
            ..PaneConfig::default()
        });
        c.on_scroll(ScrollMetrics::new(500.0, 2000.0, 400.0));
        assert!(c.show_scroll_to_bottom());
        assert!(c.render().show_scroll_to_bottom);
    }

    #[test]
    fn test_scroll_to_bottom_respects_inversion() {
        let (_, mut inverted) = container(PaneConfig::default());
        inverted.press_scroll_to_bottom();
        assert_eq!(
            inverted.engine(),
            &vec![ScrollCommand::ToOffset {
                offset: 0.0,
                animated: true
            }]
        );

        let (_, mut normal) = container(PaneConfig {
            inverted: false,
            ..PaneConfig::default()
        });
        normal.scroll_to_bottom(false);
        assert_eq!(normal.engine(), &vec![ScrollCommand::ToEnd { animated: false }]);
    }

    #[test]
    fn test_decorations_follow_inversion() {
        let config = PaneConfig {
            load_earlier: true,
            is_typing: true,
            ..PaneConfig::default()
        };
        let (_, inverted) = container(config.clone());
        let view = inverted.render();
        assert_eq!(view.leading, Some(Decoration::Footer { typing: true }));
        assert_eq!(
            view.trailing,
            Some(Decoration::LoadEarlier { is_loading: false })
        );

        let (_, normal) = container(PaneConfig {
            inverted: false,
            ..config
        });
        let view = normal.render();
        assert_eq!(
            view.leading,
            Some(Decoration::LoadEarlier { is_loading: false })
        );
        assert_eq!(view.trailing, Some(Decoration::Footer { typing: true }));
    }

    #[test]
    fn test_load_earlier_hidden_when_disabled() {
        let (_, c) = container(PaneConfig::default());
        let view = c.render();
        assert_eq!(view.trailing, None);
        assert_eq!(view.leading, Some(Decoration::Footer { typing: false }));
    }

    #[test]
    fn test_typing_suppressed_on_web_host() {
        let mut config = PaneConfig {
            is_typing: true,
            ..PaneConfig::default()
        };
        config.host = crate::config::HostCapabilities::web();
        let (_, c) = container(config);
        assert_eq!(c.render().leading, Some(Decoration::Footer { typing: false }));
    }

    #[test]
    fn test_empty_view() {
        let c = MessageContainer::builder(PaneConfig::default(), Vec::<ScrollCommand>::new())
            .build()
            .unwrap();
        let view = c.render();
        assert!(view.is_empty);
        assert!(view.rows.is_empty());
    }

    #[test]
    fn test_rows_carry_alignment() {
        let (_, c) = container(PaneConfig::default());
        let view = c.render();
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].alignment, Alignment::Own);
        assert_eq!(view.rows[1].alignment, Alignment::Other);
    }

    #[test]
    fn test_quick_reply_passthrough() {
        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        let mut c = MessageContainer::builder(PaneConfig::default(), Vec::<ScrollCommand>::new())
            .on_quick_reply(move |replies| counter.set(counter.get() + replies.len()))
            .build()
            .unwrap();
        let replies = vec![
            Reply {
                title: "Yes".into(),
                value: "y".into(),
            },
            Reply {
                title: "No".into(),
                value: "n".into(),
            },
        ];
        c.quick_reply(&replies);
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn test_press_load_earlier_gates() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut c = MessageContainer::builder(PaneConfig::default(), Vec::<ScrollCommand>::new())
            .on_load_earlier(move || counter.set(counter.get() + 1))
            .build()
            .unwrap();

        assert!(!c.press_load_earlier());
        c.set_load_earlier(true);
        assert!(c.press_load_earlier());
        c.set_loading_earlier(true);
        assert!(!c.press_load_earlier());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_set_messages_same_data_is_not_a_change() {
        let (_, mut c) = container(PaneConfig {
            inverted: false,
            ..PaneConfig::default()
        });
        assert!(c.on_layout().is_some());
        c.set_messages(vec![msg(2, "me"), msg(1, "you")]);
        assert!(c.on_layout().is_none());
        c.set_messages(vec![msg(3, "me"), msg(2, "me"), msg(1, "you")]);
        assert!(c.on_layout().is_some());
    }

    #[test]
    fn test_unmount_is_idempotent_and_silences_handlers() {
        let (_, mut c) = container(PaneConfig::default());
        c.unmount();
        c.unmount();
        assert!(!c.is_mounted());
        c.press_scroll_to_bottom();
        assert!(c.engine().is_empty());
        assert_eq!(c.next_timer_in(), None);
    }
}
