//! Interactive demo of the message pane
//!
//! Drives a [`MessageContainer`] over a [`TerminalList`] with a synthetic
//! conversation. Earlier pages arrive from a background task after a delay,
//! the same way a network-backed history would.

use std::cell::{Cell, RefCell};
use std::io::{self, Stdout};
use std::panic;
use std::rc::Rc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::Paragraph,
    Terminal,
};
use tokio::sync::mpsc;

use super::engine::{EndReachedMode, TerminalList};
use super::events::{Event, EventHandler, PaneAction};
use super::pane::{MessagePane, PaneLayout, RenderOverrides};
use super::theme::Theme;
use super::typing::TypingIndicator;
use crate::config::PaneConfig;
use crate::container::MessageContainer;
use crate::core::{Message, QuickReplies, QuickReplyKind, Reply, User};

/// Demo knobs that are not part of the pane config
#[derive(Debug, Clone)]
pub struct DemoOptions {
    /// Messages shown at start
    pub initial: usize,
    /// Messages per earlier page
    pub page_size: usize,
    /// Pages available before history runs out
    pub max_pages: usize,
    /// Simulated fetch latency
    pub load_delay: Duration,
    pub end_reached_mode: EndReachedMode,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            initial: 30,
            page_size: 20,
            max_pages: 5,
            load_delay: Duration::from_millis(600),
            end_reached_mode: EndReachedMode::default(),
        }
    }
}

pub const VIEWER_ID: &str = "me";
const PEER_ID: &str = "ada";

/// Synthetic conversation, handed out newest first
#[derive(Debug, Clone)]
pub struct History {
    next_id: i64,
}

impl History {
    /// A history holding `total` messages
    pub fn new(total: usize) -> Self {
        Self {
            next_id: total as i64,
        }
    }

    pub fn remaining(&self) -> usize {
        self.next_id.max(0) as usize
    }

    /// The next `count` older messages, newest first
    pub fn take(&mut self, count: usize) -> Vec<Message> {
        let mut page = Vec::with_capacity(count);
        while page.len() < count && self.next_id > 0 {
            page.push(Self::message(self.next_id));
            self.next_id -= 1;
        }
        page
    }

    fn message(id: i64) -> Message {
        // one message every 7 minutes, ending at a fixed instant
        let created = Utc
            .timestamp_opt(1_760_000_000 + id * 420, 0)
            .single();

        let mut message = if id % 15 == 0 {
            Message::system(id, format!("Conversation checkpoint #{}", id / 15))
        } else {
            let sender = if (id / 3) % 2 == 0 {
                User::new(VIEWER_ID).with_name("Me")
            } else {
                User::new(PEER_ID).with_name("Ada")
            };
            let filler = FILLER[id as usize % FILLER.len()];
            Message::new(id, sender, format!("Message {} {}", id, filler))
        };
        message.created_at = created;

        if id % 11 == 0 && !message.system {
            message = message.with_quick_replies(QuickReplies {
                kind: QuickReplyKind::Radio,
                values: vec![
                    Reply {
                        title: "Sounds good".into(),
                        value: "yes".into(),
                    },
                    Reply {
                        title: "Later".into(),
                        value: "later".into(),
                    },
                ],
                keep_it: false,
            });
        }
        message
    }
}

const FILLER: &[&str] = &[
    "ok",
    "did you see the build results from this morning?",
    "pushing a fix in a minute",
    "the parser now handles nested blocks, which took longer than I hoped \
     but the tests are finally green",
    "lunch?",
    "I'll review after standup",
];

/// Pane state shared by the event loop and tests
pub struct DemoPane {
    container: MessageContainer<TerminalList>,
    theme: Theme,
    overrides: RenderOverrides,
    typing: TypingIndicator,
    layout: PaneLayout,
    history: History,
    options: DemoOptions,
    /// Load requests raised by the container's callback
    requested: Rc<Cell<usize>>,
    /// Title of the last quick reply the container passed to its callback
    last_reply: Rc<RefCell<Option<String>>>,
    pages_tx: mpsc::UnboundedSender<Vec<Message>>,
    pages_rx: mpsc::UnboundedReceiver<Vec<Message>>,
    pages_loaded: usize,
    /// Lines added before the window that the next layout must compensate for
    prepend_pending: bool,
    /// Offset last reported to the container as a scroll event
    last_offset: usize,
}

impl DemoPane {
    pub fn new(config: PaneConfig, options: DemoOptions) -> anyhow::Result<Self> {
        let theme = Theme::resolve(&config.theme);
        let total = options.initial + options.page_size * options.max_pages;
        let mut history = History::new(total);
        let mut messages = history.take(options.initial);
        if !config.inverted {
            messages.reverse();
        }

        let requested = Rc::new(Cell::new(0));
        let counter = requested.clone();
        let load_earlier = config.load_earlier || options.max_pages > 0;
        let last_reply = Rc::new(RefCell::new(None));
        let replied = last_reply.clone();

        let mut container =
            MessageContainer::builder(config, TerminalList::new(options.end_reached_mode))
                .messages(messages)
                .viewer(User::new(VIEWER_ID).with_name("Me"))
                .on_load_earlier(move || counter.set(counter.get() + 1))
                .on_quick_reply(move |replies: &[Reply]| {
                    tracing::info!(count = replies.len(), "quick reply selected");
                    if let Some(reply) = replies.first() {
                        *replied.borrow_mut() = Some(reply.title.clone());
                    }
                })
                .build()?;
        container.set_load_earlier(load_earlier);

        let overrides = RenderOverrides {
            empty: Some(Box::new(|| Text::from("No messages yet"))),
            ..RenderOverrides::default()
        };

        let (pages_tx, pages_rx) = mpsc::unbounded_channel();

        Ok(Self {
            container,
            theme,
            overrides,
            typing: TypingIndicator::new(),
            layout: PaneLayout::default(),
            history,
            options,
            requested,
            last_reply,
            pages_tx,
            pages_rx,
            pages_loaded: 0,
            prepend_pending: false,
            last_offset: 0,
        })
    }

    pub fn container(&self) -> &MessageContainer<TerminalList> {
        &self.container
    }

    pub fn layout(&self) -> &PaneLayout {
        &self.layout
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    pub fn last_reply(&self) -> Option<String> {
        self.last_reply.borrow().clone()
    }

    /// Pass the `index`th reply of the newest message offering quick replies
    fn select_quick_reply(&mut self, index: usize) {
        let messages = self.container.messages();
        let offers = |m: &&Message| m.quick_replies.is_some();
        // inverted panes keep the newest message first
        let newest = if self.container.config().inverted {
            messages.iter().find(offers)
        } else {
            messages.iter().rev().find(offers)
        };
        let reply = newest
            .and_then(|m| m.quick_replies.as_ref())
            .and_then(|replies| replies.values.get(index))
            .cloned();
        match reply {
            Some(reply) => self.container.quick_reply(&[reply]),
            None => tracing::debug!(index, "no quick reply to select"),
        }
    }

    /// Time until the container next needs a tick
    pub fn next_timer_in(&self) -> Option<Duration> {
        self.container.next_timer_in()
    }

    /// Rebuild the line layout for a pane drawn in `area`
    pub fn relayout(&mut self, area: Rect) {
        let inner = MessagePane::inner(area);
        let before = self.container.engine().total_lines();

        let view = self.container.render();
        self.layout = PaneLayout::build(
            &view,
            &self.theme,
            &self.overrides,
            &self.typing,
            inner.width,
        );
        drop(view);

        let total = self.layout.total_lines();
        let changed = self.container.engine_mut().set_layout(total, inner.height);
        if self.prepend_pending {
            self.prepend_pending = false;
            self.container
                .engine_mut()
                .shift_for_prepend(total.saturating_sub(before));
        }
        if changed {
            self.container.on_layout();
        }
    }

    /// Draw the pane into `area`
    pub fn draw(&self, frame: &mut ratatui::Frame, area: Rect) {
        let pane = MessagePane::new(&self.layout, &self.theme, &self.overrides)
            .offset(self.container.engine().offset())
            .focused(true);
        frame.render_widget(pane, area);
    }

    /// Fire due timers, poll the engine and pick up finished loads
    pub fn pump(&mut self) {
        self.container.tick();

        if let Some(signal) = self.container.engine_mut().poll_end_reached() {
            let decision = self.container.on_end_reached(signal);
            tracing::debug!(?signal, ?decision, "end reached");
        }

        self.start_requested_loads();

        while let Ok(page) = self.pages_rx.try_recv() {
            self.apply_page(page);
        }

        self.report_scroll();
    }

    /// Handle one user action. Returns false when the demo should exit.
    pub fn handle(&mut self, action: PaneAction, area: Rect) -> bool {
        let page = MessagePane::inner(area).height.max(1) as isize;
        match action {
            PaneAction::Quit => return false,
            PaneAction::Scroll(lines) => {
                self.container.engine_mut().scroll_by(lines);
            }
            PaneAction::PageAway => {
                self.container.engine_mut().scroll_by(page);
            }
            PaneAction::PageToward => {
                self.container.engine_mut().scroll_by(-page);
            }
            PaneAction::JumpToNewest => self.container.press_scroll_to_bottom(),
            PaneAction::LoadEarlier => {
                self.container.press_load_earlier();
            }
            PaneAction::ToggleTyping => {
                let typing = !self.container.is_typing();
                self.container.set_typing(typing);
            }
            PaneAction::QuickReply(index) => self.select_quick_reply(index),
            PaneAction::Click { column, row } => {
                let button = MessagePane::affordance_area(area);
                let hit = column >= button.x
                    && column < button.x + button.width
                    && row >= button.y
                    && row < button.y + button.height;
                if hit && self.layout.show_scroll_to_bottom {
                    self.container.press_scroll_to_bottom();
                }
            }
        }
        self.report_scroll();
        true
    }

    /// Advance animations
    pub fn on_tick(&mut self) {
        if self.container.is_typing() {
            self.typing.tick();
        }
    }

    pub fn unmount(&mut self) {
        self.container.unmount();
    }

    /// Forward offset changes as scroll events; layout changes alone are not scrolls
    fn report_scroll(&mut self) {
        let engine = self.container.engine();
        if engine.offset() != self.last_offset {
            self.last_offset = engine.offset();
            let metrics = engine.metrics();
            self.container.on_scroll(metrics);
        }
    }

    fn start_requested_loads(&mut self) {
        if self.requested.replace(0) == 0 {
            return;
        }
        let page = self.history.take(self.options.page_size);
        self.container.set_loading_earlier(true);
        tracing::info!(count = page.len(), "fetching earlier page");

        let tx = self.pages_tx.clone();
        let delay = self.options.load_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(page);
        });
    }

    fn apply_page(&mut self, mut page: Vec<Message>) {
        self.pages_loaded += 1;
        self.container.set_loading_earlier(false);

        let mut messages = self.container.messages().to_vec();
        if self.container.config().inverted {
            messages.extend(page);
        } else {
            page.reverse();
            page.extend(messages);
            messages = page;
            self.prepend_pending = true;
        }
        self.container.set_messages(messages);
        self.container.engine_mut().rearm_end_reached();

        if self.history.remaining() == 0 {
            self.container.set_load_earlier(false);
        }
    }
}

/// Run the demo until the user quits
pub async fn run_demo(config: PaneConfig, options: DemoOptions) -> anyhow::Result<()> {
    let mut pane = DemoPane::new(config, options)?;

    install_panic_hook();
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut pane);
    pane.unmount();
    restore_terminal(&mut terminal)?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    pane: &mut DemoPane,
) -> anyhow::Result<()> {
    let events = EventHandler::with_tick_rate(Duration::from_millis(100));
    let inverted = pane.container().config().inverted;

    loop {
        let size = terminal.size()?;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(Rect::new(0, 0, size.width, size.height));
        let (header, body) = (chunks[0], chunks[1]);

        pane.relayout(body);
        pane.pump();
        pane.relayout(body);

        let status = status_line(pane);
        terminal.draw(|frame| {
            frame.render_widget(Paragraph::new(status), header);
            pane.draw(frame, body);
        })?;

        let event = events.poll(pane.next_timer_in())?;
        if let Event::Tick = event {
            pane.on_tick();
            continue;
        }
        if let Some(action) = event.action(inverted) {
            if !pane.handle(action, body) {
                return Ok(());
            }
        }
    }
}

fn status_line(pane: &DemoPane) -> Line<'static> {
    let state = pane.container().pagination_state();
    let loading = if state.is_loading_earlier {
        " loading…"
    } else {
        ""
    };
    let replied = pane
        .last_reply()
        .map(|title| format!(", replied \"{}\"", title))
        .unwrap_or_default();
    Line::from(vec![
        Span::styled(
            " q quit  j/k scroll  G newest  l load earlier  t typing  1-9 reply ",
            Style::default().fg(pane.theme.text_muted),
        ),
        Span::styled(
            format!(
                " {} messages, {} pages{}{}",
                pane.container().messages().len(),
                pane.pages_loaded(),
                replied,
                loading
            ),
            Style::default().fg(pane.theme.text_secondary),
        ),
    ])
}

/// Restore the terminal before the default panic output
fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Id;

    fn area() -> Rect {
        Rect::new(0, 0, 60, 20)
    }

    fn options() -> DemoOptions {
        DemoOptions {
            initial: 30,
            page_size: 10,
            max_pages: 2,
            load_delay: Duration::from_millis(5),
            end_reached_mode: EndReachedMode::WithDistance,
        }
    }

    #[test]
    fn test_history_pages_newest_first() {
        let mut history = History::new(25);
        let first = history.take(10);
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].id, Some(Id::Num(25)));
        assert_eq!(first[9].id, Some(Id::Num(16)));
        assert_eq!(history.take(100).len(), 15);
        assert_eq!(history.remaining(), 0);
        assert!(history.take(5).is_empty());
    }

    #[test]
    fn test_history_has_system_messages() {
        let page = History::new(30).take(30);
        assert!(page.iter().any(|m| m.system));
        assert!(page.iter().filter(|m| !m.system).all(|m| m.user.is_some()));
    }

    #[tokio::test]
    async fn test_scrolling_to_the_top_loads_a_page() {
        let config = PaneConfig {
            infinite_scroll: true,
            ..PaneConfig::default()
        };
        let mut pane = DemoPane::new(config, options()).unwrap();
        pane.relayout(area());
        pane.pump();
        assert!(!pane.container().pagination_state().has_scrolled);

        let max = pane.container().engine().max_offset() as isize;
        pane.handle(PaneAction::Scroll(max), area());
        assert!(pane.container().pagination_state().has_scrolled);
        pane.pump();
        assert!(pane.container().pagination_state().is_loading_earlier);

        tokio::time::sleep(Duration::from_millis(50)).await;
        pane.pump();
        assert_eq!(pane.pages_loaded(), 1);
        assert_eq!(pane.container().messages().len(), 40);
        assert!(!pane.container().pagination_state().is_loading_earlier);
    }

    #[tokio::test]
    async fn test_load_earlier_key_and_exhaustion() {
        let mut pane = DemoPane::new(PaneConfig::default(), options()).unwrap();
        for _ in 0..2 {
            pane.handle(PaneAction::LoadEarlier, area());
            pane.pump();
            tokio::time::sleep(Duration::from_millis(50)).await;
            pane.pump();
        }
        assert_eq!(pane.pages_loaded(), 2);
        assert_eq!(pane.container().messages().len(), 50);
        assert!(!pane.container().load_earlier());
    }

    #[test]
    fn test_quit_and_typing_toggle() {
        let mut pane = DemoPane::new(PaneConfig::default(), options()).unwrap();
        assert!(pane.handle(PaneAction::ToggleTyping, area()));
        assert!(pane.container().is_typing());
        assert!(!pane.handle(PaneAction::Quit, area()));
    }

    #[test]
    fn test_digit_keys_pass_quick_reply_to_callback() {
        for inverted in [true, false] {
            let config = PaneConfig {
                inverted,
                ..PaneConfig::default()
            };
            let mut pane = DemoPane::new(config, options()).unwrap();
            assert_eq!(pane.last_reply(), None);

            // out of range leaves the callback untouched
            assert!(pane.handle(PaneAction::QuickReply(5), area()));
            assert_eq!(pane.last_reply(), None);

            pane.handle(PaneAction::QuickReply(1), area());
            assert_eq!(pane.last_reply().as_deref(), Some("Later"));
            pane.handle(PaneAction::QuickReply(0), area());
            assert_eq!(pane.last_reply().as_deref(), Some("Sounds good"));
        }
    }

    #[test]
    fn test_jump_to_newest_resets_offset() {
        let config = PaneConfig {
            scroll_to_bottom: true,
            ..PaneConfig::default()
        };
        let mut pane = DemoPane::new(config, options()).unwrap();
        pane.relayout(area());
        pane.handle(PaneAction::PageAway, area());
        pane.handle(PaneAction::PageAway, area());
        assert!(pane.container().engine().offset() > 0);

        pane.handle(PaneAction::JumpToNewest, area());
        assert_eq!(pane.container().engine().offset(), 0);
    }
}
