//! Message pane widget
//!
//! Lays out a [`PaneView`] as terminal lines and draws the visible window.
//! Every piece of chrome can be replaced through [`RenderOverrides`].

use chrono::{DateTime, Local, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment as TextAlign, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use super::typing::TypingIndicator;
use crate::container::{Alignment, Decoration, PaneView, RowContext};

/// Bubbles take at most this share of the pane width
const BUBBLE_WIDTH_RATIO: f32 = 0.7;

pub type EmptyRenderer = Box<dyn Fn() -> Text<'static>>;
pub type FooterRenderer = Box<dyn Fn(&PaneView<'_>) -> Text<'static>>;
pub type MessageRenderer = Box<dyn Fn(&RowContext<'_>, u16) -> Text<'static>>;
pub type LoadEarlierRenderer = Box<dyn Fn(bool) -> Text<'static>>;
pub type GlyphRenderer = Box<dyn Fn() -> Text<'static>>;

/// Caller-supplied replacements for the default renderers
#[derive(Default)]
pub struct RenderOverrides {
    /// Shown when there are no messages
    pub empty: Option<EmptyRenderer>,
    /// Replaces the typing-indicator footer
    pub footer: Option<FooterRenderer>,
    /// Renders one message row at the given width
    pub message: Option<MessageRenderer>,
    /// Renders the load-earlier control; receives the loading flag
    pub load_earlier: Option<LoadEarlierRenderer>,
    /// Glyph inside the scroll-to-bottom affordance
    pub scroll_to_bottom: Option<GlyphRenderer>,
}

impl std::fmt::Debug for RenderOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOverrides")
            .field("empty", &self.empty.is_some())
            .field("footer", &self.footer.is_some())
            .field("message", &self.message.is_some())
            .field("load_earlier", &self.load_earlier.is_some())
            .field("scroll_to_bottom", &self.scroll_to_bottom.is_some())
            .finish()
    }
}

/// A pane laid out as lines in top-to-bottom screen order
#[derive(Debug, Clone, Default)]
pub struct PaneLayout {
    pub lines: Vec<Line<'static>>,
    /// Decorations pinned above and below the empty state
    pub empty_top: Vec<Line<'static>>,
    pub empty_bottom: Vec<Line<'static>>,
    pub is_empty: bool,
    pub inverted: bool,
    pub align_top: bool,
    pub show_scroll_to_bottom: bool,
}

impl PaneLayout {
    /// Lay out `view` for a pane `width` columns wide
    pub fn build(
        view: &PaneView<'_>,
        theme: &Theme,
        overrides: &RenderOverrides,
        typing: &TypingIndicator,
        width: u16,
    ) -> Self {
        let mut layout = Self {
            lines: Vec::new(),
            empty_top: Vec::new(),
            empty_bottom: Vec::new(),
            is_empty: view.is_empty,
            inverted: view.inverted,
            align_top: view.align_top,
            show_scroll_to_bottom: view.show_scroll_to_bottom,
        };

        if view.is_empty {
            let text = match &overrides.empty {
                Some(render) => render(),
                None => Text::default(),
            };
            layout.lines.extend(text.lines);

            // the load-earlier control stays on top and the footer below
            let (top, bottom) = if view.inverted {
                (view.trailing, view.leading)
            } else {
                (view.leading, view.trailing)
            };
            if let Some(decoration) = top {
                layout.empty_top = decoration_lines(decoration, view, theme, overrides, typing);
            }
            if let Some(decoration) = bottom {
                layout.empty_bottom =
                    decoration_lines(decoration, view, theme, overrides, typing);
            }
            return layout;
        }

        // blocks in data order, flipped for inverted panes
        let mut blocks: Vec<Vec<Line<'static>>> = Vec::with_capacity(view.rows.len() + 2);
        if let Some(decoration) = view.leading {
            blocks.push(decoration_lines(decoration, view, theme, overrides, typing));
        }
        for row in &view.rows {
            let text = match &overrides.message {
                Some(render) => render(row, width),
                None => default_row(row, theme, width),
            };
            blocks.push(text.lines);
        }
        if let Some(decoration) = view.trailing {
            blocks.push(decoration_lines(decoration, view, theme, overrides, typing));
        }
        if view.inverted {
            blocks.reverse();
        }

        layout.lines = blocks.into_iter().flatten().collect();
        layout
    }

    pub fn total_lines(&self) -> usize {
        self.empty_top.len() + self.lines.len() + self.empty_bottom.len()
    }
}

fn decoration_lines(
    decoration: Decoration,
    view: &PaneView<'_>,
    theme: &Theme,
    overrides: &RenderOverrides,
    typing: &TypingIndicator,
) -> Vec<Line<'static>> {
    match decoration {
        Decoration::LoadEarlier { is_loading } => match &overrides.load_earlier {
            Some(render) => render(is_loading).lines,
            None => vec![load_earlier_line(is_loading, theme)],
        },
        Decoration::Footer { typing: show } => match &overrides.footer {
            Some(render) => render(view).lines,
            None if show => vec![typing.line(theme)],
            None => Vec::new(),
        },
    }
}

fn load_earlier_line(is_loading: bool, theme: &Theme) -> Line<'static> {
    let label = if is_loading {
        "Loading…"
    } else {
        "Load earlier messages"
    };
    Line::from(Span::styled(
        format!("[ {} ]", label),
        Style::default().fg(theme.load_earlier_fg),
    ))
    .alignment(TextAlign::Center)
}

/// Default message row: day separator, sender label, wrapped bubble, replies
fn default_row(row: &RowContext<'_>, theme: &Theme, width: u16) -> Text<'static> {
    let message = &*row.current;
    let mut lines = Vec::new();

    if let Some(created) = message.created_at {
        let new_day = row
            .previous
            .and_then(|p| p.created_at)
            .map(|p| !same_day(p, created))
            .unwrap_or(true);
        if new_day {
            lines.push(
                Line::from(Span::styled(
                    format!("── {} ──", created.with_timezone(&Local).format("%a, %b %-d")),
                    Style::default().fg(theme.text_muted),
                ))
                .alignment(TextAlign::Center),
            );
        }
    }

    if message.system {
        for chunk in wrap(&message.text, width.max(1) as usize) {
            lines.push(
                Line::from(Span::styled(
                    chunk,
                    Style::default()
                        .fg(theme.system_fg)
                        .add_modifier(Modifier::ITALIC),
                ))
                .alignment(TextAlign::Center),
            );
        }
        lines.push(Line::from(""));
        return Text::from(lines);
    }

    let (fg, bg, align) = match row.alignment {
        Alignment::Own => (theme.own_bubble, theme.own_bubble_bg, TextAlign::Right),
        Alignment::Other => (theme.other_bubble, theme.other_bubble_bg, TextAlign::Left),
    };

    // sender label only at the start of a run from the same sender
    let same_sender_as_previous = row
        .previous
        .map(|p| p.sender_id() == message.sender_id() && !p.system)
        .unwrap_or(false);
    if row.alignment == Alignment::Other && !same_sender_as_previous {
        if let Some(user) = &message.user {
            lines.push(
                Line::from(Span::styled(
                    user.display_name(),
                    Style::default().fg(fg).add_modifier(Modifier::BOLD),
                ))
                .alignment(align),
            );
        }
    }

    let bubble_width = ((width as f32 * BUBBLE_WIDTH_RATIO) as usize).max(1);
    let bubble_style = Style::default().fg(theme.text_primary).bg(bg);
    for chunk in wrap(&message.text, bubble_width.saturating_sub(2).max(1)) {
        lines.push(
            Line::from(Span::styled(format!(" {} ", chunk), bubble_style)).alignment(align),
        );
    }

    if let Some(created) = message.created_at {
        lines.push(
            Line::from(Span::styled(
                created.with_timezone(&Local).format("%H:%M").to_string(),
                Style::default().fg(theme.text_muted),
            ))
            .alignment(align),
        );
    }

    if let Some(replies) = &message.quick_replies {
        let spans: Vec<Span<'static>> = replies
            .values
            .iter()
            .map(|r| {
                Span::styled(
                    format!("[{}] ", r.title),
                    Style::default().fg(theme.load_earlier_fg),
                )
            })
            .collect();
        lines.push(Line::from(spans).alignment(align));
    }

    // gap before the next sender's run
    let next_same_sender = row
        .next
        .map(|n| n.sender_id() == message.sender_id() && !n.system)
        .unwrap_or(false);
    if !next_same_sender {
        lines.push(Line::from(""));
    }

    Text::from(lines)
}

fn same_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.with_timezone(&Local).date_naive() == b.with_timezone(&Local).date_naive()
}

/// Greedy word wrap by display width
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if current.is_empty() {
                word.width()
            } else {
                current.width() + 1 + word.width()
            };
            if needed > width && !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        out.push(current);
    }
    out
}

/// Draws the visible window of a [`PaneLayout`]
pub struct MessagePane<'a> {
    layout: &'a PaneLayout,
    theme: &'a Theme,
    overrides: &'a RenderOverrides,
    offset: usize,
    focused: bool,
}

impl<'a> MessagePane<'a> {
    pub fn new(layout: &'a PaneLayout, theme: &'a Theme, overrides: &'a RenderOverrides) -> Self {
        Self {
            layout,
            theme,
            overrides,
            offset: 0,
            focused: false,
        }
    }

    /// Lines away from the anchor edge
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Area inside the border
    pub fn inner(area: Rect) -> Rect {
        Block::default().borders(Borders::ALL).inner(area)
    }

    /// Where the scroll-to-bottom affordance sits within `area`
    pub fn affordance_area(area: Rect) -> Rect {
        let inner = Self::inner(area);
        let width = 5.min(inner.width);
        let height = 3.min(inner.height);
        Rect {
            x: inner.x + inner.width.saturating_sub(width + 1),
            y: inner.y + inner.height.saturating_sub(height),
            width,
            height,
        }
    }

    /// Lines to show for a viewport `height` lines tall
    fn window(&self, height: usize) -> (usize, Vec<Line<'static>>) {
        let lines = &self.layout.lines;
        let total = lines.len();

        if total <= height {
            // short content: inverted panes sit on the bottom unless pinned to the top
            let pad = if self.layout.inverted && !self.layout.align_top {
                height - total
            } else {
                0
            };
            return (pad, lines.clone());
        }

        let max_offset = total - height;
        let offset = self.offset.min(max_offset);
        let start = if self.layout.inverted {
            max_offset - offset
        } else {
            offset
        };
        (0, lines[start..start + height].to_vec())
    }
}

impl MessagePane<'_> {
    /// Empty state centred between the pinned decorations
    fn render_empty(&self, inner: Rect, buf: &mut Buffer) {
        let top = (self.layout.empty_top.len() as u16).min(inner.height);
        let bottom = (self.layout.empty_bottom.len() as u16).min(inner.height - top);
        let middle = inner.height - top - bottom;

        Paragraph::new(self.layout.empty_top.clone())
            .render(Rect { height: top, ..inner }, buf);
        Paragraph::new(self.layout.empty_bottom.clone()).render(
            Rect {
                y: inner.y + top + middle,
                height: bottom,
                ..inner
            },
            buf,
        );

        let text = Text::from(self.layout.lines.clone());
        let pad = middle.saturating_sub(text.height() as u16) / 2;
        Paragraph::new(text).alignment(TextAlign::Center).render(
            Rect {
                y: inner.y + top + pad,
                height: middle - pad,
                ..inner
            },
            buf,
        );
    }
}

impl Widget for MessagePane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_color = if self.focused {
            self.theme.border_focused
        } else {
            self.theme.border
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(" Messages ");

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 1 || inner.width < 1 {
            return;
        }

        if self.layout.is_empty {
            self.render_empty(inner, buf);
            return;
        }

        let (pad, lines) = self.window(inner.height as usize);
        let body = Rect {
            y: inner.y + pad as u16,
            height: inner.height - pad as u16,
            ..inner
        };
        Paragraph::new(lines).render(body, buf);

        if self.layout.show_scroll_to_bottom {
            let button = Self::affordance_area(area);
            let glyph = match &self.overrides.scroll_to_bottom {
                Some(render) => render(),
                None => Text::from("V"),
            };
            Clear.render(button, buf);
            Paragraph::new(glyph)
                .alignment(TextAlign::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(self.theme.affordance_bg)),
                )
                .style(
                    Style::default()
                        .fg(self.theme.affordance_fg)
                        .bg(self.theme.affordance_bg),
                )
                .render(button, buf);
        }
    }
}
