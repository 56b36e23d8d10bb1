//! Event handling for the demo pane
//!
//! Reads crossterm events and maps them onto pane actions.

use std::time::Duration;

use crossterm::event::{
    self, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

/// Events that can occur in the terminal
#[derive(Debug, Clone)]
pub enum Event {
    /// A key was pressed
    Key(KeyEvent),
    /// Mouse event
    Mouse(MouseEvent),
    /// Terminal was resized
    Resize(u16, u16),
    /// Nothing happened before the timeout
    Tick,
}

/// What the user asked the pane to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneAction {
    Quit,
    /// Lines to move away from (positive) or toward (negative) the newest message
    Scroll(isize),
    PageAway,
    PageToward,
    /// Press the scroll-to-bottom affordance
    JumpToNewest,
    /// Press the load-earlier control
    LoadEarlier,
    ToggleTyping,
    /// Pick the nth quick reply (zero-based) on the newest message offering any
    QuickReply(usize),
    /// Left click at a terminal cell
    Click { column: u16, row: u16 },
}

/// Polls the terminal for events
#[derive(Debug)]
pub struct EventHandler {
    /// Upper bound on how long one poll blocks
    tick_rate: Duration,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    /// Create a new event handler with default tick rate (250ms)
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
        }
    }

    /// Create a new event handler with custom tick rate
    pub fn with_tick_rate(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Poll for the next event, waking early if `deadline` is sooner than the tick rate
    pub fn poll(&self, deadline: Option<Duration>) -> anyhow::Result<Event> {
        let timeout = deadline.map_or(self.tick_rate, |d| d.min(self.tick_rate));
        if event::poll(timeout)? {
            Ok(Self::convert_event(event::read()?))
        } else {
            Ok(Event::Tick)
        }
    }

    fn convert_event(event: event::Event) -> Event {
        match event {
            event::Event::Key(key) => Event::Key(key),
            event::Event::Mouse(mouse) => Event::Mouse(mouse),
            event::Event::Resize(cols, rows) => Event::Resize(cols, rows),
            // focus and paste are ignored
            _ => Event::Tick,
        }
    }
}

impl Event {
    /// Check if this is a quit key (Ctrl-C, Esc or 'q')
    pub fn is_quit(&self) -> bool {
        matches!(
            self,
            Event::Key(KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }) | Event::Key(KeyEvent {
                code: KeyCode::Char('q') | KeyCode::Esc,
                ..
            })
        )
    }

    /// Map to a pane action. `inverted` decides which arrow points away from the newest message.
    pub fn action(&self, inverted: bool) -> Option<PaneAction> {
        if self.is_quit() {
            return Some(PaneAction::Quit);
        }
        // up moves toward older messages, which is "away" only in an inverted pane
        let up = if inverted { 1 } else { -1 };
        match self {
            Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                KeyCode::Up | KeyCode::Char('k') => Some(PaneAction::Scroll(up)),
                KeyCode::Down | KeyCode::Char('j') => Some(PaneAction::Scroll(-up)),
                KeyCode::PageUp => Some(if inverted {
                    PaneAction::PageAway
                } else {
                    PaneAction::PageToward
                }),
                KeyCode::PageDown => Some(if inverted {
                    PaneAction::PageToward
                } else {
                    PaneAction::PageAway
                }),
                KeyCode::End | KeyCode::Char('G') => Some(PaneAction::JumpToNewest),
                KeyCode::Char('l') => Some(PaneAction::LoadEarlier),
                KeyCode::Char('t') => Some(PaneAction::ToggleTyping),
                KeyCode::Char(c @ '1'..='9') => {
                    Some(PaneAction::QuickReply(c as usize - '1' as usize))
                }
                _ => None,
            },
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => Some(PaneAction::Scroll(up * 3)),
                MouseEventKind::ScrollDown => Some(PaneAction::Scroll(-up * 3)),
                MouseEventKind::Down(MouseButton::Left) => Some(PaneAction::Click {
                    column: mouse.column,
                    row: mouse.row,
                }),
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_quit_keys() {
        assert!(key(KeyCode::Char('q')).is_quit());
        assert!(key(KeyCode::Esc).is_quit());
        assert!(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)).is_quit());
        assert!(!key(KeyCode::Char('c')).is_quit());
        assert!(!Event::Tick.is_quit());
    }

    #[test]
    fn test_arrows_follow_inversion() {
        assert_eq!(key(KeyCode::Up).action(true), Some(PaneAction::Scroll(1)));
        assert_eq!(key(KeyCode::Up).action(false), Some(PaneAction::Scroll(-1)));
        assert_eq!(key(KeyCode::PageUp).action(true), Some(PaneAction::PageAway));
        assert_eq!(key(KeyCode::PageUp).action(false), Some(PaneAction::PageToward));
    }

    #[test]
    fn test_pane_keys() {
        assert_eq!(key(KeyCode::End).action(true), Some(PaneAction::JumpToNewest));
        assert_eq!(key(KeyCode::Char('l')).action(true), Some(PaneAction::LoadEarlier));
        assert_eq!(key(KeyCode::Char('t')).action(true), Some(PaneAction::ToggleTyping));
        assert_eq!(key(KeyCode::Char('x')).action(true), None);
    }

    #[test]
    fn test_digits_pick_quick_replies() {
        assert_eq!(key(KeyCode::Char('1')).action(true), Some(PaneAction::QuickReply(0)));
        assert_eq!(key(KeyCode::Char('2')).action(false), Some(PaneAction::QuickReply(1)));
        assert_eq!(key(KeyCode::Char('0')).action(true), None);
    }

    #[test]
    fn test_mouse_click() {
        let event = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 4,
            row: 7,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(
            event.action(true),
            Some(PaneAction::Click { column: 4, row: 7 })
        );
    }
}
