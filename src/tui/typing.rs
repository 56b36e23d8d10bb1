//! Typing indicator animation

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use super::theme::Theme;

const DOTS: usize = 3;

/// Frame counter for the three-dot typing animation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypingIndicator {
    frame: usize,
}

impl TypingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one animation step
    pub fn tick(&mut self) {
        self.frame = (self.frame + 1) % DOTS;
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// The indicator as a line: the active dot bold, the rest dim
    pub fn line(&self, theme: &Theme) -> Line<'static> {
        let mut spans = vec![Span::raw("  ")];
        for dot in 0..DOTS {
            let style = if dot == self.frame {
                Style::default()
                    .fg(theme.typing_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text_muted)
            };
            spans.push(Span::styled("●", style));
            if dot + 1 < DOTS {
                spans.push(Span::raw(" "));
            }
        }
        Line::from(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_cycle() {
        let mut indicator = TypingIndicator::new();
        indicator.tick();
        indicator.tick();
        assert_eq!(indicator.frame(), 2);
        indicator.tick();
        assert_eq!(indicator.frame(), 0);
    }

    #[test]
    fn test_line_has_three_dots() {
        let line = TypingIndicator::new().line(&Theme::default());
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text.matches('●').count(), 3);
    }
}
