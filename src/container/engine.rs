//! Boundary to the list-rendering engine
//!
//! The engine owns windowing, measurement and scroll physics. The container
//! only ever asks it to move.

/// Imperative scroll commands issued to an engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollCommand {
    ToOffset { offset: f64, animated: bool },
    ToEnd { animated: bool },
}

/// Commands the container needs from a list engine
pub trait ListEngine {
    /// Scroll so that `offset` is at the start of the viewport
    fn scroll_to_offset(&mut self, offset: f64, animated: bool);

    /// Scroll to the far end of the content
    fn scroll_to_end(&mut self, animated: bool);

    fn apply(&mut self, command: ScrollCommand) {
        match command {
            ScrollCommand::ToOffset { offset, animated } => self.scroll_to_offset(offset, animated),
            ScrollCommand::ToEnd { animated } => self.scroll_to_end(animated),
        }
    }
}

/// Recording engine, handy for headless hosts and tests
impl ListEngine for Vec<ScrollCommand> {
    fn scroll_to_offset(&mut self, offset: f64, animated: bool) {
        self.push(ScrollCommand::ToOffset { offset, animated });
    }

    fn scroll_to_end(&mut self, animated: bool) {
        self.push(ScrollCommand::ToEnd { animated });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_records_commands() {
        let mut engine: Vec<ScrollCommand> = Vec::new();
        engine.scroll_to_offset(0.0, true);
        engine.apply(ScrollCommand::ToEnd { animated: false });
        assert_eq!(
            engine,
            vec![
                ScrollCommand::ToOffset {
                    offset: 0.0,
                    animated: true
                },
                ScrollCommand::ToEnd { animated: false },
            ]
        );
    }
}
