//! Terminal host for the message pane
//!
//! A line-based list engine, a ratatui widget that draws a [`PaneView`] and
//! an interactive demo wiring them to a [`MessageContainer`].
//!
//! [`PaneView`]: crate::container::PaneView
//! [`MessageContainer`]: crate::container::MessageContainer

pub mod app;
pub mod engine;
mod events;
pub mod pane;
pub mod theme;
pub mod typing;

pub use app::{run_demo, DemoOptions, DemoPane, History};
pub use engine::{EndReachedMode, TerminalList};
pub use events::{Event, EventHandler, PaneAction};
pub use pane::{MessagePane, PaneLayout, RenderOverrides};
pub use theme::Theme;
pub use typing::TypingIndicator;
