//! msgpane: scroll and pagination coordination for chat message panes
//!
//! This library provides:
//! - A message container that turns list-engine callbacks into view state
//! - Load-earlier pagination with a debounced end-reached trigger
//! - Per-row render context with sender alignment and neighbour links
//! - A terminal host built on ratatui, with an interactive demo

pub mod config;
pub mod container;
pub mod core;
pub mod tui;

pub use config::PaneConfig;
pub use container::{MessageContainer, PaneView, RowContext};
pub use crate::core::{Message, User};
