//! Core domain modules
//!
//! Message data model and error types shared by the container and the
//! terminal front-end.

pub mod errors;
pub mod types;

pub use errors::{ConfigError, DataWarning};
pub use types::{Id, Message, QuickReplies, QuickReplyKind, Reply, User};
