//! Canonical type definitions for the message pane
//!
//! These are the shapes callers hand to the container. Field names on the wire
//! follow the common chat JSON layout (`_id`, `user`, `createdAt`, ...) so a
//! caller can deserialize an existing message feed without remapping.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for messages and users.
///
/// Feeds use either integers or strings, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric id (`42`)
    Num(i64),
    /// String id (`"b2c4..."`)
    Text(String),
}

impl Id {
    /// Sentinel id assigned to messages that arrive without a sender
    pub const SENTINEL: Id = Id::Num(0);
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Num(n) => write!(f, "{}", n),
            Id::Text(s) => f.write_str(s),
        }
    }
}

/// Integers parse as `Num`, anything else as `Text`
impl FromStr for Id {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map(Id::Num)
            .unwrap_or_else(|_| Id::Text(s.to_string())))
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Num(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Text(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::Text(value)
    }
}

/// Sender identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identity used for own/other alignment
    #[serde(rename = "_id")]
    pub id: Id,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar URL or glyph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    /// Create a user with just an id
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            name: None,
            avatar: None,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Fallback sender for messages that don't carry one
    pub fn sentinel() -> Self {
        Self::new(Id::SENTINEL)
    }

    /// Name to show in the pane, falling back to the id
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// A single quick-reply option attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub title: String,
    pub value: String,
}

/// How quick replies may be selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickReplyKind {
    #[default]
    Radio,
    Checkbox,
}

/// Quick replies offered under a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReplies {
    #[serde(rename = "type", default)]
    pub kind: QuickReplyKind,
    pub values: Vec<Reply>,
    /// Keep the replies visible after one is chosen
    #[serde(rename = "keepIt", default)]
    pub keep_it: bool,
}

/// A chat message as supplied by the caller
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Message {
    /// Stable unique id. Missing ids are tolerated but logged.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    /// Sender. System messages usually have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// System notice rather than a user message
    #[serde(default)]
    pub system: bool,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub text: String,
    #[serde(
        rename = "quickReplies",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub quick_replies: Option<QuickReplies>,
}

impl Message {
    /// Create a message from a sender
    pub fn new(id: impl Into<Id>, user: User, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            user: Some(user),
            system: false,
            created_at: Some(Utc::now()),
            text: text.into(),
            quick_replies: None,
        }
    }

    /// Create a system notice
    pub fn system(id: impl Into<Id>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            user: None,
            system: true,
            created_at: Some(Utc::now()),
            text: text.into(),
            quick_replies: None,
        }
    }

    /// Set the creation timestamp
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Attach quick replies
    pub fn with_quick_replies(mut self, replies: QuickReplies) -> Self {
        self.quick_replies = Some(replies);
        self
    }

    /// Sender id, if any
    pub fn sender_id(&self) -> Option<&Id> {
        self.user.as_ref().map(|u| &u.id)
    }
}
