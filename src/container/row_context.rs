//! Per-row context for message renderers
//!
//! A row renderer needs more than its own message: grouping, avatars and day
//! separators depend on the neighbours in conversation order, and bubble
//! placement depends on who sent it. Building that context is pure apart from
//! the data-quality warnings it logs.

use std::borrow::Cow;

use serde::Serialize;

use crate::core::{DataWarning, Message, User};

/// Bubble placement relative to the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Sent by the viewer, placed right
    Own,
    /// Sent by someone else, placed left
    Other,
}

impl Alignment {
    /// Classify a sender against the viewer
    pub fn classify(sender: &User, viewer: Option<&User>) -> Self {
        match viewer {
            Some(viewer) if viewer.id == sender.id => Alignment::Own,
            _ => Alignment::Other,
        }
    }

    pub fn is_right(self) -> bool {
        matches!(self, Alignment::Own)
    }

    /// "right" / "left"
    pub fn position(self) -> &'static str {
        match self {
            Alignment::Own => "right",
            Alignment::Other => "left",
        }
    }
}

/// Everything a row renderer receives for one message
#[derive(Debug, Clone, Serialize)]
pub struct RowContext<'a> {
    pub index: usize,
    /// Stable key for the engine's recycling
    pub key: String,
    /// The message, with a sentinel sender filled in when it had none
    pub current: Cow<'a, Message>,
    /// Older neighbour, if any
    pub previous: Option<&'a Message>,
    /// Newer neighbour, if any
    pub next: Option<&'a Message>,
    pub alignment: Alignment,
    #[serde(skip)]
    pub warnings: Vec<DataWarning>,
}

/// Builds row contexts over one snapshot of the collection
#[derive(Debug, Clone, Copy)]
pub struct RowContextBuilder<'a> {
    messages: &'a [Message],
    viewer: Option<&'a User>,
    inverted: bool,
}

impl<'a> RowContextBuilder<'a> {
    pub fn new(messages: &'a [Message], viewer: Option<&'a User>, inverted: bool) -> Self {
        Self {
            messages,
            viewer,
            inverted,
        }
    }

    /// Context for the row at `index`, or `None` past the end of the collection
    pub fn build(&self, index: usize) -> Option<RowContext<'a>> {
        let item = self.messages.get(index)?;
        let mut warnings = Vec::new();

        if item.id.is_none() {
            let warning = DataWarning::MissingId(describe(item));
            tracing::warn!("{}", warning);
            warnings.push(warning);
        }

        let current = match item.user {
            Some(_) => Cow::Borrowed(item),
            None => {
                if !item.system {
                    let warning = DataWarning::MissingUser(describe(item));
                    tracing::warn!("{}", warning);
                    warnings.push(warning);
                }
                let mut owned = item.clone();
                owned.user = Some(User::sentinel());
                Cow::Owned(owned)
            }
        };

        let (previous, next) = if self.inverted {
            (self.neighbour(index.checked_add(1)), self.neighbour(index.checked_sub(1)))
        } else {
            (self.neighbour(index.checked_sub(1)), self.neighbour(index.checked_add(1)))
        };

        let alignment = current
            .user
            .as_ref()
            .map(|sender| Alignment::classify(sender, self.viewer))
            .unwrap_or(Alignment::Other);

        Some(RowContext {
            index,
            key: row_key(item, index),
            current,
            previous,
            next,
            alignment,
            warnings,
        })
    }

    /// Contexts for a contiguous range of rows, clamped to the collection
    pub fn build_range(&self, range: std::ops::Range<usize>) -> Vec<RowContext<'a>> {
        let end = range.end.min(self.messages.len());
        (range.start.min(end)..end)
            .filter_map(|index| self.build(index))
            .collect()
    }

    fn neighbour(&self, index: Option<usize>) -> Option<&'a Message> {
        index.and_then(|i| self.messages.get(i))
    }
}

/// Engine key for a message: `message-<id>`, or the index when the id is missing
pub fn row_key(message: &Message, index: usize) -> String {
    match &message.id {
        Some(id) => format!("message-{}", id),
        None => format!("message-#{}", index),
    }
}

fn describe(message: &Message) -> String {
    serde_json::to_string(message).unwrap_or_else(|_| format!("{:?}", message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Id;
    use proptest::prelude::*;

    fn msg(id: i64, sender: &str) -> Message {
        Message::new(id, User::new(sender), format!("m{}", id))
    }

    #[test]
    fn test_inverted_neighbours() {
        // index 0 is newest
        let messages = vec![msg(3, "a"), msg(2, "b"), msg(1, "a")];
        let builder = RowContextBuilder::new(&messages, None, true);

        let row = builder.build(1).unwrap();
        assert_eq!(row.current.id, Some(Id::Num(2)));
        assert_eq!(row.previous.unwrap().id, Some(Id::Num(1)));
        assert_eq!(row.next.unwrap().id, Some(Id::Num(3)));

        let newest = builder.build(0).unwrap();
        assert!(newest.next.is_none());
        assert_eq!(newest.previous.unwrap().id, Some(Id::Num(2)));

        let oldest = builder.build(2).unwrap();
        assert!(oldest.previous.is_none());
    }

    #[test]
    fn test_non_inverted_neighbours() {
        // index 0 is oldest
        let messages = vec![msg(1, "a"), msg(2, "b"), msg(3, "a")];
        let builder = RowContextBuilder::new(&messages, None, false);

        let row = builder.build(1).unwrap();
        assert_eq!(row.previous.unwrap().id, Some(Id::Num(1)));
        assert_eq!(row.next.unwrap().id, Some(Id::Num(3)));
        assert!(builder.build(0).unwrap().previous.is_none());
        assert!(builder.build(2).unwrap().next.is_none());
    }

    #[test]
    fn test_out_of_range_row() {
        let messages = vec![msg(1, "a")];
        let builder = RowContextBuilder::new(&messages, None, true);
        assert!(builder.build(1).is_none());
        assert!(RowContextBuilder::new(&[], None, true).build(0).is_none());
    }

    #[test]
    fn test_alignment_by_sender() {
        let me = User::new("me");
        let messages = vec![msg(1, "me"), msg(2, "you")];
        let builder = RowContextBuilder::new(&messages, Some(&me), true);
        assert_eq!(builder.build(0).unwrap().alignment, Alignment::Own);
        assert_eq!(builder.build(1).unwrap().alignment, Alignment::Other);
        assert_eq!(Alignment::Own.position(), "right");
        assert_eq!(Alignment::Other.position(), "left");
    }

    #[test]
    fn test_no_viewer_means_other() {
        let messages = vec![msg(1, "me")];
        let builder = RowContextBuilder::new(&messages, None, false);
        assert_eq!(builder.build(0).unwrap().alignment, Alignment::Other);
    }

    #[test]
    fn test_missing_id_warns_once() {
        let messages = vec![Message {
            id: None,
            user: Some(User::new(1)),
            text: "no id".to_string(),
            ..Message::default()
        }];
        let row = RowContextBuilder::new(&messages, None, true).build(0).unwrap();
        assert_eq!(row.warnings.len(), 1);
        assert!(matches!(row.warnings[0], DataWarning::MissingId(_)));
        assert_eq!(row.key, "message-#0");
    }

    #[test]
    fn test_missing_user_gets_sentinel_on_local_copy() {
        let messages = vec![Message {
            id: Some(Id::Num(9)),
            user: None,
            text: "anon".to_string(),
            ..Message::default()
        }];
        let viewer = User::new(0);
        let row = RowContextBuilder::new(&messages, Some(&viewer), true)
            .build(0)
            .unwrap();

        assert!(matches!(row.current, Cow::Owned(_)));
        assert_eq!(row.current.user, Some(User::sentinel()));
        assert_eq!(row.warnings, vec![DataWarning::MissingUser(describe(&messages[0]))]);
        // caller's data untouched
        assert!(messages[0].user.is_none());
        // sentinel sender compares like any other identity
        assert_eq!(row.alignment, Alignment::Own);
    }

    #[test]
    fn test_system_message_without_user_is_silent() {
        let messages = vec![Message::system(4, "joined")];
        let row = RowContextBuilder::new(&messages, None, true).build(0).unwrap();
        assert!(row.warnings.is_empty());
        assert_eq!(row.current.user, Some(User::sentinel()));
    }

    #[test]
    fn test_row_key() {
        assert_eq!(row_key(&msg(12, "a"), 0), "message-12");
        let text_id = Message::new("abc", User::new("a"), "x");
        assert_eq!(row_key(&text_id, 3), "message-abc");
    }

    #[test]
    fn test_build_range_clamps() {
        let messages = vec![msg(1, "a"), msg(2, "a"), msg(3, "a")];
        let builder = RowContextBuilder::new(&messages, None, true);
        assert_eq!(builder.build_range(1..10).len(), 2);
        assert!(builder.build_range(5..10).is_empty());
    }

    proptest! {
        #[test]
        fn prop_neighbours_mirror_under_inversion(len in 1usize..20, pick in 0usize..20) {
            let messages: Vec<Message> = (0..len as i64).map(|i| msg(i, "x")).collect();
            let index = pick % len;
            let inverted = RowContextBuilder::new(&messages, None, true).build(index).unwrap();
            let normal = RowContextBuilder::new(&messages, None, false).build(index).unwrap();

            prop_assert_eq!(inverted.previous, normal.next);
            prop_assert_eq!(inverted.next, normal.previous);
        }

        #[test]
        fn prop_alignment_ignores_content_and_order(
            text in "[a-z ]{0,20}",
            inverted in any::<bool>(),
            own in any::<bool>(),
        ) {
            let viewer = User::new("viewer");
            let sender = if own { "viewer" } else { "someone" };
            let messages = vec![Message::new(1, User::new(sender), text)];
            let row = RowContextBuilder::new(&messages, Some(&viewer), inverted).build(0).unwrap();
            prop_assert_eq!(row.alignment.is_right(), own);
        }
    }
}
