//! Real-time interaction messages (likes, comments, buy-clicks).
//!
//! These are transient wire payloads broadcast to room participants with
//! at-most-once, unordered delivery. They are never persisted; the tally a
//! participant keeps is session-local and dies with the connection.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::{Error, Result};

/// How many comments a tally retains (oldest evicted first).
pub const COMMENT_LOG_CAPACITY: usize = 20;

/// Wire payload: UTF-8 JSON `{type: like|comment|buy_click, from?, text?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionEvent {
    Like,
    Comment {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        #[serde(default)]
        text: String,
    },
    BuyClick,
}

impl InteractionEvent {
    /// Encode for `publish_data`.
    pub fn to_payload(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Decode a received broadcast payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(|e| {
            Error::InvalidInput(format!("malformed interaction payload: {e}"))
        })
    }
}

/// One retained comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEntry {
    pub from: Option<String>,
    pub text: String,
}

/// Session-local interaction counters.
///
/// Duplicate events count independently: delivery is at-most-once with no
/// deduplication, so every received `Like` increments by exactly one.
#[derive(Debug, Clone, Default)]
pub struct InteractionTally {
    pub likes: u64,
    pub buy_clicks: u64,
    comments: VecDeque<CommentEntry>,
}

impl InteractionTally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &InteractionEvent) {
        match event {
            InteractionEvent::Like => self.likes += 1,
            InteractionEvent::BuyClick => self.buy_clicks += 1,
            InteractionEvent::Comment { from, text } => {
                if self.comments.len() == COMMENT_LOG_CAPACITY {
                    self.comments.pop_front();
                }
                self.comments.push_back(CommentEntry {
                    from: from.clone(),
                    text: text.clone(),
                });
            }
        }
    }

    #[must_use]
    pub fn comments(&self) -> &VecDeque<CommentEntry> {
        &self.comments
    }

    /// Discard everything; used on every publish restart and viewer reconnect.
    pub fn reset(&mut self) {
        self.likes = 0;
        self.buy_clicks = 0;
        self.comments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_tags() {
        let like = serde_json::to_value(&InteractionEvent::Like).expect("serialize");
        assert_eq!(like["type"], "like");

        let buy = serde_json::to_value(&InteractionEvent::BuyClick).expect("serialize");
        assert_eq!(buy["type"], "buy_click");

        let comment: InteractionEvent =
            serde_json::from_str(r#"{"type":"comment","from":"léa","text":"superbe"}"#)
                .expect("deserialize comment");
        assert_eq!(
            comment,
            InteractionEvent::Comment {
                from: Some("léa".to_string()),
                text: "superbe".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        assert!(InteractionEvent::from_payload(b"not json").is_err());
        assert!(InteractionEvent::from_payload(br#"{"type":"wave"}"#).is_err());
    }

    #[test]
    fn test_duplicate_likes_count_independently() {
        let mut tally = InteractionTally::new();
        tally.record(&InteractionEvent::Like);
        tally.record(&InteractionEvent::Like);
        tally.record(&InteractionEvent::Like);
        assert_eq!(tally.likes, 3);
        assert_eq!(tally.buy_clicks, 0);
    }

    #[test]
    fn test_comment_log_is_bounded() {
        let mut tally = InteractionTally::new();
        for i in 0..25 {
            tally.record(&InteractionEvent::Comment {
                from: None,
                text: format!("message {i}"),
            });
        }
        assert_eq!(tally.comments().len(), COMMENT_LOG_CAPACITY);
        // Oldest entries were evicted first
        assert_eq!(tally.comments()[0].text, "message 5");
        assert_eq!(tally.comments()[19].text, "message 24");
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut tally = InteractionTally::new();
        tally.record(&InteractionEvent::Like);
        tally.record(&InteractionEvent::BuyClick);
        tally.record(&InteractionEvent::Comment {
            from: None,
            text: "hello".to_string(),
        });

        tally.reset();
        assert_eq!(tally.likes, 0);
        assert_eq!(tally.buy_clicks, 0);
        assert!(tally.comments().is_empty());
    }
}
