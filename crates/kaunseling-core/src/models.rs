//! Attachment and interaction types shared by every collection.
//!
//! These are the leaf units of the record tree. Field names serialize in
//! camelCase and instants as epoch milliseconds so documents written by the
//! browser dashboard load unchanged.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::uuid_utils::new_id;

/// Current instant at the millisecond precision documents are stored with.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A single comment on an attachment or guestbook entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user_name: String,
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    /// Build a new comment stamped with a fresh id and the current instant.
    pub fn new(user_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            user_name: user_name.into(),
            text: text.into(),
            timestamp: now_millis(),
        }
    }
}

/// Emoji reaction counter. At most one per emoji within a reaction list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub count: u32,
}

/// Date/time/location attached to a single duty-roster photo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyDetails {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub location: String,
}

/// An uploaded file embedded as a data URI, plus its comment thread and
/// reactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default)]
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty_details: Option<DutyDetails>,
}

impl Attachment {
    /// Wrap an already-encoded data URI in a fresh attachment.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            url: url.into(),
            name: None,
            mime_type: None,
            comments: Vec::new(),
            reactions: Vec::new(),
            duty_details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_loads_legacy_shape() {
        let json = r#"{
            "id": "k3j9x0a1b",
            "url": "data:image/png;base64,AAAA",
            "name": "FOTO.PNG",
            "comments": [{"id": "c1", "userName": "PELAWAT", "text": "CANTIK", "timestamp": 1700000000000}],
            "reactions": [{"emoji": "💖", "count": 3}]
        }"#;
        let att: Attachment = serde_json::from_str(json).unwrap();
        assert_eq!(att.id, "k3j9x0a1b");
        assert_eq!(att.mime_type, None);
        assert_eq!(att.comments[0].user_name, "PELAWAT");
        assert_eq!(att.comments[0].timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(att.reactions[0].count, 3);
        assert!(att.duty_details.is_none());
    }

    #[test]
    fn test_attachment_missing_threads_default_empty() {
        let att: Attachment = serde_json::from_str(r#"{"id":"a","url":"data:,"}"#).unwrap();
        assert!(att.comments.is_empty());
        assert!(att.reactions.is_empty());
    }

    #[test]
    fn test_attachment_serializes_camel_case() {
        let mut att = Attachment::from_url("data:application/pdf;base64,JVBERi0=");
        att.mime_type = Some("application/pdf".to_string());
        att.duty_details = Some(DutyDetails {
            date: "2026-03-02".to_string(),
            time: "07:00".to_string(),
            location: "PAGAR UTAMA".to_string(),
        });
        let value = serde_json::to_value(&att).unwrap();
        assert_eq!(value["mimeType"], "application/pdf");
        assert_eq!(value["dutyDetails"]["location"], "PAGAR UTAMA");
        assert!(value.get("name").is_none());
    }

    #[test]
    fn test_comment_new_has_fresh_id() {
        let a = Comment::new("A", "X");
        let b = Comment::new("A", "X");
        assert_ne!(a.id, b.id);
    }
}
