//! Database entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use uuid::fmt::Hyphenated;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_type: SenderType,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Conversation {
    pub id: i64,
    pub session_id: Hyphenated,
    pub last_message_id: Option<i64>,
    /// Cached text of the message `last_message_id` points at.
    pub last_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Points the conversation at `message` and caches its text.
    pub fn set_last_message(&mut self, message: &Message) {
        self.last_message_id = Some(message.id);
        self.last_message = Some(message.content.clone());
        self.updated_at = Utc::now();
    }
}

/// A conversation joined with the message its last-message pointer refers to.
///
/// Read from `conversations LEFT JOIN messages`, where the message columns are
/// aliased with a `message_` prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationWithLastMessage {
    pub conversation: Conversation,
    pub last_message: Option<Message>,
}

impl<'r> FromRow<'r, SqliteRow> for ConversationWithLastMessage {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let conversation = Conversation::from_row(row)?;

        let last_message = match row.try_get::<Option<i64>, _>("message_id")? {
            Some(id) => Some(Message {
                id,
                sender_type: row.try_get("message_sender_type")?,
                content: row.try_get("message_content")?,
                created_at: row.try_get("message_created_at")?,
            }),
            None => None,
        };

        Ok(ConversationWithLastMessage {
            conversation,
            last_message,
        })
    }
}
