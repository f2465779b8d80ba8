//! Infrastructure traits, used for DI on higher levels

use crate::infrastructure::entities::{
    Conversation, ConversationWithLastMessage, Message, SenderType,
};
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Parses a session id. Only the 36-char hyphenated form is accepted, so every
/// endpoint agrees on which strings name a session.
pub fn parse_session_id(raw: &str) -> Option<Uuid> {
    if raw.len() != 36 {
        return None;
    }
    Uuid::try_parse(raw).ok()
}

/// How a single conversation is addressed from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationKey {
    Id(i64),
    SessionId(Uuid),
}

impl ConversationKey {
    /// A hyphenated UUID selects by session id, a decimal integer by primary id.
    /// Anything else matches no conversation.
    pub fn parse(raw: &str) -> Option<ConversationKey> {
        match parse_session_id(raw) {
            Some(session_id) => Some(ConversationKey::SessionId(session_id)),
            None => raw.parse().ok().map(ConversationKey::Id),
        }
    }
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_by_session_id(
        &self,
        session_id: Uuid,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// Plain row lookup without the joined message. The HTTP surface reads through
    /// `find_with_last_message`.
    async fn find_by_id(&self, id: i64) -> Result<Option<Conversation>, RepositoryError>;

    async fn find_with_last_message(
        &self,
        key: ConversationKey,
    ) -> Result<Option<ConversationWithLastMessage>, RepositoryError>;

    /// Returns one page of conversations, ordered by id, plus the total number of
    /// conversations matching `session_id`. `offset` and `limit` count rows.
    async fn list_with_last_message(
        &self,
        session_id: Option<Uuid>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ConversationWithLastMessage>, i64), RepositoryError>;

    /// Inserts a conversation for `session_id`.
    ///
    /// If a row with that session id already exists (e.g. created by a concurrent
    /// request), the existing row is returned unchanged.
    async fn create(&self, session_id: Uuid) -> Result<Conversation, RepositoryError>;

    /// Persists the last-message fields and `updated_at` of `conversation`.
    async fn save(&self, conversation: &Conversation) -> Result<Conversation, RepositoryError>;

    /// Returns `false` if no conversation had the given id.
    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Nulls the last-message pointer and cached text of every conversation pointing
    /// at `message_id`. Returns the number of conversations touched.
    ///
    /// Message deletion does not go through here: `MessageRepository::delete` runs the
    /// same update inside its own transaction, and that is the authoritative path.
    async fn clear_last_message_references_to(
        &self,
        message_id: i64,
    ) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(
        &self,
        sender_type: SenderType,
        content: String,
    ) -> Result<Message, RepositoryError>;

    /// Plain row lookup; messages are only ever returned embedded in a conversation.
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, RepositoryError>;

    /// Deletes a message, clearing conversation references to it in the same
    /// transaction. Returns `false` if no message had the given id.
    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_keys_select_by_session_id() {
        let session_id = Uuid::new_v4();
        assert_eq!(
            ConversationKey::parse(&session_id.to_string()),
            Some(ConversationKey::SessionId(session_id))
        );
    }

    #[test]
    fn integer_keys_select_by_id() {
        assert_eq!(ConversationKey::parse("42"), Some(ConversationKey::Id(42)));
    }

    #[test]
    fn anything_else_matches_nothing() {
        assert_eq!(ConversationKey::parse("abc"), None);
        assert_eq!(ConversationKey::parse(""), None);
        assert_eq!(ConversationKey::parse("67e5504410b1426f9247bb680e5fe0c8"), None);
    }

    #[test]
    fn session_ids_must_be_hyphenated() {
        let session_id = Uuid::new_v4();

        assert_eq!(parse_session_id(&session_id.to_string()), Some(session_id));
        assert_eq!(
            parse_session_id(&session_id.to_string().to_uppercase()),
            Some(session_id)
        );
        assert_eq!(parse_session_id(&session_id.simple().to_string()), None);
        assert_eq!(parse_session_id(&session_id.braced().to_string()), None);
        assert_eq!(parse_session_id(&session_id.urn().to_string()), None);
        assert_eq!(parse_session_id(""), None);
    }
}
