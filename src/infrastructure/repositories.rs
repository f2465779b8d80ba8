//! DB Repository abstractions

use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{
    Conversation, ConversationWithLastMessage, Message, SenderType,
};
use crate::infrastructure::traits::{
    ConversationKey, ConversationRepository, MessageRepository, RepositoryError,
};
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::debug;
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

const SELECT_WITH_LAST_MESSAGE: &str =
    "SELECT c.id, c.session_id, c.last_message_id, c.last_message, c.created_at, c.updated_at, m.id AS message_id, m.sender_type AS message_sender_type, m.content AS message_content, m.created_at AS message_created_at FROM conversations c LEFT JOIN messages m ON m.id = c.last_message_id";

async fn clear_last_message_references<'e, E>(
    executor: E,
    message_id: i64,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE conversations SET last_message_id = NULL, last_message = NULL, updated_at = ? WHERE last_message_id = ?",
    )
    .bind(Utc::now())
    .bind(message_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

#[injectable(ConversationRepository)]
pub struct DbConversationRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbConversationRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> DbConversationRepository {
        DbConversationRepository { connection }
    }
}

#[async_trait]
impl ConversationRepository for DbConversationRepository {
    async fn find_by_session_id(
        &self,
        session_id: Uuid,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let conversation = sqlx::query_as("SELECT * FROM conversations WHERE session_id = ?")
            .bind(session_id.hyphenated())
            .fetch_optional(&**self.connection)
            .await?;

        Ok(conversation)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Conversation>, RepositoryError> {
        let conversation = sqlx::query_as("SELECT * FROM conversations WHERE id = ?")
            .bind(id)
            .fetch_optional(&**self.connection)
            .await?;

        Ok(conversation)
    }

    async fn find_with_last_message(
        &self,
        key: ConversationKey,
    ) -> Result<Option<ConversationWithLastMessage>, RepositoryError> {
        let conversation = match key {
            ConversationKey::Id(id) => {
                let sql = format!("{SELECT_WITH_LAST_MESSAGE} WHERE c.id = ?");
                sqlx::query_as(&sql)
                    .bind(id)
                    .fetch_optional(&**self.connection)
                    .await?
            }
            ConversationKey::SessionId(session_id) => {
                let sql = format!("{SELECT_WITH_LAST_MESSAGE} WHERE c.session_id = ?");
                sqlx::query_as(&sql)
                    .bind(session_id.hyphenated())
                    .fetch_optional(&**self.connection)
                    .await?
            }
        };

        Ok(conversation)
    }

    async fn list_with_last_message(
        &self,
        session_id: Option<Uuid>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<ConversationWithLastMessage>, i64), RepositoryError> {
        let session_id = session_id.map(|id| id.hyphenated());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM conversations WHERE (? IS NULL OR session_id = ?)",
        )
        .bind(session_id)
        .bind(session_id)
        .fetch_one(&**self.connection)
        .await?;

        let sql = format!(
            "{SELECT_WITH_LAST_MESSAGE} WHERE (? IS NULL OR c.session_id = ?) ORDER BY c.id ASC LIMIT ? OFFSET ?"
        );
        let conversations = sqlx::query_as(&sql)
            .bind(session_id)
            .bind(session_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&**self.connection)
            .await?;

        Ok((conversations, total))
    }

    async fn create(&self, session_id: Uuid) -> Result<Conversation, RepositoryError> {
        let now = Utc::now();

        // The no-op update makes RETURNING yield the existing row on conflict.
        let conversation = sqlx::query_as(
            "INSERT INTO conversations (session_id, created_at, updated_at) VALUES (?, ?, ?) ON CONFLICT (session_id) DO UPDATE SET session_id = excluded.session_id RETURNING *",
        )
        .bind(session_id.hyphenated())
        .bind(now)
        .bind(now)
        .fetch_one(&**self.connection)
        .await?;

        debug!("conversation ready for session {session_id}");
        Ok(conversation)
    }

    async fn save(&self, conversation: &Conversation) -> Result<Conversation, RepositoryError> {
        let conversation = sqlx::query_as(
            "UPDATE conversations SET last_message_id = ?, last_message = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(conversation.last_message_id)
        .bind(conversation.last_message.as_deref())
        .bind(conversation.updated_at)
        .bind(conversation.id)
        .fetch_one(&**self.connection)
        .await?;

        Ok(conversation)
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id)
            .execute(&**self.connection)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_last_message_references_to(
        &self,
        message_id: i64,
    ) -> Result<u64, RepositoryError> {
        Ok(clear_last_message_references(&**self.connection, message_id).await?)
    }
}

#[injectable(MessageRepository)]
pub struct DbMessageRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbMessageRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> DbMessageRepository {
        DbMessageRepository { connection }
    }
}

#[async_trait]
impl MessageRepository for DbMessageRepository {
    async fn create(
        &self,
        sender_type: SenderType,
        content: String,
    ) -> Result<Message, RepositoryError> {
        let message = sqlx::query_as(
            "INSERT INTO messages (sender_type, content, created_at) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(sender_type)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&**self.connection)
        .await?;

        Ok(message)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, RepositoryError> {
        let message = sqlx::query_as("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(&**self.connection)
            .await?;

        Ok(message)
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut tx = self.connection.begin().await?;

        let cleared = clear_last_message_references(&mut *tx, id).await?;
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if cleared > 0 {
            debug!("cleared {cleared} conversation reference(s) to message {id}");
        }
        Ok(result.rows_affected() > 0)
    }
}
