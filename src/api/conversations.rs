//! Conversations endpoints

use crate::api::conversations::schemas::{Conversation, ConversationList, ListConversationsQuery};
use crate::api::error::ApiError;
use crate::core::services::DEFAULT_PAGE_SIZE;
use crate::core::traits::ConversationService;
use crate::infrastructure::traits::ConversationKey;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_conversations))
        .route("/:id", get(get_conversation).delete(delete_conversation))
}

async fn list_conversations(
    Inject(conversation_service): Inject<dyn ConversationService>,
    query: Result<Query<ListConversationsQuery>, QueryRejection>,
) -> Result<Json<ConversationList>, ApiError> {
    let Query(query) = query?;
    // `?sessionId=` with nothing after it means no filter.
    let session_id = query.session_id.filter(|s| !s.trim().is_empty());

    let page = conversation_service
        .list_conversations(
            session_id,
            query.page.unwrap_or(1),
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(Json(ConversationList::from(page)))
}

async fn get_conversation(
    Inject(conversation_service): Inject<dyn ConversationService>,
    Path(id_or_session_id): Path<String>,
) -> Result<Json<Conversation>, ApiError> {
    let key = ConversationKey::parse(&id_or_session_id)
        .ok_or_else(|| ApiError::NotFound("conversation not found".to_owned()))?;

    let conversation = conversation_service.get_conversation(key).await?;

    Ok(Json(Conversation::from(conversation)))
}

async fn delete_conversation(
    Inject(conversation_service): Inject<dyn ConversationService>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;

    conversation_service.delete_conversation(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub mod schemas {
    use crate::api::messages::schemas::Message;
    use crate::core::traits::Page;
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct ListConversationsQuery {
        pub session_id: Option<String>,
        pub page: Option<u32>,
        pub limit: Option<u32>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Conversation {
        pub id: i64,
        pub session_id: Uuid,
        pub last_message_id: Option<i64>,
        pub last_message_content: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub last_message: Option<Message>,
    }

    impl From<entities::ConversationWithLastMessage> for Conversation {
        fn from(row: entities::ConversationWithLastMessage) -> Self {
            let conversation = row.conversation;
            Conversation {
                id: conversation.id,
                session_id: conversation.session_id.into_uuid(),
                last_message_id: conversation.last_message_id,
                last_message_content: conversation.last_message,
                created_at: conversation.created_at,
                updated_at: conversation.updated_at,
                last_message: row.last_message.map(Message::from),
            }
        }
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct PaginationMeta {
        pub total: i64,
        pub per_page: u32,
        pub current_page: u32,
        pub last_page: u32,
        pub first_page: u32,
    }

    #[derive(Serialize, Debug)]
    pub struct ConversationList {
        pub meta: PaginationMeta,
        pub data: Vec<Conversation>,
    }

    impl From<Page<entities::ConversationWithLastMessage>> for ConversationList {
        fn from(page: Page<entities::ConversationWithLastMessage>) -> Self {
            ConversationList {
                meta: PaginationMeta {
                    total: page.total,
                    per_page: page.per_page,
                    current_page: page.current_page,
                    last_page: page.last_page(),
                    first_page: 1,
                },
                data: page.items.into_iter().map(Conversation::from).collect(),
            }
        }
    }
}
