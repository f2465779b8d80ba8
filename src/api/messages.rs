//! Messages endpoints

use crate::api::error::ApiError;
use crate::core::traits::ConversationService;
use axum::Router;
use axum::extract::Path;
use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::routing::delete;
use di_axum::Inject;

pub fn router() -> Router {
    Router::new().route("/:id", delete(delete_message))
}

async fn delete_message(
    Inject(conversation_service): Inject<dyn ConversationService>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;

    conversation_service.delete_message(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub mod schemas {
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::Serialize;

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Message {
        pub id: i64,
        pub sender_type: entities::SenderType,
        pub content: String,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::Message> for Message {
        fn from(message: entities::Message) -> Self {
            Message {
                id: message.id,
                sender_type: message.sender_type,
                content: message.content,
                created_at: message.created_at,
            }
        }
    }
}
