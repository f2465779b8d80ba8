//! DI "Interfaces"

use crate::infrastructure::entities::ConversationWithLastMessage;
use crate::infrastructure::traits::{ConversationKey, RepositoryError};
use async_trait::async_trait;
use uuid::Uuid;

/// Answer returned to whoever submitted a question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionAnswer {
    pub session_id: Uuid,
    pub answer: String,
}

/// One page of results plus the numbers needed to render pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub per_page: u32,
    pub current_page: u32,
}

impl<T> Page<T> {
    pub fn last_page(&self) -> u32 {
        let per_page = i64::from(self.per_page.max(1));
        let pages = (self.total + per_page - 1) / per_page;
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, thiserror::Error)]
pub enum ChatbotError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chatbot answered with status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait ChatbotClient: Send + Sync {
    /// Forwards `question` to the chatbot under `session_id` and returns its answer.
    async fn ask(&self, session_id: Uuid, question: &str) -> Result<String, ChatbotError>;
}

#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Stores the question, asks the chatbot and stores its answer.
    ///
    /// An unknown `session_id` starts a new conversation under that id; a missing one
    /// starts a conversation under a fresh id. A failing chatbot never fails this call,
    /// the fallback answer is stored and returned instead.
    async fn submit_question(
        &self,
        question: String,
        session_id: Option<Uuid>,
    ) -> Result<QuestionAnswer, ServiceError>;

    /// Lists conversations with their last message, optionally restricted to one session.
    ///
    /// `page` is 1-indexed. A page past the end is empty, not an error. A `session_id`
    /// filter that is not a hyphenated UUID matches nothing.
    async fn list_conversations(
        &self,
        session_id: Option<String>,
        page: u32,
        limit: u32,
    ) -> Result<Page<ConversationWithLastMessage>, ServiceError>;

    async fn get_conversation(
        &self,
        key: ConversationKey,
    ) -> Result<ConversationWithLastMessage, ServiceError>;

    /// Deletes the conversation only. Its messages stay.
    async fn delete_conversation(&self, id: i64) -> Result<(), ServiceError>;

    /// Deletes the message and clears any last-message pointer referring to it.
    async fn delete_message(&self, id: i64) -> Result<(), ServiceError>;
}
