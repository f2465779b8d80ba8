//! Implementations for the service the app needs.
//!

use crate::core::traits::{ChatbotClient, ConversationService, Page, QuestionAnswer, ServiceError};
use crate::infrastructure::entities::{ConversationWithLastMessage, SenderType};
use crate::infrastructure::traits::{
    ConversationKey, ConversationRepository, MessageRepository, parse_session_id,
};
use async_trait::async_trait;
use di::{Ref, injectable};
use log::{debug, warn};
use uuid::Uuid;

/// Answer stored and returned whenever the chatbot cannot be reached or answers nonsense.
pub const FALLBACK_ANSWER: &str =
    "Sorry, I am unable to answer right now. Please try again later.";

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[injectable(ConversationService)]
pub struct DefaultConversationService {
    conversations: Ref<dyn ConversationRepository>,
    messages: Ref<dyn MessageRepository>,
    chatbot: Ref<dyn ChatbotClient>,
}

impl DefaultConversationService {
    pub fn new(
        conversations: Ref<dyn ConversationRepository>,
        messages: Ref<dyn MessageRepository>,
        chatbot: Ref<dyn ChatbotClient>,
    ) -> DefaultConversationService {
        DefaultConversationService {
            conversations,
            messages,
            chatbot,
        }
    }
}

#[async_trait]
impl ConversationService for DefaultConversationService {
    async fn submit_question(
        &self,
        question: String,
        session_id: Option<Uuid>,
    ) -> Result<QuestionAnswer, ServiceError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ServiceError::EmptyQuestion);
        }

        let session_id = session_id.unwrap_or_else(Uuid::new_v4);
        let mut conversation = match self.conversations.find_by_session_id(session_id).await? {
            Some(conversation) => conversation,
            None => self.conversations.create(session_id).await?,
        };

        self.messages
            .create(SenderType::User, question.to_owned())
            .await?;

        let answer = match self.chatbot.ask(session_id, question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("chatbot unavailable for session {session_id}, using fallback: {e}");
                FALLBACK_ANSWER.to_owned()
            }
        };

        let bot_message = self.messages.create(SenderType::Bot, answer).await?;

        conversation.set_last_message(&bot_message);
        self.conversations.save(&conversation).await?;
        debug!(
            "conversation {} now ends with message {}",
            conversation.id, bot_message.id
        );

        Ok(QuestionAnswer {
            session_id,
            answer: bot_message.content,
        })
    }

    async fn list_conversations(
        &self,
        session_id: Option<String>,
        page: u32,
        limit: u32,
    ) -> Result<Page<ConversationWithLastMessage>, ServiceError> {
        let current_page = page.max(1);
        let per_page = limit.clamp(1, MAX_PAGE_SIZE);

        let session_id = match session_id {
            Some(raw) => match parse_session_id(raw.trim()) {
                Some(session_id) => Some(session_id),
                None => {
                    return Ok(Page {
                        items: Vec::new(),
                        total: 0,
                        per_page,
                        current_page,
                    });
                }
            },
            None => None,
        };

        let offset = i64::from(current_page - 1) * i64::from(per_page);
        let (items, total) = self
            .conversations
            .list_with_last_message(session_id, offset, i64::from(per_page))
            .await?;

        Ok(Page {
            items,
            total,
            per_page,
            current_page,
        })
    }

    async fn get_conversation(
        &self,
        key: ConversationKey,
    ) -> Result<ConversationWithLastMessage, ServiceError> {
        self.conversations
            .find_with_last_message(key)
            .await?
            .ok_or(ServiceError::NotFound("conversation"))
    }

    async fn delete_conversation(&self, id: i64) -> Result<(), ServiceError> {
        if self.conversations.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("conversation"))
        }
    }

    async fn delete_message(&self, id: i64) -> Result<(), ServiceError> {
        if self.messages.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound("message"))
        }
    }
}
