//! HTTP client for the external chatbot API

use crate::config::Settings;
use crate::core::traits::{ChatbotClient, ChatbotError};
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Serialize, Debug)]
struct ChatbotRequest<'a> {
    session_id: Uuid,
    message: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatbotResponse {
    message: String,
}

pub struct HttpChatbotClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[injectable(ChatbotClient)]
impl HttpChatbotClient {
    #[inject]
    pub fn create(settings: Ref<Settings>) -> HttpChatbotClient {
        HttpChatbotClient {
            client: reqwest::Client::new(),
            url: settings.chatbot.url.clone(),
            api_key: settings.chatbot.api_key.clone(),
            timeout: settings.chatbot.timeout,
        }
    }
}

#[async_trait]
impl ChatbotClient for HttpChatbotClient {
    async fn ask(&self, session_id: Uuid, question: &str) -> Result<String, ChatbotError> {
        let mut request = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&ChatbotRequest {
                session_id,
                message: question,
            });

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatbotError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let answer: ChatbotResponse = serde_json::from_slice(&body)
            .map_err(|e| ChatbotError::MalformedResponse(e.to_string()))?;

        Ok(answer.message)
    }
}
