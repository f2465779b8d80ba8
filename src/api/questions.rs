//! Question endpoint

use crate::api::ValidatedJson;
use crate::api::error::ApiError;
use crate::api::questions::schemas::{AnswerResponse, CreateQuestion};
use crate::core::traits::ConversationService;
use crate::infrastructure::traits::parse_session_id;
use axum::routing::post;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new().route("/", post(submit_question))
}

async fn submit_question(
    Inject(conversation_service): Inject<dyn ConversationService>,
    ValidatedJson(request): ValidatedJson<CreateQuestion>,
) -> Result<Json<AnswerResponse>, ApiError> {
    // Already validated, a failure here is a bug.
    let session_id = match request.session_id.as_deref() {
        Some(raw) => Some(
            parse_session_id(raw)
                .ok_or_else(|| ApiError::Internal(format!("unparsed session id {raw}")))?,
        ),
        None => None,
    };

    let answer = conversation_service
        .submit_question(request.question, session_id)
        .await?;

    Ok(Json(AnswerResponse {
        session_id: answer.session_id,
        message: answer.answer,
    }))
}

pub mod schemas {
    use crate::infrastructure::traits::parse_session_id;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;
    use validator::{Validate, ValidationError};

    #[derive(Deserialize, Debug, Validate)]
    #[serde(rename_all = "camelCase")]
    pub struct CreateQuestion {
        #[serde(default)]
        #[validate(custom(function = "not_blank"))]
        pub question: String,
        #[validate(custom(function = "uuid_format"))]
        pub session_id: Option<String>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct AnswerResponse {
        pub session_id: Uuid,
        pub message: String,
    }

    fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(
                ValidationError::new("required").with_message("question is required".into())
            );
        }
        Ok(())
    }

    fn uuid_format(value: &str) -> Result<(), ValidationError> {
        match parse_session_id(value) {
            Some(_) => Ok(()),
            None => Err(ValidationError::new("uuid")
                .with_message("sessionId must be a valid UUID".into())),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn parse(body: &str) -> CreateQuestion {
            serde_json::from_str(body).unwrap()
        }

        #[test]
        fn accepts_question_with_and_without_session() {
            assert!(parse(r#"{"question":"hi"}"#).validate().is_ok());
            assert!(
                parse(r#"{"question":"hi","sessionId":"67e55044-10b1-426f-9247-bb680e5fe0c8"}"#)
                    .validate()
                    .is_ok()
            );
        }

        #[test]
        fn rejects_blank_question() {
            let errors = parse(r#"{"question":"   "}"#).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("question"));

            let errors = parse(r#"{}"#).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("question"));
        }

        #[test]
        fn rejects_malformed_session_id() {
            let errors = parse(r#"{"question":"hi","sessionId":"nope"}"#)
                .validate()
                .unwrap_err();
            assert!(errors.field_errors().contains_key("session_id"));
        }

        #[test]
        fn rejects_unhyphenated_session_id() {
            let body = r#"{"question":"hi","sessionId":"67e5504410b1426f9247bb680e5fe0c8"}"#;
            let errors = parse(body).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("session_id"));
        }
    }
}
