//! The single place where errors become HTTP responses.

use crate::core::traits::ServiceError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde::Serialize;
use validator::ValidationErrors;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub rule: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, rule: &str, message: impl Into<String>) -> FieldError {
        FieldError {
            field: field.to_owned(),
            rule: rule.to_owned(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// Bad input, reported field by field.
    Validation(Vec<FieldError>),
    NotFound(String),
    /// Anything unexpected. The detail is logged, never sent to the client.
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<T: Serialize> {
    errors: Vec<T>,
}

#[derive(Serialize)]
struct ErrorMessage {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { errors })).into_response()
            }
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    errors: vec![ErrorMessage { message }],
                }),
            )
                .into_response(),
            ApiError::Internal(detail) => {
                error!("request failed: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        errors: vec![ErrorMessage {
                            message: "Internal server error".to_owned(),
                        }],
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::EmptyQuestion => {
                ApiError::Validation(vec![FieldError::new("question", "required", e.to_string())])
            }
            ServiceError::NotFound(_) => ApiError::NotFound(e.to_string()),
            ServiceError::Repository(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let field = camel_case(&field.to_string());
                errors.iter().map(move |e| FieldError {
                    field: field.clone(),
                    rule: e.code.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid")),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::Validation(fields)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(vec![FieldError::new("body", "json", rejection.body_text())])
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(vec![FieldError::new("query", "format", rejection.body_text())])
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(vec![FieldError::new("id", "integer", rejection.body_text())])
    }
}

/// `session_id` -> `sessionId`, so errors name fields the way clients send them.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
