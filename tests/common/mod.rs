//! Shared setup for integration tests: a migrated SQLite file per test and a fake
//! chatbot served by a local axum server.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chatbot_conversation_api::config::{
    ChatbotSettings, DatabaseSettings, ServerSettings, Settings,
};
use chatbot_conversation_api::infrastructure::database;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

/// Requests the fake chatbot received, in order.
pub type Received = Arc<Mutex<Vec<Value>>>;

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new(chatbot_url: &str) -> TestApp {
        TestApp::with_timeout(chatbot_url, Duration::from_secs(5)).await
    }

    pub async fn with_timeout(chatbot_url: &str, timeout: Duration) -> TestApp {
        let (pool, dir) = setup_test_db().await;

        let settings = Settings {
            server: ServerSettings {
                bind_address: "127.0.0.1:0".parse().unwrap(),
                cors_allowed_origins: vec!["http://localhost:5173".to_owned()],
            },
            database: DatabaseSettings {
                url: String::new(),
                max_connections: 1,
            },
            chatbot: ChatbotSettings {
                url: chatbot_url.to_owned(),
                api_key: None,
                timeout,
            },
        };

        let provider = chatbot_conversation_api::services(settings.clone(), pool.clone())
            .build_provider()
            .unwrap();
        let router =
            chatbot_conversation_api::app(provider, &settings.server.cors_allowed_origins);

        TestApp {
            router,
            pool,
            _dir: dir,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    pub async fn ask(&self, question: &str, session_id: Option<&str>) -> (StatusCode, Value) {
        let mut body = json!({ "question": question });
        if let Some(session_id) = session_id {
            body["sessionId"] = json!(session_id);
        }
        self.request("POST", "/questions", Some(body)).await
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

/// Opens a fresh, migrated database in a temporary directory.
pub async fn setup_test_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

    let pool = database::connect(&DatabaseSettings {
        url,
        max_connections: 1,
    })
    .await
    .unwrap();

    (pool, dir)
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/chat")
}

/// A chatbot that answers `echo: <question>` and records every request body.
pub async fn echo_chatbot() -> (String, Received) {
    let received: Received = Arc::default();
    let log = received.clone();

    let router = Router::new().route(
        "/chat",
        post(move |Json(body): Json<Value>| {
            let log = log.clone();
            async move {
                let answer = format!("echo: {}", body["message"].as_str().unwrap_or_default());
                log.lock().unwrap().push(body);
                Json(json!({ "message": answer }))
            }
        }),
    );

    (serve(router).await, received)
}

/// A chatbot that always fails with 500.
pub async fn failing_chatbot() -> String {
    serve(Router::new().route(
        "/chat",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    ))
    .await
}

/// A chatbot that answers 200 without a `message` field.
pub async fn malformed_chatbot() -> String {
    serve(Router::new().route(
        "/chat",
        post(|| async { Json(json!({ "answer": 42 })) }),
    ))
    .await
}

/// A chatbot that takes longer than any test timeout to answer.
pub async fn slow_chatbot() -> String {
    serve(Router::new().route(
        "/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Json(json!({ "message": "too late" }))
        }),
    ))
    .await
}

/// An address nothing listens on.
pub const UNREACHABLE_CHATBOT: &str = "http://127.0.0.1:1/chat";
